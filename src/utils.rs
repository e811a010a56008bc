use bytemuck::{Pod, Zeroable};

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub pos: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

impl Vertex {
    pub const ATTRIBUTES: [wgpu::VertexAttribute; 3] =
        wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3, 2 => Float32x2];

    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBUTES,
        }
    }
}

/// CPU-side geometry: one vertex list plus an optional triangle index list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshData {
    pub vertices: Vec<Vertex>,
    /// Empty means the vertices are drawn as a plain triangle list
    pub indices: Vec<u32>,
}

impl MeshData {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    pub fn is_indexed(&self) -> bool {
        !self.indices.is_empty()
    }

    pub fn triangle_count(&self) -> usize {
        if self.is_indexed() {
            self.indices.len() / 3
        } else {
            self.vertices.len() / 3
        }
    }

    /// Byte sizes of the vertex and index buffers this data uploads to.
    pub fn buffer_sizes(&self) -> (u64, u64) {
        (
            std::mem::size_of_val(self.vertices.as_slice()) as u64,
            std::mem::size_of_val(self.indices.as_slice()) as u64,
        )
    }

    /// Every index refers to an existing vertex.
    pub fn indices_in_bounds(&self) -> bool {
        let n = self.vertices.len() as u32;
        self.indices.iter().all(|&i| i < n)
    }

    /// Axis-aligned cube centred on the origin with edge length `size`.
    /// Four vertices per face so normals and UVs stay per-face.
    pub fn cube(size: f32) -> Self {
        let h = size * 0.5;
        // (normal, u axis, v axis)
        let faces: [([f32; 3], [f32; 3], [f32; 3]); 6] = [
            ([0.0, 0.0, 1.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
            ([0.0, 0.0, -1.0], [-1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
            ([1.0, 0.0, 0.0], [0.0, 0.0, -1.0], [0.0, 1.0, 0.0]),
            ([-1.0, 0.0, 0.0], [0.0, 0.0, 1.0], [0.0, 1.0, 0.0]),
            ([0.0, 1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, -1.0]),
            ([0.0, -1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, 1.0]),
        ];

        let mut vertices = Vec::with_capacity(24);
        let mut indices = Vec::with_capacity(36);

        for (n, u, v) in faces {
            let base = vertices.len() as u32;
            for (su, sv) in [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)] {
                let pos = [
                    (n[0] + su * u[0] + sv * v[0]) * h,
                    (n[1] + su * u[1] + sv * v[1]) * h,
                    (n[2] + su * u[2] + sv * v[2]) * h,
                ];
                let uv = [(su + 1.0) * 0.5, 1.0 - (sv + 1.0) * 0.5];
                vertices.push(Vertex { pos, normal: n, uv });
            }
            indices.extend_from_slice(&[base, base + 1, base + 2, base + 2, base + 3, base]);
        }

        Self { vertices, indices }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    #[test]
    fn test_vertex_is_tightly_packed() {
        assert_eq!(std::mem::size_of::<Vertex>(), 32);
    }

    #[test]
    fn test_cube_geometry() {
        let cube = MeshData::cube(2.0);
        assert_eq!(cube.vertices.len(), 24);
        assert_eq!(cube.indices.len(), 36);
        assert_eq!(cube.triangle_count(), 12);
        assert!(cube.indices_in_bounds());

        for v in &cube.vertices {
            for c in v.pos {
                assert!((c.abs() - 1.0).abs() < 1e-6);
            }
        }
    }

    #[test]
    fn test_cube_faces_wind_outwards() {
        let cube = MeshData::cube(1.0);
        for tri in cube.indices.chunks(3) {
            let [a, b, c] = [tri[0], tri[1], tri[2]].map(|i| Vec3::from(cube.vertices[i as usize].pos));
            let face_normal = (b - a).cross(c - a).normalize();
            let stored = Vec3::from(cube.vertices[tri[0] as usize].normal);
            assert!(face_normal.abs_diff_eq(stored, 1e-5), "{face_normal:?} vs {stored:?}");
        }
    }

    #[test]
    fn test_non_indexed_triangle_count() {
        let mesh = MeshData {
            vertices: vec![Vertex::zeroed(); 6],
            indices: Vec::new(),
        };
        assert!(!mesh.is_indexed());
        assert_eq!(mesh.triangle_count(), 2);
    }
}
