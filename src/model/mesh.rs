//! Mesh import: turns a file on disk into a single merged [`MeshData`].
//!
//! Parsing is delegated to a [`MeshImporter`]; this module only flattens the
//! returned sub-meshes into one drawable unit and fills in missing attributes.

use std::path::Path;

use glam::{Vec2, Vec3};

use crate::errors::ImportError;
use crate::utils::{MeshData, Vertex};

/// Preprocessing requested from the importer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportFlags {
    pub triangulate: bool,
    pub generate_normals: bool,
    pub flip_uvs: bool,
    pub join_identical_vertices: bool,
}

impl Default for ImportFlags {
    fn default() -> Self {
        Self {
            triangulate: true,
            generate_normals: true,
            flip_uvs: true,
            join_identical_vertices: true,
        }
    }
}

/// One mesh as delivered by the importer. Indices are local to this sub-mesh.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SubMesh {
    pub name: String,
    pub positions: Vec<Vec3>,
    pub normals: Option<Vec<Vec3>>,
    pub uvs: Option<Vec<Vec2>>,
    /// Triangle list, three indices per face
    pub indices: Vec<u32>,
}

pub trait MeshImporter {
    fn import(&self, path: &Path, flags: ImportFlags) -> Result<Vec<SubMesh>, ImportError>;
}

/// Load `path` through `importer` and merge everything it returns.
pub fn load(path: &Path, importer: &dyn MeshImporter) -> Result<MeshData, ImportError> {
    let sub_meshes = importer.import(path, ImportFlags::default())?;
    let data = merge_sub_meshes(&sub_meshes);
    if data.is_empty() {
        return Err(ImportError::Empty(path.to_path_buf()));
    }
    tracing::info!(
        "loaded {} ({} sub-meshes, {} vertices, {} triangles)",
        path.display(),
        sub_meshes.len(),
        data.vertices.len(),
        data.triangle_count(),
    );
    Ok(data)
}

/// Reject geometry whose vertex or index buffer would exceed `max_buffer_size`.
pub fn check_buffer_limit(path: &Path, data: MeshData, max_buffer_size: u64) -> Result<MeshData, ImportError> {
    let (vertex_bytes, index_bytes) = data.buffer_sizes();
    let bytes = vertex_bytes.max(index_bytes);
    if bytes > max_buffer_size {
        return Err(ImportError::TooLarge { path: path.to_path_buf(), bytes, max: max_buffer_size });
    }
    Ok(data)
}

/// Concatenate sub-meshes, offsetting each one's indices by the number of
/// vertices already emitted. Missing normals/UVs become zero vectors.
///
/// If any sub-mesh is indexed the result is indexed, and unindexed sub-meshes
/// get sequential indices so they are still drawn.
pub fn merge_sub_meshes(sub_meshes: &[SubMesh]) -> MeshData {
    let mut out = MeshData::empty();
    let indexed = sub_meshes.iter().any(|s| !s.indices.is_empty());

    for sub in sub_meshes {
        let offset = out.vertices.len() as u32;
        let count = sub.positions.len();

        for (i, p) in sub.positions.iter().enumerate() {
            let normal = sub
                .normals
                .as_ref()
                .and_then(|n| n.get(i).copied())
                .unwrap_or(Vec3::ZERO);
            let uv = sub
                .uvs
                .as_ref()
                .and_then(|uv| uv.get(i).copied())
                .unwrap_or(Vec2::ZERO);
            out.vertices.push(Vertex {
                pos: p.to_array(),
                normal: normal.to_array(),
                uv: uv.to_array(),
            });
        }

        if indexed && sub.indices.is_empty() {
            let whole = count - count % 3;
            if whole < count {
                tracing::warn!("sub-mesh '{}': dropped {} trailing vertices", sub.name, count - whole);
            }
            out.indices.extend(offset..offset + whole as u32);
            continue;
        }

        let mut dropped = 0usize;
        for tri in sub.indices.chunks(3) {
            if tri.len() < 3 || tri.iter().any(|&i| i as usize >= count) {
                dropped += 1;
                continue;
            }
            out.indices.extend(tri.iter().map(|&i| i + offset));
        }
        if dropped > 0 {
            tracing::warn!("sub-mesh '{}': dropped {} malformed faces", sub.name, dropped);
        }
    }

    out
}

/// Area-weighted smooth normals from the triangle list. Vertices not used by
/// any face (or only by degenerate ones) get a zero normal.
pub fn generate_normals(positions: &[Vec3], indices: &[u32]) -> Vec<Vec3> {
    let mut normals = vec![Vec3::ZERO; positions.len()];

    for tri in indices.chunks_exact(3) {
        let [a, b, c] = [tri[0] as usize, tri[1] as usize, tri[2] as usize];
        if a >= positions.len() || b >= positions.len() || c >= positions.len() {
            continue;
        }
        // unnormalized cross product = face normal scaled by twice the area
        let n = (positions[b] - positions[a]).cross(positions[c] - positions[a]);
        normals[a] += n;
        normals[b] += n;
        normals[c] += n;
    }

    normals.into_iter().map(Vec3::normalize_or_zero).collect()
}

/// Wavefront OBJ importer backed by `tobj`.
#[derive(Debug, Default, Clone, Copy)]
pub struct ObjImporter;

impl MeshImporter for ObjImporter {
    fn import(&self, path: &Path, flags: ImportFlags) -> Result<Vec<SubMesh>, ImportError> {
        let is_obj = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("obj"));
        if !is_obj {
            return Err(ImportError::Unsupported(path.to_path_buf()));
        }
        if !path.exists() {
            return Err(ImportError::Io {
                path: path.to_path_buf(),
                source: std::io::Error::from(std::io::ErrorKind::NotFound),
            });
        }

        // a single index buffer is required by the vertex format, and tobj welds
        // identical position/uv/normal tuples while building it
        let options = tobj::LoadOptions {
            single_index: true,
            triangulate: flags.triangulate,
            ignore_points: true,
            ignore_lines: true,
            ..Default::default()
        };

        let (models, materials) = tobj::load_obj(path, &options).map_err(|source| ImportError::Obj {
            path: path.to_path_buf(),
            source,
        })?;
        if !flags.join_identical_vertices {
            tracing::debug!("vertex welding is always applied to OBJ input");
        }
        if let Err(e) = materials {
            tracing::debug!("no materials for {}: {}", path.display(), e);
        }

        Ok(models
            .into_iter()
            .map(|model| sub_mesh_from_obj(model, flags))
            .collect())
    }
}

fn sub_mesh_from_obj(model: tobj::Model, flags: ImportFlags) -> SubMesh {
    let mesh = model.mesh;

    let positions: Vec<Vec3> = mesh
        .positions
        .chunks_exact(3)
        .map(|p| Vec3::new(p[0], p[1], p[2]))
        .collect();

    let mut normals = (!mesh.normals.is_empty()).then(|| {
        mesh.normals
            .chunks_exact(3)
            .map(|n| Vec3::new(n[0], n[1], n[2]))
            .collect::<Vec<_>>()
    });

    let uvs = (!mesh.texcoords.is_empty()).then(|| {
        mesh.texcoords
            .chunks_exact(2)
            .map(|t| {
                let v = if flags.flip_uvs { 1.0 - t[1] } else { t[1] };
                Vec2::new(t[0], v)
            })
            .collect::<Vec<_>>()
    });

    if normals.is_none() && flags.generate_normals {
        normals = Some(generate_normals(&positions, &mesh.indices));
    }

    SubMesh {
        name: model.name,
        positions,
        normals,
        uvs,
        indices: mesh.indices,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::path::PathBuf;

    fn quad_sub_mesh(name: &str, n: usize, indices: Vec<u32>) -> SubMesh {
        SubMesh {
            name: name.to_string(),
            positions: (0..n).map(|i| Vec3::new(i as f32, 0.0, 0.0)).collect(),
            normals: None,
            uvs: None,
            indices,
        }
    }

    struct FixedImporter(Vec<SubMesh>);

    impl MeshImporter for FixedImporter {
        fn import(&self, _path: &Path, _flags: ImportFlags) -> Result<Vec<SubMesh>, ImportError> {
            Ok(self.0.clone())
        }
    }

    fn temp_obj(name: &str, contents: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("meshview-{}-{}.obj", name, std::process::id()));
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_merge_offsets_second_sub_mesh() {
        let first = quad_sub_mesh("a", 3, vec![0, 1, 2]);
        let second = quad_sub_mesh("b", 4, vec![0, 1, 2, 2, 3, 0]);

        let merged = merge_sub_meshes(&[first, second]);

        assert_eq!(merged.vertices.len(), 7);
        assert_eq!(merged.indices, vec![0, 1, 2, 3, 4, 5, 5, 6, 3]);
        assert!(merged.indices_in_bounds());
    }

    #[test]
    fn test_merge_indexes_unindexed_sub_mesh() {
        let indexed = quad_sub_mesh("a", 3, vec![0, 1, 2]);
        let plain = quad_sub_mesh("b", 3, Vec::new());

        let merged = merge_sub_meshes(&[indexed, plain]);

        assert_eq!(merged.vertices.len(), 6);
        assert_eq!(merged.indices, vec![0, 1, 2, 3, 4, 5]);
        assert_eq!(merged.triangle_count(), 2);
    }

    #[test]
    fn test_merge_keeps_all_unindexed_as_plain_list() {
        let merged = merge_sub_meshes(&[quad_sub_mesh("a", 3, Vec::new()), quad_sub_mesh("b", 6, Vec::new())]);
        assert!(!merged.is_indexed());
        assert_eq!(merged.triangle_count(), 3);
    }

    #[test]
    fn test_merge_defaults_missing_attributes() {
        let mut sub = quad_sub_mesh("a", 3, vec![0, 1, 2]);
        sub.normals = Some(vec![Vec3::Y]); // shorter than positions
        let merged = merge_sub_meshes(&[sub]);

        assert_eq!(merged.vertices[0].normal, [0.0, 1.0, 0.0]);
        assert_eq!(merged.vertices[1].normal, [0.0; 3]);
        assert!(merged.vertices.iter().all(|v| v.uv == [0.0, 0.0]));
    }

    #[test]
    fn test_merge_drops_out_of_range_faces() {
        let sub = quad_sub_mesh("a", 3, vec![0, 1, 2, 0, 1, 9, 1, 2]);
        let merged = merge_sub_meshes(&[sub]);
        assert_eq!(merged.indices, vec![0, 1, 2]);
    }

    #[test]
    fn test_buffer_limit() {
        let data = merge_sub_meshes(&[quad_sub_mesh("a", 3, vec![0, 1, 2])]);
        // 3 vertices of 32 bytes, 3 indices of 4 bytes
        assert_eq!(data.buffer_sizes(), (96, 12));

        let path = Path::new("big.obj");
        assert!(check_buffer_limit(path, data.clone(), 96).is_ok());
        let err = check_buffer_limit(path, data, 95).unwrap_err();
        assert!(matches!(err, ImportError::TooLarge { bytes: 96, max: 95, .. }));
    }

    #[test]
    fn test_load_rejects_empty_result() {
        let err = load(Path::new("nothing.obj"), &FixedImporter(Vec::new())).unwrap_err();
        assert!(matches!(err, ImportError::Empty(_)));
    }

    #[test]
    fn test_generate_normals_for_flat_triangle() {
        let positions = [Vec3::ZERO, Vec3::X, Vec3::Y, Vec3::new(5.0, 5.0, 5.0)];
        let normals = generate_normals(&positions, &[0, 1, 2]);
        for n in &normals[..3] {
            assert!(n.abs_diff_eq(Vec3::Z, 1e-6));
        }
        assert_eq!(normals[3], Vec3::ZERO);
    }

    #[test]
    fn test_obj_importer_rejects_other_formats() {
        let err = ObjImporter.import(Path::new("monkey.fbx"), ImportFlags::default()).unwrap_err();
        assert!(matches!(err, ImportError::Unsupported(_)));
    }

    #[test]
    fn test_obj_importer_missing_file() {
        let err = ObjImporter
            .import(Path::new("/definitely/not/here.obj"), ImportFlags::default())
            .unwrap_err();
        assert!(matches!(err, ImportError::Io { .. }));
    }

    #[test]
    fn test_obj_importer_generates_normals_and_flips_uvs() {
        let path = temp_obj(
            "tri",
            "v 0 0 0\nv 1 0 0\nv 0 1 0\nvt 0 0\nvt 1 0\nvt 0 0.25\nf 1/1 2/2 3/3\n",
        );
        let subs = ObjImporter.import(&path, ImportFlags::default()).unwrap();
        let _ = std::fs::remove_file(&path);

        assert_eq!(subs.len(), 1);
        let sub = &subs[0];
        assert_eq!(sub.positions.len(), 3);
        assert_eq!(sub.indices.len(), 3);

        let normals = sub.normals.as_ref().unwrap();
        assert!(normals.iter().all(|n| n.abs_diff_eq(Vec3::Z, 1e-6)));

        let uvs = sub.uvs.as_ref().unwrap();
        let flipped: Vec<f32> = uvs.iter().map(|uv| uv.y).collect();
        assert!(flipped.contains(&1.0));
        assert!(flipped.contains(&0.75));
    }

    #[test]
    fn test_obj_importer_triangulates_quads() {
        let path = temp_obj("quad", "v 0 0 0\nv 1 0 0\nv 1 1 0\nv 0 1 0\nf 1 2 3 4\n");
        let data = load(&path, &ObjImporter).unwrap();
        let _ = std::fs::remove_file(&path);

        assert_eq!(data.vertices.len(), 4);
        assert_eq!(data.triangle_count(), 2);
        assert!(data.indices_in_bounds());
    }
}
