use std::path::Path;

use glam::Mat4;
use wgpu::util::DeviceExt;

use crate::errors::TextureError;
use crate::utils::MeshData;
use crate::view::shader::{ShaderProgram, UniformBlock, UniformSetter};

pub struct GpuTexture {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub sampler: wgpu::Sampler,
}

impl GpuTexture {
    /// 1x1 opaque white, used when a renderable has no texture.
    pub fn white(device: &wgpu::Device, queue: &wgpu::Queue) -> Self {
        Self::from_rgba(device, queue, "white_texture", 1, 1, &[255, 255, 255, 255])
    }

    pub fn from_path(device: &wgpu::Device, queue: &wgpu::Queue, path: &Path) -> Result<Self, TextureError> {
        let img = image::open(path)
            .map_err(|source| TextureError::Decode { path: path.to_path_buf(), source })?
            .to_rgba8();
        let (width, height) = img.dimensions();
        let max = device.limits().max_texture_dimension_2d;
        if !texture_fits(width, height, max) {
            return Err(TextureError::TooLarge { path: path.to_path_buf(), width, height, max });
        }
        let label = path.file_name().and_then(|n| n.to_str()).unwrap_or("texture");
        Ok(Self::from_rgba(device, queue, label, width, height, img.as_raw()))
    }

    /// Falls back to white (with an error log) when the file cannot be decoded.
    pub fn from_path_or_white(device: &wgpu::Device, queue: &wgpu::Queue, path: Option<&Path>) -> Self {
        match path.map(|p| Self::from_path(device, queue, p)) {
            Some(Ok(texture)) => texture,
            Some(Err(e)) => {
                tracing::error!("{e}; using white texture");
                Self::white(device, queue)
            }
            None => Self::white(device, queue),
        }
    }

    fn from_rgba(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        label: &str,
        width: u32,
        height: u32,
        rgba: &[u8],
    ) -> Self {
        let size = wgpu::Extent3d { width, height, depth_or_array_layers: 1 };
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8UnormSrgb,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            rgba,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(4 * width),
                rows_per_image: Some(height),
            },
            size,
        );

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some(label),
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::Repeat,
            address_mode_w: wgpu::AddressMode::Repeat,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        Self { texture, view, sampler }
    }
}

/// Both sides non-zero and within the device's 2D texture limit.
pub fn texture_fits(width: u32, height: u32, max_dimension: u32) -> bool {
    width > 0 && height > 0 && width <= max_dimension && height <= max_dimension
}

/// GPU copy of one [`MeshData`] plus the per-object uniforms and texture it
/// draws with. Uploaded exactly once, in [`MeshResource::upload`]; buffers are
/// released when the resource is dropped.
pub struct MeshResource {
    data: MeshData,
    vertex_buffer: Option<wgpu::Buffer>,
    index_buffer: Option<wgpu::Buffer>,
    uniforms: UniformBlock,
    uniform_buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    texture: GpuTexture,
}

impl MeshResource {
    pub fn upload(
        device: &wgpu::Device,
        program: &ShaderProgram,
        label: &str,
        data: MeshData,
        texture: GpuTexture,
    ) -> Self {
        debug_assert!(data.indices_in_bounds());

        // empty geometry (failed import) keeps no vertex/index buffers and draws nothing
        let vertex_buffer = (!data.vertices.is_empty()).then(|| {
            device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(format!("{label}_vertices").as_str()),
                contents: bytemuck::cast_slice(&data.vertices),
                usage: wgpu::BufferUsages::VERTEX,
            })
        });
        let index_buffer = (!data.indices.is_empty()).then(|| {
            device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(format!("{label}_indices").as_str()),
                contents: bytemuck::cast_slice(&data.indices),
                usage: wgpu::BufferUsages::INDEX,
            })
        });

        let bindings = program.create_object_bindings(
            device,
            &format!("{label}_object"),
            &texture.view,
            &texture.sampler,
        );

        tracing::debug!(
            "uploaded '{}': {} vertices, {} indices",
            label,
            data.vertices.len(),
            data.indices.len()
        );

        Self {
            data,
            vertex_buffer,
            index_buffer,
            uniforms: bindings.block,
            uniform_buffer: bindings.buffer,
            bind_group: bindings.bind_group,
            texture,
        }
    }

    pub fn data(&self) -> &MeshData {
        &self.data
    }

    /// Upload `model`, bind this mesh's uniforms, texture and buffers, and
    /// issue its draw call. Expects the program to be bound on `pass` already.
    pub fn draw(&mut self, queue: &wgpu::Queue, pass: &mut wgpu::RenderPass<'_>, model: Mat4) {
        let Some(vertex_buffer) = &self.vertex_buffer else {
            return;
        };

        self.uniforms.set_mat4("model", model);
        queue.write_buffer(&self.uniform_buffer, 0, self.uniforms.bytes());

        pass.set_bind_group(1, &self.bind_group, &[]);
        pass.set_vertex_buffer(0, vertex_buffer.slice(..));

        match &self.index_buffer {
            Some(index_buffer) => {
                pass.set_index_buffer(index_buffer.slice(..), wgpu::IndexFormat::Uint32);
                pass.draw_indexed(0..self.data.indices.len() as u32, 0, 0..1);
            }
            None => pass.draw(0..self.data.vertices.len() as u32, 0..1),
        }
    }
}

impl Drop for MeshResource {
    fn drop(&mut self) {
        if let Some(buffer) = self.index_buffer.take() {
            buffer.destroy();
        }
        if let Some(buffer) = self.vertex_buffer.take() {
            buffer.destroy();
        }
        self.uniform_buffer.destroy();
        self.texture.texture.destroy();
        tracing::trace!("released mesh resource ({} vertices)", self.data.vertices.len());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_texture_fits_device_limit() {
        assert!(texture_fits(1, 1, 2048));
        assert!(texture_fits(2048, 2048, 2048));
        assert!(!texture_fits(2049, 16, 2048));
        assert!(!texture_fits(16, 8192, 2048));
        assert!(!texture_fits(0, 16, 2048));
    }
}
