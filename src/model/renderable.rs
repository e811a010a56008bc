use std::path::{Path, PathBuf};

use glam::Mat4;

use crate::model::mesh::{self, MeshImporter};
use crate::model::transform::Transform;
use crate::utils::MeshData;
use crate::view::mesh_resource::{GpuTexture, MeshResource};
use crate::view::shader::ShaderProgram;

/// Where a renderable's geometry came from.
#[derive(Debug, Clone, PartialEq)]
pub enum RenderableKind {
    /// Loaded from a mesh file. Import failures leave the geometry empty.
    Imported { path: PathBuf },
    /// Procedural axis-aligned cube with the given edge length.
    Cube { size: f32 },
}

/// Transform + uploaded geometry. Dropping it releases the GPU buffers.
pub struct Renderable {
    pub kind: RenderableKind,
    pub transform: Transform,
    /// Rotated by the object-control keys
    pub controllable: bool,
    mesh: MeshResource,
}

/// GPU handles needed to create renderables.
pub struct UploadContext<'a> {
    pub device: &'a wgpu::Device,
    pub queue: &'a wgpu::Queue,
    pub program: &'a ShaderProgram,
}

impl Renderable {
    /// Import `path`, upload it, then apply `transform`.
    pub fn from_path(
        ctx: &UploadContext,
        importer: &dyn MeshImporter,
        path: &Path,
        texture: Option<&Path>,
        transform: Transform,
    ) -> Self {
        let max_buffer_size = ctx.device.limits().max_buffer_size;
        let data = match mesh::load(path, importer).and_then(|d| mesh::check_buffer_limit(path, d, max_buffer_size)) {
            Ok(data) => data,
            Err(e) => {
                tracing::error!("{e}; renderable will draw nothing");
                MeshData::empty()
            }
        };
        let label = path.file_stem().and_then(|s| s.to_str()).unwrap_or("mesh");
        let texture = GpuTexture::from_path_or_white(ctx.device, ctx.queue, texture);
        let mesh = MeshResource::upload(ctx.device, ctx.program, label, data, texture);

        Self {
            kind: RenderableKind::Imported { path: path.to_path_buf() },
            transform,
            controllable: false,
            mesh,
        }
    }

    pub fn cube(ctx: &UploadContext, size: f32, texture: Option<&Path>, transform: Transform) -> Self {
        let texture = GpuTexture::from_path_or_white(ctx.device, ctx.queue, texture);
        let mesh = MeshResource::upload(ctx.device, ctx.program, "cube", MeshData::cube(size), texture);

        Self {
            kind: RenderableKind::Cube { size },
            transform,
            controllable: false,
            mesh,
        }
    }

    pub fn controllable(mut self, controllable: bool) -> Self {
        self.controllable = controllable;
        self
    }

    pub fn model_matrix(&self) -> Mat4 {
        self.transform.model_matrix()
    }

    pub fn mesh_data(&self) -> &MeshData {
        self.mesh.data()
    }

    pub fn name(&self) -> String {
        match &self.kind {
            RenderableKind::Imported { path } => path.display().to_string(),
            RenderableKind::Cube { size } => format!("cube ({size})"),
        }
    }

    /// Upload the model matrix and draw with the program currently bound on `pass`.
    pub fn draw(&mut self, queue: &wgpu::Queue, pass: &mut wgpu::RenderPass<'_>) {
        let model = self.model_matrix();
        self.mesh.draw(queue, pass, model);
    }
}
