// VIEW: GPU setup, shader programs and frame drawing
pub mod gpu_init;
pub mod shader;
pub mod mesh_resource;
pub mod render;

pub use gpu_init::GpuContext;
pub use shader::{ShaderProgram, UniformSetter};
pub use mesh_resource::{GpuTexture, MeshResource};
pub use render::{FrameOutcome, OverlayPaint};
