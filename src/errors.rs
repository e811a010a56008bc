use std::path::PathBuf;

use thiserror::Error;

/// Mesh import failures. Never fatal: the renderable falls back to empty geometry.
#[derive(Error, Debug)]
pub enum ImportError {
    #[error("failed to read mesh '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse mesh '{path}': {source}")]
    Obj {
        path: PathBuf,
        #[source]
        source: tobj::LoadError,
    },

    #[error("unsupported mesh format '{0}' (expected .obj)")]
    Unsupported(PathBuf),

    #[error("mesh '{0}' contains no geometry")]
    Empty(PathBuf),

    #[error("mesh '{path}' needs a {bytes} byte buffer, device limit is {max}")]
    TooLarge { path: PathBuf, bytes: u64, max: u64 },
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LightError {
    #[error("directional light capacity of {capacity} exceeded")]
    CapacityExceeded { capacity: usize },
}

#[derive(Error, Debug)]
pub enum TextureError {
    #[error("failed to load texture '{path}': {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("texture '{path}' is {width}x{height}, device limit is {max}")]
    TooLarge {
        path: PathBuf,
        width: u32,
        height: u32,
        max: u32,
    },
}

/// Windowing and graphics bring-up failures. These abort startup.
#[derive(Error, Debug)]
pub enum ContextInitError {
    #[error("event loop error: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),

    #[error("failed to create window: {0}")]
    Window(#[from] winit::error::OsError),

    #[error("failed to create surface: {0}")]
    Surface(#[from] wgpu::CreateSurfaceError),

    #[error("no suitable GPU adapter: {0}")]
    Adapter(#[from] wgpu::RequestAdapterError),

    #[error("failed to create GPU device: {0}")]
    Device(#[from] wgpu::RequestDeviceError),

    #[error("surface reports no supported formats")]
    NoSurfaceFormat,
}
