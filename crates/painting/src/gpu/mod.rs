//! wgpu compositing backend
//!
//! Splat textures live on the GPU as Rgba32Float storage textures. The
//! brush kernel is a compute pass that reads the source with `textureLoad`
//! and stores every texel of the destination.

mod backend;

pub use backend::{GpuTexture, WgpuBackend};

/// Errors from GPU setup and readback
#[derive(Debug, thiserror::Error)]
pub enum GpuError {
    #[error("No suitable GPU adapter: {0}")]
    Adapter(#[from] wgpu::RequestAdapterError),

    #[error("Failed to create GPU device: {0}")]
    Device(#[from] wgpu::RequestDeviceError),

    #[error("Adapter {adapter} cannot run the brush kernel: {reason}")]
    UnsupportedAdapter { adapter: String, reason: String },

    #[error("GPU validation failed: {0}")]
    Validation(String),

    #[error("Texture size {width}x{height} outside device limits (max {max})")]
    TextureSize { width: u32, height: u32, max: u32 },

    #[error("Failed to map readback buffer: {0}")]
    BufferMap(#[from] wgpu::BufferAsyncError),

    #[error("Device poll failed: {0}")]
    Poll(#[from] wgpu::PollError),

    #[error("Readback callback dropped before completion")]
    ReadbackLost,
}
