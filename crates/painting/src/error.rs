use thiserror::Error;

use crate::asset::AssetError;

/// Reasons a selected object cannot be painted
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BindError {
    #[error("Target has no mesh")]
    MissingMesh,
    #[error("Target has no material with a splat map property")]
    MissingSplatMaterial,
    #[error("Splat map property has no texture assigned")]
    MissingSplatTexture,
    #[error("Splat map texture is empty ({width}x{height})")]
    EmptyTexture { width: u32, height: u32 },
}

#[derive(Debug, Error)]
pub enum PaintError {
    #[error("Selected object not suitable for splat map painting: {0}")]
    NotSuitable(#[from] BindError),
    #[error(transparent)]
    Asset(#[from] AssetError),
    #[error("Texture size mismatch: expected {expected:?}, got {actual:?}")]
    SizeMismatch {
        expected: (u32, u32),
        actual: (u32, u32),
    },
    #[error("No painting session is active")]
    NoSession,
    #[cfg(feature = "gpu")]
    #[error(transparent)]
    Gpu(#[from] crate::gpu::GpuError),
}
