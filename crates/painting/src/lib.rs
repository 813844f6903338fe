//! Splat map painting engine
//!
//! This crate paints per-channel blend weights onto a mesh's splat map:
//! - [`mapper`] - screen position to UV and world hit via ray casting
//! - [`compositor`] - double-buffered dab compositing through a [`backend`]
//! - [`stroke`] - stroke state machine with spacing-gated dabs
//! - [`undo`] - one full-texture snapshot per stroke
//! - [`preview`] - non-destructive brush footprint feedback
//! - [`session`] - binding a target and its working texture
//! - [`tool`] - host-facing commands around at most one session

pub mod asset;
pub mod backend;
pub mod brush;
pub mod channel;
pub mod compositor;
pub mod constants;
pub mod error;
#[cfg(feature = "gpu")]
pub mod gpu;
pub mod mapper;
pub mod preview;
pub mod raycast;
pub mod session;
pub mod stroke;
pub mod surface;
pub mod target;
pub mod tool;
pub mod types;
pub mod undo;

pub use asset::{AssetError, AssetId, AssetStore, FileAssetStore};
pub use backend::{CompositeBackend, CpuBackend};
pub use brush::*;
pub use channel::Channel;
pub use compositor::PaintCompositor;
pub use constants::*;
pub use error::{BindError, PaintError};
#[cfg(feature = "gpu")]
pub use gpu::{GpuError, WgpuBackend};
pub use mapper::{Camera, CollisionProxy, Ray, SurfaceMapper};
pub use preview::{BrushPreviewRenderer, PreviewFrame, PreviewParams, PreviewSink};
pub use raycast::{MeshCollider, SurfaceMesh};
pub use session::{Session, validate_target};
pub use stroke::{ButtonEdge, PointerInput, StrokeController, StrokeEvent, StrokeState, TickOutcome};
pub use surface::CpuTexture;
pub use target::{PaintTarget, SceneObject, SplatBinding, SplatMaterial};
pub use tool::{HostDialogs, SplatPainter, ToolStatus};
pub use types::*;
pub use undo::{StrokeSnapshot, UndoManager};
