//! Shared configuration for the splat painter
//!
//! This crate is the single source of truth for brush defaults, slider
//! ranges, undo policy and preview sizes used by the painting engine and
//! the host binary.

use std::path::Path;

use serde::{Deserialize, Serialize};

/// Default dab spacing in texels
pub const DEFAULT_SPACING: u32 = 3;

/// Spacing slider range in texels
pub const MIN_SPACING: u32 = 1;
pub const MAX_SPACING: u32 = 10;

/// Default brush radius in texels
pub const DEFAULT_SIZE: u32 = 5;

/// Smallest brush radius in texels
pub const MIN_SIZE: u32 = 1;

/// The largest brush is this fraction of the texture's largest dimension
pub const MAX_SIZE_DIVISOR: u32 = 6;

/// Default edge hardness (0.0 = soft, 1.0 = hard)
pub const DEFAULT_HARDNESS: f32 = 0.5;

/// Edge length of the downsampled material-layer previews
pub const DEFAULT_LAYER_PREVIEW_SIZE: u32 = 256;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Channel selected for painting.
///
/// Mirrors the engine's channel model so the config stays a leaf crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ChannelSetting {
    #[default]
    R,
    G,
    B,
    A,
    None,
}

/// Brush parameters exposed as sliders by the host
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrushSettings {
    /// Minimum distance between dabs, in texels
    pub spacing: u32,
    /// Brush radius in texels
    pub size: u32,
    /// Edge hardness 0.0-1.0
    pub hardness: f32,
}

impl Default for BrushSettings {
    fn default() -> Self {
        Self {
            spacing: DEFAULT_SPACING,
            size: DEFAULT_SIZE,
            hardness: DEFAULT_HARDNESS,
        }
    }
}

impl BrushSettings {
    /// Upper bound of the size slider for a texture
    pub fn max_size_for(largest_dimension: u32) -> u32 {
        (largest_dimension / MAX_SIZE_DIVISOR).max(MIN_SIZE)
    }

    /// Clamp every field into its slider range for a texture
    pub fn clamped(&self, largest_dimension: u32) -> Self {
        let hardness = if self.hardness.is_nan() {
            DEFAULT_HARDNESS
        } else {
            self.hardness.clamp(0.0, 1.0)
        };
        Self {
            spacing: self.spacing.clamp(MIN_SPACING, MAX_SPACING),
            size: self
                .size
                .clamp(MIN_SIZE, Self::max_size_for(largest_dimension)),
            hardness,
        }
    }
}

/// Undo stack policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct UndoSettings {
    /// Maximum number of stroke snapshots kept; `None` keeps every stroke
    pub max_depth: Option<usize>,
}

/// Preview texture settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreviewSettings {
    /// Edge length of each material-layer preview
    pub layer_preview_size: u32,
    /// Draw the brush footprint on the mesh while hovering
    pub show_brush_preview: bool,
}

impl Default for PreviewSettings {
    fn default() -> Self {
        Self {
            layer_preview_size: DEFAULT_LAYER_PREVIEW_SIZE,
            show_brush_preview: true,
        }
    }
}

/// Complete painter configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PainterConfig {
    pub brush: BrushSettings,
    pub undo: UndoSettings,
    pub preview: PreviewSettings,
    pub active_channel: ChannelSetting,
}

impl PainterConfig {
    /// Parse a config from a JSON string; missing fields take defaults
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a config from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }
}
