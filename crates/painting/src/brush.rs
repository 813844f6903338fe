//! Brush state and the brush kernel
//!
//! The kernel is what a compositing backend evaluates for every covered
//! texel of a dab: a radial falloff shaped by `hardness`, scaled by the
//! strength of the active channel, blending the existing weights toward
//! the channel's one-hot vector.

use glam::Vec2;
use splat_painter_config::BrushSettings;

use crate::channel::Channel;

/// Live brush parameters
///
/// Mutated by pointer input and host sliders; read by the compositor and
/// the preview renderer.
#[derive(Debug, Clone, PartialEq)]
pub struct BrushState {
    /// Last UV position the pointer hit on the target surface
    pub cursor_uv: Vec2,
    /// Brush radius in texels
    pub size: u32,
    /// Edge hardness 0.0-1.0
    pub hardness: f32,
    /// Minimum distance between accepted dabs, in texels
    pub spacing: u32,
    /// UV position of the last accepted dab (None until a stroke paints)
    pub last_paint_uv: Option<Vec2>,
}

impl Default for BrushState {
    fn default() -> Self {
        Self::from_settings(&BrushSettings::default())
    }
}

impl BrushState {
    /// Create brush state from configured settings
    pub fn from_settings(settings: &BrushSettings) -> Self {
        Self {
            cursor_uv: Vec2::ZERO,
            size: settings.size,
            hardness: settings.hardness,
            spacing: settings.spacing,
            last_paint_uv: None,
        }
    }

    /// Current slider values
    pub fn settings(&self) -> BrushSettings {
        BrushSettings {
            spacing: self.spacing,
            size: self.size,
            hardness: self.hardness,
        }
    }

    /// Apply slider values, clamped to the ranges valid for a texture
    pub fn apply_settings(&mut self, settings: &BrushSettings, largest_dimension: u32) {
        let clamped = settings.clamped(largest_dimension);
        self.size = clamped.size;
        self.hardness = clamped.hardness;
        self.spacing = clamped.spacing;
    }
}

/// Parameters handed to the brush kernel for one dab
///
/// Laid out for direct upload as a uniform buffer.
#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
#[repr(C)]
pub struct BrushKernelParams {
    /// Dab centre in UV space
    pub cursor_uv: [f32; 2],
    /// Dab radius in UV units of the largest dimension
    pub uv_radius: f32,
    /// Edge hardness 0.0-1.0
    pub hardness: f32,
    /// Target channel weight vector
    pub weights: [f32; 4],
    /// Texture width and height in texels
    pub texture_size: [f32; 2],
    /// Padding to a 16-byte multiple
    pub _padding: [f32; 2],
}

impl BrushKernelParams {
    /// Build kernel parameters for a dab
    ///
    /// `radius` is in texels and is converted to UV units by dividing by
    /// the texture's largest dimension, which keeps the footprint round on
    /// non-square textures.
    pub fn new(
        uv: Vec2,
        radius: f32,
        hardness: f32,
        channel: Channel,
        width: u32,
        height: u32,
    ) -> Self {
        let largest = width.max(height).max(1) as f32;
        Self {
            cursor_uv: uv.to_array(),
            uv_radius: radius / largest,
            hardness: hardness.clamp(0.0, 1.0),
            weights: channel.weights(),
            texture_size: [width as f32, height as f32],
            _padding: [0.0, 0.0],
        }
    }

    /// Sum of the target weights: 1 for a one-hot channel, 0 for None
    #[inline]
    pub fn strength(&self) -> f32 {
        self.weights.iter().sum::<f32>().clamp(0.0, 1.0)
    }

    /// Distance from the dab centre, normalized so the brush edge is 1.0
    pub fn normalized_distance(&self, texel_uv: Vec2) -> f32 {
        if self.uv_radius <= 0.0 {
            return f32::INFINITY;
        }
        let [width, height] = self.texture_size;
        let largest = width.max(height).max(1.0);
        let aspect = Vec2::new(width, height) / largest;
        let offset = (texel_uv - Vec2::from_array(self.cursor_uv)) * aspect;
        offset.length() / self.uv_radius
    }

    /// How far a texel moves toward the target weights (0.0-1.0)
    #[inline]
    pub fn blend_amount(&self, texel_uv: Vec2) -> f32 {
        brush_falloff(self.normalized_distance(texel_uv), self.hardness) * self.strength()
    }

    /// Evaluate the kernel for one texel
    #[inline]
    pub fn apply(&self, existing: [f32; 4], texel_uv: Vec2) -> [f32; 4] {
        let amount = self.blend_amount(texel_uv);
        blend_weights(existing, self.weights, amount)
    }
}

/// Blend existing weights toward a target
///
/// Written as `a * (1 - t) + b * t` so t = 0 and t = 1 are exact.
#[inline]
pub fn blend_weights(existing: [f32; 4], target: [f32; 4], amount: f32) -> [f32; 4] {
    if amount <= 0.0 {
        return existing;
    }
    let keep = 1.0 - amount;
    [
        existing[0] * keep + target[0] * amount,
        existing[1] * keep + target[1] * amount,
        existing[2] * keep + target[2] * amount,
        existing[3] * keep + target[3] * amount,
    ]
}

/// Hermite smoothstep between two edges
#[inline]
pub fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

/// Calculate falloff based on hardness
/// distance_normalized is 0 at center, 1 at edge
/// hardness is 0.0 (soft) to 1.0 (hard)
///
/// Full strength up to `hardness`, then a smoothstep down to zero at the
/// edge. Hardness 1.0 is a step: everything strictly inside the radius.
#[inline]
pub fn brush_falloff(distance_normalized: f32, hardness: f32) -> f32 {
    if distance_normalized.is_nan() || distance_normalized >= 1.0 {
        return 0.0;
    }
    if hardness >= 1.0 {
        return 1.0;
    }
    1.0 - smoothstep(hardness.max(0.0), 1.0, distance_normalized)
}
