/// Radius passed by "fill all": large enough to cover any texture in one dab.
pub const FILL_ALL_RADIUS: f32 = f32::MAX;

/// Radius of the world-space cursor circle drawn at the hit point.
pub const CURSOR_GIZMO_RADIUS: f32 = 1.0;

/// Number of material layers a four-channel splat map can encode.
pub const LAYER_COUNT: usize = 5;

/// Texel size in bytes of the working texture (Rgba32Float).
pub const TEXEL_SIZE: usize = 16;
