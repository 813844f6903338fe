use glam::{Vec2, Vec3};

use crate::constants::CURSOR_GIZMO_RADIUS;

/// Result of a ray intersection with a mesh surface
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeshHit {
    /// Hit position in world space
    pub world_pos: Vec3,
    /// Distance along the ray in world units
    pub distance: f32,
    /// Index of the triangle that was hit
    pub face_id: u32,
    /// Barycentric coordinates within the triangle (w, u, v)
    pub barycentric: Vec3,
    /// Interpolated surface normal in world space
    pub normal: Vec3,
    /// Interpolated UV coordinates (None if the mesh has no UVs)
    pub uv: Option<Vec2>,
}

/// A paintable point on the target surface
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceHit {
    /// Texture coordinate at the hit (zero when the mesh has no UVs)
    pub uv: Vec2,
    pub world_pos: Vec3,
    pub normal: Vec3,
}

impl From<MeshHit> for SurfaceHit {
    fn from(hit: MeshHit) -> Self {
        Self {
            uv: hit.uv.unwrap_or(Vec2::ZERO),
            world_pos: hit.world_pos,
            normal: hit.normal,
        }
    }
}

/// World-space cursor circle drawn at the hit point
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CursorGizmo {
    pub center: Vec3,
    pub normal: Vec3,
    pub radius: f32,
}

impl CursorGizmo {
    pub fn at(hit: &SurfaceHit) -> Self {
        Self {
            center: hit.world_pos,
            normal: hit.normal,
            radius: CURSOR_GIZMO_RADIUS,
        }
    }
}
