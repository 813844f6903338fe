//! Surface mapping: screen position -> view ray -> UV and world hit

use glam::{Mat4, Vec2, Vec3};
use tracing::debug;

use crate::types::{CursorGizmo, MeshHit, SurfaceHit};

/// A world-space ray
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    /// Unit direction
    pub direction: Vec3,
}

impl Ray {
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self {
            origin,
            direction: direction.normalize_or_zero(),
        }
    }

    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }
}

/// Ray intersection against a bound collision proxy
pub trait CollisionProxy {
    /// Closest hit along a world-space ray
    fn raycast(&self, ray: &Ray) -> Option<MeshHit>;
}

/// View used to turn pointer positions into rays
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    inverse_view_projection: Mat4,
    /// Viewport size in pixels
    viewport: Vec2,
}

impl Camera {
    /// Camera from a combined view-projection matrix (depth range 0..1)
    pub fn from_view_projection(view_projection: Mat4, viewport: Vec2) -> Self {
        Self {
            inverse_view_projection: view_projection.inverse(),
            viewport,
        }
    }

    /// Perspective camera looking from `eye` at `target`
    pub fn look_at(eye: Vec3, target: Vec3, fov_y_radians: f32, viewport: Vec2) -> Self {
        let aspect = if viewport.y > 0.0 {
            viewport.x / viewport.y
        } else {
            1.0
        };
        let view = Mat4::look_at_rh(eye, target, Vec3::Y);
        let projection = Mat4::perspective_rh(fov_y_radians, aspect, 0.01, 1000.0);
        Self::from_view_projection(projection * view, viewport)
    }

    pub fn viewport(&self) -> Vec2 {
        self.viewport
    }

    /// Ray through a screen position (pixels, origin top-left)
    ///
    /// Returns None for an empty viewport.
    pub fn screen_to_ray(&self, screen: Vec2) -> Option<Ray> {
        if self.viewport.x <= 0.0 || self.viewport.y <= 0.0 {
            return None;
        }
        let ndc = Vec2::new(
            screen.x / self.viewport.x * 2.0 - 1.0,
            1.0 - screen.y / self.viewport.y * 2.0,
        );
        let near = self
            .inverse_view_projection
            .project_point3(Vec3::new(ndc.x, ndc.y, 0.0));
        let far = self
            .inverse_view_projection
            .project_point3(Vec3::new(ndc.x, ndc.y, 1.0));
        let direction = far - near;
        if !direction.is_finite() || direction.length_squared() == 0.0 {
            return None;
        }
        Some(Ray::new(near, direction))
    }
}

/// Maps pointer positions onto the target surface
///
/// Remembers the most recent hit for the cursor gizmo and preview.
#[derive(Debug, Default)]
pub struct SurfaceMapper {
    last_hit: Option<SurfaceHit>,
}

impl SurfaceMapper {
    pub fn new() -> Self {
        Self::default()
    }

    /// Map a screen position to a surface hit
    ///
    /// A miss (or no proxy) clears the last hit and returns None. A hit on a
    /// mesh without UVs maps to UV (0, 0).
    pub fn map(
        &mut self,
        camera: &Camera,
        screen: Vec2,
        proxy: Option<&dyn CollisionProxy>,
    ) -> Option<SurfaceHit> {
        let hit = proxy.and_then(|proxy| {
            let ray = camera.screen_to_ray(screen)?;
            proxy.raycast(&ray)
        });

        self.last_hit = hit.map(|hit| {
            if hit.uv.is_none() {
                debug!("SurfaceMapper: hit face {} has no UVs, using (0, 0)", hit.face_id);
            }
            SurfaceHit::from(hit)
        });
        self.last_hit
    }

    pub fn last_hit(&self) -> Option<&SurfaceHit> {
        self.last_hit.as_ref()
    }

    /// Cursor circle at the last hit
    pub fn cursor_gizmo(&self) -> Option<CursorGizmo> {
        self.last_hit.as_ref().map(CursorGizmo::at)
    }

    pub fn clear(&mut self) {
        self.last_hit = None;
    }
}
