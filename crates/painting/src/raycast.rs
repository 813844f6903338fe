//! Ray-mesh intersection for surface painting.
//!
//! This module provides ray-triangle intersection using the Moller-Trumbore algorithm,
//! with support for interpolating vertex attributes (UVs, normals) at hit points.

use glam::{Affine3A, Vec2, Vec3};

use crate::mapper::{CollisionProxy, Ray};
use crate::types::MeshHit;

/// Epsilon for floating point comparisons in ray intersection
const EPSILON: f32 = 1e-6;

/// Result of a ray-triangle intersection test
#[derive(Debug, Clone, Copy)]
pub struct TriangleHit {
    /// Distance along the ray to the intersection point
    pub t: f32,
    /// Barycentric coordinate u (weight for vertex 1)
    pub u: f32,
    /// Barycentric coordinate v (weight for vertex 2)
    pub v: f32,
}

/// Moller-Trumbore ray-triangle intersection algorithm.
///
/// Returns the hit parameter and barycentric coordinates if the ray
/// intersects the triangle. Both faces are hit.
pub fn ray_triangle_intersection(
    ray_origin: Vec3,
    ray_dir: Vec3,
    v0: Vec3,
    v1: Vec3,
    v2: Vec3,
) -> Option<TriangleHit> {
    let edge1 = v1 - v0;
    let edge2 = v2 - v0;

    let pvec = ray_dir.cross(edge2);
    let det = edge1.dot(pvec);

    // Ray parallel to the triangle plane
    if det.abs() < EPSILON {
        return None;
    }

    let inv_det = 1.0 / det;
    let tvec = ray_origin - v0;

    let u = tvec.dot(pvec) * inv_det;
    if !(0.0..=1.0).contains(&u) {
        return None;
    }

    let qvec = tvec.cross(edge1);
    let v = ray_dir.dot(qvec) * inv_det;
    if v < 0.0 || u + v > 1.0 {
        return None;
    }

    let t = edge2.dot(qvec) * inv_det;

    // Only accept hits in front of the ray
    if t < EPSILON {
        return None;
    }

    Some(TriangleHit { t, u, v })
}

/// Interpolate a Vec3 attribute using barycentric coordinates.
pub fn interpolate_vec3(v0: Vec3, v1: Vec3, v2: Vec3, u: f32, v: f32) -> Vec3 {
    let w = 1.0 - u - v;
    v0 * w + v1 * u + v2 * v
}

/// Interpolate a Vec2 attribute (like UVs) using barycentric coordinates.
pub fn interpolate_vec2(v0: Vec2, v1: Vec2, v2: Vec2, u: f32, v: f32) -> Vec2 {
    let w = 1.0 - u - v;
    v0 * w + v1 * u + v2 * v
}

/// Triangle mesh geometry of a paint target, in object space.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SurfaceMesh {
    /// Vertex positions
    pub positions: Vec<Vec3>,
    /// Triangle indices (3 per triangle)
    pub indices: Vec<u32>,
    /// Vertex normals (same length as positions, or empty)
    pub normals: Vec<Vec3>,
    /// Vertex UVs (same length as positions, or empty if the mesh has none)
    pub uvs: Vec<Vec2>,
}

impl SurfaceMesh {
    /// Unit quad in the XY plane facing +Z, UVs spanning [0,1]
    pub fn quad(half_extent: f32) -> Self {
        let e = half_extent;
        Self {
            positions: vec![
                Vec3::new(-e, -e, 0.0),
                Vec3::new(e, -e, 0.0),
                Vec3::new(e, e, 0.0),
                Vec3::new(-e, e, 0.0),
            ],
            indices: vec![0, 1, 2, 0, 2, 3],
            normals: vec![Vec3::Z; 4],
            uvs: vec![
                Vec2::new(0.0, 0.0),
                Vec2::new(1.0, 0.0),
                Vec2::new(1.0, 1.0),
                Vec2::new(0.0, 1.0),
            ],
        }
    }

    /// Get the number of triangles in the mesh
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Whether the mesh carries texture coordinates
    pub fn has_uvs(&self) -> bool {
        !self.uvs.is_empty()
    }

    /// Get the vertex indices for a triangle
    pub fn triangle_indices(&self, tri_index: usize) -> Option<[usize; 3]> {
        let base = tri_index * 3;
        let tri = self.indices.get(base..base + 3)?;
        Some([tri[0] as usize, tri[1] as usize, tri[2] as usize])
    }

    /// Get the vertex positions for a triangle
    ///
    /// Returns None for triangles that index past the vertex list.
    pub fn triangle_positions(&self, tri_index: usize) -> Option<(Vec3, Vec3, Vec3)> {
        let [i0, i1, i2] = self.triangle_indices(tri_index)?;
        Some((
            *self.positions.get(i0)?,
            *self.positions.get(i1)?,
            *self.positions.get(i2)?,
        ))
    }

    fn vertex_uvs(&self, [i0, i1, i2]: [usize; 3]) -> Option<(Vec2, Vec2, Vec2)> {
        Some((*self.uvs.get(i0)?, *self.uvs.get(i1)?, *self.uvs.get(i2)?))
    }

    fn vertex_normals(&self, [i0, i1, i2]: [usize; 3]) -> Option<(Vec3, Vec3, Vec3)> {
        Some((
            *self.normals.get(i0)?,
            *self.normals.get(i1)?,
            *self.normals.get(i2)?,
        ))
    }
}

/// Cast a ray against mesh data and return the closest hit.
///
/// The ray is in mesh space; hit positions and normals are too.
/// `ray_dir` need not be normalized: `distance` is the hit parameter times
/// its length.
pub fn raycast_mesh(ray_origin: Vec3, ray_dir: Vec3, mesh: &SurfaceMesh) -> Option<MeshHit> {
    let mut closest_hit: Option<(TriangleHit, usize)> = None;

    // Test all triangles (brute force)
    for tri_idx in 0..mesh.triangle_count() {
        let Some((v0, v1, v2)) = mesh.triangle_positions(tri_idx) else {
            continue;
        };

        if let Some(hit) = ray_triangle_intersection(ray_origin, ray_dir, v0, v1, v2) {
            let dominated = match &closest_hit {
                Some((prev, _)) => hit.t >= prev.t,
                None => false,
            };
            if !dominated {
                closest_hit = Some((hit, tri_idx));
            }
        }
    }

    let (hit, face_id) = closest_hit?;
    let indices = mesh.triangle_indices(face_id)?;
    let (v0, v1, v2) = mesh.triangle_positions(face_id)?;

    let world_pos = ray_origin + ray_dir * hit.t;
    let barycentric = Vec3::new(1.0 - hit.u - hit.v, hit.u, hit.v);

    // Interpolated normal, or the face normal for meshes without normals
    let normal = match mesh.vertex_normals(indices) {
        Some((n0, n1, n2)) => interpolate_vec3(n0, n1, n2, hit.u, hit.v).normalize_or_zero(),
        None => (v1 - v0).cross(v2 - v0).normalize_or_zero(),
    };

    let uv = mesh
        .vertex_uvs(indices)
        .map(|(uv0, uv1, uv2)| interpolate_vec2(uv0, uv1, uv2, hit.u, hit.v));

    Some(MeshHit {
        world_pos,
        distance: hit.t * ray_dir.length(),
        face_id: face_id as u32,
        barycentric,
        normal,
        uv,
    })
}

/// Collision proxy built from a target's mesh and world transform.
///
/// Created by a session when the target has no collider of its own.
#[derive(Debug, Clone)]
pub struct MeshCollider {
    mesh: SurfaceMesh,
    transform: Affine3A,
    inverse: Affine3A,
}

impl MeshCollider {
    pub fn new(mesh: SurfaceMesh, transform: Affine3A) -> Self {
        Self {
            mesh,
            transform,
            inverse: transform.inverse(),
        }
    }

    pub fn mesh(&self) -> &SurfaceMesh {
        &self.mesh
    }

    pub fn transform(&self) -> Affine3A {
        self.transform
    }
}

impl CollisionProxy for MeshCollider {
    fn raycast(&self, ray: &Ray) -> Option<MeshHit> {
        let local_origin = self.inverse.transform_point3(ray.origin);
        let local_dir = self.inverse.transform_vector3(ray.direction);

        let local = raycast_mesh(local_origin, local_dir, &self.mesh)?;

        let world_pos = self.transform.transform_point3(local.world_pos);
        // Normals transform by the inverse transpose
        let normal = self
            .inverse
            .matrix3
            .transpose()
            .mul_vec3(local.normal)
            .normalize_or_zero();

        Some(MeshHit {
            world_pos,
            distance: ray.origin.distance(world_pos),
            normal,
            ..local
        })
    }
}
