//! Surface queries against the character meshes.
//!
//! Shape sizing and heel placement need "how far is the skin from this
//! joint" answers. The probe abstracts that so tests can run against
//! synthetic hulls and the null probe exercises the fallback paths.

use glam::Vec3;

use rigforge_spec::MeshData;

const RAY_EPSILON: f32 = 1e-7;

/// A ray-surface intersection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    /// World-space hit position.
    pub position: Vec3,
    /// Distance from the ray origin.
    pub distance: f32,
}

/// Something the rig can cast rays against.
pub trait SurfaceProbe {
    /// Nearest hit along `direction` within `max_distance`, or `None`.
    /// `direction` need not be normalized.
    fn cast(&self, origin: Vec3, direction: Vec3, max_distance: f32) -> Option<RayHit>;
}

/// Probe over a triangle soup merged from the character meshes.
#[derive(Debug, Clone)]
pub struct MeshProbe {
    triangles: Vec<[Vec3; 3]>,
}

impl MeshProbe {
    pub fn new(triangles: Vec<[Vec3; 3]>) -> Self {
        Self { triangles }
    }

    /// Merges all meshes into one world-space soup.
    pub fn from_meshes(meshes: &[MeshData]) -> Self {
        Self::new(rigforge_spec::merge_world_triangles(meshes))
    }

    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }
}

impl SurfaceProbe for MeshProbe {
    fn cast(&self, origin: Vec3, direction: Vec3, max_distance: f32) -> Option<RayHit> {
        let dir = direction.normalize_or_zero();
        if dir == Vec3::ZERO {
            return None;
        }
        let mut best: Option<f32> = None;
        for tri in &self.triangles {
            if let Some(t) = intersect_triangle(origin, dir, tri) {
                if t <= max_distance && best.map_or(true, |b| t < b) {
                    best = Some(t);
                }
            }
        }
        best.map(|distance| RayHit {
            position: origin + dir * distance,
            distance,
        })
    }
}

/// Probe that never hits. Drives the fallback sizing paths.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullProbe;

impl SurfaceProbe for NullProbe {
    fn cast(&self, _origin: Vec3, _direction: Vec3, _max_distance: f32) -> Option<RayHit> {
        None
    }
}

/// Moller-Trumbore, both-sided. Returns the ray parameter `t` for hits in
/// front of the origin.
fn intersect_triangle(origin: Vec3, dir: Vec3, tri: &[Vec3; 3]) -> Option<f32> {
    let edge1 = tri[1] - tri[0];
    let edge2 = tri[2] - tri[0];
    let p = dir.cross(edge2);
    let det = edge1.dot(p);
    if det.abs() < RAY_EPSILON {
        return None;
    }
    let inv_det = 1.0 / det;
    let s = origin - tri[0];
    let u = s.dot(p) * inv_det;
    if !(0.0..=1.0).contains(&u) {
        return None;
    }
    let q = s.cross(edge1);
    let v = dir.dot(q) * inv_det;
    if v < 0.0 || u + v > 1.0 {
        return None;
    }
    let t = edge2.dot(q) * inv_det;
    (t > RAY_EPSILON).then_some(t)
}
