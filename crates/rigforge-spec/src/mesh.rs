//! Triangle mesh input for surface probing.
//!
//! The synthesizer treats collaborating character meshes as one merged
//! triangle soup: proxy-shape sizing, spring placement, and the foot-roll
//! heel probe all ray-cast against it.

use glam::{Mat4, Vec3};
use serde::{Deserialize, Serialize};

/// One triangle mesh in its own local space plus a world transform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MeshData {
    /// Mesh name, for reporting only.
    pub name: String,
    /// Vertex positions.
    pub positions: Vec<[f32; 3]>,
    /// Triangle indices into `positions`, three per triangle.
    pub indices: Vec<u32>,
    /// Column-major 4x4 world transform applied to positions.
    #[serde(default = "identity_transform")]
    pub transform: [f32; 16],
}

fn identity_transform() -> [f32; 16] {
    Mat4::IDENTITY.to_cols_array()
}

impl MeshData {
    /// Creates a mesh with an identity transform.
    pub fn new(name: impl Into<String>, positions: Vec<[f32; 3]>, indices: Vec<u32>) -> Self {
        Self {
            name: name.into(),
            positions,
            indices,
            transform: identity_transform(),
        }
    }

    /// Number of triangles.
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// World transform as a matrix.
    pub fn transform_mat(&self) -> Mat4 {
        Mat4::from_cols_array(&self.transform)
    }

    /// Yields world-space triangles, applying the mesh transform once.
    pub fn world_triangles(&self) -> Vec<[Vec3; 3]> {
        let mat = self.transform_mat();
        let verts: Vec<Vec3> = self
            .positions
            .iter()
            .map(|p| mat.transform_point3(Vec3::from_array(*p)))
            .collect();
        self.indices
            .chunks_exact(3)
            .filter_map(|tri| {
                let a = verts.get(tri[0] as usize)?;
                let b = verts.get(tri[1] as usize)?;
                let c = verts.get(tri[2] as usize)?;
                Some([*a, *b, *c])
            })
            .collect()
    }

    /// Builds an axis-aligned box shell (12 triangles) centered at `center`
    /// with the given half extents. Used as a stand-in body volume in tests
    /// and sample inputs.
    pub fn box_shell(name: impl Into<String>, center: [f32; 3], half_extents: [f32; 3]) -> Self {
        let c = Vec3::from_array(center);
        let h = Vec3::from_array(half_extents);
        let corners: Vec<[f32; 3]> = (0..8)
            .map(|i| {
                let sx = if i & 1 == 0 { -1.0 } else { 1.0 };
                let sy = if i & 2 == 0 { -1.0 } else { 1.0 };
                let sz = if i & 4 == 0 { -1.0 } else { 1.0 };
                (c + Vec3::new(sx * h.x, sy * h.y, sz * h.z)).to_array()
            })
            .collect();
        // Two triangles per face, outward winding.
        let indices: Vec<u32> = vec![
            0, 2, 1, 1, 2, 3, // -z
            4, 5, 6, 5, 7, 6, // +z
            0, 1, 4, 1, 5, 4, // -y
            2, 6, 3, 3, 6, 7, // +y
            0, 4, 2, 2, 4, 6, // -x
            1, 3, 5, 3, 7, 5, // +x
        ];
        Self::new(name, corners, indices)
    }
}

/// Merges several meshes into one world-space triangle soup.
pub fn merge_world_triangles(meshes: &[MeshData]) -> Vec<[Vec3; 3]> {
    let mut triangles = Vec::new();
    for mesh in meshes {
        triangles.extend(mesh.world_triangles());
    }
    triangles
}
