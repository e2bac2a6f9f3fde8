use crate::turtle::Ring;
use bevy_math::bounding::Aabb3d;
use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Append-only triangle buffer produced by a generation call.
///
/// Indices are 0-based insertion indices into [`vertices`](Self::vertices)
/// and always reference vertices that were appended earlier.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MeshBuffer {
    vertices: Vec<Vec3>,
    triangles: Vec<[u32; 3]>,
}

impl MeshBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    #[inline]
    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    #[inline]
    pub fn vertices(&self) -> &[Vec3] {
        &self.vertices
    }

    #[inline]
    pub fn triangles(&self) -> &[[u32; 3]] {
        &self.triangles
    }

    /// Appends a ring and returns the index of its first vertex.
    pub fn push_ring(&mut self, ring: Ring) -> u32 {
        let base = self.vertices.len() as u32;
        self.vertices.extend_from_slice(&ring);
        base
    }

    pub fn push_triangle(&mut self, a: u32, b: u32, c: u32) {
        debug_assert!(
            [a, b, c].iter().all(|&i| (i as usize) < self.vertices.len()),
            "triangle ({a}, {b}, {c}) references a vertex not yet appended"
        );
        self.triangles.push([a, b, c]);
    }

    /// The last four vertices and the index of the first of them.
    pub fn last_ring(&self) -> Option<(Ring, u32)> {
        let start = self.vertices.len().checked_sub(4)?;
        let ring: Ring = self.vertices[start..].try_into().ok()?;
        Some((ring, start as u32))
    }

    /// Unnormalized normal of triangle `index`, `(b - a) x (c - a)`.
    pub fn face_normal(&self, index: usize) -> Vec3 {
        let [a, b, c] = self.triangles[index].map(|i| self.vertices[i as usize]);
        (b - a).cross(c - a)
    }

    /// Area-weighted smooth normals, one per vertex.
    ///
    /// Vertices that belong to no triangle (or only to degenerate ones)
    /// get `Vec3::ZERO`.
    pub fn vertex_normals(&self) -> Vec<Vec3> {
        let mut normals = vec![Vec3::ZERO; self.vertices.len()];
        for (i, tri) in self.triangles.iter().enumerate() {
            let n = self.face_normal(i);
            for &v in tri {
                normals[v as usize] += n;
            }
        }
        normals.iter().map(|n| n.normalize_or_zero()).collect()
    }

    /// Axis-aligned bounds of all vertices, `None` for an empty buffer.
    pub fn bounds(&self) -> Option<Aabb3d> {
        let first = *self.vertices.first()?;
        let (min, max) = self
            .vertices
            .iter()
            .fold((first, first), |(min, max), &v| (min.min(v), max.max(v)));
        Some(Aabb3d {
            min: min.into(),
            max: max.into(),
        })
    }

    /// Triangle indices flattened into the layout index buffers expect.
    pub fn flat_indices(&self) -> Vec<u32> {
        self.triangles.iter().flatten().copied().collect()
    }

    pub fn into_parts(self) -> (Vec<Vec3>, Vec<[u32; 3]>) {
        (self.vertices, self.triangles)
    }
}

/// Receives the finished buffer once generation succeeds.
///
/// This is the seam to the host engine's own bounds, normal and tangent
/// recomputation and optimization passes. Closures taking
/// `&mut MeshBuffer` implement it.
pub trait MeshPostProcessor {
    fn process(&mut self, mesh: &mut MeshBuffer);
}

impl<F> MeshPostProcessor for F
where
    F: FnMut(&mut MeshBuffer),
{
    fn process(&mut self, mesh: &mut MeshBuffer) {
        self(mesh)
    }
}
