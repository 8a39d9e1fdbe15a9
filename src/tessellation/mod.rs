mod tessellate_face;
mod tessellate_solid;

pub use tessellate_face::{triangulate_loops, TessellateFace};
pub use tessellate_solid::TessellateSolid;

use crate::math::{Point3, Vector3};

/// A triangle soup with per-vertex normals and per-triangle source faces.
///
/// Triangles wind counter-clockwise around their outward normal. Vertices
/// are not shared between different source faces.
#[derive(Debug, Clone, Default)]
pub struct TriangleMesh {
    /// Vertex positions.
    pub vertices: Vec<Point3>,
    /// Vertex normals.
    pub normals: Vec<Vector3>,
    /// Triangle indices (each triple defines a triangle).
    pub indices: Vec<[u32; 3]>,
    /// Index of the body face each triangle was generated from.
    pub face_ids: Vec<usize>,
}

impl TriangleMesh {
    /// Number of triangles.
    #[must_use]
    pub fn triangle_count(&self) -> usize {
        self.indices.len()
    }

    /// Corner positions of triangle `i`.
    ///
    /// # Panics
    ///
    /// Panics if `i` is out of range or the mesh indices are corrupt.
    #[must_use]
    pub fn triangle(&self, i: usize) -> [Point3; 3] {
        let [a, b, c] = self.indices[i];
        [
            self.vertices[a as usize],
            self.vertices[b as usize],
            self.vertices[c as usize],
        ]
    }

    /// Iterates over all triangles as corner arrays.
    pub fn triangles(&self) -> impl Iterator<Item = [Point3; 3]> + '_ {
        (0..self.indices.len()).map(|i| self.triangle(i))
    }

    /// Appends `other`, re-basing its indices. Its `face_ids` are kept as they are.
    #[allow(clippy::cast_possible_truncation)]
    pub fn merge(&mut self, other: &TriangleMesh) {
        let base = self.vertices.len() as u32;
        self.vertices.extend_from_slice(&other.vertices);
        self.normals.extend_from_slice(&other.normals);
        self.indices
            .extend(other.indices.iter().map(|t| [t[0] + base, t[1] + base, t[2] + base]));
        self.face_ids.extend_from_slice(&other.face_ids);
    }
}
