//! Indexed polygon meshes with triangle and quad faces.

mod validate;

use std::collections::HashMap;

use crate::error::{OperationError, Result};
use crate::math::polygon_3d::vector_area;
use crate::math::{grid_key, Point3, Vector3, TOLERANCE};
use crate::tessellation::TriangleMesh;

/// A mesh face: three or four vertex indices, counter-clockwise seen from
/// outside.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeshFace {
    Triangle([usize; 3]),
    Quad([usize; 4]),
}

impl MeshFace {
    /// Vertex indices in winding order.
    #[must_use]
    pub fn indices(&self) -> &[usize] {
        match self {
            Self::Triangle(ix) => ix,
            Self::Quad(ix) => ix,
        }
    }

    /// The face split into triangles: itself, or `ABC` and `ACD` for a quad.
    #[must_use]
    pub fn triangles(&self) -> Vec<[usize; 3]> {
        match *self {
            Self::Triangle(t) => vec![t],
            Self::Quad([a, b, c, d]) => vec![[a, b, c], [a, c, d]],
        }
    }

    fn remapped(&self, map: &[usize]) -> Self {
        match *self {
            Self::Triangle([a, b, c]) => Self::Triangle([map[a], map[b], map[c]]),
            Self::Quad([a, b, c, d]) => Self::Quad([map[a], map[b], map[c], map[d]]),
        }
    }
}

/// An indexed mesh body with per-face and per-vertex unit normals.
///
/// Normals are derived from the winding; a face without area gets a zero
/// normal, which [`MeshBody::validate`] reports.
#[derive(Debug, Clone)]
pub struct MeshBody {
    vertices: Vec<Point3>,
    faces: Vec<MeshFace>,
    face_normals: Vec<Vector3>,
    vertex_normals: Vec<Vector3>,
}

impl MeshBody {
    /// Builds a mesh and computes its normals.
    ///
    /// # Errors
    ///
    /// Returns [`OperationError::InvalidInput`] if a face refers to a vertex
    /// that does not exist.
    pub fn new(vertices: Vec<Point3>, faces: Vec<MeshFace>) -> Result<Self> {
        if let Some((fi, &vi)) = faces.iter().enumerate().find_map(|(fi, f)| {
            f.indices()
                .iter()
                .find(|&&vi| vi >= vertices.len())
                .map(|vi| (fi, vi))
        }) {
            return Err(OperationError::InvalidInput(format!(
                "face {fi} refers to vertex {vi}, mesh has {}",
                vertices.len()
            ))
            .into());
        }

        let face_normals: Vec<Vector3> = faces
            .iter()
            .map(|f| {
                let pts: Vec<Point3> = f.indices().iter().map(|&i| vertices[i]).collect();
                vector_area(&pts)
                    .try_normalize(TOLERANCE)
                    .unwrap_or_else(Vector3::zeros)
            })
            .collect();

        let mut vertex_normals = vec![Vector3::zeros(); vertices.len()];
        for (face, normal) in faces.iter().zip(&face_normals) {
            for &i in face.indices() {
                vertex_normals[i] += normal;
            }
        }
        for n in &mut vertex_normals {
            *n = n.try_normalize(TOLERANCE).unwrap_or_else(Vector3::zeros);
        }

        Ok(Self {
            vertices,
            faces,
            face_normals,
            vertex_normals,
        })
    }

    /// Builds a triangle-only mesh from a tessellation.
    ///
    /// # Errors
    ///
    /// Returns an error if the tessellation indices are out of range.
    pub fn from_triangle_mesh(mesh: &TriangleMesh) -> Result<Self> {
        let faces = mesh
            .indices
            .iter()
            .map(|t| MeshFace::Triangle(t.map(|i| i as usize)))
            .collect();
        Self::new(mesh.vertices.clone(), faces)
    }

    #[must_use]
    pub fn vertices(&self) -> &[Point3] {
        &self.vertices
    }

    #[must_use]
    pub fn faces(&self) -> &[MeshFace] {
        &self.faces
    }

    #[must_use]
    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    /// Unit outward normal of face `index` (zero for a degenerate face).
    #[must_use]
    pub fn face_normal(&self, index: usize) -> Option<Vector3> {
        self.face_normals.get(index).copied()
    }

    /// Normalized sum of the adjacent face normals.
    #[must_use]
    pub fn vertex_normal(&self, index: usize) -> Option<Vector3> {
        self.vertex_normals.get(index).copied()
    }

    /// Corner positions of face `index`.
    #[must_use]
    pub fn face_points(&self, index: usize) -> Option<Vec<Point3>> {
        let face = self.faces.get(index)?;
        Some(face.indices().iter().map(|&i| self.vertices[i]).collect())
    }

    /// Mean of the corners of face `index`.
    #[must_use]
    pub fn face_centroid(&self, index: usize) -> Option<Point3> {
        let pts = self.face_points(index)?;
        #[allow(clippy::cast_precision_loss)]
        let n = pts.len() as f64;
        Some(Point3::from(
            pts.iter().map(|p| p.coords).sum::<Vector3>() / n,
        ))
    }

    /// Copies face `index` into a standalone one-face mesh with the same
    /// vertex coordinates.
    ///
    /// # Errors
    ///
    /// Returns [`OperationError::InvalidInput`] if the index is out of range.
    pub fn face_to_mesh(&self, index: usize) -> Result<Self> {
        let face = self.faces.get(index).ok_or_else(|| {
            OperationError::InvalidInput(format!(
                "face {index} out of range, mesh has {}",
                self.faces.len()
            ))
        })?;
        let vertices = face.indices().iter().map(|&i| self.vertices[i]).collect();
        let local = match face {
            MeshFace::Triangle(_) => MeshFace::Triangle([0, 1, 2]),
            MeshFace::Quad(_) => MeshFace::Quad([0, 1, 2, 3]),
        };
        Self::new(vertices, vec![local])
    }

    /// Merges vertices closer than `tolerance` and drops unreferenced ones.
    ///
    /// Faces keep their order and count, even if welding collapses one.
    #[must_use]
    pub fn clean(&self, tolerance: f64) -> Self {
        let mut by_key: HashMap<[i64; 3], usize> = HashMap::new();
        let mut used = vec![false; self.vertices.len()];
        for face in &self.faces {
            for &i in face.indices() {
                used[i] = true;
            }
        }

        let mut vertices = Vec::new();
        let mut map = vec![0; self.vertices.len()];
        for (i, p) in self.vertices.iter().enumerate() {
            if !used[i] {
                continue;
            }
            map[i] = *by_key.entry(grid_key(p, tolerance)).or_insert_with(|| {
                vertices.push(*p);
                vertices.len() - 1
            });
        }

        let faces = self.faces.iter().map(|f| f.remapped(&map)).collect();
        // Indices are remapped from valid ones, so construction cannot fail.
        Self::new(vertices, faces).unwrap_or_else(|_| self.clone())
    }

    /// Splits quads into triangles; `face_ids` point back at mesh faces.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn triangulate(&self) -> TriangleMesh {
        let mut mesh = TriangleMesh {
            vertices: self.vertices.clone(),
            normals: self.vertex_normals.clone(),
            ..TriangleMesh::default()
        };
        for (fi, face) in self.faces.iter().enumerate() {
            for t in face.triangles() {
                mesh.indices.push(t.map(|i| i as u32));
                mesh.face_ids.push(fi);
            }
        }
        mesh
    }

    /// Signed enclosed volume; positive for a closed mesh wound outward.
    #[must_use]
    pub fn signed_volume(&self) -> f64 {
        crate::operations::query::Volume::of_mesh(&self.triangulate())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn p(x: f64, y: f64, z: f64) -> Point3 {
        Point3::new(x, y, z)
    }

    /// Axis-aligned box as six outward quads.
    pub(crate) fn quad_box(min: Point3, max: Point3) -> MeshBody {
        let (a, b) = (min, max);
        let vertices = vec![
            p(a.x, a.y, a.z), p(b.x, a.y, a.z), p(b.x, b.y, a.z), p(a.x, b.y, a.z),
            p(a.x, a.y, b.z), p(b.x, a.y, b.z), p(b.x, b.y, b.z), p(a.x, b.y, b.z),
        ];
        let faces = vec![
            MeshFace::Quad([0, 3, 2, 1]), // -z
            MeshFace::Quad([4, 5, 6, 7]), // +z
            MeshFace::Quad([0, 1, 5, 4]), // -y
            MeshFace::Quad([2, 3, 7, 6]), // +y
            MeshFace::Quad([1, 2, 6, 5]), // +x
            MeshFace::Quad([3, 0, 4, 7]), // -x
        ];
        MeshBody::new(vertices, faces).unwrap()
    }

    #[test]
    fn box_normals_point_outward() {
        let mesh = quad_box(p(0.0, 0.0, 0.0), p(1.0, 1.0, 1.0));
        assert_relative_eq!(mesh.face_normal(0).unwrap(), -Vector3::z());
        assert_relative_eq!(mesh.face_normal(1).unwrap(), Vector3::z());
        assert_relative_eq!(mesh.face_normal(4).unwrap(), Vector3::x());
        let corner = mesh.vertex_normal(6).unwrap();
        assert_relative_eq!(corner, Vector3::new(1.0, 1.0, 1.0).normalize(), epsilon = 1e-12);
        assert_relative_eq!(mesh.signed_volume(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn out_of_range_index_is_rejected() {
        let result = MeshBody::new(
            vec![p(0.0, 0.0, 0.0), p(1.0, 0.0, 0.0), p(0.0, 1.0, 0.0)],
            vec![MeshFace::Triangle([0, 1, 3])],
        );
        assert!(result.is_err());
    }

    #[test]
    fn quad_centroid_is_vertex_mean() {
        let mesh = quad_box(p(0.0, 0.0, 0.0), p(2.0, 4.0, 6.0));
        assert_relative_eq!(mesh.face_centroid(1).unwrap(), p(1.0, 2.0, 6.0));
        assert!(mesh.face_centroid(6).is_none());
    }

    #[test]
    fn extracted_face_keeps_coordinates() {
        let mesh = quad_box(p(0.1, 0.2, 0.3), p(1.7, 2.9, 3.1));
        for i in 0..mesh.face_count() {
            let single = mesh.face_to_mesh(i).unwrap();
            assert_eq!(single.face_count(), 1);
            assert_eq!(single.face_points(0).unwrap(), mesh.face_points(i).unwrap());
            assert_eq!(single.face_normal(0), mesh.face_normal(i));
        }
        assert!(mesh.face_to_mesh(6).is_err());
    }

    #[test]
    fn clean_merges_coincident_vertices() {
        // Triangle soup of a tetrahedron: every face has its own vertices.
        let corners = [p(0.0, 0.0, 0.0), p(1.0, 0.0, 0.0), p(0.0, 1.0, 0.0), p(0.0, 0.0, 1.0)];
        let tris = [[0, 2, 1], [0, 1, 3], [1, 2, 3], [0, 3, 2]];
        let mut vertices = Vec::new();
        let mut faces = Vec::new();
        for t in tris {
            let base = vertices.len();
            vertices.extend(t.iter().map(|&i| corners[i] + Vector3::repeat(1e-6)));
            faces.push(MeshFace::Triangle([base, base + 1, base + 2]));
        }
        let soup = MeshBody::new(vertices, faces).unwrap();
        assert_eq!(soup.vertices().len(), 12);

        let cleaned = soup.clean(1e-3);
        assert_eq!(cleaned.vertices().len(), 4);
        assert_eq!(cleaned.face_count(), 4);
        assert!(cleaned.validate(1e-3).is_empty());
    }

    #[test]
    fn triangulate_tracks_source_faces() {
        let mesh = quad_box(p(0.0, 0.0, 0.0), p(1.0, 1.0, 1.0));
        let tri = mesh.triangulate();
        assert_eq!(tri.triangle_count(), 12);
        assert_eq!(tri.face_ids[..4], [0, 0, 1, 1]);
    }
}
