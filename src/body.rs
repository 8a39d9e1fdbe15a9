//! Solid bodies under analysis: indexed meshes or planar boundary
//! representations, behind one capability set.

use crate::error::{AnalysisError, Result};
use crate::geometry::Plane;
use crate::math::polygon_3d::{max_plane_deviation, newell_normal, polygon_centroid_3d};
use crate::math::region_2d::{LoopFill, Region2};
use crate::math::{Point3, Vector3};
use crate::mesh::{MeshBody, MeshFace};
use crate::operations::query::{Aabb, IsValid};
use crate::tessellation::{TessellateSolid, TriangleMesh};
use crate::topology::{FaceId, FaceLoops, SolidId, TopologyStore};

/// A planar boundary-representation solid: a topology store plus the solid
/// inside it that is analysed.
#[derive(Debug)]
pub struct BrepBody {
    store: TopologyStore,
    solid: SolidId,
    faces: Vec<FaceId>,
}

impl BrepBody {
    /// Wraps `solid` of `store`.
    ///
    /// # Errors
    ///
    /// Returns a topology error if the solid or its shells cannot be resolved.
    pub fn new(store: TopologyStore, solid: SolidId) -> Result<Self> {
        let faces = store.solid_faces(solid)?;
        Ok(Self {
            store,
            solid,
            faces,
        })
    }

    #[must_use]
    pub fn store(&self) -> &TopologyStore {
        &self.store
    }

    #[must_use]
    pub fn solid(&self) -> SolidId {
        self.solid
    }

    /// Face IDs in body face order.
    #[must_use]
    pub fn face_ids(&self) -> &[FaceId] {
        &self.faces
    }

    fn face_id(&self, index: usize) -> Result<FaceId> {
        self.faces.get(index).copied().ok_or_else(|| {
            AnalysisError::FaceOutOfRange {
                index,
                count: self.faces.len(),
            }
            .into()
        })
    }

    /// Supporting plane of face `index`, normal pointing out of the solid.
    ///
    /// # Errors
    ///
    /// Returns an error if the index is out of range or the face is missing.
    pub fn face_plane(&self, index: usize) -> Result<Plane> {
        Ok(self.store.face(self.face_id(index)?)?.outward_plane())
    }

    /// Boundary loops of face `index`, outer first.
    ///
    /// # Errors
    ///
    /// Returns an error if the index is out of range or the face is missing.
    pub fn face_loops(&self, index: usize) -> Result<FaceLoops> {
        Ok(self.store.face_loops(self.face_id(index)?)?)
    }
}

/// The parametric domain a face is sampled over.
#[derive(Debug, Clone)]
pub enum FaceDomain {
    Triangle([Point3; 3]),
    Quad([Point3; 4]),
    /// A region in the `(u, v)` frame of a plane.
    Planar { plane: Plane, region: Region2 },
}

/// A body under analysis.
#[derive(Debug)]
pub enum SolidBody {
    Mesh(MeshBody),
    Brep(BrepBody),
}

impl From<MeshBody> for SolidBody {
    fn from(mesh: MeshBody) -> Self {
        Self::Mesh(mesh)
    }
}

impl From<BrepBody> for SolidBody {
    fn from(brep: BrepBody) -> Self {
        Self::Brep(brep)
    }
}

impl SolidBody {
    #[must_use]
    pub fn face_count(&self) -> usize {
        match self {
            Self::Mesh(mesh) => mesh.face_count(),
            Self::Brep(brep) => brep.faces.len(),
        }
    }

    fn check_index(&self, index: usize) -> Result<()> {
        let count = self.face_count();
        if index < count {
            Ok(())
        } else {
            Err(AnalysisError::FaceOutOfRange { index, count }.into())
        }
    }

    /// Unit outward normal of face `index`.
    ///
    /// # Errors
    ///
    /// Returns [`AnalysisError::FaceOutOfRange`] for a bad index.
    pub fn face_normal(&self, index: usize) -> Result<Vector3> {
        self.check_index(index)?;
        match self {
            Self::Mesh(mesh) => Ok(mesh.face_normal(index).unwrap_or_else(Vector3::zeros)),
            Self::Brep(brep) => Ok(*brep.face_plane(index)?.plane_normal()),
        }
    }

    /// Supporting plane of face `index` with an outward normal.
    ///
    /// # Errors
    ///
    /// Returns [`AnalysisError::FaceOutOfRange`] for a bad index, or a
    /// geometry error for a mesh face without area.
    pub fn face_plane(&self, index: usize) -> Result<Plane> {
        match self {
            Self::Mesh(_) => Plane::from_normal(self.face_centroid(index)?, self.face_normal(index)?),
            Self::Brep(brep) => brep.face_plane(index),
        }
    }

    /// Centroid of face `index`: the corner mean for mesh faces, the area
    /// centroid of the outer loop for B-rep faces.
    ///
    /// # Errors
    ///
    /// Returns [`AnalysisError::FaceOutOfRange`] for a bad index.
    pub fn face_centroid(&self, index: usize) -> Result<Point3> {
        self.check_index(index)?;
        match self {
            Self::Mesh(mesh) => mesh
                .face_centroid(index)
                .ok_or_else(|| AnalysisError::FaceOutOfRange { index, count: mesh.face_count() }.into()),
            Self::Brep(brep) => Ok(polygon_centroid_3d(&brep.face_loops(index)?.outer)),
        }
    }

    /// Sampling domain of face `index`.
    ///
    /// # Errors
    ///
    /// Returns [`AnalysisError::FaceOutOfRange`] for a bad index.
    pub fn face_domain(&self, index: usize) -> Result<FaceDomain> {
        self.check_index(index)?;
        match self {
            Self::Mesh(mesh) => {
                let pts = mesh.face_points(index).unwrap_or_default();
                Ok(match mesh.faces()[index] {
                    MeshFace::Triangle(_) => FaceDomain::Triangle([pts[0], pts[1], pts[2]]),
                    MeshFace::Quad(_) => FaceDomain::Quad([pts[0], pts[1], pts[2], pts[3]]),
                })
            }
            Self::Brep(brep) => {
                let plane = brep.face_plane(index)?;
                let loops: Vec<_> = brep
                    .face_loops(index)?
                    .iter()
                    .map(|ring| ring.iter().map(|p| plane.project(p)).collect())
                    .collect();
                let region = Region2::from_loops(&loops, LoopFill::EvenOdd);
                Ok(FaceDomain::Planar { plane, region })
            }
        }
    }

    /// Whether every boundary vertex of face `index` lies within `tolerance`
    /// of its best-fit plane.
    ///
    /// # Errors
    ///
    /// Returns [`AnalysisError::FaceOutOfRange`] for a bad index.
    pub fn is_face_planar(&self, index: usize, tolerance: f64) -> Result<bool> {
        self.check_index(index)?;
        let points = match self {
            Self::Mesh(mesh) => mesh.face_points(index).unwrap_or_default(),
            Self::Brep(brep) => brep.face_loops(index)?.iter().flatten().copied().collect(),
        };
        let Ok(normal) = newell_normal(&points) else {
            return Ok(false);
        };
        let origin = polygon_centroid_3d(&points);
        Ok(max_plane_deviation(&points, &origin, &normal) <= tolerance)
    }

    /// All boundary vertex positions (duplicates possible for B-reps).
    #[must_use]
    pub fn vertices(&self) -> Vec<Point3> {
        match self {
            Self::Mesh(mesh) => mesh.vertices().to_vec(),
            Self::Brep(brep) => brep
                .faces
                .iter()
                .filter_map(|&f| brep.store.face_loops(f).ok())
                .flat_map(|loops| loops.iter().flatten().copied().collect::<Vec<_>>())
                .collect(),
        }
    }

    #[must_use]
    pub fn bounding_box(&self) -> Option<Aabb> {
        Aabb::from_points(&self.vertices())
    }

    /// Triangle mesh of the boundary; `face_ids` are body face indices.
    ///
    /// # Errors
    ///
    /// Returns an error if a B-rep face cannot be tessellated.
    pub fn triangulate(&self) -> Result<TriangleMesh> {
        match self {
            Self::Mesh(mesh) => Ok(mesh.triangulate()),
            Self::Brep(brep) => TessellateSolid::new(brep.solid).execute(&brep.store),
        }
    }

    /// Every failed validity predicate; empty for a closed, manifold solid.
    #[must_use]
    pub fn validate(&self, tolerance: f64) -> Vec<String> {
        match self {
            Self::Mesh(mesh) => mesh.validate(tolerance),
            Self::Brep(brep) => IsValid::new(brep.solid)
                .with_tolerance(tolerance)
                .issues(&brep.store),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) mod tests {
    use super::*;
    use crate::mesh::tests::quad_box;
    use crate::operations::creation::{MakeBox, MakeFace, MakeWire};
    use crate::operations::shaping::Extrude;
    use approx::assert_relative_eq;

    fn p(x: f64, y: f64, z: f64) -> Point3 {
        Point3::new(x, y, z)
    }

    pub(crate) fn brep_box(min: Point3, max: Point3) -> SolidBody {
        let mut store = TopologyStore::new();
        let solid = MakeBox::new(min, max).execute(&mut store).unwrap();
        SolidBody::Brep(BrepBody::new(store, solid).unwrap())
    }

    /// Step-shaped prism: the L profile `(0,0) (0,2) (1,2) (1,1) (2,1) (2,0)`
    /// in the xz-plane, extruded one unit along +y.
    ///
    /// Face order: 0 front (y=0), 1 back (y=1), then the six sides in profile
    /// order: 2 left `x=0`, 3 upper top `z=2`, 4 inner `x=1`, 5 lower top
    /// `z=1`, 6 right `x=2`, 7 bottom.
    pub(crate) fn step_brep() -> SolidBody {
        let mut store = TopologyStore::new();
        let wire = MakeWire::new(
            vec![
                p(0.0, 0.0, 0.0), p(0.0, 0.0, 2.0), p(1.0, 0.0, 2.0),
                p(1.0, 0.0, 1.0), p(2.0, 0.0, 1.0), p(2.0, 0.0, 0.0),
            ],
            true,
        )
        .execute(&mut store)
        .unwrap();
        let face = MakeFace::new(wire, vec![]).execute(&mut store).unwrap();
        let solid = Extrude::new(face, Vector3::y()).execute(&mut store).unwrap();
        SolidBody::Brep(BrepBody::new(store, solid).unwrap())
    }

    /// [`step_brep`] as a triangle mesh body with the same face geometry.
    pub(crate) fn step_mesh() -> SolidBody {
        let brep = step_brep();
        let tri = brep.triangulate().unwrap();
        SolidBody::Mesh(MeshBody::from_triangle_mesh(&tri).unwrap().clean(1e-6))
    }

    #[test]
    fn step_faces_are_where_documented() {
        let body = step_brep();
        assert_eq!(body.face_count(), 8);
        let expected = [
            -Vector3::y(), Vector3::y(), -Vector3::x(), Vector3::z(),
            Vector3::x(), Vector3::z(), Vector3::x(), -Vector3::z(),
        ];
        for (i, n) in expected.iter().enumerate() {
            assert_relative_eq!(body.face_normal(i).unwrap(), *n, epsilon = 1e-12);
        }
        assert_relative_eq!(body.face_centroid(5).unwrap(), p(1.5, 0.5, 1.0), epsilon = 1e-12);
        assert!(body.validate(1e-3).is_empty());
    }

    #[test]
    fn mesh_and_brep_share_capabilities() {
        let mesh = SolidBody::Mesh(quad_box(p(0.0, 0.0, 0.0), p(1.0, 1.0, 1.0)));
        let brep = brep_box(p(0.0, 0.0, 0.0), p(1.0, 1.0, 1.0));
        for body in [&mesh, &brep] {
            assert_eq!(body.face_count(), 6);
            assert_eq!(body.triangulate().unwrap().triangle_count(), 12);
            let aabb = body.bounding_box().unwrap();
            assert_eq!(aabb.max, p(1.0, 1.0, 1.0));
            assert!(body.is_face_planar(0, 1e-6).unwrap());
            assert!(body.validate(1e-3).is_empty());
        }
        assert!(matches!(
            mesh.face_normal(6),
            Err(crate::DemoldError::Analysis(AnalysisError::FaceOutOfRange { index: 6, count: 6 }))
        ));
    }

    #[test]
    fn brep_domain_is_a_planar_region() {
        let body = brep_box(p(0.0, 0.0, 0.0), p(2.0, 3.0, 1.0));
        let FaceDomain::Planar { plane, region } = body.face_domain(1).unwrap() else {
            panic!("B-rep face should have a planar domain");
        };
        assert_relative_eq!(*plane.plane_normal(), Vector3::z(), epsilon = 1e-12);
        assert_relative_eq!(region.area(), 6.0, epsilon = 1e-6);
    }

    #[test]
    fn mesh_domain_keeps_corners() {
        let body = SolidBody::Mesh(quad_box(p(0.0, 0.0, 0.0), p(1.0, 1.0, 1.0)));
        let FaceDomain::Quad(corners) = body.face_domain(1).unwrap() else {
            panic!("quad face should have a quad domain");
        };
        assert_eq!(corners[0], p(0.0, 0.0, 1.0));
    }
}
