//! Ray-based collision testing: a face is removable along a vector if no
//! ray cast from its sample points along that vector strikes the target.

use std::collections::BTreeSet;

use rand::Rng;
use tracing::{debug, info, warn};

use crate::body::SolidBody;
use crate::error::Result;
use crate::kernel::GeometryKernel;
use crate::math::{Point3, Vector3};
use crate::tessellation::TriangleMesh;

use super::gate::{check_body, unit_vector};
use super::sampler::FaceSampler;
use super::{AnalysisParams, Diagnostic};

/// Outcome of casting every sample ray of one face.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FaceCollisions {
    pub no_collision: bool,
    /// Target faces struck by any ray.
    pub struck_faces: BTreeSet<usize>,
}

/// Casts rays from the faces of a source body against a target mesh.
///
/// Every ray origin is a face sample point moved along the face's outward
/// normal by `normal_offset`. A positive offset starts rays just outside
/// the emitting face, which is what same-body analysis needs; a negative
/// one starts them just inside a withdrawn part, clear of the surface it
/// shares with the target.
#[derive(Debug, Clone)]
pub struct RayCollision<'a, K> {
    kernel: K,
    target: &'a TriangleMesh,
    sampler: FaceSampler,
    tolerance: f64,
    normal_offset: f64,
}

impl<'a, K: GeometryKernel> RayCollision<'a, K> {
    /// A tester against `target` with a normal offset of `+tolerance`.
    #[must_use]
    pub fn new(kernel: K, target: &'a TriangleMesh, params: &AnalysisParams) -> Self {
        Self {
            kernel,
            target,
            sampler: FaceSampler::new(params.point_density, params.tolerance)
                .with_max_resolution(params.max_resolution),
            tolerance: params.tolerance,
            normal_offset: params.tolerance,
        }
    }

    #[must_use]
    pub fn with_normal_offset(mut self, normal_offset: f64) -> Self {
        self.normal_offset = normal_offset;
        self
    }

    fn origins(
        &self,
        body: &SolidBody,
        face: usize,
        rng: &mut impl Rng,
    ) -> Result<impl Iterator<Item = Point3>> {
        let offset = body.face_normal(face)? * self.normal_offset;
        let points = self.sampler.generate(&body.face_domain(face)?, rng)?;
        Ok(points.map(move |p| p + offset))
    }

    /// Whether every sample ray of `face` misses the target. Stops at the
    /// first hit.
    ///
    /// # Errors
    ///
    /// Returns an error for a degenerate vector, a bad face index, or a face
    /// that cannot be sampled.
    pub fn face_no_collision(
        &self,
        body: &SolidBody,
        face: usize,
        vector: &Vector3,
        rng: &mut impl Rng,
    ) -> Result<bool> {
        let dir = unit_vector(vector)?;
        for origin in self.origins(body, face, rng)? {
            if let Some(hit) = self.kernel.ray_cast(self.target, &origin, &dir, self.tolerance) {
                debug!(face, distance = hit.distance, struck = ?hit.faces, "ray hit");
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Casts every sample ray of `face` and collects all struck target faces.
    ///
    /// # Errors
    ///
    /// See [`RayCollision::face_no_collision`].
    pub fn face_collisions(
        &self,
        body: &SolidBody,
        face: usize,
        vector: &Vector3,
        rng: &mut impl Rng,
    ) -> Result<FaceCollisions> {
        let dir = unit_vector(vector)?;
        let mut struck_faces = BTreeSet::new();
        for origin in self.origins(body, face, rng)? {
            if let Some(hit) = self.kernel.ray_cast(self.target, &origin, &dir, self.tolerance) {
                struck_faces.extend(hit.faces);
            }
        }
        Ok(FaceCollisions {
            no_collision: struck_faces.is_empty(),
            struck_faces,
        })
    }
}

/// Result of withdrawing a part from the body cast around it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemovalReport {
    pub no_collision: bool,
    /// Cast body faces struck by any ray, ascending.
    pub struck_faces: Vec<usize>,
    /// Part faces that face the removal direction and were tested.
    pub checked_faces: Vec<usize>,
    /// Part faces that could not be tested; each one blocks the removal.
    pub diagnostics: Vec<Diagnostic>,
}

/// Checks whether a part can be pulled out of a cast body along a vector.
///
/// Only part faces whose normals lean toward the vector (cosine at or above
/// the perpendicular threshold) are tested; the rest trail the motion.
#[derive(Debug, Clone)]
pub struct RemovalCheck<K> {
    kernel: K,
    params: AnalysisParams,
}

impl<K: GeometryKernel + Copy> RemovalCheck<K> {
    #[must_use]
    pub fn new(kernel: K, params: AnalysisParams) -> Self {
        Self { kernel, params }
    }

    /// Tests `part` against `cast` along `vector`.
    ///
    /// Mesh parts are welded at the tolerance first. A part face that
    /// cannot be sampled counts as colliding and is reported as a
    /// diagnostic.
    ///
    /// # Errors
    ///
    /// Returns [`AnalysisError::InvalidBody`](crate::error::AnalysisError::InvalidBody)
    /// if either body is not a valid solid, or
    /// [`AnalysisError::DegenerateVector`](crate::error::AnalysisError::DegenerateVector).
    pub fn run(&self, part: &SolidBody, cast: &SolidBody, vector: &Vector3) -> Result<RemovalReport> {
        let tol = self.params.tolerance;
        let welded;
        let part = match part {
            SolidBody::Mesh(mesh) => {
                welded = SolidBody::Mesh(mesh.clean(tol));
                &welded
            }
            SolidBody::Brep(_) => part,
        };
        check_body(part, tol)?;
        check_body(cast, tol)?;
        let dir = unit_vector(vector)?;

        let target = cast.triangulate()?;
        let tester = RayCollision::new(self.kernel, &target, &self.params).with_normal_offset(-tol);
        let mut rng = self.params.rng();

        let mut struck = BTreeSet::new();
        let mut checked_faces = Vec::new();
        let mut diagnostics = Vec::new();
        for face in 0..part.face_count() {
            if part.face_normal(face)?.dot(&dir) < self.params.perpendicular_threshold {
                continue;
            }
            checked_faces.push(face);
            match tester.face_collisions(part, face, vector, &mut rng) {
                Ok(hits) => struck.extend(hits.struck_faces),
                Err(err) => {
                    warn!(face, %err, "treating part face as colliding");
                    diagnostics.push(Diagnostic::for_face(face, err.to_string()));
                }
            }
        }

        info!(
            checked = checked_faces.len(),
            struck = struck.len(),
            failed = diagnostics.len(),
            "removal check finished"
        );
        Ok(RemovalReport {
            no_collision: struck.is_empty() && diagnostics.is_empty(),
            struck_faces: struck.into_iter().collect(),
            checked_faces,
            diagnostics,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::analysis::tests::init_tracing;
    use crate::body::tests::{brep_box, step_mesh};
    use crate::kernel::PolyhedralKernel;
    use crate::mesh::tests::quad_box;
    use crate::mesh::{MeshBody, MeshFace};

    fn p(x: f64, y: f64, z: f64) -> Point3 {
        Point3::new(x, y, z)
    }

    /// Mesh faces with outward normal `normal` whose centroid passes `at`.
    fn faces_where(body: &SolidBody, normal: Vector3, at: impl Fn(Point3) -> bool) -> Vec<usize> {
        (0..body.face_count())
            .filter(|&i| (body.face_normal(i).unwrap() - normal).norm() < 1e-9)
            .filter(|&i| at(body.face_centroid(i).unwrap()))
            .collect()
    }

    fn no_collision(body: &SolidBody, faces: &[usize], v: Vector3) -> bool {
        let target = body.triangulate().unwrap();
        let params = AnalysisParams::default();
        let tester = RayCollision::new(PolyhedralKernel, &target, &params);
        let mut rng = params.rng();
        faces
            .iter()
            .all(|&f| tester.face_no_collision(body, f, &v, &mut rng).unwrap())
    }

    #[test]
    fn cube_top_clears_upward() {
        init_tracing();
        let body = SolidBody::Mesh(quad_box(p(0.0, 0.0, 0.0), p(1.0, 1.0, 1.0)));
        assert!(no_collision(&body, &[1], Vector3::z()));
        // Sideways along the top face: rays start above the body.
        assert!(no_collision(&body, &[1], Vector3::x()));
    }

    #[test]
    fn step_lower_top_is_blocked_by_the_riser() {
        let body = step_mesh();
        let lower_top = faces_where(&body, Vector3::z(), |c| (c.z - 1.0).abs() < 1e-9);
        assert_eq!(lower_top.len(), 2);
        assert!(!no_collision(&body, &lower_top, -Vector3::x()));
        assert!(no_collision(&body, &lower_top, Vector3::z()));
        assert!(no_collision(&body, &lower_top, Vector3::x()));
    }

    #[test]
    fn step_riser_slides_up_but_not_down() {
        let body = step_mesh();
        let riser = faces_where(&body, Vector3::x(), |c| (c.x - 1.0).abs() < 1e-9);
        assert_eq!(riser.len(), 2);
        assert!(no_collision(&body, &riser, Vector3::z()));
        assert!(!no_collision(&body, &riser, -Vector3::z()));
    }

    #[test]
    fn collisions_report_struck_faces() {
        let body = step_mesh();
        let target = body.triangulate().unwrap();
        let params = AnalysisParams::default();
        let tester = RayCollision::new(PolyhedralKernel, &target, &params);
        let mut rng = params.rng();
        let lower_top = faces_where(&body, Vector3::z(), |c| (c.z - 1.0).abs() < 1e-9);
        let riser = faces_where(&body, Vector3::x(), |c| (c.x - 1.0).abs() < 1e-9);

        let hits = tester
            .face_collisions(&body, lower_top[0], &-Vector3::x(), &mut rng)
            .unwrap();
        assert!(!hits.no_collision);
        assert!(!hits.struck_faces.is_empty());
        assert!(hits.struck_faces.iter().all(|f| riser.contains(f)));
    }

    #[test]
    fn degenerate_vector_is_an_error() {
        let body = SolidBody::Mesh(quad_box(p(0.0, 0.0, 0.0), p(1.0, 1.0, 1.0)));
        let target = body.triangulate().unwrap();
        let params = AnalysisParams::default();
        let tester = RayCollision::new(PolyhedralKernel, &target, &params);
        let mut rng = params.rng();
        assert!(tester
            .face_no_collision(&body, 1, &Vector3::zeros(), &mut rng)
            .is_err());
    }

    #[test]
    fn part_lifts_off_its_base_but_cannot_sink_into_it() {
        init_tracing();
        let part = SolidBody::Mesh(quad_box(p(0.0, 0.0, 0.0), p(1.0, 1.0, 1.0)));
        let base = SolidBody::Mesh(quad_box(p(-1.0, -1.0, -1.0), p(2.0, 2.0, 0.0)));
        let check = RemovalCheck::new(PolyhedralKernel, AnalysisParams::default());

        let up = check.run(&part, &base, &Vector3::z()).unwrap();
        assert!(up.no_collision);
        assert_eq!(up.checked_faces, vec![1]);

        let down = check.run(&part, &base, &-Vector3::z()).unwrap();
        assert!(!down.no_collision);
        assert_eq!(down.checked_faces, vec![0]);
        // The base's top face.
        assert_eq!(down.struck_faces, vec![1]);
    }

    #[test]
    fn wall_blocks_sideways_withdrawal() {
        let part = SolidBody::Mesh(quad_box(p(0.0, 0.0, 0.0), p(1.0, 1.0, 1.0)));
        let wall = SolidBody::Mesh(quad_box(p(1.0, -1.0, -1.0), p(2.0, 2.0, 1.0)));
        let check = RemovalCheck::new(PolyhedralKernel, AnalysisParams::default());

        let sideways = check.run(&part, &wall, &Vector3::x()).unwrap();
        assert!(!sideways.no_collision);
        // The wall's -x face.
        assert_eq!(sideways.struck_faces, vec![5]);
        assert!(check.run(&part, &wall, &Vector3::z()).unwrap().no_collision);
    }

    #[test]
    fn unsampleable_part_face_blocks_instead_of_failing() {
        init_tracing();
        // Side faces are thinner than twice the sampling guard.
        let part = brep_box(p(0.0, 0.0, 1.0), p(1.0, 1.0, 1.0015));
        let base = brep_box(p(0.0, 0.0, 0.0), p(1.0, 1.0, 1.0));
        let check = RemovalCheck::new(PolyhedralKernel, AnalysisParams::default());

        let report = check.run(&part, &base, &Vector3::new(1.0, 0.0, 1.0)).unwrap();
        assert!(!report.no_collision);
        assert!(report.struck_faces.is_empty());
        assert!(!report.diagnostics.is_empty());
        for diagnostic in &report.diagnostics {
            assert!(report.checked_faces.contains(&diagnostic.face.unwrap()));
        }
    }

    #[test]
    fn mesh_parts_are_welded_before_testing() {
        let welded = quad_box(p(0.0, 0.0, 0.0), p(1.0, 1.0, 0.25));
        // Split the +x face's upper edge onto copies pulled in by less than
        // the tolerance, which tilts that face toward +z.
        let mut vertices = welded.vertices().to_vec();
        let inset = Vector3::new(-0.0004, 0.0, 0.0);
        vertices.push(vertices[5] + inset);
        vertices.push(vertices[6] + inset);
        let mut faces = welded.faces().to_vec();
        faces[4] = MeshFace::Quad([1, 2, 9, 8]);
        let split = MeshBody::new(vertices, faces).unwrap();
        assert!(split.face_normal(4).unwrap().z > 1e-3);

        let base = SolidBody::Mesh(quad_box(p(-1.0, -1.0, -1.0), p(2.0, 2.0, 0.0)));
        let check = RemovalCheck::new(PolyhedralKernel, AnalysisParams::default());
        let from_split = check.run(&SolidBody::Mesh(split), &base, &Vector3::z()).unwrap();
        let from_welded = check.run(&SolidBody::Mesh(welded), &base, &Vector3::z()).unwrap();
        assert_eq!(from_split, from_welded);
        assert_eq!(from_split.checked_faces, vec![1]);
        assert!(from_split.no_collision);
    }
}
