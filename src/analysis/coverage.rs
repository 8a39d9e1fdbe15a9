//! Multi-vector coverage: which faces no removal vector can clear.

use std::collections::BTreeMap;

use rand::Rng;
use tracing::{debug, info, warn};

use crate::body::{BrepBody, SolidBody};
use crate::error::Result;
use crate::kernel::GeometryKernel;
use crate::math::Vector3;
use crate::tessellation::TriangleMesh;

use super::gate::{check_body, unit_vector};
use super::ray_collision::RayCollision;
use super::region_collision::RegionCollision;
use super::{AnalysisParams, Diagnostic, FaceStatus};

/// Faces left uncovered by a set of removal vectors.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CoverageReport {
    /// Uncovered face indices, ascending.
    pub uncovered: Vec<usize>,
    /// Face index → index of the first vector that cleared it.
    pub covered_by: BTreeMap<usize, usize>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Per-face display classification for a single vector.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusReport {
    /// One entry per body face.
    pub statuses: Vec<FaceStatus>,
    pub diagnostics: Vec<Diagnostic>,
}

enum Tester<'a, K> {
    Ray(RayCollision<'a, K>),
    Region(RegionCollision<'a, K>, &'a BrepBody),
}

impl<K: GeometryKernel> Tester<'_, K> {
    /// Clearance of `face` along `vector`; failures collide and are reported.
    fn clear(
        &self,
        body: &SolidBody,
        face: usize,
        vector: &Vector3,
        rng: &mut impl Rng,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> bool {
        let outcome = match self {
            Self::Ray(ray) => ray.face_no_collision(body, face, vector, rng),
            Self::Region(region, brep) => region.face_report(brep, face, vector, rng).map(|r| {
                diagnostics.extend(r.diagnostics);
                r.no_collision
            }),
        };
        outcome.unwrap_or_else(|err| {
            warn!(face, %err, "treating face as colliding");
            diagnostics.push(Diagnostic::for_face(face, err.to_string()));
            false
        })
    }
}

/// Searches, face by face, for a removal vector that clears the face.
#[derive(Debug, Clone)]
pub struct Coverage<K> {
    kernel: K,
    params: AnalysisParams,
}

impl<K: GeometryKernel + Copy> Coverage<K> {
    #[must_use]
    pub fn new(kernel: K, params: AnalysisParams) -> Self {
        Self { kernel, params }
    }

    fn tester<'a>(&self, body: &'a SolidBody, target: &'a TriangleMesh) -> Tester<'a, K> {
        match body {
            SolidBody::Mesh(_) => Tester::Ray(RayCollision::new(self.kernel, target, &self.params)),
            SolidBody::Brep(brep) => {
                Tester::Region(RegionCollision::new(self.kernel, target, self.params), brep)
            }
        }
    }

    /// Finds the faces of `body` that none of `vectors` clears.
    ///
    /// `faces` defaults to every face. A vector is only tried on a face if
    /// it lies within `angle_threshold_deg` (clamped to `[0, 90]`) of the
    /// face normal; the first vector that clears a face covers it.
    ///
    /// # Errors
    ///
    /// Returns [`AnalysisError::InvalidBody`](crate::error::AnalysisError::InvalidBody),
    /// [`AnalysisError::DegenerateVector`](crate::error::AnalysisError::DegenerateVector)
    /// or [`AnalysisError::FaceOutOfRange`](crate::error::AnalysisError::FaceOutOfRange)
    /// before any face is tested.
    pub fn run(
        &self,
        body: &SolidBody,
        faces: Option<&[usize]>,
        vectors: &[Vector3],
        angle_threshold_deg: f64,
    ) -> Result<CoverageReport> {
        let tol = self.params.tolerance;
        check_body(body, tol)?;
        let units = vectors.iter().map(unit_vector).collect::<Result<Vec<_>>>()?;
        let faces: Vec<usize> = match faces {
            Some(list) => list.to_vec(),
            None => (0..body.face_count()).collect(),
        };
        let normals = faces
            .iter()
            .map(|&f| body.face_normal(f))
            .collect::<Result<Vec<_>>>()?;

        let threshold = if angle_threshold_deg.is_nan() {
            90.0
        } else {
            angle_threshold_deg.clamp(0.0, 90.0)
        };
        let min_cos = threshold.to_radians().cos() - tol;

        let target = body.triangulate()?;
        let tester = self.tester(body, &target);
        let mut rng = self.params.rng();
        let mut report = CoverageReport::default();

        for (&face, normal) in faces.iter().zip(&normals) {
            let covering = vectors.iter().zip(&units).position(|(vector, unit)| {
                if normal.dot(unit) < min_cos {
                    return false;
                }
                tester.clear(body, face, vector, &mut rng, &mut report.diagnostics)
            });
            match covering {
                Some(v) => {
                    debug!(face, vector = v, "face covered");
                    report.covered_by.insert(face, v);
                }
                None => report.uncovered.push(face),
            }
        }
        report.uncovered.sort_unstable();
        report.uncovered.dedup();

        info!(
            faces = faces.len(),
            vectors = vectors.len(),
            uncovered = report.uncovered.len(),
            diagnostics = report.diagnostics.len(),
            "coverage finished"
        );
        Ok(report)
    }

    /// Classifies every face of `body` for removal along `vector`.
    ///
    /// # Errors
    ///
    /// Returns [`AnalysisError::InvalidBody`](crate::error::AnalysisError::InvalidBody)
    /// or [`AnalysisError::DegenerateVector`](crate::error::AnalysisError::DegenerateVector).
    pub fn face_status(&self, body: &SolidBody, vector: &Vector3) -> Result<StatusReport> {
        check_body(body, self.params.tolerance)?;
        let unit = unit_vector(vector)?;
        let target = body.triangulate()?;
        let tester = self.tester(body, &target);
        let mut rng = self.params.rng();
        let mut report = StatusReport::default();

        for face in 0..body.face_count() {
            let grazing = body.face_normal(face)?.dot(&unit).abs() <= self.params.perpendicular_threshold;
            let clear = tester.clear(body, face, vector, &mut rng, &mut report.diagnostics);
            report.statuses.push(FaceStatus::from_outcome(clear, grazing));
        }
        Ok(report)
    }
}
