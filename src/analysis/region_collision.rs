//! Region and swept-volume collision testing for planar B-rep faces.
//!
//! The test branches on `p = n · v`, the cosine between the face's outward
//! normal and the removal direction:
//!
//! * `|p| <= threshold`: the face slides along itself. The area it sweeps
//!   in its own plane is intersected with the body's cross-section just
//!   behind the face; any material found there blocks it.
//! * `p > threshold`: the face moves away from the body. Its triangles are
//!   swept into prisms and the material inside them is measured.
//! * otherwise the face moves into its own body and always collides.

use rand::Rng;
use tracing::{debug, warn};

use crate::body::BrepBody;
use crate::error::{AnalysisError, DemoldError, Result};
use crate::geometry::Plane;
use crate::kernel::{GeometryKernel, OverlapPiece, PointClassification, Prism};
use crate::math::polygon_2d::signed_area;
use crate::math::region_2d::{LoopFill, Region2};
use crate::math::{Point2, Point3, Vector3};
use crate::tessellation::{TessellateFace, TriangleMesh};

use super::gate::unit_vector;
use super::sampler::sample_region;
use super::{AnalysisParams, Diagnostic, FaceStatus};

/// Which test decided a face.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Branch {
    Grazing,
    Oblique,
    /// Moving into the body; no test needed.
    Opposed,
}

/// Everything the region/volume test learned about one face.
#[derive(Debug, Clone)]
pub struct RegionReport {
    pub no_collision: bool,
    pub status: FaceStatus,
    pub branch: Branch,
    /// Overlap pieces of the swept volume (oblique branch).
    pub pieces: Vec<OverlapPiece>,
    /// Points tested for containment (grazing branch).
    pub checked_points: Vec<Point3>,
    /// Areas of the critical regions that were sampled (grazing branch).
    pub critical_areas: Vec<f64>,
    pub diagnostics: Vec<Diagnostic>,
}

impl RegionReport {
    fn new(branch: Branch) -> Self {
        Self {
            no_collision: false,
            status: FaceStatus::Colliding,
            branch,
            pieces: Vec::new(),
            checked_points: Vec::new(),
            critical_areas: Vec::new(),
            diagnostics: Vec::new(),
        }
    }
}

/// Tests faces of a B-rep body against a target mesh, normally the same
/// body's tessellation.
#[derive(Debug, Clone)]
pub struct RegionCollision<'a, K> {
    kernel: K,
    target: &'a TriangleMesh,
    params: AnalysisParams,
}

impl<'a, K: GeometryKernel> RegionCollision<'a, K> {
    #[must_use]
    pub fn new(kernel: K, target: &'a TriangleMesh, params: AnalysisParams) -> Self {
        Self {
            kernel,
            target,
            params,
        }
    }

    /// Whether `face` can be removed along `vector`.
    ///
    /// # Errors
    ///
    /// See [`RegionCollision::face_report`].
    pub fn face_no_collision(
        &self,
        body: &BrepBody,
        face: usize,
        vector: &Vector3,
        rng: &mut impl Rng,
    ) -> Result<bool> {
        Ok(self.face_report(body, face, vector, rng)?.no_collision)
    }

    /// Full report for `face` moved along `vector`.
    ///
    /// Geometry that cannot be built (section, regions, sweep, sampling)
    /// makes the face collide and is recorded as a diagnostic.
    ///
    /// # Errors
    ///
    /// Returns an error for a degenerate vector or a bad face index.
    pub fn face_report(
        &self,
        body: &BrepBody,
        face: usize,
        vector: &Vector3,
        rng: &mut impl Rng,
    ) -> Result<RegionReport> {
        let dir = unit_vector(vector)?;
        let plane = body.face_plane(face)?;
        let p = plane.plane_normal().dot(&dir);
        let threshold = self.params.perpendicular_threshold;

        let branch = if p.abs() <= threshold {
            Branch::Grazing
        } else if p > threshold {
            Branch::Oblique
        } else {
            Branch::Opposed
        };
        debug!(face, p, ?branch, "region test branch");

        let mut report = RegionReport::new(branch);
        let outcome = match branch {
            Branch::Grazing => self.grazing(body, face, &plane, vector, rng, &mut report),
            Branch::Oblique => self.oblique(body, face, vector, &mut report),
            Branch::Opposed => Ok(false),
        };
        report.no_collision = match outcome {
            Ok(clear) => clear,
            Err(err) => {
                warn!(face, %err, "treating face as colliding");
                report.diagnostics.push(Diagnostic::for_face(face, err.to_string()));
                false
            }
        };
        report.status = FaceStatus::from_outcome(report.no_collision, branch == Branch::Grazing);
        Ok(report)
    }

    fn grazing(
        &self,
        body: &BrepBody,
        face: usize,
        plane: &Plane,
        vector: &Vector3,
        rng: &mut impl Rng,
        report: &mut RegionReport,
    ) -> Result<bool> {
        let tol = self.params.tolerance;
        let outer = body.face_loops(face)?.outer;
        let face_region = Region2::from_loops(&[project(plane, &outer)], LoopFill::NonZero);
        let swept = swept_region(plane, &outer, vector);

        let section = self.kernel.section(self.target, plane, tol)?;
        if section.is_empty() {
            return Err(construction("face plane does not cut the body"));
        }
        let loops: Vec<Vec<Point2>> = section.iter().map(|l| project(plane, l)).collect();
        let behind = Region2::from_loops(&loops, LoopFill::NonZero);

        let critical = behind.difference(&face_region).intersection(&swept);
        let resolution = self.params.surface_resolution.max(1);
        for shape in critical.shapes() {
            let area = shape.area();
            if area <= tol {
                debug!(face, area, "dropping sliver");
                continue;
            }
            report.critical_areas.push(area);
            let samples = sample_region(
                &shape.to_region(),
                resolution,
                resolution.saturating_mul(resolution),
                tol,
                self.params.max_resolution,
                rng,
            )?;
            for uv in samples {
                let point = plane.lift(&uv);
                report.checked_points.push(point);
                match self.kernel.classify_point(self.target, &point, tol) {
                    PointClassification::Inside => {
                        debug!(face, ?point, "material in the swept region");
                        return Ok(false);
                    }
                    PointClassification::Unknown => {
                        warn!(face, ?point, "unclassified point in the swept region");
                        report.diagnostics.push(Diagnostic::for_face(
                            face,
                            format!(
                                "could not classify point ({:.6}, {:.6}, {:.6})",
                                point.x, point.y, point.z
                            ),
                        ));
                        return Ok(false);
                    }
                    PointClassification::Outside | PointClassification::OnBoundary => {}
                }
            }
        }
        Ok(true)
    }

    fn oblique(
        &self,
        body: &BrepBody,
        face: usize,
        vector: &Vector3,
        report: &mut RegionReport,
    ) -> Result<bool> {
        let tol = self.params.tolerance;
        let face_id = body.face_ids()[face];
        let mesh = TessellateFace::new(face_id).execute(body.store())?;
        let triangles: Vec<[Point3; 3]> = mesh.triangles().collect();
        let swept = self.kernel.sweep_triangles(&triangles, vector)?;
        report.pieces = self.kernel.overlap(self.target, &swept, tol)?;
        let length = vector.norm();
        Ok(report.pieces.iter().all(|piece| {
            let depth = mean_travel_in_material(piece, swept.prisms(), length);
            debug!(face, volume = piece.volume, depth, "overlap piece");
            depth <= tol
        }))
    }
}

/// Mean distance the piece's triangles travel through material: the filled
/// fraction of their prisms times the sweep length.
fn mean_travel_in_material(piece: &OverlapPiece, prisms: &[Prism], length: f64) -> f64 {
    let capacity: f64 = piece
        .prisms
        .iter()
        .filter_map(|&i| prisms.get(i))
        .map(Prism::volume)
        .sum();
    if capacity > 0.0 {
        piece.volume / capacity * length
    } else {
        0.0
    }
}

fn construction(message: &str) -> DemoldError {
    AnalysisError::Construction(message.into()).into()
}

fn project(plane: &Plane, points: &[Point3]) -> Vec<Point2> {
    points.iter().map(|p| plane.project(p)).collect()
}

/// Area covered in `plane` by the loop `outer` moving along `vector`: the
/// loop at both ends plus the quad each edge sweeps.
fn swept_region(plane: &Plane, outer: &[Point3], vector: &Vector3) -> Region2 {
    let moved: Vec<Point3> = outer.iter().map(|p| p + vector).collect();
    let n = outer.len();
    let mut loops: Vec<Vec<Point2>> = (0..n)
        .map(|i| {
            let j = (i + 1) % n;
            project(plane, &[outer[i], outer[j], moved[j], moved[i]])
        })
        .collect();
    loops.push(project(plane, outer));
    loops.push(project(plane, &moved));
    for ring in &mut loops {
        if signed_area(ring) < 0.0 {
            ring.reverse();
        }
    }
    Region2::from_loops(&loops, LoopFill::NonZero)
}
