//! Candidate box orientations from convex hull facets, and fitting them
//! into a print volume.

use std::collections::HashSet;

use tracing::{debug, info};

use crate::body::SolidBody;
use crate::error::Result;
use crate::geometry::Plane;
use crate::kernel::{GeometryKernel, OrientedBox};
use crate::math::{grid_key, Point3};

use super::AnalysisParams;

/// Enumerates boxes aligned with the edges of the body's convex hull.
///
/// Each hull facet `(A, B, C)` gives three frames, one per corner, with the
/// x axis along the facet edge leaving that corner, so every candidate has
/// a face flush with a hull facet.
#[derive(Debug, Clone, Copy)]
pub struct OrientedBoxSearch<K> {
    kernel: K,
    tolerance: f64,
    angle_tolerance: f64,
}

impl<K: GeometryKernel + Copy> OrientedBoxSearch<K> {
    #[must_use]
    pub fn new(kernel: K, params: &AnalysisParams) -> Self {
        Self {
            kernel,
            tolerance: params.tolerance,
            angle_tolerance: params.angle_tolerance,
        }
    }

    /// Lazily yields one box per usable facet frame.
    ///
    /// # Errors
    ///
    /// Returns an error if the body's vertices are flat or too few for a hull.
    pub fn enumerate(&self, body: &SolidBody) -> Result<impl Iterator<Item = OrientedBox>> {
        let mut seen = HashSet::new();
        let points: Vec<Point3> = body
            .vertices()
            .into_iter()
            .filter(|p| seen.insert(grid_key(p, self.tolerance)))
            .collect();
        let hull = self
            .kernel
            .convex_hull(&points, self.tolerance, self.angle_tolerance)?;
        let facets: Vec<[Point3; 3]> = hull.triangles().collect();
        debug!(points = points.len(), facets = facets.len(), "hull built");

        let kernel = self.kernel;
        let angle_tolerance = self.angle_tolerance;
        let hull_points = hull.vertices;
        Ok(facets
            .into_iter()
            .flat_map(|[a, b, c]| [(a, b, c), (b, c, a), (c, a, b)])
            .filter_map(move |(origin, along, side)| {
                Plane::through_points(&origin, &along, &side, angle_tolerance).ok()
            })
            .map(move |frame| kernel.bounding_box_in_frame(&hull_points, &frame)))
    }
}

/// Picks the smallest candidate box that fits a printer's build volume.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PrintVolumeFit {
    /// Build volume edge lengths, ascending.
    target: [f64; 3],
}

impl Default for PrintVolumeFit {
    fn default() -> Self {
        Self::new(256.0, 256.0, 256.0)
    }
}

impl PrintVolumeFit {
    #[must_use]
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        let mut target = [x, y, z];
        target.sort_by(f64::total_cmp);
        Self { target }
    }

    /// Whether `candidate` fits in some axis permutation.
    #[must_use]
    pub fn fits(&self, candidate: &OrientedBox) -> bool {
        candidate
            .sorted_dimensions()
            .iter()
            .zip(&self.target)
            .all(|(dim, limit)| dim <= limit)
    }

    /// The minimum-volume candidate that fits; ties go to the smaller
    /// sorted dimensions. `None` if nothing fits.
    pub fn fit(&self, candidates: impl IntoIterator<Item = OrientedBox>) -> Option<OrientedBox> {
        let mut sorted: Vec<OrientedBox> = candidates.into_iter().collect();
        let total = sorted.len();
        sorted.sort_by(|a, b| {
            let (da, db) = (a.sorted_dimensions(), b.sorted_dimensions());
            da.iter()
                .zip(&db)
                .map(|(x, y)| x.total_cmp(y))
                .find(|o| o.is_ne())
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        let best = sorted
            .into_iter()
            .filter(|b| self.fits(b))
            .min_by(|a, b| a.volume().total_cmp(&b.volume()));
        info!(
            candidates = total,
            fitted = best.is_some(),
            volume = best.as_ref().map(OrientedBox::volume),
            "print volume fit"
        );
        best
    }
}
