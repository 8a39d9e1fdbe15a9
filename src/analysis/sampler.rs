//! Test points on faces, inset from the face boundary.

use rand::Rng;
use tracing::debug;

use crate::body::FaceDomain;
use crate::error::{AnalysisError, Result};
use crate::geometry::Plane;
use crate::math::polygon_2d::area_centroid;
use crate::math::region_2d::Region2;
use crate::math::{Point2, Point3};

/// Largest accepted point density.
pub const MAX_POINT_DENSITY: u32 = 100;

/// Generates sample points on a face domain.
///
/// Triangles are sampled on a barycentric lattice of `density` steps per
/// side, quads as the two triangles `ABC` and `ACD`. Planar regions are
/// sampled on a jittered grid that is refined until `density²` points land
/// strictly inside.
#[derive(Debug, Clone, Copy)]
pub struct FaceSampler {
    density: u32,
    guard: f64,
    max_resolution: u32,
}

impl FaceSampler {
    /// Creates a sampler; `density` is clamped to `0..=100`.
    #[must_use]
    pub fn new(density: u32, guard: f64) -> Self {
        Self {
            density: density.min(MAX_POINT_DENSITY),
            guard,
            max_resolution: 64,
        }
    }

    /// Caps the grid resolution used for planar regions.
    #[must_use]
    pub fn with_max_resolution(mut self, max_resolution: u32) -> Self {
        self.max_resolution = max_resolution;
        self
    }

    #[must_use]
    pub fn density(&self) -> u32 {
        self.density
    }

    /// Samples a triangle: its centroid, then the lattice points.
    #[must_use]
    pub fn triangle(&self, tri: &[Point3; 3]) -> SamplePoints {
        SamplePoints::lattices(vec![TriangleLattice::new(tri, self.density, self.guard)])
    }

    /// Samples a quad `ABCD`. With density zero this is the single mean of
    /// the four corners.
    #[must_use]
    pub fn quad(&self, quad: &[Point3; 4]) -> SamplePoints {
        let [a, b, c, d] = *quad;
        if self.density == 0 {
            let mean = Point3::from((a.coords + b.coords + c.coords + d.coords) / 4.0);
            return SamplePoints::listed(vec![mean]);
        }
        SamplePoints::lattices(vec![
            TriangleLattice::new(&[a, b, c], self.density, self.guard),
            TriangleLattice::new(&[a, c, d], self.density, self.guard),
        ])
    }

    /// Samples a region of `plane`.
    ///
    /// # Errors
    ///
    /// Returns [`AnalysisError::SamplingExhausted`] if the region is too thin
    /// to hold the requested points at the maximum resolution.
    pub fn planar(&self, plane: &Plane, region: &Region2, rng: &mut impl Rng) -> Result<SamplePoints> {
        if self.density == 0 {
            let centroid = region
                .shapes()
                .first()
                .and_then(|s| area_centroid(s.outer()))
                .filter(|c| region.shapes().iter().any(|s| s.contains_strictly(c, self.guard)));
            let uv = match centroid {
                Some(c) => c,
                None => {
                    let grid = sample_region(region, 1, 1, self.guard, self.max_resolution, rng)?;
                    grid[0]
                }
            };
            return Ok(SamplePoints::listed(vec![plane.lift(&uv)]));
        }

        let d = self.density;
        let uv = sample_region(region, d, d.saturating_mul(d), self.guard, self.max_resolution, rng)?;
        Ok(SamplePoints::listed(uv.iter().map(|p| plane.lift(p)).collect()))
    }

    /// Samples any face domain.
    ///
    /// # Errors
    ///
    /// See [`FaceSampler::planar`]; triangle and quad domains never fail.
    pub fn generate(&self, domain: &FaceDomain, rng: &mut impl Rng) -> Result<SamplePoints> {
        match domain {
            FaceDomain::Triangle(tri) => Ok(self.triangle(tri)),
            FaceDomain::Quad(quad) => Ok(self.quad(quad)),
            FaceDomain::Planar { plane, region } => self.planar(plane, region, rng),
        }
    }
}

/// Jittered-grid points strictly inside `region`.
///
/// Starts with a `start × start` grid over the region's bounds, one point at
/// a random offset in each cell, and keeps the points further than `guard`
/// from every contour. Refines by one cell per side until at least `target`
/// points survive.
///
/// # Errors
///
/// Returns [`AnalysisError::SamplingExhausted`] once the resolution would
/// exceed `max_resolution`.
pub fn sample_region(
    region: &Region2,
    start: u32,
    target: u32,
    guard: f64,
    max_resolution: u32,
    rng: &mut impl Rng,
) -> Result<Vec<Point2>> {
    let bounds = region
        .shapes()
        .iter()
        .filter_map(|s| s.bounds())
        .reduce(|(lo, hi), (a, b)| (lo.inf(&a), hi.sup(&b)));
    let Some((lo, hi)) = bounds else {
        return Err(AnalysisError::SamplingExhausted { resolution: start }.into());
    };

    let size = hi - lo;
    let mut resolution = start.max(1);
    while resolution <= max_resolution {
        let cell = size / f64::from(resolution);
        let mut points = Vec::new();
        for i in 0..resolution {
            for j in 0..resolution {
                let candidate = Point2::new(
                    lo.x + (f64::from(i) + rng.random::<f64>()) * cell.x,
                    lo.y + (f64::from(j) + rng.random::<f64>()) * cell.y,
                );
                if region.shapes().iter().any(|s| s.contains_strictly(&candidate, guard)) {
                    points.push(candidate);
                }
            }
        }
        debug!(resolution, kept = points.len(), target, "region sampling pass");
        if points.len() >= target as usize && !points.is_empty() {
            return Ok(points);
        }
        let Some(next) = resolution.checked_add(1) else {
            break;
        };
        resolution = next;
    }
    Err(AnalysisError::SamplingExhausted {
        resolution: max_resolution,
    }
    .into())
}

/// Lazily produced sample points of one face.
#[derive(Debug, Clone)]
pub struct SamplePoints {
    inner: Source,
}

#[derive(Debug, Clone)]
enum Source {
    Lattices {
        parts: Vec<TriangleLattice>,
        current: usize,
    },
    Listed(std::vec::IntoIter<Point3>),
}

impl SamplePoints {
    fn lattices(parts: Vec<TriangleLattice>) -> Self {
        Self {
            inner: Source::Lattices { parts, current: 0 },
        }
    }

    fn listed(points: Vec<Point3>) -> Self {
        Self {
            inner: Source::Listed(points.into_iter()),
        }
    }
}

impl Iterator for SamplePoints {
    type Item = Point3;

    fn next(&mut self) -> Option<Point3> {
        match &mut self.inner {
            Source::Listed(iter) => iter.next(),
            Source::Lattices { parts, current } => loop {
                let part = parts.get_mut(*current)?;
                if let Some(p) = part.next() {
                    return Some(p);
                }
                *current += 1;
            },
        }
    }
}

/// Centroid followed by the points `(i·A + j·B + k·C) / n`, `i + j + k = n`,
/// over the corners pulled toward the centroid by the guard distance.
#[derive(Debug, Clone)]
struct TriangleLattice {
    corners: [Point3; 3],
    centroid: Point3,
    n: u32,
    i: u32,
    j: u32,
    centroid_done: bool,
}

impl TriangleLattice {
    fn new(tri: &[Point3; 3], n: u32, guard: f64) -> Self {
        let centroid = Point3::from((tri[0].coords + tri[1].coords + tri[2].coords) / 3.0);
        let corners = tri.map(|v| {
            let to_centroid = centroid - v;
            let dist = to_centroid.norm();
            if dist == 0.0 {
                v
            } else {
                v + to_centroid * (guard.min(dist) / dist)
            }
        });
        Self {
            corners,
            centroid,
            n,
            i: 0,
            j: 0,
            centroid_done: false,
        }
    }
}

impl Iterator for TriangleLattice {
    type Item = Point3;

    fn next(&mut self) -> Option<Point3> {
        if !self.centroid_done {
            self.centroid_done = true;
            return Some(self.centroid);
        }
        if self.n == 0 || self.i > self.n {
            return None;
        }
        let (i, j) = (self.i, self.j);
        let k = self.n - i - j;
        let n = f64::from(self.n);
        let [a, b, c] = self.corners;
        let point = Point3::from(
            (a.coords * f64::from(i) + b.coords * f64::from(j) + c.coords * f64::from(k)) / n,
        );

        if j < self.n - i {
            self.j += 1;
        } else {
            self.i += 1;
            self.j = 0;
        }
        Some(point)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::math::region_2d::LoopFill;
    use crate::math::Vector3;
    use approx::assert_relative_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn p(x: f64, y: f64, z: f64) -> Point3 {
        Point3::new(x, y, z)
    }

    fn tri() -> [Point3; 3] {
        [p(0.0, 0.0, 0.0), p(3.0, 0.0, 0.0), p(0.0, 3.0, 0.0)]
    }

    fn square_region(side: f64) -> Region2 {
        let pts = vec![
            Point2::new(0.0, 0.0),
            Point2::new(side, 0.0),
            Point2::new(side, side),
            Point2::new(0.0, side),
        ];
        Region2::from_loops(&[pts], LoopFill::EvenOdd)
    }

    #[test]
    fn density_zero_gives_the_centroid() {
        let pts: Vec<_> = FaceSampler::new(0, 1e-3).triangle(&tri()).collect();
        assert_eq!(pts, vec![p(1.0, 1.0, 0.0)]);

        let quad = [p(0.0, 0.0, 0.0), p(2.0, 0.0, 0.0), p(2.0, 4.0, 0.0), p(0.0, 4.0, 0.0)];
        let pts: Vec<_> = FaceSampler::new(0, 1e-3).quad(&quad).collect();
        assert_eq!(pts, vec![p(1.0, 2.0, 0.0)]);
    }

    #[test]
    fn lattice_count_matches_formula() {
        for n in 1..6u32 {
            let count = FaceSampler::new(n, 1e-3).triangle(&tri()).count();
            assert_eq!(count, 1 + ((n + 1) * (n + 2) / 2) as usize);
        }
        let quad = [p(0.0, 0.0, 0.0), p(1.0, 0.0, 0.0), p(1.0, 1.0, 0.0), p(0.0, 1.0, 0.0)];
        assert_eq!(FaceSampler::new(2, 1e-3).quad(&quad).count(), 2 * 7);
    }

    #[test]
    fn count_never_decreases_with_density() {
        let quad = [p(0.0, 0.0, 0.0), p(1.0, 0.0, 0.0), p(1.0, 1.0, 0.0), p(0.0, 1.0, 0.0)];
        let sizes: Vec<usize> = (0..8)
            .map(|n| FaceSampler::new(n, 1e-3).quad(&quad).count())
            .collect();
        assert!(sizes.windows(2).all(|w| w[1] >= w[0]));
    }

    #[test]
    fn lattice_points_are_inset() {
        let guard = 0.01;
        for q in FaceSampler::new(4, guard).triangle(&tri()) {
            // Corners move along the medians, so the inset is at least guard / sqrt(5).
            assert!(q.x >= guard * 0.4 && q.y >= guard * 0.4, "{q:?} on the boundary");
            assert!(q.x + q.y <= 3.0 - guard * 0.4);
        }
    }

    #[test]
    fn corner_move_never_passes_the_centroid() {
        let tiny = [p(0.0, 0.0, 0.0), p(1e-4, 0.0, 0.0), p(0.0, 1e-4, 0.0)];
        let pts: Vec<_> = FaceSampler::new(1, 1.0).triangle(&tiny).collect();
        let centroid = pts[0];
        for q in &pts[1..] {
            assert_relative_eq!(*q, centroid, epsilon = 1e-15);
        }
    }

    #[test]
    fn density_is_clamped() {
        assert_eq!(FaceSampler::new(1000, 1e-3).density(), MAX_POINT_DENSITY);
    }

    #[test]
    fn planar_points_lie_in_region_and_plane() {
        let plane = Plane::from_normal(p(0.0, 0.0, 2.0), Vector3::z()).unwrap();
        let region = square_region(1.0);
        let mut rng = StdRng::seed_from_u64(1);
        let pts: Vec<_> = FaceSampler::new(3, 1e-3)
            .planar(&plane, &region, &mut rng)
            .unwrap()
            .collect();
        assert!(pts.len() >= 9);
        for q in &pts {
            assert_relative_eq!(q.z, 2.0, epsilon = 1e-12);
            assert!(region.shapes()[0].contains_strictly(&plane.project(q), 1e-3));
        }
    }

    #[test]
    fn planar_density_zero_uses_area_centroid() {
        let plane = Plane::from_normal(p(0.0, 0.0, 0.0), Vector3::z()).unwrap();
        let mut rng = StdRng::seed_from_u64(1);
        let pts: Vec<_> = FaceSampler::new(0, 1e-3)
            .planar(&plane, &square_region(2.0), &mut rng)
            .unwrap()
            .collect();
        assert_eq!(pts.len(), 1);
        assert_relative_eq!(plane.project(&pts[0]), Point2::new(1.0, 1.0), epsilon = 1e-12);
    }

    #[test]
    fn sliver_exhausts_the_resolution_cap() {
        let sliver = Region2::from_loops(
            &[vec![
                Point2::new(0.0, 0.0),
                Point2::new(1.0, 0.0),
                Point2::new(1.0, 0.0015),
                Point2::new(0.0, 0.0015),
            ]],
            LoopFill::EvenOdd,
        );
        let mut rng = StdRng::seed_from_u64(3);
        let result = sample_region(&sliver, 3, 9, 1e-3, 8, &mut rng);
        assert!(matches!(
            result,
            Err(crate::DemoldError::Analysis(AnalysisError::SamplingExhausted { resolution: 8 }))
        ));
    }

    #[test]
    fn huge_targets_exhaust_instead_of_overflowing() {
        let mut rng = StdRng::seed_from_u64(3);
        let region = square_region(1.0);
        let result = sample_region(&region, u32::MAX, u32::MAX, 1e-3, 4, &mut rng);
        assert!(matches!(
            result,
            Err(crate::DemoldError::Analysis(AnalysisError::SamplingExhausted { resolution: 4 }))
        ));
        // Density is clamped, but the product must not overflow either way.
        let plane = Plane::from_normal(p(0.0, 0.0, 0.0), Vector3::z()).unwrap();
        let sampler = FaceSampler::new(u32::MAX, 1e-3).with_max_resolution(4);
        assert!(sampler.planar(&plane, &region, &mut rng).is_err());
    }

    #[test]
    fn empty_region_cannot_be_sampled() {
        let mut rng = StdRng::seed_from_u64(3);
        assert!(sample_region(&Region2::empty(), 3, 9, 1e-3, 64, &mut rng).is_err());
    }
}
