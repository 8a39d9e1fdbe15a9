//! Removal-direction collision analysis.
//!
//! Every analysis validates its inputs through [`gate`], samples faces
//! with [`sampler::FaceSampler`], and asks a
//! [`GeometryKernel`](crate::kernel::GeometryKernel) whether the sampled
//! material can be withdrawn along a removal vector. Anything that cannot be
//! decided is reported as colliding, with a [`Diagnostic`].

pub mod coverage;
pub mod gate;
pub mod oriented_box;
pub mod ray_collision;
pub mod region_collision;
pub mod removal_vectors;
pub mod sampler;

use std::fmt;

use rand::rngs::StdRng;
use rand::SeedableRng;

/// Tolerances and sampling controls shared by all analyses.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnalysisParams {
    /// Model distance tolerance; also the sampling guard distance and the
    /// ray start offset.
    pub tolerance: f64,
    /// `|n · v|` at or below this is a grazing removal.
    pub perpendicular_threshold: f64,
    /// Smallest corner angle (radians) of a usable box frame.
    pub angle_tolerance: f64,
    /// Face sampling density, clamped to `0..=100` at use.
    pub point_density: u32,
    /// Starting grid resolution for critical regions.
    pub surface_resolution: u32,
    /// Grid resolution at which region sampling gives up.
    pub max_resolution: u32,
    /// Seed for the sampling jitter.
    pub seed: u64,
}

impl Default for AnalysisParams {
    fn default() -> Self {
        Self {
            tolerance: 1e-3,
            perpendicular_threshold: 1e-3,
            angle_tolerance: 1f64.to_radians(),
            point_density: 1,
            surface_resolution: 3,
            max_resolution: 64,
            seed: 0x5eed,
        }
    }
}

impl AnalysisParams {
    #[must_use]
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    #[must_use]
    pub fn with_perpendicular_threshold(mut self, threshold: f64) -> Self {
        self.perpendicular_threshold = threshold;
        self
    }

    #[must_use]
    pub fn with_angle_tolerance(mut self, radians: f64) -> Self {
        self.angle_tolerance = radians;
        self
    }

    #[must_use]
    pub fn with_point_density(mut self, density: u32) -> Self {
        self.point_density = density;
        self
    }

    #[must_use]
    pub fn with_surface_resolution(mut self, resolution: u32) -> Self {
        self.surface_resolution = resolution;
        self
    }

    #[must_use]
    pub fn with_max_resolution(mut self, resolution: u32) -> Self {
        self.max_resolution = resolution;
        self
    }

    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// A fresh generator seeded from [`AnalysisParams::seed`].
    #[must_use]
    pub fn rng(&self) -> StdRng {
        StdRng::seed_from_u64(self.seed)
    }
}

/// Something an analysis could not decide, attached to a face when known.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub face: Option<usize>,
    pub message: String,
}

impl Diagnostic {
    pub(crate) fn for_face(face: usize, message: impl Into<String>) -> Self {
        Self {
            face: Some(face),
            message: message.into(),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.face {
            Some(face) => write!(f, "face {face}: {}", self.message),
            None => f.write_str(&self.message),
        }
    }
}

/// Per-face outcome for one removal vector, as shown to a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaceStatus {
    /// Removable without collision.
    Clear,
    /// Removable, but the vector runs along the face.
    ClearGrazing,
    Colliding,
}

impl FaceStatus {
    #[must_use]
    pub fn is_clear(self) -> bool {
        self != Self::Colliding
    }

    pub(crate) fn from_outcome(no_collision: bool, grazing: bool) -> Self {
        match (no_collision, grazing) {
            (false, _) => Self::Colliding,
            (true, true) => Self::ClearGrazing,
            (true, false) => Self::Clear,
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Routes `tracing` output to the test harness; honours `RUST_LOG`.
    pub(crate) fn init_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    }

    #[test]
    fn defaults() {
        let params = AnalysisParams::default();
        assert!((params.tolerance - 1e-3).abs() < f64::EPSILON);
        assert_eq!(params.point_density, 1);
        assert_eq!(params.surface_resolution, 3);
        assert_eq!(params.max_resolution, 64);
        let tuned = params.with_point_density(4).with_seed(9);
        assert_eq!(tuned.point_density, 4);
        assert_eq!(tuned.seed, 9);
    }

    #[test]
    fn same_seed_same_jitter() {
        use rand::Rng;
        let params = AnalysisParams::default();
        let a: f64 = params.rng().random();
        let b: f64 = params.rng().random();
        assert!((a - b).abs() < f64::EPSILON);
    }

    #[test]
    fn status_from_outcome() {
        assert_eq!(FaceStatus::from_outcome(true, false), FaceStatus::Clear);
        assert_eq!(FaceStatus::from_outcome(true, true), FaceStatus::ClearGrazing);
        assert_eq!(FaceStatus::from_outcome(false, true), FaceStatus::Colliding);
        assert!(FaceStatus::ClearGrazing.is_clear());
    }

    #[test]
    fn diagnostic_display() {
        let d = Diagnostic::for_face(3, "section open");
        assert_eq!(d.to_string(), "face 3: section open");
    }
}
