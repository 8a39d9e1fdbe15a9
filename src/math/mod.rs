pub mod clip_3d;
pub mod intersect_3d;
pub mod polygon_2d;
pub mod polygon_3d;
pub mod region_2d;

/// 2D point type.
pub type Point2 = nalgebra::Point2<f64>;

/// 3D point type.
pub type Point3 = nalgebra::Point3<f64>;

/// 3D vector type.
pub type Vector3 = nalgebra::Vector3<f64>;

/// Global geometric tolerance for floating-point comparisons.
///
/// This is the numerical noise floor. Model tolerances used by the
/// analyses (default `1e-3`) live in [`crate::analysis::AnalysisParams`].
pub const TOLERANCE: f64 = 1e-10;

/// Snaps a point to an integer grid of spacing `cell`.
///
/// Points closer than `cell` usually share a key; callers that weld by key
/// accept the rare split across a cell boundary.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn grid_key(point: &Point3, cell: f64) -> [i64; 3] {
    [
        (point.x / cell).round() as i64,
        (point.y / cell).round() as i64,
        (point.z / cell).round() as i64,
    ]
}
