use crate::error::{GeometryError, Result};

use super::{Point3, Vector3, TOLERANCE};

/// Vector area of a closed polygon: half the sum of fan cross products.
///
/// Its direction is the right-hand normal of the loop and its length the
/// enclosed area, for planar loops.
#[must_use]
pub fn vector_area(points: &[Point3]) -> Vector3 {
    if points.len() < 3 {
        return Vector3::zeros();
    }
    let o = &points[0];
    let mut sum = Vector3::zeros();
    for i in 1..points.len() - 1 {
        sum += (points[i] - o).cross(&(points[i + 1] - o));
    }
    sum * 0.5
}

/// Computes the unit normal of a polygon using Newell's method.
///
/// # Errors
///
/// Returns [`GeometryError::Degenerate`] if the polygon encloses no area.
pub fn newell_normal(points: &[Point3]) -> Result<Vector3> {
    let n = points.len();
    let mut normal = Vector3::zeros();
    for i in 0..n {
        let curr = &points[i];
        let next = &points[(i + 1) % n];
        normal.x += (curr.y - next.y) * (curr.z + next.z);
        normal.y += (curr.z - next.z) * (curr.x + next.x);
        normal.z += (curr.x - next.x) * (curr.y + next.y);
    }
    let len = normal.norm();
    if len < TOLERANCE {
        return Err(
            GeometryError::Degenerate("polygon has no area, normal is undefined".into()).into(),
        );
    }
    Ok(normal / len)
}

/// Area centroid of a planar polygon.
///
/// Falls back to the vertex average when the polygon has no area.
#[must_use]
pub fn polygon_centroid_3d(points: &[Point3]) -> Point3 {
    let vertex_mean = || {
        let sum = points.iter().fold(Vector3::zeros(), |acc, p| acc + p.coords);
        #[allow(clippy::cast_precision_loss)]
        Point3::from(sum / points.len().max(1) as f64)
    };
    if points.len() < 3 {
        return vertex_mean();
    }

    let total = vector_area(points);
    let total_sq = total.norm_squared();
    if total_sq < TOLERANCE * TOLERANCE {
        return vertex_mean();
    }

    let o = points[0];
    let mut weighted = Vector3::zeros();
    for i in 1..points.len() - 1 {
        let a = points[i];
        let b = points[i + 1];
        let w = 0.5 * (a - o).cross(&(b - o)).dot(&total) / total_sq.sqrt();
        weighted += (o.coords + a.coords + b.coords) * (w / 3.0);
    }
    Point3::from(weighted / total_sq.sqrt())
}

/// Maximum distance of any point from the plane through `origin` with unit `normal`.
#[must_use]
pub fn max_plane_deviation(points: &[Point3], origin: &Point3, normal: &Vector3) -> f64 {
    points
        .iter()
        .map(|p| (p - origin).dot(normal).abs())
        .fold(0.0, f64::max)
}
