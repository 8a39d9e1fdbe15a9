use super::{Point3, Vector3};

/// A closed half-space `{x : normal · x <= offset}`.
///
/// `normal` is unit length and points out of the half-space.
#[derive(Debug, Clone, Copy)]
pub struct HalfSpace {
    pub normal: Vector3,
    pub offset: f64,
}

impl HalfSpace {
    /// Half-space bounded by the plane through `point`, excluding the side `normal` points to.
    ///
    /// Returns `None` if `normal` has no length.
    #[must_use]
    pub fn through(point: &Point3, normal: &Vector3) -> Option<Self> {
        let n = normal.try_normalize(0.0)?;
        Some(Self {
            normal: n,
            offset: n.dot(&point.coords),
        })
    }

    /// Positive outside, negative inside.
    #[must_use]
    pub fn signed_distance(&self, point: &Point3) -> f64 {
        self.normal.dot(&point.coords) - self.offset
    }

    /// Whether every point lies on the bounding plane within `tolerance`.
    #[must_use]
    pub fn contains_all_on_plane(&self, points: &[Point3], tolerance: f64) -> bool {
        points
            .iter()
            .all(|p| self.signed_distance(p).abs() <= tolerance)
    }
}

/// Clips a polygon against one half-space (Sutherland–Hodgman step).
///
/// Orientation of the input loop is preserved.
#[must_use]
pub fn clip_polygon(polygon: &[Point3], half_space: &HalfSpace) -> Vec<Point3> {
    let n = polygon.len();
    if n == 0 {
        return Vec::new();
    }
    let mut out = Vec::with_capacity(n + 2);
    for i in 0..n {
        let cur = polygon[i];
        let next = polygon[(i + 1) % n];
        let dc = half_space.signed_distance(&cur);
        let dn = half_space.signed_distance(&next);

        if dc <= 0.0 {
            out.push(cur);
        }
        if (dc <= 0.0) != (dn <= 0.0) {
            let t = dc / (dc - dn);
            out.push(cur + (next - cur) * t);
        }
    }
    out
}

/// Clips a polygon against the intersection of several half-spaces.
#[must_use]
pub fn clip_polygon_all(polygon: &[Point3], half_spaces: &[HalfSpace]) -> Vec<Point3> {
    let mut current = polygon.to_vec();
    for hs in half_spaces {
        if current.len() < 3 {
            return Vec::new();
        }
        current = clip_polygon(&current, hs);
    }
    if current.len() < 3 {
        Vec::new()
    } else {
        current
    }
}
