use super::{Point3, Vector3, TOLERANCE};

/// A ray/triangle hit: ray parameter plus barycentric coordinates of the hit.
#[derive(Debug, Clone, Copy)]
pub struct TriangleHit {
    /// Distance along the ray in units of the direction vector.
    pub t: f64,
    /// Barycentric weight of the second vertex.
    pub u: f64,
    /// Barycentric weight of the third vertex.
    pub v: f64,
}

impl TriangleHit {
    /// Smallest barycentric weight; near zero means the hit grazes an edge.
    #[must_use]
    pub fn edge_margin(&self) -> f64 {
        self.u.min(self.v).min(1.0 - self.u - self.v)
    }
}

/// Möller–Trumbore ray/triangle intersection.
///
/// Returns hits with `t >= 0` only, including hits on the triangle's edges.
/// Rays parallel to the triangle's plane never hit.
#[must_use]
pub fn ray_triangle_intersect(
    origin: &Point3,
    dir: &Vector3,
    tri: &[Point3; 3],
) -> Option<TriangleHit> {
    let e1 = tri[1] - tri[0];
    let e2 = tri[2] - tri[0];
    let pvec = dir.cross(&e2);
    let det = e1.dot(&pvec);
    let scale = e1.norm() * e2.norm() * dir.norm();
    if det.abs() <= TOLERANCE * scale.max(TOLERANCE) {
        return None;
    }
    let inv_det = 1.0 / det;

    let tvec = origin - tri[0];
    let u = tvec.dot(&pvec) * inv_det;
    if !(-TOLERANCE..=1.0 + TOLERANCE).contains(&u) {
        return None;
    }

    let qvec = tvec.cross(&e1);
    let v = dir.dot(&qvec) * inv_det;
    if v < -TOLERANCE || u + v > 1.0 + TOLERANCE {
        return None;
    }

    let t = e2.dot(&qvec) * inv_det;
    if t < 0.0 {
        return None;
    }
    Some(TriangleHit { t, u, v })
}

/// Closest point on a triangle to `point` (Ericson, Real-Time Collision Detection 5.1.5).
#[must_use]
pub fn closest_point_on_triangle(point: &Point3, tri: &[Point3; 3]) -> Point3 {
    let [a, b, c] = tri;
    let ab = b - a;
    let ac = c - a;
    let ap = point - a;
    let d1 = ab.dot(&ap);
    let d2 = ac.dot(&ap);
    if d1 <= 0.0 && d2 <= 0.0 {
        return *a;
    }

    let bp = point - b;
    let d3 = ab.dot(&bp);
    let d4 = ac.dot(&bp);
    if d3 >= 0.0 && d4 <= d3 {
        return *b;
    }

    let vc = d1 * d4 - d3 * d2;
    if vc <= 0.0 && d1 >= 0.0 && d3 <= 0.0 {
        let v = d1 / (d1 - d3);
        return a + ab * v;
    }

    let cp = point - c;
    let d5 = ab.dot(&cp);
    let d6 = ac.dot(&cp);
    if d6 >= 0.0 && d5 <= d6 {
        return *c;
    }

    let vb = d5 * d2 - d1 * d6;
    if vb <= 0.0 && d2 >= 0.0 && d6 <= 0.0 {
        let w = d2 / (d2 - d6);
        return a + ac * w;
    }

    let va = d3 * d6 - d5 * d4;
    if va <= 0.0 && (d4 - d3) >= 0.0 && (d5 - d6) >= 0.0 {
        let w = (d4 - d3) / ((d4 - d3) + (d5 - d6));
        return b + (c - b) * w;
    }

    let denom = 1.0 / (va + vb + vc);
    let v = vb * denom;
    let w = vc * denom;
    a + ab * v + ac * w
}
