use super::Point2;

/// Computes the signed area of a closed 2D loop (shoelace formula).
///
/// Positive for counter-clockwise, negative for clockwise.
#[must_use]
pub fn signed_area(points: &[Point2]) -> f64 {
    let n = points.len();
    if n < 3 {
        return 0.0;
    }
    let mut sum = 0.0;
    for i in 0..n {
        let j = (i + 1) % n;
        sum += points[i].x * points[j].y - points[j].x * points[i].y;
    }
    sum * 0.5
}

/// Area centroid of a closed loop, `None` if it encloses no area.
#[must_use]
pub fn area_centroid(points: &[Point2]) -> Option<Point2> {
    let area = signed_area(points);
    if area.abs() < f64::EPSILON {
        return None;
    }
    let n = points.len();
    let (mut cx, mut cy) = (0.0, 0.0);
    for i in 0..n {
        let (a, b) = (points[i], points[(i + 1) % n]);
        let w = a.x * b.y - b.x * a.y;
        cx += (a.x + b.x) * w;
        cy += (a.y + b.y) * w;
    }
    Some(Point2::new(cx / (6.0 * area), cy / (6.0 * area)))
}

/// Winding number of `point` with respect to the closed loop `verts`.
///
/// Non-zero => inside, zero => outside.
#[must_use]
pub fn winding_number(point: &Point2, verts: &[Point2]) -> i32 {
    let n = verts.len();
    let mut winding = 0i32;
    for i in 0..n {
        let a = verts[i];
        let b = verts[(i + 1) % n];
        let side = cross_2d(b.x - a.x, b.y - a.y, point.x - a.x, point.y - a.y);

        if a.y <= point.y {
            if b.y > point.y && side > 0.0 {
                winding += 1;
            }
        } else if b.y <= point.y && side < 0.0 {
            winding -= 1;
        }
    }
    winding
}

/// Distance from `point` to the closest edge of the closed loop `verts`.
#[must_use]
pub fn distance_to_loop(point: &Point2, verts: &[Point2]) -> f64 {
    let n = verts.len();
    let mut best = f64::INFINITY;
    for i in 0..n {
        best = best.min(distance_to_segment(point, &verts[i], &verts[(i + 1) % n]));
    }
    best
}

/// Distance from `point` to the segment `a`–`b`.
#[must_use]
pub fn distance_to_segment(point: &Point2, a: &Point2, b: &Point2) -> f64 {
    let ab = b - a;
    let len_sq = ab.norm_squared();
    if len_sq == 0.0 {
        return (point - a).norm();
    }
    let t = ((point - a).dot(&ab) / len_sq).clamp(0.0, 1.0);
    (point - (a + ab * t)).norm()
}

/// Axis-aligned bounds `(min, max)` of a set of 2D points.
///
/// Returns `None` for an empty slice.
#[must_use]
pub fn bounds(points: &[Point2]) -> Option<(Point2, Point2)> {
    let first = points.first()?;
    let mut min = *first;
    let mut max = *first;
    for p in &points[1..] {
        min.x = min.x.min(p.x);
        min.y = min.y.min(p.y);
        max.x = max.x.max(p.x);
        max.y = max.y.max(p.y);
    }
    Some((min, max))
}

/// 2D cross product: `(ax * by - ay * bx)`.
#[inline]
fn cross_2d(ax: f64, ay: f64, bx: f64, by: f64) -> f64 {
    ax * by - ay * bx
}
