use crate::error::{GeometryError, Result};
use crate::math::{Point2, Point3, Vector3, TOLERANCE};

/// An infinite plane in 3D space, carrying a right-handed orthonormal frame.
///
/// Defined by an origin point and two orthogonal unit vectors
/// (`u_dir`, `v_dir`). The normal is `u_dir × v_dir`.
///
/// Parametric form: `P(u, v) = origin + u * u_dir + v * v_dir`.
#[derive(Debug, Clone)]
pub struct Plane {
    origin: Point3,
    u_dir: Vector3,
    v_dir: Vector3,
    normal: Vector3,
}

impl Plane {
    /// Creates a plane from an origin and an in-plane direction pair.
    ///
    /// `v_dir` is orthogonalized against `u_dir`, so any non-parallel pair works.
    ///
    /// # Errors
    ///
    /// Returns an error if either direction is zero-length or the two are
    /// parallel (degenerate plane).
    pub fn new(origin: Point3, u_dir: Vector3, v_dir: Vector3) -> Result<Self> {
        let u_len = u_dir.norm();
        if u_len < TOLERANCE {
            return Err(GeometryError::ZeroVector.into());
        }
        if v_dir.norm() < TOLERANCE {
            return Err(GeometryError::ZeroVector.into());
        }

        let u_dir = u_dir / u_len;
        let normal = u_dir.cross(&v_dir);
        let normal_len = normal.norm();
        if normal_len < TOLERANCE * v_dir.norm() {
            return Err(
                GeometryError::Degenerate("plane directions are parallel".into()).into(),
            );
        }
        let normal = normal / normal_len;
        let v_dir = normal.cross(&u_dir);

        Ok(Self {
            origin,
            u_dir,
            v_dir,
            normal,
        })
    }

    /// Creates a plane from an origin and a normal vector.
    ///
    /// The U and V directions are computed automatically.
    ///
    /// # Errors
    ///
    /// Returns an error if the normal vector is zero-length.
    pub fn from_normal(origin: Point3, normal: Vector3) -> Result<Self> {
        let len = normal.norm();
        if len < TOLERANCE {
            return Err(GeometryError::ZeroVector.into());
        }
        let normal = normal / len;

        // Choose a reference vector not parallel to the normal
        let reference = if normal.x.abs() < 0.9 {
            Vector3::new(1.0, 0.0, 0.0)
        } else {
            Vector3::new(0.0, 1.0, 0.0)
        };

        let u_dir = reference.cross(&normal).normalize();
        let v_dir = normal.cross(&u_dir);

        Ok(Self {
            origin,
            u_dir,
            v_dir,
            normal,
        })
    }

    /// Frame through three points: origin `a`, U toward `b`, V on the side of `c`.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::Degenerate`] if the corner angle at `a` is
    /// smaller than `angle_tolerance` (radians) or either leg is zero-length.
    pub fn through_points(a: &Point3, b: &Point3, c: &Point3, angle_tolerance: f64) -> Result<Self> {
        let ab = b - a;
        let ac = c - a;
        let (ab_len, ac_len) = (ab.norm(), ac.norm());
        if ab_len < TOLERANCE || ac_len < TOLERANCE {
            return Err(GeometryError::Degenerate("frame leg has zero length".into()).into());
        }
        let sin = (ab.cross(&ac).norm() / (ab_len * ac_len)).min(1.0);
        if sin.asin() < angle_tolerance.max(TOLERANCE) {
            return Err(GeometryError::Degenerate("frame points are collinear".into()).into());
        }
        Self::new(*a, ab, ac)
    }

    /// Returns the origin point of the plane.
    #[must_use]
    pub fn origin(&self) -> &Point3 {
        &self.origin
    }

    /// Returns the U direction vector.
    #[must_use]
    pub fn u_dir(&self) -> &Vector3 {
        &self.u_dir
    }

    /// Returns the V direction vector.
    #[must_use]
    pub fn v_dir(&self) -> &Vector3 {
        &self.v_dir
    }

    /// Returns the normal vector of the plane.
    #[must_use]
    pub fn plane_normal(&self) -> &Vector3 {
        &self.normal
    }

    /// Point at plane coordinates `(u, v)`.
    #[must_use]
    pub fn evaluate(&self, u: f64, v: f64) -> Point3 {
        self.origin + self.u_dir * u + self.v_dir * v
    }

    /// Lifts a UV point back into 3D.
    #[must_use]
    pub fn lift(&self, uv: &Point2) -> Point3 {
        self.evaluate(uv.x, uv.y)
    }

    /// Orthogonal projection of a 3D point into plane coordinates.
    #[must_use]
    pub fn project(&self, point: &Point3) -> Point2 {
        let d = point - self.origin;
        Point2::new(d.dot(&self.u_dir), d.dot(&self.v_dir))
    }

    /// Signed distance of `point` along the normal.
    #[must_use]
    pub fn signed_distance(&self, point: &Point3) -> f64 {
        (point - self.origin).dot(&self.normal)
    }

    /// Same plane with the normal reversed (U kept, V flipped).
    #[must_use]
    pub fn flipped(&self) -> Self {
        Self {
            origin: self.origin,
            u_dir: self.u_dir,
            v_dir: -self.v_dir,
            normal: -self.normal,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn p(x: f64, y: f64, z: f64) -> Point3 {
        Point3::new(x, y, z)
    }

    #[test]
    fn from_normal_builds_right_handed_frame() {
        let plane = Plane::from_normal(p(0.0, 0.0, 0.0), Vector3::new(0.0, 0.0, 2.0)).unwrap();
        let n = plane.u_dir().cross(plane.v_dir());
        assert_relative_eq!(n, *plane.plane_normal(), epsilon = 1e-12);
        assert_relative_eq!(plane.plane_normal().z, 1.0);
    }

    #[test]
    fn new_orthogonalizes_v() {
        let plane = Plane::new(
            p(0.0, 0.0, 0.0),
            Vector3::new(1.0, 0.0, 0.0),
            Vector3::new(1.0, 1.0, 0.0),
        )
        .unwrap();
        assert_relative_eq!(plane.u_dir().dot(plane.v_dir()), 0.0, epsilon = 1e-12);
        assert_relative_eq!(*plane.v_dir(), Vector3::new(0.0, 1.0, 0.0), epsilon = 1e-12);
    }

    #[test]
    fn project_and_lift_round_trip() {
        let plane = Plane::from_normal(p(1.0, 2.0, 3.0), Vector3::new(1.0, 1.0, 1.0)).unwrap();
        let q = plane.evaluate(0.75, -1.5);
        let uv = plane.project(&q);
        assert_relative_eq!(uv, Point2::new(0.75, -1.5), epsilon = 1e-12);
        assert_relative_eq!(plane.lift(&uv), q, epsilon = 1e-12);
        assert_relative_eq!(plane.signed_distance(&q), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn through_points_rejects_collinear() {
        let result = Plane::through_points(
            &p(0.0, 0.0, 0.0),
            &p(1.0, 0.0, 0.0),
            &p(2.0, 1e-6, 0.0),
            std::f64::consts::PI / 180.0,
        );
        assert!(result.is_err());
    }

    #[test]
    fn through_points_keeps_third_point_on_positive_v() {
        let plane = Plane::through_points(
            &p(0.0, 0.0, 0.0),
            &p(2.0, 0.0, 0.0),
            &p(0.5, -3.0, 0.0),
            0.0,
        )
        .unwrap();
        assert!(plane.project(&p(0.5, -3.0, 0.0)).y > 0.0);
        assert_relative_eq!(plane.plane_normal().z, -1.0, epsilon = 1e-12);
    }

    #[test]
    fn zero_normal_is_rejected() {
        assert!(Plane::from_normal(p(0.0, 0.0, 0.0), Vector3::zeros()).is_err());
    }
}
