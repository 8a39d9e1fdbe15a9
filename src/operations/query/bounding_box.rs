use crate::math::{Point3, Vector3};

/// An axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    /// Minimum corner of the bounding box.
    pub min: Point3,
    /// Maximum corner of the bounding box.
    pub max: Point3,
}

impl Aabb {
    /// Smallest box containing all `points`, `None` if there are none.
    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a Point3>) -> Option<Self> {
        let mut iter = points.into_iter();
        let first = *iter.next()?;
        let (min, max) = iter.fold((first, first), |(lo, hi), p| (lo.inf(p), hi.sup(p)));
        Some(Self { min, max })
    }

    /// Edge lengths along x, y and z.
    #[must_use]
    pub fn size(&self) -> Vector3 {
        self.max - self.min
    }

    /// Length of the main diagonal.
    #[must_use]
    pub fn diagonal(&self) -> f64 {
        self.size().norm()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn bounds_enclose_every_point() {
        let points = [
            Point3::new(-1.0, 4.0, 0.5),
            Point3::new(3.0, 2.0, 1.5),
            Point3::new(0.0, 3.0, 1.0),
        ];
        let aabb = Aabb::from_points(&points).unwrap();
        assert_eq!(aabb.min, Point3::new(-1.0, 2.0, 0.5));
        assert_eq!(aabb.max, Point3::new(3.0, 4.0, 1.5));
        assert_relative_eq!(aabb.diagonal(), 21.0_f64.sqrt(), epsilon = 1e-12);
    }

    #[test]
    fn empty_point_set_has_no_box() {
        assert!(Aabb::from_points(std::iter::empty()).is_none());
    }
}
