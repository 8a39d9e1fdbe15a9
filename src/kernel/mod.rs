//! Geometric predicates consumed by the collision analyses.
//!
//! [`GeometryKernel`] is the seam between the analyses and the geometry
//! engine. [`PolyhedralKernel`] implements it for closed, planar-faced
//! bodies given as triangle meshes.

mod hull;
mod overlap;
mod polyhedral;
mod section;
mod sweep;

pub use overlap::OverlapPiece;
pub use polyhedral::PolyhedralKernel;
pub use sweep::{Prism, SweptVolume};

use crate::error::Result;
use crate::geometry::Plane;
use crate::math::{Point3, Vector3};
use crate::tessellation::TriangleMesh;

/// Nearest ray hit on a mesh.
#[derive(Debug, Clone, PartialEq)]
pub struct RayHit {
    /// Distance from the ray origin, in model units.
    pub distance: f64,
    pub point: Point3,
    /// Source faces (`face_ids`) of every triangle hit within tolerance of
    /// `distance`, sorted and deduplicated.
    pub faces: Vec<usize>,
}

/// Classification of a point relative to a solid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointClassification {
    Inside,
    Outside,
    OnBoundary,
    /// The kernel could not decide, e.g. every parity ray hit an edge.
    Unknown,
}

impl PointClassification {
    /// Inside and further than tolerance from the boundary.
    #[must_use]
    pub fn is_strictly_inside(self) -> bool {
        self == Self::Inside
    }

    /// Inside or on the boundary. [`PointClassification::Unknown`] is
    /// neither.
    #[must_use]
    pub fn is_inside_or_on(self) -> bool {
        matches!(self, Self::Inside | Self::OnBoundary)
    }
}

/// A box aligned with an arbitrary orthonormal frame.
///
/// The frame is a [`Plane`]: its `u`, `v` and normal directions are the box
/// x, y and z axes. `min` and `max` are coordinates in that frame.
#[derive(Debug, Clone)]
pub struct OrientedBox {
    pub frame: Plane,
    pub min: Vector3,
    pub max: Vector3,
}

impl OrientedBox {
    /// Edge lengths along the frame's x, y and z axes.
    #[must_use]
    pub fn dimensions(&self) -> Vector3 {
        self.max - self.min
    }

    /// Edge lengths in ascending order.
    #[must_use]
    pub fn sorted_dimensions(&self) -> [f64; 3] {
        let d = self.dimensions();
        let mut dims = [d.x, d.y, d.z];
        dims.sort_by(f64::total_cmp);
        dims
    }

    #[must_use]
    pub fn volume(&self) -> f64 {
        let d = self.dimensions();
        d.x * d.y * d.z
    }

    /// The eight corners in world coordinates.
    #[must_use]
    pub fn corners(&self) -> [Point3; 8] {
        let f = &self.frame;
        std::array::from_fn(|i| {
            let x = if i & 1 == 0 { self.min.x } else { self.max.x };
            let y = if i & 2 == 0 { self.min.y } else { self.max.y };
            let z = if i & 4 == 0 { self.min.z } else { self.max.z };
            f.origin() + f.u_dir() * x + f.v_dir() * y + f.plane_normal() * z
        })
    }
}

/// Geometric queries on closed triangle meshes.
///
/// All queries are pure. Meshes passed in are expected to be closed and
/// wound outward; `face_ids` identify the body faces triangles came from.
pub trait GeometryKernel {
    /// Nearest intersection of the ray `origin + t * direction`, `t >= 0`.
    fn ray_cast(
        &self,
        mesh: &TriangleMesh,
        origin: &Point3,
        direction: &Vector3,
        tolerance: f64,
    ) -> Option<RayHit>;

    /// Classifies `point`; within `tolerance` of the boundary is
    /// [`PointClassification::OnBoundary`]. Callers must treat
    /// [`PointClassification::Unknown`] as possible material.
    fn classify_point(
        &self,
        mesh: &TriangleMesh,
        point: &Point3,
        tolerance: f64,
    ) -> PointClassification;

    /// Closed loops where `plane` cuts the solid.
    ///
    /// Vertices lying on the plane count as being on its normal side, so a
    /// plane through a face yields the cross-section just behind that face.
    /// Loops wind counter-clockwise around the plane normal around material.
    ///
    /// # Errors
    ///
    /// Returns an error if the cut segments do not chain into closed loops.
    fn section(&self, mesh: &TriangleMesh, plane: &Plane, tolerance: f64)
        -> Result<Vec<Vec<Point3>>>;

    /// Sweeps each triangle along `vector` into a convex prism.
    ///
    /// # Errors
    ///
    /// Returns an error if a triangle is degenerate or `vector` lies in its
    /// plane.
    fn sweep_triangles(&self, triangles: &[[Point3; 3]], vector: &Vector3) -> Result<SweptVolume>;

    /// Material of `mesh` inside the swept volume, grouped into pieces of
    /// adjacent prisms.
    ///
    /// # Errors
    ///
    /// Returns an error if the overlap cannot be evaluated.
    fn overlap(
        &self,
        mesh: &TriangleMesh,
        swept: &SweptVolume,
        tolerance: f64,
    ) -> Result<Vec<OverlapPiece>>;

    /// Convex hull of `points` as an outward triangle mesh.
    ///
    /// # Errors
    ///
    /// Returns an error if the points are coplanar or fewer than four.
    fn convex_hull(
        &self,
        points: &[Point3],
        tolerance: f64,
        angle_tolerance: f64,
    ) -> Result<TriangleMesh>;

    /// Tight box around `points` in `frame`.
    fn bounding_box_in_frame(&self, points: &[Point3], frame: &Plane) -> OrientedBox;
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn oriented_box_measures() {
        let frame = Plane::from_normal(Point3::new(1.0, 0.0, 0.0), Vector3::z()).unwrap();
        let obox = OrientedBox {
            frame,
            min: Vector3::new(0.0, -1.0, 0.0),
            max: Vector3::new(3.0, 1.0, 0.5),
        };
        assert_eq!(obox.sorted_dimensions(), [0.5, 2.0, 3.0]);
        assert_relative_eq!(obox.volume(), 3.0);
        let corners = obox.corners();
        let spread = corners
            .iter()
            .map(|c| (c - Point3::new(1.0, 0.0, 0.0)).norm())
            .fold(0.0, f64::max);
        assert_relative_eq!(spread, (9.0_f64 + 1.0 + 0.25).sqrt(), epsilon = 1e-12);
    }

    #[test]
    fn classification_predicates() {
        assert!(PointClassification::Inside.is_strictly_inside());
        assert!(!PointClassification::OnBoundary.is_strictly_inside());
        assert!(PointClassification::OnBoundary.is_inside_or_on());
        assert!(!PointClassification::Outside.is_inside_or_on());
        assert!(!PointClassification::Unknown.is_strictly_inside());
        assert!(!PointClassification::Unknown.is_inside_or_on());
    }
}
