//! Removal vectors along face normals, the usual starting set for coverage.

use tracing::debug;

use crate::body::{FaceDomain, SolidBody};
use crate::error::{AnalysisError, Result};
use crate::math::{Point2, Point3, Vector3};

/// A removal vector anchored on the face it was derived from.
#[derive(Debug, Clone, PartialEq)]
pub struct RemovalVector {
    pub face: usize,
    /// Where the vector is drawn from.
    pub anchor: Point3,
    pub vector: Vector3,
}

/// Builds outward-normal removal vectors for selected faces.
#[derive(Debug, Clone)]
pub struct RemovalVectors<'a> {
    body: &'a SolidBody,
    length: Option<f64>,
    anchor: Option<(f64, f64)>,
}

impl<'a> RemovalVectors<'a> {
    #[must_use]
    pub fn new(body: &'a SolidBody) -> Self {
        Self {
            body,
            length: None,
            anchor: None,
        }
    }

    /// Vector length; defaults to the body's bounding-box diagonal.
    #[must_use]
    pub fn with_length(mut self, length: f64) -> Self {
        self.length = Some(length);
        self
    }

    /// Anchors B-rep vectors at `(u, v)` percent of the face's extent in its
    /// plane, each clamped to `0..=100`. Anchors falling outside the face
    /// revert to the face centroid. Mesh faces always use their centroid.
    #[must_use]
    pub fn with_anchor(mut self, u_percent: f64, v_percent: f64) -> Self {
        self.anchor = Some((u_percent.clamp(0.0, 100.0), v_percent.clamp(0.0, 100.0)));
        self
    }

    /// One vector per entry of `faces`; indices are clamped into range.
    ///
    /// # Errors
    ///
    /// Returns [`AnalysisError::FaceOutOfRange`] for a body without faces.
    pub fn generate(&self, faces: &[usize]) -> Result<Vec<RemovalVector>> {
        let count = self.body.face_count();
        if count == 0 {
            return Err(AnalysisError::FaceOutOfRange { index: 0, count }.into());
        }
        let length = match self.length {
            Some(length) => length,
            None => self
                .body
                .bounding_box()
                .map_or(1.0, |aabb| aabb.diagonal()),
        };

        faces
            .iter()
            .map(|&requested| {
                let face = requested.min(count - 1);
                let normal = self.body.face_normal(face)?;
                let anchor = self.anchor_point(face)?;
                debug!(requested, face, ?anchor, "removal vector");
                Ok(RemovalVector {
                    face,
                    anchor,
                    vector: normal * length,
                })
            })
            .collect()
    }

    fn anchor_point(&self, face: usize) -> Result<Point3> {
        if let (Some((u, v)), SolidBody::Brep(_)) = (self.anchor, self.body) {
            if let FaceDomain::Planar { plane, region } = self.body.face_domain(face)? {
                let bounds = region
                    .shapes()
                    .iter()
                    .filter_map(|s| s.bounds())
                    .reduce(|(lo, hi), (a, b)| (lo.inf(&a), hi.sup(&b)));
                if let Some((lo, hi)) = bounds {
                    let uv = Point2::new(
                        lo.x + (hi.x - lo.x) * u / 100.0,
                        lo.y + (hi.y - lo.y) * v / 100.0,
                    );
                    if region.shapes().iter().any(|s| s.contains_strictly(&uv, 0.0)) {
                        return Ok(plane.lift(&uv));
                    }
                }
            }
        }
        self.body.face_centroid(face)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::body::tests::{brep_box, step_brep};
    use crate::mesh::tests::quad_box;
    use approx::assert_relative_eq;

    fn p(x: f64, y: f64, z: f64) -> Point3 {
        Point3::new(x, y, z)
    }

    #[test]
    fn vectors_follow_normals_with_diagonal_length() {
        let body = SolidBody::Mesh(quad_box(p(0.0, 0.0, 0.0), p(1.0, 2.0, 2.0)));
        let vectors = RemovalVectors::new(&body).generate(&[1, 4]).unwrap();
        assert_eq!(vectors.len(), 2);
        assert_relative_eq!(vectors[0].vector, Vector3::new(0.0, 0.0, 3.0), epsilon = 1e-12);
        assert_relative_eq!(vectors[0].anchor, p(0.5, 1.0, 2.0), epsilon = 1e-12);
        assert_relative_eq!(vectors[1].vector, Vector3::new(3.0, 0.0, 0.0), epsilon = 1e-12);
    }

    #[test]
    fn indices_are_clamped() {
        let body = SolidBody::Mesh(quad_box(p(0.0, 0.0, 0.0), p(1.0, 1.0, 1.0)));
        let vectors = RemovalVectors::new(&body)
            .with_length(2.0)
            .generate(&[42])
            .unwrap();
        assert_eq!(vectors[0].face, 5);
        assert_relative_eq!(vectors[0].vector, Vector3::new(-2.0, 0.0, 0.0), epsilon = 1e-12);
    }

    #[test]
    fn brep_anchor_uses_face_extent() {
        let body = brep_box(p(0.0, 0.0, 0.0), p(4.0, 2.0, 1.0));
        let vectors = RemovalVectors::new(&body)
            .with_length(1.0)
            .with_anchor(25.0, 50.0)
            .generate(&[1])
            .unwrap();
        let anchor = vectors[0].anchor;
        assert_relative_eq!(anchor.z, 1.0, epsilon = 1e-12);
        // The top face spans 4 x 2; a quarter and a half of some in-plane
        // extents land strictly inside and away from the centroid.
        assert!(anchor.x > 0.0 && anchor.x < 4.0 && anchor.y > 0.0 && anchor.y < 2.0);
        assert!((anchor - p(2.0, 1.0, 1.0)).norm() > 0.1);
    }

    #[test]
    fn anchor_outside_an_l_face_falls_back_to_the_centroid() {
        let body = step_brep();
        let front = 0;
        let centroid = body.face_centroid(front).unwrap();
        // One quadrant of the L's extent is empty, whichever way the face
        // frame points.
        let anchors: Vec<Point3> = [(75.0, 75.0), (25.0, 75.0), (75.0, 25.0), (25.0, 25.0)]
            .iter()
            .map(|&(u, v)| {
                RemovalVectors::new(&body)
                    .with_anchor(u, v)
                    .generate(&[front])
                    .unwrap()[0]
                    .anchor
            })
            .collect();
        let fell_back = anchors
            .iter()
            .filter(|a| (**a - centroid).norm() < 1e-12)
            .count();
        assert_eq!(fell_back, 1);
        assert!(anchors.iter().all(|a| a.y.abs() < 1e-12));
    }
}
