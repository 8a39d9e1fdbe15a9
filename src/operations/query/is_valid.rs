use std::collections::HashMap;

use crate::error::Result;
use crate::math::polygon_3d::max_plane_deviation;
use crate::math::{grid_key, Point3};
use crate::topology::{SolidId, TopologyStore};

use super::Volume;

/// Validates the topological and geometric consistency of a solid.
///
/// A valid solid is closed and manifold (every directed boundary edge is
/// matched by exactly one reversed edge of another face, compared by
/// position), has only planar faces, and encloses a positive volume.
pub struct IsValid {
    solid: SolidId,
    tolerance: f64,
}

impl IsValid {
    /// Creates a new `IsValid` query with a model tolerance of `1e-3`.
    #[must_use]
    pub fn new(solid: SolidId) -> Self {
        Self {
            solid,
            tolerance: 1e-3,
        }
    }

    /// Sets the distance tolerance used for planarity and edge matching.
    #[must_use]
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Executes the validation, returning `true` if the solid is valid.
    #[must_use]
    pub fn execute(&self, store: &TopologyStore) -> bool {
        self.issues(store).is_empty()
    }

    /// Every failed predicate, as a human-readable reason.
    #[must_use]
    pub fn issues(&self, store: &TopologyStore) -> Vec<String> {
        match self.collect_issues(store) {
            Ok(issues) => issues,
            Err(e) => vec![e.to_string()],
        }
    }

    fn collect_issues(&self, store: &TopologyStore) -> Result<Vec<String>> {
        let mut issues = Vec::new();
        let faces = store.solid_faces(self.solid)?;
        if faces.is_empty() {
            return Ok(vec!["solid has no faces".into()]);
        }

        let mut directed: HashMap<([i64; 3], [i64; 3]), i32> = HashMap::new();
        for (index, &face_id) in faces.iter().enumerate() {
            let face = store.face(face_id)?;
            let outward = face.outward_plane();
            let loops = store.face_loops(face_id)?;

            let points: Vec<Point3> = loops.iter().flatten().copied().collect();
            let deviation = max_plane_deviation(&points, outward.origin(), outward.plane_normal());
            if deviation > self.tolerance {
                issues.push(format!(
                    "face {index} is not planar (deviation {deviation:.3e})"
                ));
            }

            for ring in loops.iter() {
                let n = ring.len();
                for i in 0..n {
                    let (a, b) = if face.same_sense {
                        (&ring[i], &ring[(i + 1) % n])
                    } else {
                        (&ring[(i + 1) % n], &ring[i])
                    };
                    let key = (grid_key(a, self.tolerance), grid_key(b, self.tolerance));
                    *directed.entry(key).or_default() += 1;
                }
            }
        }

        let unmatched = directed
            .iter()
            .filter(|&(&(a, b), &count)| count != 1 || directed.get(&(b, a)) != Some(&1))
            .count();
        if unmatched > 0 {
            issues.push(format!(
                "shell is open or non-manifold ({unmatched} unmatched directed edges)"
            ));
        }

        match Volume::new(self.solid).execute(store) {
            Ok(volume) if volume > self.tolerance => {}
            Ok(volume) => issues.push(format!("enclosed volume {volume:.3e} is not positive")),
            Err(e) => issues.push(format!("volume could not be computed: {e}")),
        }

        Ok(issues)
    }
}
