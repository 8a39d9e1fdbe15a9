use std::collections::HashMap;

use crate::math::grid_key;
use crate::math::polygon_3d::vector_area;

use super::MeshBody;

impl MeshBody {
    /// Checks that the mesh bounds a solid.
    ///
    /// Returns one reason per failed predicate: degenerate faces, open or
    /// non-manifold edges (vertices are compared after snapping to a
    /// `tolerance` grid), and a non-positive enclosed volume. An empty list
    /// means the mesh is valid.
    #[must_use]
    pub fn validate(&self, tolerance: f64) -> Vec<String> {
        let mut issues = Vec::new();
        if self.faces.is_empty() {
            issues.push("mesh has no faces".into());
            return issues;
        }

        let degenerate: Vec<usize> = (0..self.faces.len())
            .filter(|&i| {
                self.face_points(i)
                    .is_none_or(|pts| vector_area(&pts).norm() <= tolerance * tolerance)
            })
            .collect();
        if !degenerate.is_empty() {
            issues.push(format!("degenerate faces {degenerate:?}"));
        }

        let keys: Vec<[i64; 3]> = self.vertices.iter().map(|p| grid_key(p, tolerance)).collect();
        let mut directed: HashMap<([i64; 3], [i64; 3]), u32> = HashMap::new();
        for face in &self.faces {
            let ix = face.indices();
            for k in 0..ix.len() {
                let a = keys[ix[k]];
                let b = keys[ix[(k + 1) % ix.len()]];
                if a != b {
                    *directed.entry((a, b)).or_default() += 1;
                }
            }
        }
        let unmatched = directed
            .iter()
            .filter(|&(&(a, b), &count)| count != 1 || directed.get(&(b, a)) != Some(&1))
            .count();
        if unmatched > 0 {
            issues.push(format!(
                "mesh is open or non-manifold ({unmatched} unmatched directed edges)"
            ));
        }

        let volume = self.signed_volume();
        if volume <= tolerance {
            issues.push(format!("enclosed volume {volume:.3e} is not positive"));
        }

        issues
    }
}
