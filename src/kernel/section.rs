use std::collections::HashMap;

use crate::error::{OperationError, Result};
use crate::geometry::Plane;
use crate::math::{grid_key, Point3, Vector3};
use crate::tessellation::TriangleMesh;

/// Cuts a closed mesh with a plane and chains the cut segments into loops.
///
/// A vertex is on the positive side when its signed distance exceeds
/// `-tolerance`, so vertices on the plane belong to the normal side. Each
/// triangle straddling the plane contributes one segment, directed along
/// `plane normal x triangle normal` so that material lies to its left.
pub(super) fn section_loops(
    mesh: &TriangleMesh,
    plane: &Plane,
    tolerance: f64,
) -> Result<Vec<Vec<Point3>>> {
    let segments = cut_segments(mesh, plane, tolerance);
    chain_segments(&segments, tolerance)
}

fn cut_segments(mesh: &TriangleMesh, plane: &Plane, tolerance: f64) -> Vec<(Point3, Point3)> {
    let normal = plane.plane_normal();
    let mut segments = Vec::new();

    for tri in mesh.triangles() {
        let d = tri.map(|p| plane.signed_distance(&p));
        let positive = d.map(|di| di > -tolerance);
        if positive.iter().all(|&s| s) || positive.iter().all(|&s| !s) {
            continue;
        }

        let mut cut = Vec::with_capacity(2);
        for i in 0..3 {
            let j = (i + 1) % 3;
            if positive[i] != positive[j] {
                let t = (d[i] / (d[i] - d[j])).clamp(0.0, 1.0);
                cut.push(tri[i] + (tri[j] - tri[i]) * t);
            }
        }
        let [a, b] = [cut[0], cut[1]];
        if (b - a).norm() <= tolerance {
            continue;
        }

        let tri_normal: Vector3 = (tri[1] - tri[0]).cross(&(tri[2] - tri[0]));
        let along = normal.cross(&tri_normal);
        segments.push(if (b - a).dot(&along) >= 0.0 { (a, b) } else { (b, a) });
    }
    segments
}

/// Segment starts bucketed on a `tolerance` grid; lookups scan the 27
/// neighbouring cells so matches across a cell boundary are found.
struct StartIndex {
    cell: f64,
    buckets: HashMap<[i64; 3], Vec<usize>>,
}

impl StartIndex {
    fn new(segments: &[(Point3, Point3)], cell: f64) -> Self {
        let mut buckets: HashMap<[i64; 3], Vec<usize>> = HashMap::new();
        for (i, (start, _)) in segments.iter().enumerate() {
            buckets.entry(grid_key(start, cell)).or_default().push(i);
        }
        Self { cell, buckets }
    }

    fn find(&self, point: &Point3, segments: &[(Point3, Point3)], used: &[bool]) -> Option<usize> {
        let [x, y, z] = grid_key(point, self.cell);
        let mut best: Option<(f64, usize)> = None;
        for dx in -1..=1 {
            for dy in -1..=1 {
                for dz in -1..=1 {
                    let Some(bucket) = self.buckets.get(&[x + dx, y + dy, z + dz]) else {
                        continue;
                    };
                    for &i in bucket {
                        let dist = (segments[i].0 - point).norm();
                        if !used[i] && dist <= self.cell && best.is_none_or(|(b, _)| dist < b) {
                            best = Some((dist, i));
                        }
                    }
                }
            }
        }
        best.map(|(_, i)| i)
    }
}

fn chain_segments(segments: &[(Point3, Point3)], tolerance: f64) -> Result<Vec<Vec<Point3>>> {
    let index = StartIndex::new(segments, tolerance);
    let mut used = vec![false; segments.len()];
    let mut loops = Vec::new();

    for first in 0..segments.len() {
        if used[first] {
            continue;
        }
        used[first] = true;
        let (start, mut current) = segments[first];
        let mut ring = vec![start];

        while (current - start).norm() > tolerance {
            let Some(next) = index.find(&current, segments, &used) else {
                return Err(OperationError::Failed(format!(
                    "section does not close near ({:.6}, {:.6}, {:.6})",
                    current.x, current.y, current.z
                ))
                .into());
            };
            used[next] = true;
            ring.push(segments[next].0);
            current = segments[next].1;
        }

        if ring.len() >= 3 {
            loops.push(ring);
        }
    }
    Ok(loops)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::math::polygon_2d::signed_area;
    use crate::math::Point2;
    use crate::operations::creation::MakeBox;
    use crate::tessellation::TessellateSolid;
    use crate::topology::TopologyStore;
    use approx::assert_relative_eq;

    fn p(x: f64, y: f64, z: f64) -> Point3 {
        Point3::new(x, y, z)
    }

    fn cube_mesh() -> TriangleMesh {
        let mut store = TopologyStore::new();
        let solid = MakeBox::new(p(0.0, 0.0, 0.0), p(2.0, 3.0, 1.0))
            .execute(&mut store)
            .unwrap();
        TessellateSolid::new(solid).execute(&store).unwrap()
    }

    fn area_in(plane: &Plane, ring: &[Point3]) -> f64 {
        let uv: Vec<Point2> = ring.iter().map(|q| plane.project(q)).collect();
        signed_area(&uv)
    }

    #[test]
    fn mid_plane_cuts_one_ccw_rectangle() {
        let plane = Plane::from_normal(p(0.0, 0.0, 0.5), Vector3::z()).unwrap();
        let loops = section_loops(&cube_mesh(), &plane, 1e-3).unwrap();
        assert_eq!(loops.len(), 1);
        assert_relative_eq!(area_in(&plane, &loops[0]), 6.0, epsilon = 1e-9);
    }

    #[test]
    fn plane_through_top_face_sees_material_behind_it() {
        let plane = Plane::from_normal(p(0.0, 0.0, 1.0), Vector3::z()).unwrap();
        let loops = section_loops(&cube_mesh(), &plane, 1e-3).unwrap();
        assert_eq!(loops.len(), 1);
        assert_relative_eq!(area_in(&plane, &loops[0]), 6.0, epsilon = 1e-9);
    }

    #[test]
    fn plane_through_bottom_face_from_outside_is_empty() {
        let plane = Plane::from_normal(p(0.0, 0.0, 0.0), Vector3::z()).unwrap();
        assert!(section_loops(&cube_mesh(), &plane, 1e-3).unwrap().is_empty());
    }

    #[test]
    fn reversed_plane_winds_the_other_way_in_its_own_frame() {
        let plane = Plane::from_normal(p(0.0, 0.0, 0.5), -Vector3::z()).unwrap();
        let loops = section_loops(&cube_mesh(), &plane, 1e-3).unwrap();
        assert_relative_eq!(area_in(&plane, &loops[0]), 6.0, epsilon = 1e-9);
    }

    #[test]
    fn open_chain_is_an_error() {
        let segments = vec![(p(0.0, 0.0, 0.0), p(1.0, 0.0, 0.0)), (p(1.0, 0.0, 0.0), p(1.0, 1.0, 0.0))];
        assert!(chain_segments(&segments, 1e-3).is_err());
    }
}
