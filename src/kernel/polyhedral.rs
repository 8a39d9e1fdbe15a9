use tracing::warn;

use crate::error::Result;
use crate::geometry::Plane;
use crate::math::intersect_3d::{closest_point_on_triangle, ray_triangle_intersect};
use crate::math::{Point3, Vector3, TOLERANCE};
use crate::tessellation::TriangleMesh;

use super::hull::convex_hull;
use super::overlap::{overlap_pieces, OverlapPiece};
use super::section::section_loops;
use super::sweep::SweptVolume;
use super::{GeometryKernel, OrientedBox, PointClassification, RayHit};

/// Exact predicates on planar-faced meshes by direct triangle tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct PolyhedralKernel;

/// Skew ray directions for parity counting; none is parallel to a
/// coordinate plane, so axis-aligned bodies rarely produce grazing hits.
const PARITY_DIRECTIONS: [[f64; 3]; 5] = [
    [0.8017, 0.4633, 0.3778],
    [-0.3251, 0.8613, 0.3906],
    [0.2711, -0.4102, 0.8708],
    [-0.6529, -0.5837, -0.4827],
    [0.5194, -0.7931, -0.3181],
];

enum RayCastResult {
    Clear(PointClassification),
    Degenerate,
}

fn ray_cast_classify(mesh: &TriangleMesh, point: &Point3, dir: &Vector3) -> RayCastResult {
    let mut crossings = 0u32;
    for tri in mesh.triangles() {
        let Some(hit) = ray_triangle_intersect(point, dir, &tri) else {
            continue;
        };
        // Hits on an edge or vertex may be counted twice or not at all.
        if hit.edge_margin() < 1e-9 || hit.t < TOLERANCE {
            return RayCastResult::Degenerate;
        }
        crossings += 1;
    }
    if crossings % 2 == 1 {
        RayCastResult::Clear(PointClassification::Inside)
    } else {
        RayCastResult::Clear(PointClassification::Outside)
    }
}

impl GeometryKernel for PolyhedralKernel {
    fn ray_cast(
        &self,
        mesh: &TriangleMesh,
        origin: &Point3,
        direction: &Vector3,
        tolerance: f64,
    ) -> Option<RayHit> {
        let dir = direction.try_normalize(TOLERANCE)?;
        let hits: Vec<(f64, usize)> = mesh
            .triangles()
            .zip(&mesh.face_ids)
            .filter_map(|(tri, &face)| ray_triangle_intersect(origin, &dir, &tri).map(|h| (h.t, face)))
            .collect();
        let distance = hits.iter().map(|&(t, _)| t).min_by(f64::total_cmp)?;

        let mut faces: Vec<usize> = hits
            .iter()
            .filter(|&&(t, _)| t <= distance + tolerance)
            .map(|&(_, face)| face)
            .collect();
        faces.sort_unstable();
        faces.dedup();

        Some(RayHit {
            distance,
            point: origin + dir * distance,
            faces,
        })
    }

    fn classify_point(
        &self,
        mesh: &TriangleMesh,
        point: &Point3,
        tolerance: f64,
    ) -> PointClassification {
        let near_boundary = mesh
            .triangles()
            .any(|tri| (closest_point_on_triangle(point, &tri) - point).norm() <= tolerance);
        if near_boundary {
            return PointClassification::OnBoundary;
        }

        for dir in PARITY_DIRECTIONS {
            let dir = Vector3::from(dir);
            if let RayCastResult::Clear(classification) = ray_cast_classify(mesh, point, &dir) {
                return classification;
            }
        }

        warn!(?point, "every parity ray grazed an edge; point left unclassified");
        PointClassification::Unknown
    }

    fn section(
        &self,
        mesh: &TriangleMesh,
        plane: &Plane,
        tolerance: f64,
    ) -> Result<Vec<Vec<Point3>>> {
        section_loops(mesh, plane, tolerance)
    }

    fn sweep_triangles(&self, triangles: &[[Point3; 3]], vector: &Vector3) -> Result<SweptVolume> {
        SweptVolume::new(triangles, vector)
    }

    fn overlap(
        &self,
        mesh: &TriangleMesh,
        swept: &SweptVolume,
        tolerance: f64,
    ) -> Result<Vec<OverlapPiece>> {
        Ok(overlap_pieces(mesh, swept, tolerance))
    }

    fn convex_hull(
        &self,
        points: &[Point3],
        tolerance: f64,
        angle_tolerance: f64,
    ) -> Result<TriangleMesh> {
        convex_hull(points, tolerance, angle_tolerance)
    }

    fn bounding_box_in_frame(&self, points: &[Point3], frame: &Plane) -> OrientedBox {
        let local = |p: &Point3| {
            let d = p - frame.origin();
            Vector3::new(
                d.dot(frame.u_dir()),
                d.dot(frame.v_dir()),
                d.dot(frame.plane_normal()),
            )
        };
        let mut iter = points.iter().map(local);
        let first = iter.next().unwrap_or_else(Vector3::zeros);
        let (min, max) = iter.fold((first, first), |(lo, hi), q| (lo.inf(&q), hi.sup(&q)));
        OrientedBox {
            frame: frame.clone(),
            min,
            max,
        }
    }
}
