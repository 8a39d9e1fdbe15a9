use std::collections::{HashMap, HashSet};

use qhull::Qh;
use tracing::debug;

use crate::error::{GeometryError, Result};
use crate::math::{grid_key, Point3, Vector3};
use crate::tessellation::TriangleMesh;

/// 3D convex hull computed by qhull.
///
/// Points within `tolerance` of each other are merged first. Facets qhull
/// leaves as polygons are fanned into triangles; polygon corners straighter
/// than `angle_tolerance` are skipped so the fan has no sliver triangles.
/// Every triangle is wound outward and tagged with its facet index.
pub(super) fn convex_hull(
    points: &[Point3],
    tolerance: f64,
    angle_tolerance: f64,
) -> Result<TriangleMesh> {
    let mut seen = HashSet::new();
    let pts: Vec<Point3> = points
        .iter()
        .filter(|p| seen.insert(grid_key(p, tolerance)))
        .copied()
        .collect();
    if pts.len() < 4 {
        return Err(GeometryError::Degenerate(format!(
            "convex hull needs four distinct points, got {}",
            pts.len()
        ))
        .into());
    }
    if are_coplanar(&pts, tolerance) {
        return Err(GeometryError::Degenerate("convex hull of flat point set".into()).into());
    }

    #[allow(clippy::cast_precision_loss)]
    let center = Point3::from(
        pts.iter().fold(Vector3::zeros(), |acc, p| acc + p.coords) / pts.len() as f64,
    );
    let facets = hull_facets(&pts)?;
    debug!(points = pts.len(), facets = facets.len(), "qhull finished");

    let mut used: HashMap<[i64; 3], u32> = HashMap::new();
    let mut mesh = TriangleMesh::default();
    for (fi, facet) in facets.iter().enumerate() {
        for tri in fan(&order_around(facet, &center), angle_tolerance) {
            let tri = outward(&center, tri);
            let n = (tri[1] - tri[0]).cross(&(tri[2] - tri[0]));
            let Some(n) = n.try_normalize(0.0) else {
                continue;
            };
            let mut indices = [0u32; 3];
            for (slot, p) in tri.iter().enumerate() {
                let index = *used.entry(grid_key(p, tolerance)).or_insert_with(|| {
                    mesh.vertices.push(*p);
                    mesh.normals.push(Vector3::zeros());
                    #[allow(clippy::cast_possible_truncation)]
                    let index = (mesh.vertices.len() - 1) as u32;
                    index
                });
                mesh.normals[index as usize] += n;
                indices[slot] = index;
            }
            mesh.indices.push(indices);
            mesh.face_ids.push(fi);
        }
    }
    for n in &mut mesh.normals {
        *n = n.try_normalize(0.0).unwrap_or_else(Vector3::zeros);
    }
    Ok(mesh)
}

/// Vertex polygons of the hull facets, unordered within each facet.
fn hull_facets(pts: &[Point3]) -> Result<Vec<Vec<Point3>>> {
    let qh = Qh::builder()
        .compute(true)
        .triangulate(true)
        .build_from_iter(pts.iter().map(|p| [p.x, p.y, p.z]))
        .map_err(|_| GeometryError::Degenerate(format!("qhull failed on {} points", pts.len())))?;

    // qhull can hand back merged facets even when asked to triangulate.
    let facets = qh
        .faces()
        .filter_map(|face| {
            let vertices = face.vertices()?;
            let corners: Vec<Point3> = vertices
                .iter()
                .filter_map(|v| match v.point() {
                    [x, y, z, ..] => Some(Point3::new(*x, *y, *z)),
                    _ => None,
                })
                .collect();
            (corners.len() >= 3).then_some(corners)
        })
        .collect();
    Ok(facets)
}

/// Whether every point lies within `tolerance` of one plane.
fn are_coplanar(pts: &[Point3], tolerance: f64) -> bool {
    let a = pts[0];
    let Some(b) = farthest(pts, |p| (p - a).norm()) else {
        return true;
    };
    let ab = b - a;
    if ab.norm() <= tolerance {
        return true;
    }
    let Some(c) = farthest(pts, |p| ab.cross(&(p - a)).norm()) else {
        return true;
    };
    let Some(normal) = ab.cross(&(c - a)).try_normalize(tolerance * ab.norm()) else {
        return true;
    };
    pts.iter().all(|p| normal.dot(&(p - a)).abs() <= tolerance)
}

fn farthest(pts: &[Point3], measure: impl Fn(&Point3) -> f64) -> Option<Point3> {
    pts.iter()
        .max_by(|p, q| measure(p).total_cmp(&measure(q)))
        .copied()
}

/// Sorts a convex facet's corners cyclically around their mean.
fn order_around(facet: &[Point3], center: &Point3) -> Vec<Point3> {
    #[allow(clippy::cast_precision_loss)]
    let mid = Point3::from(
        facet.iter().fold(Vector3::zeros(), |acc, p| acc + p.coords) / facet.len() as f64,
    );
    let axis = mid - center;
    let seed = if axis.x.abs() < axis.y.abs().max(axis.z.abs()) {
        Vector3::x()
    } else {
        Vector3::y()
    };
    let u = axis.cross(&seed);
    let w = axis.cross(&u);
    let angle = |p: &Point3| {
        let d = p - mid;
        d.dot(&w).atan2(d.dot(&u))
    };
    let mut sorted = facet.to_vec();
    sorted.sort_by(|p, q| angle(p).total_cmp(&angle(q)));
    sorted
}

/// Fan triangles of a cyclically ordered convex polygon, skipping corners
/// that are straight within `angle_tolerance`.
fn fan(polygon: &[Point3], angle_tolerance: f64) -> Vec<[Point3; 3]> {
    let n = polygon.len();
    let corners: Vec<Point3> = if n > 3 {
        let kept: Vec<Point3> = (0..n)
            .filter(|&i| {
                let prev = polygon[(i + n - 1) % n] - polygon[i];
                let next = polygon[(i + 1) % n] - polygon[i];
                prev.angle(&next) < std::f64::consts::PI - angle_tolerance
            })
            .map(|i| polygon[i])
            .collect();
        if kept.len() >= 3 {
            kept
        } else {
            polygon.to_vec()
        }
    } else {
        polygon.to_vec()
    };
    (1..corners.len().saturating_sub(1))
        .map(|i| [corners[0], corners[i], corners[i + 1]])
        .collect()
}

fn outward(center: &Point3, [a, b, c]: [Point3; 3]) -> [Point3; 3] {
    let n = (b - a).cross(&(c - a));
    if n.dot(&(a - center)) < 0.0 {
        [c, b, a]
    } else {
        [a, b, c]
    }
}
