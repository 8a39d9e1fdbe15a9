use crate::math::clip_3d::{clip_polygon_all, HalfSpace};
use crate::math::polygon_3d::vector_area;
use crate::math::{Point3, Vector3, TOLERANCE};
use crate::tessellation::TriangleMesh;

use super::sweep::{Prism, SweptVolume};

/// A connected group of swept prisms that overlap material.
#[derive(Debug, Clone, PartialEq)]
pub struct OverlapPiece {
    /// Volume of material inside the group.
    pub volume: f64,
    /// Indices into [`SweptVolume::prisms`].
    pub prisms: Vec<usize>,
}

/// Groups overlapping prisms of `swept` into connected pieces.
pub(super) fn overlap_pieces(
    mesh: &TriangleMesh,
    swept: &SweptVolume,
    tolerance: f64,
) -> Vec<OverlapPiece> {
    let prisms = swept.prisms();
    let volumes: Vec<f64> = prisms
        .iter()
        .map(|prism| prism_overlap_volume(mesh, prism, tolerance))
        .collect();

    let mut parent: Vec<usize> = (0..prisms.len()).collect();
    for i in 0..prisms.len() {
        if volumes[i] <= TOLERANCE {
            continue;
        }
        for j in (i + 1)..prisms.len() {
            if volumes[j] > TOLERANCE && prisms[i].touches(&prisms[j]) {
                let (ri, rj) = (find(&mut parent, i), find(&mut parent, j));
                parent[rj] = ri;
            }
        }
    }

    let mut pieces: Vec<(usize, OverlapPiece)> = Vec::new();
    for i in (0..prisms.len()).filter(|&i| volumes[i] > TOLERANCE) {
        let root = find(&mut parent, i);
        match pieces.iter_mut().find(|(r, _)| *r == root) {
            Some((_, piece)) => {
                piece.volume += volumes[i];
                piece.prisms.push(i);
            }
            None => pieces.push((
                root,
                OverlapPiece {
                    volume: volumes[i],
                    prisms: vec![i],
                },
            )),
        }
    }
    pieces.into_iter().map(|(_, piece)| piece).collect()
}

fn find(parent: &mut [usize], mut i: usize) -> usize {
    while parent[i] != i {
        parent[i] = parent[parent[i]];
        i = parent[i];
    }
    i
}

/// Volume of `mesh ∩ prism` by the divergence theorem.
///
/// `V = 1/3 ∮ (x - o) · n dA` over the boundary of the intersection, which
/// is the mesh surface clipped to the prism plus the parts of the prism's
/// faces that lie inside the mesh. With `o` on the base plane the base term
/// vanishes.
fn prism_overlap_volume(mesh: &TriangleMesh, prism: &Prism, tolerance: f64) -> f64 {
    let origin = prism.base_centroid();
    let planes = prism.planes();
    let mut flux = 0.0;

    // Mesh surface inside the prism. Triangles lying on a prism plane touch
    // the prism without entering it, or are accounted for as a cap below.
    for tri in mesh.triangles() {
        if planes.iter().any(|h| h.contains_all_on_plane(&tri, tolerance)) {
            continue;
        }
        let clipped = clip_polygon_all(&tri, planes);
        if let Some(first) = clipped.first() {
            flux += (first - origin).dot(&vector_area(&clipped));
        }
    }

    // Prism faces inside the mesh.
    for (i, face) in prism.faces().iter().enumerate().skip(1) {
        let plane = &planes[i];
        let area = cap_area(mesh, face, plane, tolerance);
        if area > 0.0 {
            flux += area * plane.normal.dot(&(face[0] - origin));
        }
    }

    (flux / 3.0).max(0.0)
}

/// Area of the convex polygon `face` (on `plane`) that lies inside `mesh`.
///
/// Closes the mesh below `plane` inside the column over `face`: the flux of
/// the constant field `plane.normal` through that closed surface is zero,
/// so the cap area is minus the flux through the enclosed mesh surface.
fn cap_area(mesh: &TriangleMesh, face: &[Point3], plane: &HalfSpace, tolerance: f64) -> f64 {
    let n = plane.normal;
    let mut bounds = vec![*plane];
    for k in 0..face.len() {
        let a = face[k];
        let b = face[(k + 1) % face.len()];
        // Face winds counter-clockwise around n: outward is edge x n.
        if let Some(wall) = HalfSpace::through(&a, &(b - a).cross(&n)) {
            bounds.push(wall);
        }
    }

    let mut projected: Vector3 = Vector3::zeros();
    for tri in mesh.triangles() {
        if plane.contains_all_on_plane(&tri, tolerance) {
            continue;
        }
        let clipped = clip_polygon_all(&tri, &bounds);
        if clipped.len() >= 3 {
            projected += vector_area(&clipped);
        }
    }
    -n.dot(&projected)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::operations::creation::MakeBox;
    use crate::tessellation::TessellateSolid;
    use crate::topology::TopologyStore;
    use approx::assert_relative_eq;

    fn p(x: f64, y: f64, z: f64) -> Point3 {
        Point3::new(x, y, z)
    }

    fn cube_mesh(min: Point3, max: Point3) -> TriangleMesh {
        let mut store = TopologyStore::new();
        let solid = MakeBox::new(min, max).execute(&mut store).unwrap();
        TessellateSolid::new(solid).execute(&store).unwrap()
    }

    #[test]
    fn prism_inside_cube_measures_its_own_volume() {
        let mesh = cube_mesh(p(0.0, 0.0, 0.0), p(4.0, 4.0, 4.0));
        let tri = [p(1.0, 1.0, 1.0), p(2.0, 1.0, 1.0), p(1.0, 2.0, 1.0)];
        let prism = Prism::new(&tri, &Vector3::new(0.0, 0.0, 2.0)).unwrap();
        assert_relative_eq!(prism_overlap_volume(&mesh, &prism, 1e-3), 1.0, epsilon = 1e-9);
    }

    #[test]
    fn prism_leaving_through_the_top_is_cut() {
        let mesh = cube_mesh(p(0.0, 0.0, 0.0), p(4.0, 4.0, 4.0));
        let tri = [p(1.0, 1.0, 3.0), p(2.0, 1.0, 3.0), p(1.0, 2.0, 3.0)];
        let prism = Prism::new(&tri, &Vector3::new(0.0, 0.0, 2.0)).unwrap();
        assert_relative_eq!(prism_overlap_volume(&mesh, &prism, 1e-3), 0.5, epsilon = 1e-9);
    }

    #[test]
    fn oblique_prism_through_a_wall() {
        // Slab x in [2, 3]; prism sheared along x from a base at x = 0.
        let mesh = cube_mesh(p(2.0, -5.0, -5.0), p(3.0, 5.0, 5.0));
        let tri = [p(0.0, 0.0, 0.0), p(0.0, 1.0, 0.0), p(0.0, 0.0, 1.0)];
        let prism = Prism::new(&tri, &Vector3::new(5.0, 0.3, 0.2)).unwrap();
        // Every x-slice of the prism is the base triangle, area 1/2.
        assert_relative_eq!(prism_overlap_volume(&mesh, &prism, 1e-3), 0.5, epsilon = 1e-9);
    }

    #[test]
    fn face_swept_off_its_solid_overlaps_nothing() {
        let mesh = cube_mesh(p(0.0, 0.0, 0.0), p(1.0, 1.0, 1.0));
        let top = [
            [p(0.0, 0.0, 1.0), p(1.0, 0.0, 1.0), p(1.0, 1.0, 1.0)],
            [p(0.0, 0.0, 1.0), p(1.0, 1.0, 1.0), p(0.0, 1.0, 1.0)],
        ];
        let swept = SweptVolume::new(&top, &Vector3::new(0.3, 0.0, 1.0)).unwrap();
        assert!(overlap_pieces(&mesh, &swept, 1e-3).is_empty());
    }

    #[test]
    fn adjacent_overlaps_form_one_piece() {
        let mesh = cube_mesh(p(0.0, 0.0, 0.0), p(4.0, 4.0, 4.0));
        let tris = [
            [p(1.0, 1.0, 1.0), p(2.0, 1.0, 1.0), p(2.0, 2.0, 1.0)],
            [p(1.0, 1.0, 1.0), p(2.0, 2.0, 1.0), p(1.0, 2.0, 1.0)],
            [p(-3.0, 1.0, 1.0), p(-2.0, 1.0, 1.0), p(-2.0, 2.0, 1.0)],
        ];
        let swept = SweptVolume::new(&tris, &Vector3::new(0.0, 0.0, 1.0)).unwrap();
        let pieces = overlap_pieces(&mesh, &swept, 1e-3);
        assert_eq!(pieces.len(), 1);
        assert_eq!(pieces[0].prisms, vec![0, 1]);
        assert_relative_eq!(pieces[0].volume, 1.0, epsilon = 1e-9);
    }
}
