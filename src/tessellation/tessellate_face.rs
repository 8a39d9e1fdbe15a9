use std::collections::{HashMap, HashSet, VecDeque};

use spade::handles::{FixedFaceHandle, FixedVertexHandle, InnerTag};
use spade::{ConstrainedDelaunayTriangulation, InsertionError, Point2 as SpadePoint2, Triangulation};

use crate::error::{Result, TessellationError};
use crate::geometry::Plane;
use crate::math::{Point3, Vector3};
use crate::topology::{FaceId, FaceLoops, TopologyStore};

use super::TriangleMesh;

type Cdt = ConstrainedDelaunayTriangulation<SpadePoint2<f64>>;

/// Tessellates a planar face (with holes) into a triangle mesh.
///
/// Mesh vertices are the face's own boundary points, bit for bit; the
/// constrained Delaunay triangulation adds no Steiner points.
pub struct TessellateFace {
    face: FaceId,
}

impl TessellateFace {
    /// Creates a new `TessellateFace` operation.
    #[must_use]
    pub fn new(face: FaceId) -> Self {
        Self { face }
    }

    /// Executes the tessellation, returning a triangle mesh.
    ///
    /// # Errors
    ///
    /// Returns an error if the face cannot be read or its loops cannot be
    /// triangulated (fewer than three points, crossing boundaries).
    pub fn execute(&self, store: &TopologyStore) -> Result<TriangleMesh> {
        let face = store.face(self.face)?;
        let outward = face.outward_plane();
        let loops = store.face_loops(self.face)?;
        triangulate_loops(face.plane(), &loops, outward.plane_normal())
    }
}

/// Triangulates boundary loops lying in `plane`.
///
/// Triangles are wound counter-clockwise around `normal`, which is also
/// written as every vertex normal. All `face_ids` are zero.
///
/// # Errors
///
/// Returns [`TessellationError::Failed`] if a loop has fewer than three
/// points, the loops cross each other, or nothing lies inside the outer loop.
#[allow(clippy::cast_possible_truncation)]
pub fn triangulate_loops(plane: &Plane, loops: &FaceLoops, normal: &Vector3) -> Result<TriangleMesh> {
    let mut cdt = Cdt::new();
    let mut originals: HashMap<usize, Point3> = HashMap::new();
    for ring in loops.iter() {
        insert_constraint_loop(&mut cdt, plane, ring, &mut originals)?;
    }

    let interior = classify_interior_faces(&cdt);
    let flip = plane.plane_normal().dot(normal) < 0.0;

    let mut mesh = TriangleMesh::default();
    let mut vertex_map: HashMap<usize, u32> = HashMap::new();

    for face_handle in cdt.inner_faces() {
        if !interior.contains(&face_handle.fix().index()) {
            continue;
        }

        let mut tri = [0u32; 3];
        for (slot, vh) in face_handle.vertices().iter().enumerate() {
            let idx = vh.fix().index();
            tri[slot] = *vertex_map.entry(idx).or_insert_with(|| {
                let pos = vh.position();
                let point = originals
                    .get(&idx)
                    .copied()
                    .unwrap_or_else(|| plane.evaluate(pos.x, pos.y));
                mesh.vertices.push(point);
                mesh.normals.push(*normal);
                (mesh.vertices.len() - 1) as u32
            });
        }
        if flip {
            tri.swap(1, 2);
        }
        mesh.indices.push(tri);
        mesh.face_ids.push(0);
    }

    if mesh.indices.is_empty() {
        return Err(TessellationError::Failed("face loops enclose no triangles".into()).into());
    }
    Ok(mesh)
}

fn insert_constraint_loop(
    cdt: &mut Cdt,
    plane: &Plane,
    points: &[Point3],
    originals: &mut HashMap<usize, Point3>,
) -> Result<()> {
    if points.len() < 3 {
        return Err(
            TessellationError::Failed("constraint loop needs at least 3 points".into()).into(),
        );
    }

    let mut handles: Vec<FixedVertexHandle> = Vec::with_capacity(points.len());
    for p in points {
        let uv = plane.project(p);
        let h = cdt
            .insert(SpadePoint2::new(uv.x, uv.y))
            .map_err(|e: InsertionError| TessellationError::Failed(format!("CDT insert: {e}")))?;
        originals.entry(h.index()).or_insert(*p);
        handles.push(h);
    }

    for i in 0..handles.len() {
        let from = handles[i];
        let to = handles[(i + 1) % handles.len()];
        if from == to {
            continue;
        }
        if !cdt.can_add_constraint(from, to) {
            return Err(TessellationError::Failed("face boundary crosses itself".into()).into());
        }
        cdt.add_constraint(from, to);
    }

    Ok(())
}

/// Classifies which inner faces of the CDT are inside the polygon using flood-fill.
///
/// Starts from faces adjacent to the outer (infinite) face at depth 0. Each time
/// a constraint edge is crossed, depth increments. Odd depth = interior.
fn classify_interior_faces(cdt: &Cdt) -> HashSet<usize> {
    let mut interior = HashSet::new();
    let mut depth_map: HashMap<usize, u32> = HashMap::new();
    let mut queue: VecDeque<(FixedFaceHandle<InnerTag>, u32)> = VecDeque::new();

    let outer_fix = cdt.outer_face().fix();

    for edge in cdt.directed_edges() {
        if edge.face().fix() != outer_fix {
            continue;
        }
        if let Some(inner) = edge.rev().face().as_inner() {
            let idx = inner.fix().index();
            if depth_map.contains_key(&idx) {
                continue;
            }
            let depth = u32::from(cdt.is_constraint_edge(edge.as_undirected().fix()));
            depth_map.insert(idx, depth);
            if depth % 2 == 1 {
                interior.insert(idx);
            }
            queue.push_back((inner.fix(), depth));
        }
    }

    while let Some((face_fix, depth)) = queue.pop_front() {
        for edge in cdt.face(face_fix).adjacent_edges() {
            let Some(neighbor) = edge.rev().face().as_inner() else {
                continue;
            };
            let n_idx = neighbor.fix().index();
            if depth_map.contains_key(&n_idx) {
                continue;
            }
            let new_depth = depth + u32::from(cdt.is_constraint_edge(edge.as_undirected().fix()));
            depth_map.insert(n_idx, new_depth);
            if new_depth % 2 == 1 {
                interior.insert(n_idx);
            }
            queue.push_back((neighbor.fix(), new_depth));
        }
    }

    interior
}
