use crate::error::{OperationError, Result};
use crate::math::polygon_3d::newell_normal;
use crate::math::{Point3, Vector3, TOLERANCE};
use crate::operations::creation::{MakeFace, MakeSolid, MakeWire};
use crate::topology::{FaceId, ShellData, SolidId, TopologyStore};

/// Extrudes a planar face along a direction vector to create a prism solid.
///
/// Faces of the result are ordered bottom, top, then one side per boundary
/// edge (outer loop first, then each hole).
pub struct Extrude {
    face: FaceId,
    direction: Vector3,
}

impl Extrude {
    /// Creates a new `Extrude` operation.
    #[must_use]
    pub fn new(face: FaceId, direction: Vector3) -> Self {
        Self { face, direction }
    }

    /// Executes the extrusion, creating the solid in the topology store.
    ///
    /// # Errors
    ///
    /// Returns [`OperationError::InvalidInput`] if the direction is zero-length
    /// or lies in the face's plane.
    pub fn execute(&self, store: &mut TopologyStore) -> Result<SolidId> {
        if self.direction.norm() < TOLERANCE {
            return Err(
                OperationError::InvalidInput("extrude direction must be non-zero".into()).into(),
            );
        }

        let loops = store.face_loops(self.face)?;
        let normal = newell_normal(&loops.outer)?;
        if normal.dot(&self.direction).abs() < TOLERANCE * self.direction.norm() {
            return Err(OperationError::InvalidInput(
                "extrude direction lies in the face plane".into(),
            )
            .into());
        }

        // Outer loop counter-clockwise seen from the tip of the direction,
        // holes clockwise. Side quads built from these face outward.
        let outer = orient(loops.outer, &self.direction, true)?;
        let holes = loops
            .holes
            .into_iter()
            .map(|h| orient(h, &self.direction, false))
            .collect::<Result<Vec<_>>>()?;

        let bottom = make_planar_face(
            store,
            &reversed(&outer),
            &holes.iter().map(|h| reversed(h)).collect::<Vec<_>>(),
        )?;
        let top = make_planar_face(
            store,
            &translate(&outer, &self.direction),
            &holes
                .iter()
                .map(|h| translate(h, &self.direction))
                .collect::<Vec<_>>(),
        )?;

        let mut faces = vec![bottom, top];
        for ring in std::iter::once(&outer).chain(&holes) {
            let lifted = translate(ring, &self.direction);
            let n = ring.len();
            for i in 0..n {
                let j = (i + 1) % n;
                let quad = [ring[i], ring[j], lifted[j], lifted[i]];
                faces.push(make_planar_face(store, &quad, &[])?);
            }
        }

        let shell = store.add_shell(ShellData {
            faces,
            is_closed: true,
        });
        MakeSolid::new(shell, vec![]).execute(store)
    }
}

/// Reverses `points` if needed so the loop winds counter-clockwise
/// (`ccw = true`) or clockwise around `direction`.
fn orient(points: Vec<Point3>, direction: &Vector3, ccw: bool) -> Result<Vec<Point3>> {
    let aligned = newell_normal(&points)?.dot(direction) > 0.0;
    Ok(if aligned == ccw {
        points
    } else {
        points.into_iter().rev().collect()
    })
}

fn translate(points: &[Point3], offset: &Vector3) -> Vec<Point3> {
    points.iter().map(|p| p + offset).collect()
}

fn reversed(points: &[Point3]) -> Vec<Point3> {
    points.iter().rev().copied().collect()
}

/// Creates a planar face from point loops using `MakeWire` + `MakeFace`.
fn make_planar_face(
    store: &mut TopologyStore,
    outer: &[Point3],
    holes: &[Vec<Point3>],
) -> Result<FaceId> {
    let outer_wire = MakeWire::new(outer.to_vec(), true).execute(store)?;
    let inner_wires = holes
        .iter()
        .map(|h| MakeWire::new(h.clone(), true).execute(store))
        .collect::<Result<Vec<_>>>()?;
    MakeFace::new(outer_wire, inner_wires).execute(store)
}
