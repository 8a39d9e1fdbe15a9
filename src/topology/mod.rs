pub mod edge;
pub mod face;
pub mod shell;
pub mod solid;
pub mod vertex;
pub mod wire;

pub use edge::{EdgeData, EdgeId};
pub use face::{FaceData, FaceId, FaceSurface};
pub use shell::{ShellData, ShellId};
pub use solid::{SolidData, SolidId};
pub use vertex::{VertexData, VertexId};
pub use wire::{OrientedEdge, WireData, WireId};

use crate::error::TopologyError;
use crate::math::Point3;
use slotmap::SlotMap;

/// Central arena that owns all topological entities.
///
/// Entities reference each other via typed IDs (generational indices),
/// avoiding self-referential structures.
#[derive(Debug, Default)]
pub struct TopologyStore {
    vertices: SlotMap<VertexId, VertexData>,
    edges: SlotMap<EdgeId, EdgeData>,
    wires: SlotMap<WireId, WireData>,
    faces: SlotMap<FaceId, FaceData>,
    shells: SlotMap<ShellId, ShellData>,
    solids: SlotMap<SolidId, SolidData>,
}

/// Boundary loops of a face as point sequences, outer first.
#[derive(Debug, Clone)]
pub struct FaceLoops {
    pub outer: Vec<Point3>,
    pub holes: Vec<Vec<Point3>>,
}

impl FaceLoops {
    /// All loops, outer first.
    pub fn iter(&self) -> impl Iterator<Item = &Vec<Point3>> {
        std::iter::once(&self.outer).chain(&self.holes)
    }
}

macro_rules! accessors {
    ($add:ident, $get:ident, $field:ident, $id:ty, $data:ty, $name:literal) => {
        #[doc = concat!("Inserts a ", $name, " and returns its ID.")]
        pub fn $add(&mut self, data: $data) -> $id {
            self.$field.insert(data)
        }

        #[doc = concat!("Returns the ", $name, " data.")]
        ///
        /// # Errors
        ///
        /// Returns [`TopologyError::EntityNotFound`] if the ID is stale.
        pub fn $get(&self, id: $id) -> Result<&$data, TopologyError> {
            self.$field
                .get(id)
                .ok_or_else(|| TopologyError::EntityNotFound($name.into()))
        }
    };
}

impl TopologyStore {
    /// Creates a new, empty topology store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    accessors!(add_vertex, vertex, vertices, VertexId, VertexData, "vertex");
    accessors!(add_edge, edge, edges, EdgeId, EdgeData, "edge");
    accessors!(add_wire, wire, wires, WireId, WireData, "wire");
    accessors!(add_face, face, faces, FaceId, FaceData, "face");
    accessors!(add_shell, shell, shells, ShellId, ShellData, "shell");
    accessors!(add_solid, solid, solids, SolidId, SolidData, "solid");

    /// Vertex positions of a wire in traversal order.
    ///
    /// # Errors
    ///
    /// Returns an error if the wire or any of its edges or vertices is missing.
    pub fn wire_points(&self, wire: WireId) -> Result<Vec<Point3>, TopologyError> {
        let wire = self.wire(wire)?;
        wire.edges
            .iter()
            .map(|oe| {
                let edge = self.edge(oe.edge)?;
                let vid = if oe.forward { edge.start } else { edge.end };
                Ok(self.vertex(vid)?.point)
            })
            .collect()
    }

    /// Outer and inner boundary points of a face.
    ///
    /// # Errors
    ///
    /// Returns an error if the face or its wires cannot be resolved.
    pub fn face_loops(&self, face: FaceId) -> Result<FaceLoops, TopologyError> {
        let data = self.face(face)?;
        let outer = self.wire_points(data.outer_wire)?;
        let holes = data
            .inner_wires
            .iter()
            .map(|&w| self.wire_points(w))
            .collect::<Result<_, _>>()?;
        Ok(FaceLoops { outer, holes })
    }

    /// Faces of every shell of a solid, outer shell first.
    ///
    /// # Errors
    ///
    /// Returns an error if the solid or one of its shells is missing.
    pub fn solid_faces(&self, solid: SolidId) -> Result<Vec<FaceId>, TopologyError> {
        let data = self.solid(solid)?;
        let mut faces = Vec::new();
        for &shell in std::iter::once(&data.outer_shell).chain(&data.inner_shells) {
            faces.extend_from_slice(&self.shell(shell)?.faces);
        }
        Ok(faces)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn stale_ids_are_reported() {
        let mut store = TopologyStore::new();
        let id = store.add_vertex(VertexData {
            point: Point3::origin(),
        });
        let other = TopologyStore::new();
        assert!(store.vertex(id).is_ok());
        assert!(matches!(
            other.vertex(id),
            Err(TopologyError::EntityNotFound(name)) if name == "vertex"
        ));
    }

    #[test]
    fn wire_points_follow_edge_orientation() {
        let mut store = TopologyStore::new();
        let a = store.add_vertex(VertexData {
            point: Point3::new(0.0, 0.0, 0.0),
        });
        let b = store.add_vertex(VertexData {
            point: Point3::new(1.0, 0.0, 0.0),
        });
        let e0 = store.add_edge(EdgeData { start: a, end: b });
        let e1 = store.add_edge(EdgeData { start: a, end: b });
        let wire = store.add_wire(WireData {
            edges: vec![
                OrientedEdge {
                    edge: e0,
                    forward: true,
                },
                OrientedEdge {
                    edge: e1,
                    forward: false,
                },
            ],
            is_closed: true,
        });
        let pts = store.wire_points(wire).unwrap();
        assert_eq!(pts, vec![Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 0.0, 0.0)]);
    }
}
