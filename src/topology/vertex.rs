use crate::math::Point3;

slotmap::new_key_type! {
    /// Key of a vertex in a [`TopologyStore`](super::TopologyStore).
    pub struct VertexId;
}

/// A topological vertex: a position shared by the edges meeting there.
#[derive(Debug, Clone)]
pub struct VertexData {
    pub point: Point3,
}
