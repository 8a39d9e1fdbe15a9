use super::edge::EdgeId;

slotmap::new_key_type! {
    /// Key of a wire in a [`TopologyStore`](super::TopologyStore).
    pub struct WireId;
}

/// An edge use inside a wire.
#[derive(Debug, Clone, Copy)]
pub struct OrientedEdge {
    pub edge: EdgeId,
    /// `true` traverses start → end, `false` end → start.
    pub forward: bool,
}

/// An ordered chain of edge uses. Face boundaries are always closed.
#[derive(Debug, Clone)]
pub struct WireData {
    pub edges: Vec<OrientedEdge>,
    pub is_closed: bool,
}
