use super::face::FaceId;

slotmap::new_key_type! {
    /// Key of a shell in a [`TopologyStore`](super::TopologyStore).
    pub struct ShellId;
}

/// A connected set of faces. Face order defines the face indices seen by
/// the analyses.
#[derive(Debug, Clone)]
pub struct ShellData {
    pub faces: Vec<FaceId>,
    /// Whether the shell was built as watertight. Validation re-checks this
    /// from the geometry.
    pub is_closed: bool,
}
