use super::shell::ShellId;

slotmap::new_key_type! {
    /// Key of a solid in a [`TopologyStore`](super::TopologyStore).
    pub struct SolidId;
}

/// A bounded volume: one outer shell plus optional void shells.
#[derive(Debug, Clone)]
pub struct SolidData {
    pub outer_shell: ShellId,
    pub inner_shells: Vec<ShellId>,
}
