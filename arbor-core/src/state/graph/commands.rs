use super::NodeID;
use crate::state::{node_type::NodeKind, transform::Transform};

#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    Reparent {
        target: NodeID,
        /// Old parent, or None if root.
        old_parent: Option<NodeID>,
        old_child_idx: usize,
        /// New parent, or None if root.
        new_parent: Option<NodeID>,
        new_child_idx: usize,
    },
    NodeCreated {
        target: NodeID,
        kind: NodeKind,
        /// Parent at creation, or None if root.
        destination: Option<NodeID>,
        child_idx: usize,
    },
    NodeDeleted {
        target: NodeID,
    },
    LocalTransformChanged {
        target: NodeID,
        from: Transform,
        to: Transform,
    },
    Renamed {
        target: NodeID,
        from: String,
        to: String,
    },
}
impl Command {
    /// The node this command is about.
    #[must_use]
    pub fn target(&self) -> NodeID {
        match self {
            Self::Reparent { target, .. }
            | Self::NodeCreated { target, .. }
            | Self::NodeDeleted { target }
            | Self::LocalTransformChanged { target, .. }
            | Self::Renamed { target, .. } => *target,
        }
    }
}
