//! # State
//!
//! A [`Scene`] is the node hierarchy together with the per-type registry of its live nodes. All the lifecycle
//! operations go through the scene, so that the two never disagree about which nodes exist.

pub mod graph;
pub mod node_type;
pub mod transform;

use crate::commands::{self, CommandConsumer, CommandError, DoUndo, GraphCommand, MetaCommand};
use graph::{Location, NodeID, SceneGraph, TargetError};
use node_type::{NodeKind, NodeTypeInfo, NodeTypeRegistry};

pub type SceneID = crate::ArborID<Scene>;

pub struct Scene {
    id: SceneID,
    graph: SceneGraph,
    types: NodeTypeRegistry,
}
impl std::fmt::Debug for Scene {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scene")
            .field("id", &self.id)
            .field("graph", &self.graph)
            .field("instances", &self.types.instance_count())
            .finish()
    }
}
impl Scene {
    /// An empty scene, with node type names and icons from `infos`.
    #[must_use]
    pub fn new(id: SceneID, infos: &hashbrown::HashMap<NodeKind, NodeTypeInfo>) -> Self {
        Self {
            id,
            graph: SceneGraph::default(),
            types: NodeTypeRegistry::new(id, infos),
        }
    }
    #[must_use]
    pub fn id(&self) -> SceneID {
        self.id
    }
    #[must_use]
    pub fn graph(&self) -> &SceneGraph {
        &self.graph
    }
    pub(crate) fn graph_mut(&mut self) -> &mut SceneGraph {
        &mut self.graph
    }
    #[must_use]
    pub fn types(&self) -> &NodeTypeRegistry {
        &self.types
    }
    /// Access the registry for listener management.
    ///
    /// Listeners are called with the scene locked, so they must not call back into the scene's queue.
    pub fn types_mut(&mut self) -> &mut NodeTypeRegistry {
        &mut self.types
    }
    /// Create a node and register it with its type.
    pub(crate) fn add_node(
        &mut self,
        location: Location,
        name: String,
        kind: NodeKind,
    ) -> Result<NodeID, TargetError> {
        let id = self.graph.add_node(location, name, kind)?;
        self.types.get_mut(kind).add_instance(id);
        Ok(id)
    }
    /// Flag the node as deleted, unregistering it and every descendant that was live.
    pub(crate) fn delete(&mut self, id: NodeID) -> Result<(), TargetError> {
        let node = self.graph.get(id).ok_or(TargetError::TargetNotFound)?;
        if node.is_deleted() {
            return Err(TargetError::TargetDeleted);
        }
        // Children first.
        for (node, kind) in self.graph.live_subtree(id).into_iter().rev() {
            self.types.get_mut(kind).remove_instance(node);
        }
        self.graph.set_deleted(id, true)?;
        log::debug!("Deleted {id} from {}", self.id);
        Ok(())
    }
    /// Undo a deletion, registering the node and every descendant that becomes live.
    pub(crate) fn restore(&mut self, id: NodeID) -> Result<(), TargetError> {
        let node = self.graph.get(id).ok_or(TargetError::TargetNotFound)?;
        if !node.is_deleted() {
            return Err(TargetError::TargetNotDeleted);
        }
        self.graph.set_deleted(id, false)?;
        for (node, kind) in self.graph.live_subtree(id) {
            self.types.get_mut(kind).add_instance(node);
        }
        log::debug!("Restored {id} in {}", self.id);
        Ok(())
    }
    /// Empty the scene, as on reload. Type listeners stay subscribed, but are not notified.
    /// IDs of removed nodes are not handed out again.
    pub(crate) fn reset(&mut self) {
        self.graph.clear();
        self.types.reset();
        log::debug!("Reset {}", self.id);
    }
    fn expect_deleted(&self, id: NodeID, deleted: bool) -> Result<(), CommandError> {
        let node = self.graph.get(id).ok_or(CommandError::UnknownResource)?;
        if node.is_deleted() == deleted {
            Ok(())
        } else {
            Err(CommandError::MismatchedState)
        }
    }
}

impl CommandConsumer<GraphCommand> for Scene {
    fn apply(&mut self, command: DoUndo<'_, GraphCommand>) -> Result<(), CommandError> {
        match command {
            DoUndo::Do(GraphCommand::Reparent {
                target,
                old_parent: from_parent,
                old_child_idx: from_idx,
                new_parent: to_parent,
                new_child_idx: to_idx,
            })
            | DoUndo::Undo(GraphCommand::Reparent {
                target,
                new_parent: from_parent,
                new_child_idx: from_idx,
                old_parent: to_parent,
                old_child_idx: to_idx,
            }) => {
                if self.graph.location_of(*target) != Some((*from_parent, *from_idx)) {
                    return Err(CommandError::MismatchedState);
                }
                self.graph
                    .set_parent(*target, Location::at(*to_parent, *to_idx))?;
                Ok(())
            }
            DoUndo::Do(GraphCommand::NodeCreated {
                target,
                destination,
                ..
            }) => {
                self.expect_deleted(*target, true)?;
                if self.graph.parent_of(*target) != Some(*destination) {
                    return Err(CommandError::MismatchedState);
                }
                self.restore(*target)?;
                Ok(())
            }
            DoUndo::Undo(GraphCommand::NodeCreated { target, .. })
            | DoUndo::Do(GraphCommand::NodeDeleted { target }) => {
                self.expect_deleted(*target, false)?;
                self.delete(*target)?;
                Ok(())
            }
            DoUndo::Undo(GraphCommand::NodeDeleted { target }) => {
                self.restore(*target)?;
                Ok(())
            }
            DoUndo::Do(GraphCommand::LocalTransformChanged { target, from, to })
            | DoUndo::Undo(GraphCommand::LocalTransformChanged {
                target,
                from: to,
                to: from,
            }) => {
                let local = self.graph.local_transform(*target);
                if local.is_none() && self.graph.get(*target).is_none() {
                    return Err(CommandError::UnknownResource);
                }
                if local != Some(*from) {
                    return Err(CommandError::MismatchedState);
                }
                self.graph.set_local_transform(*target, *to)?;
                Ok(())
            }
            DoUndo::Do(GraphCommand::Renamed { target, from, to })
            | DoUndo::Undo(GraphCommand::Renamed {
                target,
                from: to,
                to: from,
            }) => {
                let node = self.graph.get(*target).ok_or(CommandError::UnknownResource)?;
                if node.name() != from.as_str() {
                    return Err(CommandError::MismatchedState);
                }
                self.graph.rename(*target, to.clone())?;
                Ok(())
            }
        }
    }
}
impl CommandConsumer<commands::Command> for Scene {
    fn apply(&mut self, command: DoUndo<'_, commands::Command>) -> Result<(), CommandError> {
        use commands::Command;
        match command {
            DoUndo::Do(Command::Graph(graph)) => self.apply(DoUndo::Do(graph)),
            DoUndo::Undo(Command::Graph(graph)) => self.apply(DoUndo::Undo(graph)),
            // Recursively do each of the commands in the scope, in order.
            DoUndo::Do(Command::Meta(MetaCommand::Scope(_, scope))) => {
                commands::apply_all(self, scope.iter().map(DoUndo::Do))
            }
            // Recursively undo each of the commands of the scope, in reverse order.
            DoUndo::Undo(Command::Meta(MetaCommand::Scope(_, scope))) => {
                commands::apply_all(self, scope.iter().rev().map(DoUndo::Undo))
            }
            DoUndo::Do(Command::Meta(MetaCommand::Pushed { primary, pushed })) => {
                commands::apply_all(
                    self,
                    std::iter::once(&**primary)
                        .chain(pushed.iter())
                        .map(DoUndo::Do),
                )
            }
            // Primary first, then the pushed commands most-recent-first.
            DoUndo::Undo(Command::Meta(MetaCommand::Pushed { primary, pushed })) => {
                commands::apply_all(
                    self,
                    std::iter::once(&**primary)
                        .chain(pushed.iter().rev())
                        .map(DoUndo::Undo),
                )
            }
            DoUndo::Do(Command::Dummy) | DoUndo::Undo(Command::Dummy) => Ok(()),
        }
    }
}
