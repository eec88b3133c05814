//! # Graph
//!
//! The nodes of a scene form a tree, stored in an arena. Every node has at most one parent; nodes without one
//! sit directly under a hidden root, which is never handed out. Deleted nodes stay in the arena, flagged, so
//! that their deletion can be undone. Their descendants are unreachable until then.

pub mod commands;
mod stable_id;
pub mod writer;

use super::node_type::NodeKind;
use super::transform::{ReparentPolicy, Transform};
pub use stable_id::{NodeID, SceneNode};

#[derive(Clone, PartialEq, Debug)]
pub struct NodeData {
    // NOT public, the node type registry relies on this never changing!
    kind: NodeKind,
    /// Relative to the parent's frame. Present iff `kind` is spatial.
    transform: Option<Transform>,
    // NOT public, the user could break the command queue by mutating this!
    /// Represents whether the node is deleted, or the command that created it has been undone.
    deleted: bool,
    name: String,
}
impl NodeData {
    fn new(name: String, kind: NodeKind) -> Self {
        Self {
            kind,
            transform: kind.is_spatial().then(Transform::identity),
            deleted: false,
            name,
        }
    }
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
    #[must_use]
    pub fn kind(&self) -> NodeKind {
        self.kind
    }
    #[must_use]
    pub fn transform(&self) -> Option<&Transform> {
        self.transform.as_ref()
    }
    #[must_use]
    pub fn is_spatial(&self) -> bool {
        self.transform.is_some()
    }
    /// Whether this node itself is flagged deleted. A node may be unreachable
    /// because of a deleted ancestor while this is false, see [`SceneGraph::is_live`].
    #[must_use]
    pub fn is_deleted(&self) -> bool {
        self.deleted
    }
}

#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetError {
    #[error("ID not found")]
    TargetNotFound,
    #[error("target ID is deleted")]
    TargetDeleted,
    #[error("target has no transform")]
    NoTransform,
    #[error("transform is not finite")]
    NonFiniteTransform,
    #[error("target is not deleted")]
    TargetNotDeleted,
}

#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReparentError {
    #[error("target not found: {}", .0)]
    TargetError(TargetError),
    #[error("destination not found: {}", .0)]
    DestinationError(TargetError),
    #[error("can't reparent to the node itself or its own [grand]children")]
    WouldCycle,
}

/// Where a node should end up. Child indices count deleted siblings too,
/// so that recorded positions survive deletions being undone.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Location {
    /// Calculate the index and parent, such that the location
    /// referenced is the sibling above this node.
    AboveSelection(NodeID),
    /// Set as the nth child of this node, where top = 0
    ///
    /// An index too large will be clamped to the bottom position.
    IndexIntoNode(NodeID, usize),
    /// Set as the nth child of the root, where top = 0
    ///
    /// An index too large will be clamped to the bottom position.
    IndexIntoRoot(usize),
}
impl Location {
    /// The bottom position under `parent`, or under the root if None.
    #[must_use]
    pub fn end_of(parent: Option<NodeID>) -> Self {
        Self::at(parent, usize::MAX)
    }
    /// The nth position under `parent`, or under the root if None.
    #[must_use]
    pub fn at(parent: Option<NodeID>, child_idx: usize) -> Self {
        match parent {
            Some(parent) => Self::IndexIntoNode(parent, child_idx),
            None => Self::IndexIntoRoot(child_idx),
        }
    }
}

pub struct SceneGraph {
    tree: id_tree::Tree<NodeData>,
    root: id_tree::NodeId,
    ids: stable_id::StableIDMap,
}
impl Default for SceneGraph {
    fn default() -> Self {
        let (tree, root) = Self::empty_tree();
        Self {
            tree,
            root,
            ids: stable_id::StableIDMap::default(),
        }
    }
}
impl std::fmt::Debug for SceneGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SceneGraph")
            .field("nodes", &self.ids.len())
            .finish_non_exhaustive()
    }
}
// Public methods for client
impl SceneGraph {
    /// Iterate the live children of the root
    pub fn iter_top_level(&self) -> impl Iterator<Item = (NodeID, &NodeData)> + '_ {
        self.iter_children_of_raw(&self.root).into_iter().flatten()
    }
    /// Iterate the live children of this node, or None if it is not live.
    #[must_use]
    pub fn iter_children(
        &self,
        parent: NodeID,
    ) -> Option<impl Iterator<Item = (NodeID, &NodeData)> + '_> {
        let tree_id = self.live_tree_id(parent).ok()?;
        self.iter_children_of_raw(&tree_id)
    }
    /// Collect the live children of `parent`, or of the root if None.
    #[must_use]
    pub fn children_of(&self, parent: Option<NodeID>) -> Option<Vec<NodeID>> {
        Some(match parent {
            Some(parent) => self.iter_children(parent)?.map(|(id, _)| id).collect(),
            None => self.iter_top_level().map(|(id, _)| id).collect(),
        })
    }
    /// Iterate all live nodes, parents before their children.
    pub fn iter(&self) -> impl Iterator<Item = (NodeID, &NodeData)> + '_ {
        self.iter_live_from(&self.root)
    }
    pub fn get(&self, id: NodeID) -> Option<&NodeData> {
        let tree_id = self.ids.tree_id(id)?;
        self.tree.get(tree_id).ok().map(id_tree::Node::data)
    }
    /// Whether the node exists, and neither it nor any of its ancestors are deleted.
    #[must_use]
    pub fn is_live(&self, id: NodeID) -> bool {
        self.live_tree_id(id).is_ok()
    }
    /// Get the (parent, idx) of the node. Parent is None if root is the parent.
    #[must_use]
    pub fn location_of(&self, id: NodeID) -> Option<(Option<NodeID>, usize)> {
        let tree_id = self.ids.tree_id(id)?;
        // Never None - user doesn't have access to the root's ID!
        let parent = self.tree.get(tree_id).ok()?.parent()?;
        let child_idx = self.child_idx(parent, tree_id)?;
        // Will be None if parent is root.
        Some((self.ids.node_id(parent), child_idx))
    }
    #[must_use]
    pub fn parent_of(&self, id: NodeID) -> Option<Option<NodeID>> {
        self.location_of(id).map(|(parent, _)| parent)
    }
    /// Reparent the target onto a new parent.
    /// Children are brought along for the ride!
    pub fn set_parent(&mut self, target: NodeID, destination: Location) -> Result<(), ReparentError> {
        let target_tree_id = self
            .live_tree_id(target)
            .map_err(ReparentError::TargetError)?;
        if destination == Location::AboveSelection(target) {
            // Already above itself.
            return Ok(());
        }
        let (destination_id, idx) = self
            .find_location(destination)
            .map_err(ReparentError::DestinationError)?;
        // Are we trying to reparent to one of this node's own children
        // or itself?
        let ancestors = self
            .tree
            .ancestor_ids(&destination_id)
            .map_err(|_| ReparentError::DestinationError(TargetError::TargetNotFound))?;
        if std::iter::once(&destination_id)
            .chain(ancestors)
            .any(|ancestor| *ancestor == target_tree_id)
        {
            return Err(ReparentError::WouldCycle);
        }

        self.tree
            .move_node(
                &target_tree_id,
                id_tree::MoveBehavior::ToParent(&destination_id),
            )
            .map_err(|_| ReparentError::DestinationError(TargetError::TargetNotFound))?;

        let idx = match destination {
            // The selection shifts up if the target used to be above it.
            Location::AboveSelection(selection) => self
                .ids
                .tree_id(selection)
                .and_then(|selection| self.child_idx(&destination_id, selection))
                .unwrap_or(idx),
            Location::IndexIntoNode(..) | Location::IndexIntoRoot(..) => idx,
        };
        self.place_nth(&target_tree_id, idx);

        Ok(())
    }
    #[must_use]
    pub fn local_transform(&self, id: NodeID) -> Option<Transform> {
        self.get(id)?.transform
    }
    /// The node's transform in scene space: every spatial ancestor's local transform, outermost first,
    /// then its own. Non-spatial nodes take their parent's frame.
    #[must_use]
    pub fn world_transform(&self, id: NodeID) -> Option<Transform> {
        let tree_id = self.ids.tree_id(id)?;
        Some(self.raw_world_transform(tree_id))
    }
}
// Private methods for writer/applier
impl SceneGraph {
    fn empty_tree() -> (id_tree::Tree<NodeData>, id_tree::NodeId) {
        let mut tree = id_tree::TreeBuilder::new().build();
        // The root's data is never observed.
        let root = tree
            .insert(
                id_tree::Node::new(NodeData::new(String::new(), NodeKind::Group)),
                id_tree::InsertBehavior::AsRoot,
            )
            .unwrap_or_else(|_| unreachable!("inserting a root into an empty tree"));
        (tree, root)
    }
    /// Remove every node, deleted or not. IDs of removed nodes are not handed out again.
    pub(crate) fn clear(&mut self) {
        (self.tree, self.root) = Self::empty_tree();
        self.ids.clear();
    }
    fn live_tree_id(&self, id: NodeID) -> Result<id_tree::NodeId, TargetError> {
        let tree_id = self.ids.tree_id(id).ok_or(TargetError::TargetNotFound)?;
        if self.raw_is_live(tree_id) {
            Ok(tree_id.clone())
        } else {
            Err(TargetError::TargetDeleted)
        }
    }
    fn raw_is_live(&self, tree_id: &id_tree::NodeId) -> bool {
        let Ok(ancestors) = self.tree.ancestor_ids(tree_id) else {
            return false;
        };
        std::iter::once(tree_id)
            .chain(ancestors)
            .all(|id| self.tree.get(id).is_ok_and(|node| !node.data().deleted))
    }
    fn child_idx(&self, parent: &id_tree::NodeId, child: &id_tree::NodeId) -> Option<usize> {
        self.tree
            .get(parent)
            .ok()?
            .children()
            .iter()
            .position(|id| id == child)
    }
    /// Iterate the children of this raw ID. A helper method for all various iters!
    fn iter_children_of_raw<'s>(
        &'s self,
        tree_id: &id_tree::NodeId,
    ) -> Option<impl Iterator<Item = (NodeID, &'s NodeData)> + 's> {
        Some(self.tree.children_ids(tree_id).ok()?.filter_map(|tree_id| {
            let node = self.tree.get(tree_id).ok()?.data();
            // Skip children marked as deleted
            if node.deleted {
                return None;
            }
            let id = self
                .ids
                .node_id(tree_id)
                // Every node but the root has an ID, and the root is never a child.
                .expect("Unknown node encountered in iteration");
            Some((id, node))
        }))
    }
    /// Pre-order iteration from this raw ID, skipping deleted subtrees and the root.
    fn iter_live_from<'s>(
        &'s self,
        start: &'s id_tree::NodeId,
    ) -> impl Iterator<Item = (NodeID, &'s NodeData)> + 's {
        let is_undeleted =
            |id: &&id_tree::NodeId| self.tree.get(id).is_ok_and(|node| !node.data().deleted);
        let mut stack: Vec<&id_tree::NodeId> = std::iter::once(start).filter(is_undeleted).collect();
        std::iter::from_fn(move || loop {
            let tree_id = stack.pop()?;
            let node = self.tree.get(tree_id).ok()?;
            // Reversed, so that the first child is popped first.
            stack.extend(node.children().iter().rev().filter(is_undeleted));
            if let Some(id) = self.ids.node_id(tree_id) {
                return Some((id, node.data()));
            }
        })
    }
    /// Convert a location to a parent and child idx
    /// Ok result implies the parent is both present and live.
    fn find_location(&self, location: Location) -> Result<(id_tree::NodeId, usize), TargetError> {
        match location {
            Location::AboveSelection(selection) => {
                let selection = self.live_tree_id(selection)?;
                // The root is never selectable, so there's always a parent.
                let parent = self
                    .tree
                    .get(&selection)
                    .ok()
                    .and_then(|node| node.parent().cloned())
                    .ok_or(TargetError::TargetNotFound)?;
                let idx = self
                    .child_idx(&parent, &selection)
                    .ok_or(TargetError::TargetNotFound)?;
                Ok((parent, idx))
            }
            Location::IndexIntoNode(node, idx) => Ok((self.live_tree_id(node)?, idx)),
            Location::IndexIntoRoot(idx) => Ok((self.root.clone(), idx)),
        }
    }
    /// Move the node to the nth position among its siblings, clamped to the bottom.
    fn place_nth(&mut self, tree_id: &id_tree::NodeId, idx: usize) {
        let siblings = self
            .tree
            .get(tree_id)
            .ok()
            .and_then(id_tree::Node::parent)
            .and_then(|parent| self.tree.get(parent).ok())
            .map_or(1, |parent| parent.children().len());
        let idx = idx.min(siblings.saturating_sub(1));
        // Can't fail, presence was just checked.
        let _ = self.tree.make_nth_sibling(tree_id, idx);
    }
    fn raw_world_transform(&self, tree_id: &id_tree::NodeId) -> Transform {
        let Ok(ancestors) = self.tree.ancestor_ids(tree_id) else {
            return Transform::identity();
        };
        let chain: Vec<&id_tree::NodeId> = std::iter::once(tree_id).chain(ancestors).collect();
        chain
            .into_iter()
            .rev()
            .filter_map(|id| self.tree.get(id).ok()?.data().transform)
            .fold(Transform::identity(), |world, local| world.compose(&local))
    }
    fn get_mut(&mut self, id: NodeID) -> Option<&mut NodeData> {
        let tree_id = self.ids.tree_id(id)?;
        self.tree.get_mut(tree_id).ok().map(id_tree::Node::data_mut)
    }
    pub(crate) fn add_node(
        &mut self,
        location: Location,
        name: String,
        kind: NodeKind,
    ) -> Result<NodeID, TargetError> {
        // Convert this location to a parent ID and a child idx.
        let (parent_id, idx) = self.find_location(location)?;
        let new_node = self
            .tree
            .insert(
                id_tree::Node::new(NodeData::new(name, kind)),
                id_tree::InsertBehavior::UnderNode(&parent_id),
            )
            .map_err(|_| TargetError::TargetNotFound)?;
        self.place_nth(&new_node, idx);

        Ok(self.ids.insert(new_node))
    }
    /// Flag or unflag a node as deleted. Returns the previous flag.
    pub(crate) fn set_deleted(&mut self, id: NodeID, deleted: bool) -> Result<bool, TargetError> {
        let node = self.get_mut(id).ok_or(TargetError::TargetNotFound)?;
        Ok(std::mem::replace(&mut node.deleted, deleted))
    }
    /// Returns the replaced name.
    pub(crate) fn rename(&mut self, id: NodeID, name: String) -> Result<String, TargetError> {
        let node = self.get_mut(id).ok_or(TargetError::TargetNotFound)?;
        Ok(std::mem::replace(&mut node.name, name))
    }
    /// Returns the replaced transform.
    pub(crate) fn set_local_transform(
        &mut self,
        id: NodeID,
        transform: Transform,
    ) -> Result<Transform, TargetError> {
        let node = self.get_mut(id).ok_or(TargetError::TargetNotFound)?;
        let local = node.transform.as_mut().ok_or(TargetError::NoTransform)?;
        if !transform.is_finite() {
            return Err(TargetError::NonFiniteTransform);
        }
        Ok(std::mem::replace(local, transform))
    }
    /// The node and its live descendants, parents first. Empty if the node isn't live.
    pub(crate) fn live_subtree(&self, id: NodeID) -> Vec<(NodeID, NodeKind)> {
        let Ok(tree_id) = self.live_tree_id(id) else {
            return Vec::new();
        };
        self.iter_live_from(&tree_id)
            .map(|(id, node)| (id, node.kind))
            .collect()
    }
    /// Re-derive the target's local transform after it was reparented, given its world transform from before.
    /// Makes the change and returns it as a command, or None if the node isn't spatial or nothing changed.
    ///
    /// A parent frame that can't be inverted (collapsed to zero scale) has no world position to preserve
    /// against, so the local transform is kept as under [`ReparentPolicy::KeepLocal`].
    pub(crate) fn compute_object_components(
        &mut self,
        target: NodeID,
        world_before: Transform,
        policy: ReparentPolicy,
    ) -> Option<commands::Command> {
        match policy {
            ReparentPolicy::KeepLocal => None,
            ReparentPolicy::PreserveWorld => {
                let tree_id = self.ids.tree_id(target)?;
                let node = self.tree.get(tree_id).ok()?;
                let from = node.data().transform?;
                let parent_world = node
                    .parent()
                    .map(|parent| self.raw_world_transform(parent))
                    .unwrap_or_default();
                if !parent_world.is_invertible() {
                    log::debug!("Parent frame of {target} is degenerate, keeping its local transform");
                    return None;
                }

                let to = parent_world.inverse().compose(&world_before);
                if to == from || !to.is_finite() {
                    return None;
                }
                self.set_local_transform(target, to).ok()?;
                Some(commands::Command::LocalTransformChanged { target, from, to })
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use ultraviolet::Vec3;

    /// ```ignore
    ///   <root>
    ///    /  \
    ///   A    D
    ///   |
    ///   B
    ///   |
    ///   C
    /// ```
    fn make_test_graph() -> (SceneGraph, [NodeID; 4]) {
        let mut graph = SceneGraph::default();
        let a = graph
            .add_node(Location::IndexIntoRoot(0), "A".to_owned(), NodeKind::Group)
            .unwrap();
        let b = graph
            .add_node(Location::end_of(Some(a)), "B".to_owned(), NodeKind::Group)
            .unwrap();
        let c = graph
            .add_node(Location::end_of(Some(b)), "C".to_owned(), NodeKind::Group)
            .unwrap();
        let d = graph
            .add_node(Location::end_of(None), "D".to_owned(), NodeKind::Group)
            .unwrap();
        (graph, [a, b, c, d])
    }
    #[test]
    fn structure() {
        let (graph, [a, b, c, d]) = make_test_graph();
        assert_eq!(graph.children_of(None), Some(vec![a, d]));
        assert_eq!(graph.children_of(Some(a)), Some(vec![b]));
        assert_eq!(graph.location_of(c), Some((Some(b), 0)));
        assert_eq!(graph.location_of(d), Some((None, 1)));
        assert_eq!(graph.get(b).map(NodeData::name), Some("B"));
        let order: Vec<_> = graph.iter().map(|(id, _)| id).collect();
        assert_eq!(order, [a, b, c, d]);
    }
    #[test]
    fn reparent_to_descendant_rejected() {
        let (mut graph, [a, b, c, _]) = make_test_graph();
        assert_eq!(
            graph.set_parent(a, Location::end_of(Some(c))),
            Err(ReparentError::WouldCycle)
        );
        assert_eq!(
            graph.set_parent(a, Location::end_of(Some(a))),
            Err(ReparentError::WouldCycle)
        );
        // No state change.
        assert_eq!(graph.parent_of(a), Some(None));
        assert_eq!(graph.parent_of(b), Some(Some(a)));
        assert_eq!(graph.parent_of(c), Some(Some(b)));
    }
    #[test]
    fn reparent_moves_children_along() {
        let (mut graph, [a, b, c, d]) = make_test_graph();
        graph.set_parent(b, Location::end_of(Some(d))).unwrap();
        assert_eq!(graph.children_of(Some(a)), Some(vec![]));
        assert_eq!(graph.children_of(Some(d)), Some(vec![b]));
        assert_eq!(graph.parent_of(c), Some(Some(b)));
        // To root, at the top.
        graph.set_parent(c, Location::IndexIntoRoot(0)).unwrap();
        assert_eq!(graph.children_of(None), Some(vec![c, a, d]));
    }
    #[test]
    fn above_selection() {
        let (mut graph, [a, _, _, d]) = make_test_graph();
        let e = graph
            .add_node(Location::end_of(None), "E".to_owned(), NodeKind::Mesh)
            .unwrap();
        // Target above the selection, in the same parent.
        graph.set_parent(a, Location::AboveSelection(e)).unwrap();
        assert_eq!(graph.children_of(None), Some(vec![d, a, e]));
        // Target below the selection.
        graph.set_parent(e, Location::AboveSelection(d)).unwrap();
        assert_eq!(graph.children_of(None), Some(vec![e, d, a]));
        // Above itself is a no-op.
        graph.set_parent(d, Location::AboveSelection(d)).unwrap();
        assert_eq!(graph.children_of(None), Some(vec![e, d, a]));
    }
    #[test]
    fn deleted_nodes_hide_subtrees() {
        let (mut graph, [a, b, c, d]) = make_test_graph();
        assert_eq!(graph.set_deleted(b, true), Ok(false));
        assert!(!graph.is_live(b));
        assert!(!graph.is_live(c));
        assert!(graph.get(c).is_some_and(|node| !node.is_deleted()));
        let order: Vec<_> = graph.iter().map(|(id, _)| id).collect();
        assert_eq!(order, [a, d]);

        assert_eq!(
            graph.set_parent(d, Location::end_of(Some(c))),
            Err(ReparentError::DestinationError(TargetError::TargetDeleted))
        );
        assert_eq!(
            graph.set_parent(c, Location::end_of(Some(d))),
            Err(ReparentError::TargetError(TargetError::TargetDeleted))
        );
        assert!(graph.live_subtree(b).is_empty());

        graph.set_deleted(b, false).unwrap();
        assert_eq!(
            graph.live_subtree(a),
            [
                (a, NodeKind::Group),
                (b, NodeKind::Group),
                (c, NodeKind::Group)
            ]
        );
    }
    #[test]
    fn world_transforms() {
        let mut graph = SceneGraph::default();
        let outer = graph
            .add_node(Location::end_of(None), "outer".to_owned(), NodeKind::Pivot)
            .unwrap();
        let group = graph
            .add_node(Location::end_of(Some(outer)), "group".to_owned(), NodeKind::Group)
            .unwrap();
        let inner = graph
            .add_node(Location::end_of(Some(group)), "inner".to_owned(), NodeKind::Locator)
            .unwrap();
        graph
            .set_local_transform(outer, Transform::from_translation(Vec3::new(1.0, 0.0, 0.0)))
            .unwrap();
        graph
            .set_local_transform(inner, Transform::from_translation(Vec3::new(0.0, 2.0, 0.0)))
            .unwrap();

        assert_eq!(graph.local_transform(group), None);
        assert_eq!(
            graph.set_local_transform(group, Transform::identity()),
            Err(TargetError::NoTransform)
        );
        // Groups pass their parent's frame through.
        assert_eq!(
            graph.world_transform(group).map(|t| t.translation),
            Some(Vec3::new(1.0, 0.0, 0.0))
        );
        assert_eq!(
            graph.world_transform(inner).map(|t| t.translation),
            Some(Vec3::new(1.0, 2.0, 0.0))
        );
    }
    #[test]
    fn object_components_preserve_world() {
        let mut graph = SceneGraph::default();
        let frame = graph
            .add_node(Location::end_of(None), "frame".to_owned(), NodeKind::Pivot)
            .unwrap();
        let light = graph
            .add_node(Location::end_of(None), "light".to_owned(), NodeKind::PointLight)
            .unwrap();
        graph
            .set_local_transform(frame, Transform::from_translation(Vec3::new(5.0, 0.0, 0.0)))
            .unwrap();
        graph
            .set_local_transform(light, Transform::from_translation(Vec3::new(1.0, 1.0, 0.0)))
            .unwrap();

        let before = graph.world_transform(light).unwrap();
        graph.set_parent(light, Location::end_of(Some(frame))).unwrap();
        let change = graph
            .compute_object_components(light, before, ReparentPolicy::PreserveWorld)
            .unwrap();

        assert!(matches!(
            change,
            commands::Command::LocalTransformChanged { target, .. } if target == light
        ));
        assert!(graph
            .world_transform(light)
            .unwrap()
            .approx_eq(&before, 1e-5));
        assert!(graph
            .local_transform(light)
            .unwrap()
            .approx_eq(&Transform::from_translation(Vec3::new(-4.0, 1.0, 0.0)), 1e-5));
        // Non-spatial nodes and KeepLocal leave things be.
        assert_eq!(
            graph.compute_object_components(light, before, ReparentPolicy::KeepLocal),
            None
        );
    }
    #[test]
    fn collapsed_parent_keeps_local() {
        let mut graph = SceneGraph::default();
        let frame = graph
            .add_node(Location::end_of(None), "frame".to_owned(), NodeKind::Pivot)
            .unwrap();
        let light = graph
            .add_node(Location::end_of(None), "light".to_owned(), NodeKind::PointLight)
            .unwrap();
        let start = Transform::from_translation(Vec3::new(1.0, 1.0, 0.0));
        graph
            .set_local_transform(
                frame,
                Transform {
                    scale: 0.0,
                    ..Transform::identity()
                },
            )
            .unwrap();
        graph.set_local_transform(light, start).unwrap();

        let before = graph.world_transform(light).unwrap();
        graph.set_parent(light, Location::end_of(Some(frame))).unwrap();
        assert_eq!(
            graph.compute_object_components(light, before, ReparentPolicy::PreserveWorld),
            None
        );
        assert_eq!(graph.local_transform(light), Some(start));
    }
    #[test]
    fn non_finite_transform_rejected() {
        let mut graph = SceneGraph::default();
        let pivot = graph
            .add_node(Location::end_of(None), "pivot".to_owned(), NodeKind::Pivot)
            .unwrap();
        assert_eq!(
            graph.set_local_transform(pivot, Transform::from_translation(Vec3::new(f32::NAN, 0.0, 0.0))),
            Err(TargetError::NonFiniteTransform)
        );
        assert_eq!(
            graph.set_local_transform(
                pivot,
                Transform {
                    scale: f32::INFINITY,
                    ..Transform::identity()
                }
            ),
            Err(TargetError::NonFiniteTransform)
        );
        assert_eq!(graph.local_transform(pivot), Some(Transform::identity()));
    }
    #[test]
    fn clear_never_reuses_ids() {
        let (mut graph, [a, _, _, d]) = make_test_graph();
        graph.clear();
        assert_eq!(graph.iter().count(), 0);
        assert_eq!(graph.get(a), None);
        assert_eq!(graph.location_of(d), None);

        let fresh = graph
            .add_node(Location::end_of(None), "fresh".to_owned(), NodeKind::Group)
            .unwrap();
        assert!(![a, d].contains(&fresh));
        assert_eq!(graph.children_of(None), Some(vec![fresh]));
    }
}
