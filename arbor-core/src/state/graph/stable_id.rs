//! Glue between [`NodeID`]s and the arena's own `id_tree::NodeId`s. Arena IDs are neither `Copy` nor meaningful
//! outside of their tree, so only [`NodeID`]s ever leave the graph.

/// Namespace for node IDs.
pub struct SceneNode;
pub type NodeID = crate::ArborID<SceneNode>;

#[derive(Default)]
pub(super) struct StableIDMap {
    ids: crate::id::IdServer<SceneNode>,
    node_to_tree: hashbrown::HashMap<NodeID, id_tree::NodeId>,
    tree_to_node: hashbrown::HashMap<id_tree::NodeId, NodeID>,
}
impl StableIDMap {
    pub fn tree_id(&self, node: NodeID) -> Option<&id_tree::NodeId> {
        self.node_to_tree.get(&node)
    }
    pub fn node_id(&self, tree: &id_tree::NodeId) -> Option<NodeID> {
        self.tree_to_node.get(tree).copied()
    }
    /// Allocate a new ID for a freshly inserted arena node.
    pub fn insert(&mut self, tree: id_tree::NodeId) -> NodeID {
        let node = self.ids.allocate();
        self.node_to_tree.insert(node, tree.clone());
        self.tree_to_node.insert(tree, node);
        node
    }
    /// Forget every mapping. IDs handed out so far are never reused.
    pub fn clear(&mut self) {
        self.node_to_tree.clear();
        self.tree_to_node.clear();
    }
    pub fn len(&self) -> usize {
        self.node_to_tree.len()
    }
}
