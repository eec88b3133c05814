//! # Node types
//!
//! Every live node of a scene is registered with the [`NodeType`] of its [`NodeKind`]. Listings (like an
//! outliner grouped by type) observe the types for instances being added and removed, rather than polling the graph.
//!
//! Registration follows node lifecycles only: creating, deleting, and restoring nodes. Moving nodes around the
//! hierarchy never touches the registry.

use super::graph::NodeID;
use super::SceneID;
use crate::events::{Event, ListenerID, ListenerStatus};

/// The runtime type of a node.
#[derive(
    Copy,
    Clone,
    PartialEq,
    Eq,
    Hash,
    Debug,
    strum::EnumIter,
    strum::Display,
)]
pub enum NodeKind {
    /// Organizational only, no transform of its own.
    Group,
    Pivot,
    Joint,
    Mesh,
    Curve,
    Entity,
    Locator,
    Volume,
    PointLight,
    SpotLight,
    DirectionalLight,
    NavMesh,
}
impl NodeKind {
    /// Spatial nodes carry a local transform relative to their parent.
    /// Non-spatial nodes are positioned by their nearest spatial ancestor.
    #[must_use]
    pub fn is_spatial(self) -> bool {
        match self {
            Self::Pivot
            | Self::Joint
            | Self::Entity
            | Self::Locator
            | Self::Volume
            | Self::PointLight
            | Self::SpotLight
            | Self::DirectionalLight => true,
            Self::Group | Self::Mesh | Self::Curve | Self::NavMesh => false,
        }
    }
    /// Index into the 16x16 editor icon strip.
    #[must_use]
    pub fn default_icon_index(self) -> u32 {
        match self {
            Self::Group => 0,
            Self::Pivot | Self::Joint => 1,
            Self::Mesh => 2,
            Self::Curve => 3,
            Self::Entity => 4,
            Self::Locator => 5,
            Self::Volume => 6,
            Self::PointLight | Self::SpotLight | Self::DirectionalLight => 7,
            Self::NavMesh => 8,
        }
    }
}

/// Shared, per-kind presentation info.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NodeTypeInfo {
    pub name: String,
    pub icon_index: u32,
}
impl NodeTypeInfo {
    #[must_use]
    pub fn default_for(kind: NodeKind) -> Self {
        Self {
            name: kind.to_string(),
            icon_index: kind.default_icon_index(),
        }
    }
}

/// Payload of the added and removed notifications.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct NodeTypeChange {
    pub node: NodeID,
    pub kind: NodeKind,
}

/// All live instances of one [`NodeKind`] within a scene.
pub struct NodeType {
    kind: NodeKind,
    name: String,
    icon_index: u32,
    scene: SceneID,
    instances: hashbrown::HashSet<NodeID>,
    added: Event<NodeTypeChange>,
    removed: Event<NodeTypeChange>,
}
impl std::fmt::Debug for NodeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodeType")
            .field("kind", &self.kind)
            .field("name", &self.name)
            .field("scene", &self.scene)
            .field("instances", &self.instances.len())
            .finish_non_exhaustive()
    }
}
impl NodeType {
    #[must_use]
    pub fn new(scene: SceneID, kind: NodeKind, info: NodeTypeInfo) -> Self {
        Self {
            kind,
            name: info.name,
            icon_index: info.icon_index,
            scene,
            instances: hashbrown::HashSet::new(),
            added: Event::default(),
            removed: Event::default(),
        }
    }
    #[must_use]
    pub fn kind(&self) -> NodeKind {
        self.kind
    }
    #[must_use]
    pub fn scene(&self) -> SceneID {
        self.scene
    }
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }
    #[must_use]
    pub fn icon_index(&self) -> u32 {
        self.icon_index
    }
    pub fn set_icon_index(&mut self, index: u32) {
        self.icon_index = index;
    }
    #[must_use]
    pub fn instances(&self) -> &hashbrown::HashSet<NodeID> {
        &self.instances
    }
    #[must_use]
    pub fn contains(&self, node: NodeID) -> bool {
        self.instances.contains(&node)
    }
    /// Register a node, notifying the added listeners.
    ///
    /// # Panics
    /// If the node is already registered. Registration mirrors node lifecycles, so a
    /// duplicate means the lifecycle bookkeeping is broken.
    pub fn add_instance(&mut self, node: NodeID) {
        assert!(
            self.instances.insert(node),
            "{node} registered twice with node type {}",
            self.kind
        );
        log::trace!("{node} added to {}", self.kind);
        self.added.raise(&NodeTypeChange {
            node,
            kind: self.kind,
        });
    }
    /// Unregister a node, notifying the removed listeners.
    ///
    /// # Panics
    /// If the node was not registered.
    pub fn remove_instance(&mut self, node: NodeID) {
        assert!(
            self.instances.remove(&node),
            "{node} removed from node type {} it was never registered with",
            self.kind
        );
        log::trace!("{node} removed from {}", self.kind);
        self.removed.raise(&NodeTypeChange {
            node,
            kind: self.kind,
        });
    }
    /// Forget every instance at once, as on scene reload. Fires no notifications.
    pub(crate) fn reset(&mut self) {
        self.instances.clear();
    }
    pub fn add_added_listener<F>(&mut self, listener: F) -> ListenerID
    where
        F: FnMut(&NodeTypeChange) -> ListenerStatus + Send + Sync + 'static,
    {
        self.added.add(listener)
    }
    pub fn remove_added_listener(&mut self, id: ListenerID) -> bool {
        self.added.remove(id)
    }
    pub fn add_removed_listener<F>(&mut self, listener: F) -> ListenerID
    where
        F: FnMut(&NodeTypeChange) -> ListenerStatus + Send + Sync + 'static,
    {
        self.removed.add(listener)
    }
    pub fn remove_removed_listener(&mut self, id: ListenerID) -> bool {
        self.removed.remove(id)
    }
}

/// One [`NodeType`] for every [`NodeKind`], owned by a scene.
#[derive(Debug)]
pub struct NodeTypeRegistry {
    scene: SceneID,
    // Indexed by kind, in `NodeKind::iter` order.
    types: Vec<NodeType>,
}
impl NodeTypeRegistry {
    /// Create the registry, taking names and icons from `infos`.
    /// Kinds missing from `infos` get [`NodeTypeInfo::default_for`].
    #[must_use]
    pub fn new(scene: SceneID, infos: &hashbrown::HashMap<NodeKind, NodeTypeInfo>) -> Self {
        use strum::IntoEnumIterator;
        let types = NodeKind::iter()
            .map(|kind| {
                let info = infos
                    .get(&kind)
                    .cloned()
                    .unwrap_or_else(|| NodeTypeInfo::default_for(kind));
                NodeType::new(scene, kind, info)
            })
            .collect();
        Self { scene, types }
    }
    #[must_use]
    pub fn scene(&self) -> SceneID {
        self.scene
    }
    #[must_use]
    pub fn get(&self, kind: NodeKind) -> &NodeType {
        &self.types[kind as usize]
    }
    pub fn get_mut(&mut self, kind: NodeKind) -> &mut NodeType {
        &mut self.types[kind as usize]
    }
    pub fn iter(&self) -> impl Iterator<Item = &NodeType> + '_ {
        self.types.iter()
    }
    /// Find which type the node is registered with, if any.
    #[must_use]
    pub fn type_of(&self, node: NodeID) -> Option<NodeKind> {
        self.types
            .iter()
            .find(|ty| ty.contains(node))
            .map(NodeType::kind)
    }
    /// Total live instances across all types.
    #[must_use]
    pub fn instance_count(&self) -> usize {
        self.types.iter().map(|ty| ty.instances.len()).sum()
    }
    /// Reset every type. Fires no notifications.
    ///
    /// Only for use alongside clearing the graph, see [`super::Scene::reset`].
    pub(crate) fn reset(&mut self) {
        self.types.iter_mut().for_each(NodeType::reset);
    }
}
