//! Command Queue
//!
//! The queues manage all the actions performed by the user, keeping track of commands, undo/redo state, etc.
//! The queues are the ground truth for the current state of their scene. Listeners to the queue
//! can be various stages of out-of-date, at any point they can view all new commands and bring themselves back to the present.
//!
//! If a listener is greatly out-of-date, the order of commands it sees may not match the exact order of events, but the outcome
//! will be the same. (For example, an unobserved undo followed by a redo will result in neither being reported).
//!
//! There exists one command queue per scene, owned by a [provider].
//!
//! With a history limit set, the oldest commands on the path to the present are folded into the starting state once the
//! limit is exceeded, and branches abandoned off of them are dropped. Listeners left behind on dropped commands can no
//! longer catch up by replaying, and report [`ListenerError::Evicted`].

use std::sync::Arc;

use crate::{
    commands::{self, CommandConsumer, DoUndo, OwnedDoUndo},
    preferences::Preferences,
    state::{node_type::NodeTypeRegistry, Scene, SceneID},
};

pub mod provider;
mod queue_state;
pub mod writer;

struct SceneCommandQueueInner {
    /// Tree structure of commands, where undos create branches.
    /// "First child" represents earlier series of commands that were undone, "last" is the most recent.
    /// More than two branches are allowed, of course!
    command_tree: slab_tree::Tree<commands::Command>,
    state: queue_state::State,
    /// The oldest command still in history. Always a [`commands::Command::Dummy`].
    root: slab_tree::NodeId,
    preferences: Preferences,
}
impl SceneCommandQueueInner {
    /// Number of commands between the root and the present.
    fn depth(&self) -> usize {
        self.command_tree
            .get(self.state.present)
            .map_or(0, |present| present.ancestors().count())
    }
    /// Drop the oldest commands leading up to the present, until at most `history_limit` remain.
    fn evict_excess(&mut self) {
        let Some(limit) = self.preferences.history_limit else {
            return;
        };
        let Some(present) = self.command_tree.get(self.state.present) else {
            return;
        };
        // Root first, present last.
        let mut path: Vec<slab_tree::NodeId> = std::iter::once(present.node_id())
            .chain(present.ancestors().map(|node| node.node_id()))
            .collect();
        path.reverse();
        let depth = path.len() - 1;
        if depth <= limit {
            return;
        }
        let new_root_idx = depth - limit;
        for pair in path[..=new_root_idx].windows(2) {
            let [old, keep] = [pair[0], pair[1]];
            let abandoned: Vec<_> = self
                .command_tree
                .get(old)
                .map(|node| {
                    node.children()
                        .map(|child| child.node_id())
                        .filter(|child| *child != keep)
                        .collect()
                })
                .unwrap_or_default();
            for branch in abandoned {
                let _ = self
                    .command_tree
                    .remove(branch, slab_tree::RemoveBehavior::DropChildren);
            }
            // Leaves `keep` without a parent, the start of history.
            let _ = self
                .command_tree
                .remove(old, slab_tree::RemoveBehavior::OrphanChildren);
        }
        let new_root = path[new_root_idx];
        // Its effects are part of the starting state now.
        if let Some(mut node) = self.command_tree.get_mut(new_root) {
            *node.data() = commands::Command::Dummy;
        }
        self.root = new_root;
        log::debug!(
            "Evicted {new_root_idx} command(s) from history of {}",
            self.state.scene.id()
        );
    }
    /// Move the present to `end`, applying every command along the way.
    ///
    /// # Panics
    /// If the path can't be found or the commands don't apply. The history no longer
    /// describes the state in that case, which is unrecoverable.
    fn travel_to(&mut self, end: slab_tree::NodeId) -> bool {
        let Self {
            command_tree,
            state,
            ..
        } = self;
        let start = state.present;
        let path = traverse(command_tree, start, end)
            .unwrap_or_else(|err| panic!("Command tree malformed: {err}"));
        for step in path {
            if let Err(err) = state.apply(step) {
                panic!("History does not match state of {}: {err}", state.scene.id());
            }
        }
        state.present = end;
        start != end
    }
}

pub struct SceneCommandQueue {
    /// Mutable inner bits.
    inner: Arc<parking_lot::RwLock<SceneCommandQueueInner>>,
    scene: SceneID,
}
impl std::fmt::Debug for SceneCommandQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SceneCommandQueue")
            .field("scene", &self.scene)
            .finish_non_exhaustive()
    }
}
impl SceneCommandQueue {
    /// Create a queue from a scene, without a history.
    #[must_use]
    pub fn new(scene: Scene, preferences: Preferences) -> Self {
        let command_tree = slab_tree::TreeBuilder::new()
            .with_root(commands::Command::Dummy)
            .build();
        let root = command_tree
            .root_id()
            .expect("command tree was built with a root");
        let id = scene.id();
        Self {
            inner: Arc::new(
                SceneCommandQueueInner {
                    state: queue_state::State::new(scene, root),
                    command_tree,
                    root,
                    preferences,
                }
                .into(),
            ),
            scene: id,
        }
    }
    #[must_use]
    pub fn id(&self) -> SceneID {
        self.scene
    }
    /// Locks the queue for writing commands during the span of the closure, where each modification of the state is tracked
    /// by the command queue. If multiple commands are written, they will be written in order as a single Atoms scope.
    pub fn write_with<F, T>(&self, write: F) -> T
    where
        F: FnOnce(&mut writer::CommandQueueWriter<'_>) -> T,
    {
        let lock = self.inner.write();
        let mut writer = writer::CommandQueueWriter {
            lock,
            commands: smallvec::SmallVec::new(),
        };
        // Panic safe - `writer::CommandQueueWriter`'s Drop impl will do the cleanup ensuring the queue's commands and state are synchronized.
        write(&mut writer)
    }
    /// View the state as it is at this moment.
    pub fn read_with<F, T>(&self, read: F) -> T
    where
        F: FnOnce(&Scene) -> T,
    {
        read(&self.inner.read().state.scene)
    }
    /// Access the node type registry, to manage its listeners. Changes made here are not recorded.
    pub fn with_types_mut<F, T>(&self, f: F) -> T
    where
        F: FnOnce(&mut NodeTypeRegistry) -> T,
    {
        f(self.inner.write().state.scene.types_mut())
    }
    /// Update the preferences. A reduced history limit takes effect immediately.
    pub fn set_preferences(&self, preferences: Preferences) {
        let mut lock = self.inner.write();
        lock.preferences = preferences;
        lock.evict_excess();
    }
    /// Empty the scene and forget its whole history, as on reload. The node type registry is reset along with
    /// the graph, keeping its listeners. Every existing listener reports [`ListenerError::Evicted`].
    pub fn reset(&self) {
        let mut lock = self.inner.write();
        let inner = &mut *lock;
        let old_root = inner.root;
        let branches: Vec<_> = inner
            .command_tree
            .get(old_root)
            .map(|root| root.children().map(|child| child.node_id()).collect())
            .unwrap_or_default();
        for branch in branches {
            let _ = inner
                .command_tree
                .remove(branch, slab_tree::RemoveBehavior::DropChildren);
        }
        // A fresh start node, so that no listener's cursor survives.
        let Some(mut root) = inner.command_tree.get_mut(old_root) else {
            panic!("Root {old_root:?} not found in command tree!");
        };
        let new_root = root.append(commands::Command::Dummy).node_id();
        let _ = inner
            .command_tree
            .remove(old_root, slab_tree::RemoveBehavior::OrphanChildren);
        inner.root = new_root;
        inner.state.present = new_root;
        inner.state.scene.reset();
    }
    /// Undo up to `num` commands along the path to the start of history.
    /// Returns whether anything changed.
    pub fn undo_n(&self, num: usize) -> bool {
        // Linearly walk up the tree num steps.
        let mut lock = self.inner.write();
        let start = lock.state.present;
        let Some(this) = lock.command_tree.get(start) else {
            // Cursor not found - shouldn't be possible, as the present is never evicted!
            // This kinda means the command tree is now in an unusable state...
            panic!("Current Node {start:?} not found in command tree!");
        };
        let end = this
            .ancestors()
            .take(num)
            .last()
            .map_or(start, |node| node.node_id());
        let changed = lock.travel_to(end);
        if changed {
            log::debug!("Undid up to {num} command(s) on {}", self.scene);
        }
        changed
    }
    /// Redo up to `num` commands, taking the most recent branch every time.
    /// Returns whether anything changed.
    pub fn redo_n(&self, num: usize) -> bool {
        // Step down the tree, taking the last (most recent) child every time.
        let mut lock = self.inner.write();
        let mut end = lock.state.present;
        for _ in 0..num {
            let Some(this) = lock.command_tree.get(end) else {
                panic!("Current Node {end:?} not found in command tree!");
            };
            let Some(last_child) = this.last_child() else {
                // We've gone as deep as we can go!
                break;
            };
            end = last_child.node_id();
        }
        let changed = lock.travel_to(end);
        if changed {
            log::debug!("Redid up to {num} command(s) on {}", self.scene);
        }
        changed
    }
    #[must_use]
    pub fn can_undo(&self) -> bool {
        let lock = self.inner.read();
        lock.state.present != lock.root
    }
    #[must_use]
    pub fn can_redo(&self) -> bool {
        let lock = self.inner.read();
        lock.command_tree
            .get(lock.state.present)
            .is_some_and(|present| present.last_child().is_some())
    }
    /// Number of commands that can be undone.
    #[must_use]
    pub fn history_len(&self) -> usize {
        self.inner.read().depth()
    }
    /// Create a listener that starts at the beginning of history.
    #[must_use]
    pub fn listen_from_start(&self) -> SceneCommandListener {
        let start = self.inner.read().root;
        self.listener_at(start)
    }
    /// Create a listener that will only see new activity
    #[must_use]
    pub fn listen_from_now(&self) -> SceneCommandListener {
        let start = self.inner.read().state.present;
        self.listener_at(start)
    }
    fn listener_at(&self, cursor: slab_tree::NodeId) -> SceneCommandListener {
        SceneCommandListener {
            scene: self.scene,
            cursor,
            inner: std::sync::Arc::downgrade(&self.inner),
        }
    }
}
#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum ListenerError {
    #[error("scene not available")]
    SceneClosed,
    #[error("the commands since this listener's last update were evicted from history")]
    Evicted,
    // Hints that something has gone horribly wrong internally!
    #[error("tree malformed: {}", .0)]
    TreeMalformed(TraverseError),
}
pub struct SceneCommandListener {
    scene: SceneID,
    // Cursor into the tree that this listener has last seen,
    // When more events are requested, the path to the "true" cursor is found and traversed.
    cursor: slab_tree::NodeId,
    inner: std::sync::Weak<parking_lot::RwLock<SceneCommandQueueInner>>,
}
impl std::fmt::Debug for SceneCommandListener {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SceneCommandListener")
            .field("scene", &self.scene)
            .finish_non_exhaustive()
    }
}
impl SceneCommandListener {
    #[must_use]
    pub fn scene(&self) -> SceneID {
        self.scene
    }
    fn upgrade(&self) -> Result<Arc<parking_lot::RwLock<SceneCommandQueueInner>>, ListenerError> {
        self.inner.upgrade().ok_or(ListenerError::SceneClosed)
    }
    /// Collect the steps from the cursor to the present under one lock, handing them to `f` with the present state.
    fn view<F, T>(&self, f: F) -> Result<(T, slab_tree::NodeId), ListenerError>
    where
        F: FnOnce(&[DoUndo<'_, commands::Command>], &Scene) -> T,
    {
        let inner = self.upgrade()?;
        let lock = inner.read();
        let steps: Vec<_> = traverse(&lock.command_tree, self.cursor, lock.state.present)
            .map_err(|err| match err {
                // The present is always in the tree, so the cursor was evicted.
                TraverseError::NotFound => ListenerError::Evicted,
                TraverseError::Disconnected => ListenerError::TreeMalformed(err),
            })?
            .collect();
        Ok((f(&steps, &lock.state.scene), lock.state.present))
    }
    /// Call `f` with the steps from this listener's point in time to the present, and the present state,
    /// without forwarding this listener.
    pub fn peek_with<F, T>(&self, f: F) -> Result<T, ListenerError>
    where
        F: FnOnce(&[DoUndo<'_, commands::Command>], &Scene) -> T,
    {
        self.view(f).map(|(result, _)| result)
    }
    /// Like [`Self::peek_with`], bringing this listener up-to-date in the process.
    pub fn forward_with<F, T>(&mut self, f: F) -> Result<T, ListenerError>
    where
        F: FnOnce(&[DoUndo<'_, commands::Command>], &Scene) -> T,
    {
        let (result, present) = self.view(f)?;
        self.cursor = present;
        Ok(result)
    }
    /// Clone the steps from this listener's point in time to the present, without forwarding this listener.
    pub fn peek_changes(&self) -> Result<Vec<OwnedDoUndo<commands::Command>>, ListenerError> {
        self.peek_with(|steps, _| steps.iter().copied().map(Into::into).collect())
    }
    /// Clone the steps from this listener's point in time to the present, bringing this listener up-to-date.
    pub fn forward_changes(&mut self) -> Result<Vec<OwnedDoUndo<commands::Command>>, ListenerError> {
        self.forward_with(|steps, _| steps.iter().copied().map(Into::into).collect())
    }
    /// Moves the cursor forward up-to-date with the scene, not reporting the changes.
    /// Returns `true` if any change occured.
    ///
    /// Always succeeds for an evicted listener, as long as the scene is still open.
    pub fn forward(&mut self) -> Result<bool, ListenerError> {
        let inner = self.upgrade()?;
        let lock = inner.read();

        if lock.state.present == self.cursor {
            Ok(false)
        } else {
            self.cursor = lock.state.present;
            Ok(true)
        }
    }
}

// Traverses the shortest path from one tree node to another.
// A traversal is an optional walk up to the closest ancestor, followed by walking down.
struct TreeTraverser<'t, T> {
    // current point of the traversal
    cur: slab_tree::NodeRef<'t, T>,
    tree: &'t slab_tree::Tree<T>,

    // Common ancestor. May be equal to end, but never equal to start (we'd be walking down then).
    // Or None if we're walking down (i.e. start *is* the common ancestor)
    ancestor: Option<slab_tree::NodeId>,
    // Path from the end up to the ancestor. Includes the ID of the branch point and the child idx.
    path_down: Vec<(slab_tree::NodeId, usize)>,
    // destination of the traversal.
    end: slab_tree::NodeId,
}

impl<'t, T> Iterator for TreeTraverser<'t, T> {
    type Item = commands::DoUndo<'t, T>;
    fn next(&mut self) -> Option<Self::Item> {
        if let Some(ancestor) = self.ancestor {
            // Ancestor is Some, we're going up!
            // Undo, then move cur
            let result = commands::DoUndo::Undo(self.cur.data());
            // Parent will be some, as we know there's a common ancestor.
            // NodeRef.parent borrows the ref, not the tree, so look it up again.
            self.cur = self.tree.get(self.cur.parent()?.node_id())?;

            // We've reached the top of traversal! Go down now.
            if self.cur.node_id() == ancestor {
                self.ancestor = None;
            }

            Some(result)
        } else {
            // We made it!
            if self.cur.node_id() == self.end {
                return None;
            }

            // Ancestor is None, going down.
            // Move cur, then "Do" (opposite order)

            // Last item will be next path to go down. Only consume it if the node id matches,
            // Otherwise default to first child.
            let child_idx = match self.path_down.last().copied() {
                Some((node_id, child_idx)) if node_id == self.cur.node_id() => {
                    self.path_down.pop();
                    child_idx
                }
                _ => 0,
            };
            self.cur = self
                .tree
                .get(self.cur.children().nth(child_idx)?.node_id())?;

            Some(commands::DoUndo::Do(self.cur.data()))
        }
    }
}

/// Find the ID of the nearest ancestor of A and B, or None if the IDs do not come from the same tree.
/// The endpoints themselves could be the ancestor, if one is a parent of another!
fn nearest_ancestor<T>(
    tree: &slab_tree::Tree<T>,
    a: slab_tree::NodeId,
    b: slab_tree::NodeId,
) -> Result<slab_tree::NodeId, TraverseError> {
    let a_node = tree.get(a).ok_or(TraverseError::NotFound)?;
    let b_node = tree.get(b).ok_or(TraverseError::NotFound)?;

    // Collect the ID of A, followed by the ancestors of A.
    let parents_of_a: Vec<_> = std::iter::once(a)
        .chain(a_node.ancestors().map(|node| node.node_id()))
        .collect();
    // Iterate over the ID of B, followed by the ancestors of B, and find the first one
    // that is shared. Because of traversal order this will be the nearest ancestor!
    // Won't be found if they come from different trees within the same structure.
    std::iter::once(b)
        .chain(b_node.ancestors().map(|node| node.node_id()))
        .find(|b_ancestor| parents_of_a.contains(b_ancestor))
        .ok_or(TraverseError::Disconnected)
}

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum TraverseError {
    #[error("can't traverse disconnected subtrees")]
    Disconnected,
    #[error("ID not present in tree")]
    NotFound,
}
/// Create an iterator that traverses the shortest path between start and end nodes, or an error if the start
/// and end nodes are not from the same tree.
fn traverse<T>(
    tree: &slab_tree::Tree<T>,
    start: slab_tree::NodeId,
    end: slab_tree::NodeId,
) -> Result<TreeTraverser<'_, T>, TraverseError> {
    let ancestor = nearest_ancestor(tree, start, end)?;

    // Find the path from the ancestor to the end.
    let mut path_down = Vec::<(slab_tree::NodeId, usize)>::new();
    // Early escape if end is the nearest ancestor -
    // There will be no drilling down phase of the traversal.
    if ancestor != end {
        let mut cur_ref = tree.get(end).ok_or(TraverseError::NotFound)?;
        loop {
            // Some, as we know there's a common ancestor. Will break before this becomes None.
            let parent = cur_ref.parent().ok_or(TraverseError::Disconnected)?;
            let child_idx = parent
                .children()
                .position(|node| node.node_id() == cur_ref.node_id())
                .ok_or(TraverseError::Disconnected)?;
            // Default to the zero'th child. That way, nodes with only one child won't
            // be collected, otherwise we're just storing the whole tree! :P
            if child_idx != 0 {
                path_down.push((parent.node_id(), child_idx));
            }

            if parent.node_id() == ancestor {
                break;
            }
            cur_ref = tree
                .get(parent.node_id())
                .ok_or(TraverseError::NotFound)?;
        }
    }

    Ok(TreeTraverser {
        cur: tree.get(start).ok_or(TraverseError::NotFound)?,
        tree,
        ancestor: (ancestor != start).then_some(ancestor),
        path_down,
        end,
    })
}
