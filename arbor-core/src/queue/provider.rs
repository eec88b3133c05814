//! # Providers
//!
//! Providers give access to some number of scene queues. It is the source of ownership for the scene data!
//! Although only one is currently implemented, this interface will allow for placing the scene data in a daemon,
//! on a server, ect.

use super::SceneCommandQueue;
use crate::state::SceneID;

/// A provider that keeps scenes in-memory.
#[derive(Default)]
pub struct InMemorySceneProvider {
    // We don't expect high contention - will only be locked for writing when a queue is inserted or removed.
    scenes: parking_lot::RwLock<hashbrown::HashMap<SceneID, SceneCommandQueue>>,
}
impl std::fmt::Debug for InMemorySceneProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemorySceneProvider")
            .field("scenes", &self.scenes.read().len())
            .finish()
    }
}
impl InMemorySceneProvider {
    /// Insert a queue into this provider.
    /// If a scene with this ID already exists, the untouched queue is returned as an error.
    pub fn insert(&self, queue: SceneCommandQueue) -> Result<(), SceneCommandQueue> {
        match self.scenes.write().entry(queue.id()) {
            hashbrown::hash_map::Entry::Occupied(_) => Err(queue),
            hashbrown::hash_map::Entry::Vacant(v) => {
                v.insert(queue);
                Ok(())
            }
        }
    }
    /// Call the given closure on the scene queue with the given ID, if found.
    pub fn inspect<F, T>(&self, id: SceneID, f: F) -> Option<T>
    where
        F: FnOnce(&SceneCommandQueue) -> T,
    {
        Some(f(self.scenes.read().get(&id)?))
    }
    /// Iterate over all the open scenes, by ID.
    pub fn scene_iter(&self) -> impl Iterator<Item = SceneID> {
        let ids: Vec<_> = self.scenes.read().keys().copied().collect();
        ids.into_iter()
    }
    /// Take the queue out of this provider. Listeners to it report the scene as closed once it's dropped.
    pub fn remove(&self, id: SceneID) -> Option<SceneCommandQueue> {
        self.scenes.write().remove(&id)
    }
    /// Drop every scene.
    pub fn clear(&self) {
        self.scenes.write().clear();
    }
    #[must_use]
    pub fn len(&self) -> usize {
        self.scenes.read().len()
    }
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.scenes.read().is_empty()
    }
}
