//! # Events
//!
//! Ordered listener lists. Listeners are invoked in the order they were added, and each one decides after every
//! call whether it keeps listening, which lets a listener unsubscribe itself mid-dispatch without invalidating
//! the iteration.

use crate::id::{ArborID, IdServer};

/// Namespace for listener IDs.
pub struct Listener;
pub type ListenerID = ArborID<Listener>;

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum ListenerStatus {
    Listening,
    /// Remove this listener after the current call returns.
    Unsubscribe,
}

type BoxedListener<Args> = Box<dyn FnMut(&Args) -> ListenerStatus + Send + Sync>;

pub struct Event<Args> {
    ids: IdServer<Listener>,
    listeners: Vec<(ListenerID, BoxedListener<Args>)>,
}
impl<Args> Default for Event<Args> {
    fn default() -> Self {
        Self {
            ids: IdServer::new(),
            listeners: Vec::new(),
        }
    }
}
impl<Args> std::fmt::Debug for Event<Args> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Event")
            .field("listeners", &self.listeners.len())
            .finish()
    }
}
impl<Args> Event<Args> {
    /// Register a listener, to be called after every listener registered before it.
    pub fn add<F>(&mut self, listener: F) -> ListenerID
    where
        F: FnMut(&Args) -> ListenerStatus + Send + Sync + 'static,
    {
        let id = self.ids.allocate();
        self.listeners.push((id, Box::new(listener)));
        id
    }
    /// Unregister a listener. Returns false if it was not registered (or already removed).
    pub fn remove(&mut self, id: ListenerID) -> bool {
        let Some(idx) = self
            .listeners
            .iter()
            .position(|(listener, _)| *listener == id)
        else {
            return false;
        };
        // Not swap_remove, invocation order must hold.
        let _ = self.listeners.remove(idx);
        true
    }
    /// Call every listener with the given args, in registration order.
    pub fn raise(&mut self, args: &Args) {
        self.listeners
            .retain_mut(|(_, listener)| listener(args) == ListenerStatus::Listening);
    }
    #[must_use]
    pub fn len(&self) -> usize {
        self.listeners.len()
    }
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }
}
