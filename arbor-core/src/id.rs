//! # IDs
//! Handles for scenes, nodes, and listeners are implemented in this module via the `ArborID<T>` type,
//! namespaced by the type T so that, say, a scene ID can never be passed where a node ID is expected.
//!
//! There is no process-wide ID server. Whoever owns a namespace owns an [`IdServer`] for it: a scene graph
//! allocates its node IDs, an event allocates its listener IDs, and the context allocates scene IDs. An ID is
//! unique among the IDs handed out by the server that allocated it.

/// ID that is guarunteed unique within the [`IdServer`] that allocated it.
/// IDs with different types may share a value but should not be considered equal.
pub struct ArborID<T> {
    id: std::num::NonZeroU64,
    // Namespace marker. `fn() -> T` keeps the ID `Send + Sync` regardless of T.
    _phantom: std::marker::PhantomData<fn() -> T>,
}
impl<T> Clone for ArborID<T> {
    fn clone(&self) -> Self {
        *self
    }
}
impl<T> Copy for ArborID<T> {}
impl<T> PartialEq for ArborID<T> {
    fn eq(&self, other: &Self) -> bool {
        // Namespace already checked at compile time.
        self.id == other.id
    }
}
impl<T> Eq for ArborID<T> {}
impl<T> PartialOrd for ArborID<T> {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}
impl<T> Ord for ArborID<T> {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.id.cmp(&other.id)
    }
}
impl<T> std::hash::Hash for ArborID<T> {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}
impl<T> ArborID<T> {
    /// Get the raw numeric value of this ID.
    /// IDs from differing namespaces or servers may share the same numeric ID!
    #[must_use]
    pub fn id(&self) -> u64 {
        self.id.get()
    }
}
impl<T> std::fmt::Display for ArborID<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // rsplit always yields at least one element, even for empty strings.
        let name = std::any::type_name::<T>().rsplit("::").next().unwrap_or_default();
        write!(f, "{name}#{}", self.id)
    }
}
impl<T> std::fmt::Debug for ArborID<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        <Self as std::fmt::Display>::fmt(self, f)
    }
}

/// Hands out IDs of one namespace. Never hands out the same ID twice.
pub struct IdServer<T> {
    /// Next ID to give out. Zero is never valid, so this starts at one.
    next: u64,
    _phantom: std::marker::PhantomData<fn() -> T>,
}
impl<T> Default for IdServer<T> {
    fn default() -> Self {
        Self {
            next: 1,
            _phantom: std::marker::PhantomData,
        }
    }
}
impl<T> std::fmt::Debug for IdServer<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdServer")
            .field("namespace", &std::any::type_name::<T>())
            .field("next", &self.next)
            .finish()
    }
}
impl<T> IdServer<T> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
    /// Allocate a single ID.
    pub fn allocate(&mut self) -> ArborID<T> {
        // `many(1)` always yields exactly one.
        self.many(1)
            .next()
            .unwrap_or_else(|| unreachable!("allocated one ID, got none"))
    }
    /// Allocate many IDs at once, without allocating memory.
    ///
    /// IDs are assigned eagerly - dropping the returned iterator early does *not* recycle the unused IDs.
    ///
    /// # Panics
    /// If the namespace's `u64::MAX - 1` IDs are exhausted. This is a logic error in the caller.
    pub fn many(&mut self, count: usize) -> impl ExactSizeIterator<Item = ArborID<T>> {
        // Usize is always <= 64bits
        let count_u64 = count as u64;
        let start_id = self.next;
        // u64::MAX itself is never handed out, leaving `u64::MAX - 1` IDs per server.
        let Some(next) = start_id.checked_add(count_u64) else {
            panic!("{} ID overflow!", std::any::type_name::<T>());
        };
        self.next = next;

        // Must use `usize` indices for ExactSizeIterator, as absolute values of the IDs would
        // overflow a 32-bit system's usize
        (0..count).map(move |idx| ArborID {
            // Non-zero-ness checked above, start_id >= 1.
            id: std::num::NonZeroU64::MIN.saturating_add(idx as u64 + start_id - 1),
            _phantom: std::marker::PhantomData,
        })
    }
}

#[cfg(test)]
mod test {
    use super::{ArborID, IdServer};

    // Local namespace for testing.
    struct Namespace;
    type TestID = ArborID<Namespace>;

    #[test]
    fn none_ids() {
        let mut server = IdServer::<Namespace>::new();
        // Allocating none should be valid.
        assert_eq!(server.many(0).len(), 0);
        assert_eq!(server.many(0).len(), 0);

        let id: TestID = server.allocate();
        // Not a stable guarantee! Dont use this!!
        assert_eq!(id.id(), 1);
    }
    #[test]
    fn many_ids_unique() {
        let mut server = IdServer::<Namespace>::new();
        let count = 1024;
        let mut v: Vec<TestID> = server.many(count).collect();
        v.extend(server.many(count));
        v.push(server.allocate());

        v.sort_unstable();
        let length_before = v.len();
        v.dedup();
        assert_eq!(length_before, v.len(), "had duplicate ids");
        assert_eq!(length_before, count * 2 + 1);
    }
    #[test]
    fn servers_are_independent() {
        let mut a = IdServer::<Namespace>::new();
        let mut b = IdServer::<Namespace>::new();
        // Separate owners, separate sequences.
        assert_eq!(a.allocate().id(), b.allocate().id());
    }
    #[test]
    fn display_names_namespace() {
        let mut server = IdServer::<Namespace>::new();
        assert_eq!(server.allocate().to_string(), "Namespace#1");
    }
    // Test only makes sense if we can fit u64::MAX in a usize
    #[cfg(target_pointer_width = "64")]
    #[test]
    fn near_overflow() {
        let mut server = IdServer::<Namespace>::new();
        // Minus one, as they're NonZeroU64 which has one fewer possible values.
        let mut all = server.many((u64::MAX - 1) as usize);
        assert_eq!(all.next().map(|id| id.id()), Some(1));
        let _ = server.many(0);
    }
    #[cfg(target_pointer_width = "64")]
    #[test]
    #[should_panic(expected = "ID overflow")]
    fn overflow() {
        let mut server = IdServer::<Namespace>::new();
        // Does NOT panic. Tested by [near_overflow]
        let _ = server.many((u64::MAX - 1) as usize);
        // Should panic!
        let _ = server.many(1);
    }
}
