//! # Context
//!
//! Everything shared between the scenes of one editing session lives in a [`SceneContext`], created once by the
//! application and passed to whoever needs it. Subsystems are set up in order on creation and torn down in the
//! reverse order, exactly once, either explicitly with [`SceneContext::teardown`] or when the context is dropped.

use crate::id::IdServer;
use crate::preferences::Preferences;
use crate::queue::{provider::InMemorySceneProvider, SceneCommandQueue};
use crate::state::{
    node_type::{NodeKind, NodeTypeInfo},
    Scene, SceneID,
};

type Cleanup<S> = Box<dyn FnOnce(&mut S) + Send>;

/// Setup steps with their matching cleanups, undone last-first.
pub struct InitializerStack<S> {
    cleanups: Vec<(&'static str, Cleanup<S>)>,
}
impl<S> Default for InitializerStack<S> {
    fn default() -> Self {
        Self {
            cleanups: Vec::new(),
        }
    }
}
impl<S> std::fmt::Debug for InitializerStack<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.cleanups.iter().map(|(name, _)| name))
            .finish()
    }
}
impl<S> InitializerStack<S> {
    /// Run `init` now, and remember `cleanup` for later.
    pub fn push<Init, Clean>(&mut self, state: &mut S, name: &'static str, init: Init, cleanup: Clean)
    where
        Init: FnOnce(&mut S),
        Clean: FnOnce(&mut S) + Send + 'static,
    {
        log::debug!("Initializing {name}");
        init(state);
        self.cleanups.push((name, Box::new(cleanup)));
    }
    /// Run every cleanup, most recently initialized first. Afterwards, the stack is empty.
    pub fn cleanup(&mut self, state: &mut S) {
        while let Some((name, cleanup)) = self.cleanups.pop() {
            log::debug!("Cleaning up {name}");
            cleanup(state);
        }
    }
    #[must_use]
    pub fn len(&self) -> usize {
        self.cleanups.len()
    }
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cleanups.is_empty()
    }
}

/// The parts of a context that initializers set up and tear down.
#[derive(Debug, Default)]
pub struct Registrations {
    types: hashbrown::HashMap<NodeKind, NodeTypeInfo>,
    scenes: InMemorySceneProvider,
}

#[derive(Debug)]
pub struct SceneContext {
    preferences: Preferences,
    registrations: Registrations,
    initializers: InitializerStack<Registrations>,
    scene_ids: IdServer<Scene>,
    torn_down: bool,
}
impl SceneContext {
    #[must_use]
    pub fn new(preferences: Preferences) -> Self {
        let mut registrations = Registrations::default();
        let mut initializers = InitializerStack::default();
        initializers.push(
            &mut registrations,
            "node types",
            |registrations| {
                use strum::IntoEnumIterator;
                registrations.types.extend(
                    NodeKind::iter().map(|kind| (kind, NodeTypeInfo::default_for(kind))),
                );
            },
            |registrations| registrations.types.clear(),
        );
        initializers.push(
            &mut registrations,
            "scenes",
            |_| (),
            |registrations| {
                if !registrations.scenes.is_empty() {
                    log::info!("Closing {} open scene(s)", registrations.scenes.len());
                }
                registrations.scenes.clear();
            },
        );
        Self {
            preferences,
            registrations,
            initializers,
            scene_ids: IdServer::new(),
            torn_down: false,
        }
    }
    #[must_use]
    pub fn preferences(&self) -> &Preferences {
        &self.preferences
    }
    /// Change the preferences, for this context and every open scene.
    pub fn set_preferences(&mut self, preferences: Preferences) {
        let scenes = &self.registrations.scenes;
        for id in scenes.scene_iter() {
            scenes.inspect(id, |queue| queue.set_preferences(preferences.clone()));
        }
        self.preferences = preferences;
    }
    /// Change the name and icon of a node type, for scenes created from now on.
    pub fn register_type(&mut self, kind: NodeKind, info: NodeTypeInfo) {
        self.registrations.types.insert(kind, info);
    }
    #[must_use]
    pub fn type_info(&self, kind: NodeKind) -> Option<&NodeTypeInfo> {
        self.registrations.types.get(&kind)
    }
    /// Create an empty scene and its command queue.
    ///
    /// # Panics
    /// If the context was torn down.
    pub fn new_scene(&mut self) -> SceneID {
        assert!(!self.torn_down, "Scene created after context teardown");
        let id = self.scene_ids.allocate();
        let queue = SceneCommandQueue::new(
            Scene::new(id, &self.registrations.types),
            self.preferences.clone(),
        );
        if self.registrations.scenes.insert(queue).is_err() {
            // IDs come from our own server, never reused.
            unreachable!("{id} already open");
        }
        log::debug!("Opened {id}");
        id
    }
    #[must_use]
    pub fn scenes(&self) -> &InMemorySceneProvider {
        &self.registrations.scenes
    }
    /// Close a scene. Returns false if it wasn't open.
    pub fn close_scene(&mut self, id: SceneID) -> bool {
        let closed = self.registrations.scenes.remove(id).is_some();
        if closed {
            log::debug!("Closed {id}");
        }
        closed
    }
    #[must_use]
    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }
    /// Close every scene and clean up every subsystem, in reverse order of setup.
    /// Only the first call has any effect.
    pub fn teardown(&mut self) {
        if std::mem::replace(&mut self.torn_down, true) {
            return;
        }
        self.initializers.cleanup(&mut self.registrations);
    }
}
impl Drop for SceneContext {
    fn drop(&mut self) {
        self.teardown();
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::queue::ListenerError;

    #[test]
    fn cleanup_runs_in_reverse() {
        let mut log = Vec::<&'static str>::new();
        let mut stack = InitializerStack::<Vec<&'static str>>::default();
        stack.push(&mut log, "first", |log| log.push("init first"), |log| log.push("clean first"));
        stack.push(&mut log, "second", |log| log.push("init second"), |log| log.push("clean second"));
        assert_eq!(stack.len(), 2);

        stack.cleanup(&mut log);
        assert!(stack.is_empty());
        // Already empty, nothing runs twice.
        stack.cleanup(&mut log);
        assert_eq!(
            log,
            ["init first", "init second", "clean second", "clean first"]
        );
    }
    #[test]
    fn scenes_use_registered_types() {
        let mut context = SceneContext::new(Preferences::default());
        assert_eq!(
            context.type_info(NodeKind::Mesh),
            Some(&NodeTypeInfo::default_for(NodeKind::Mesh))
        );
        context.register_type(
            NodeKind::Mesh,
            NodeTypeInfo {
                name: "Static Mesh".to_owned(),
                icon_index: 12,
            },
        );
        let id = context.new_scene();
        let name = context
            .scenes()
            .inspect(id, |queue| {
                queue.read_with(|scene| scene.types().get(NodeKind::Mesh).name().to_owned())
            })
            .unwrap();
        assert_eq!(name, "Static Mesh");
    }
    #[test]
    fn teardown_closes_everything_once() {
        let mut context = SceneContext::new(Preferences::default());
        let first = context.new_scene();
        let second = context.new_scene();
        assert_ne!(first, second);
        let listener = context
            .scenes()
            .inspect(first, SceneCommandQueue::listen_from_now)
            .unwrap();

        assert!(context.close_scene(second));
        assert!(!context.close_scene(second));

        context.teardown();
        assert!(context.is_torn_down());
        assert!(context.scenes().is_empty());
        assert_eq!(context.type_info(NodeKind::Group), None);
        assert_eq!(listener.peek_changes(), Err(ListenerError::SceneClosed));
        // Again is a no-op, and so is the drop.
        context.teardown();
    }
    #[test]
    #[should_panic(expected = "after context teardown")]
    fn no_scenes_after_teardown() {
        let mut context = SceneContext::new(Preferences::default());
        context.teardown();
        let _ = context.new_scene();
    }
    #[test]
    fn preferences_reach_open_scenes() {
        let mut context = SceneContext::new(Preferences::default());
        let id = context.new_scene();
        for name in ["A", "B", "C"] {
            context.scenes().inspect(id, |queue| {
                queue.write_with(|writer| {
                    writer
                        .graph()
                        .add_node(
                            NodeKind::Group,
                            crate::state::graph::Location::end_of(None),
                            name,
                        )
                        .unwrap();
                });
            });
        }
        context.set_preferences(Preferences {
            history_limit: Some(1),
            ..Default::default()
        });
        assert_eq!(context.preferences().history_limit, Some(1));
        assert_eq!(
            context.scenes().inspect(id, SceneCommandQueue::history_len),
            Some(1)
        );
    }
}
