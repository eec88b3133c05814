//! # Reparenting
//!
//! [`ParentCommand`] moves a node to a new parent the moment it's constructed, remembering where it came from.
//! Spatial nodes get their local transform re-derived according to a [`ReparentPolicy`], which is recorded as a
//! pushed sub-command so the whole move undoes and redoes as one unit.

use super::{apply_all, Command, CommandError, DoUndo, GraphCommand, MetaCommand};
use crate::state::{
    graph::{Location, NodeID, ReparentError, TargetError},
    transform::ReparentPolicy,
    Scene,
};

/// A parent and a position among its children. A `None` parent is the scene root.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Placement {
    pub parent: Option<NodeID>,
    /// Counts deleted siblings too.
    pub child_idx: usize,
}
impl Placement {
    #[must_use]
    pub fn location(&self) -> Location {
        Location::at(self.parent, self.child_idx)
    }
}

#[derive(Debug)]
pub struct ParentCommand {
    target: NodeID,
    /// Where the target is while applied.
    next: Placement,
    /// Where the target is while reverted.
    previous: Placement,
    /// Follow-up commands, already applied at the time they were pushed.
    pushed: Vec<Command>,
    applied: bool,
}
impl ParentCommand {
    /// Move `target` to the end of `parent`'s children, or of the root's if None.
    pub fn new(
        scene: &mut Scene,
        target: NodeID,
        parent: Option<NodeID>,
        policy: ReparentPolicy,
    ) -> Result<Self, ReparentError> {
        Self::with_location(scene, target, Location::end_of(parent), policy)
    }
    /// Move `target` to `destination`. On error, nothing has changed.
    pub fn with_location(
        scene: &mut Scene,
        target: NodeID,
        destination: Location,
        policy: ReparentPolicy,
    ) -> Result<Self, ReparentError> {
        let graph = scene.graph_mut();
        let (parent, child_idx) = graph
            .location_of(target)
            .ok_or(ReparentError::TargetError(TargetError::TargetNotFound))?;
        let world_before = graph.world_transform(target);

        graph.set_parent(target, destination)?;

        // Where it actually landed, after clamping.
        let (next_parent, next_idx) = graph
            .location_of(target)
            .ok_or(ReparentError::TargetError(TargetError::TargetNotFound))?;
        let mut command = Self {
            target,
            next: Placement {
                parent: next_parent,
                child_idx: next_idx,
            },
            previous: Placement { parent, child_idx },
            pushed: Vec::new(),
            applied: true,
        };
        if let Some(recompute) = world_before
            .and_then(|world| graph.compute_object_components(target, world, policy))
        {
            command.push(recompute);
        }
        log::trace!(
            "Reparented {target} from {:?} to {:?}",
            command.previous,
            command.next
        );
        Ok(command)
    }
    /// Bundle a follow-up command, which must already have been applied.
    /// It is undone and redone along with the move.
    pub fn push(&mut self, command: impl Into<Command>) {
        self.pushed.push(command.into());
    }
    /// Move the target back, then revert pushed commands most-recent-first.
    ///
    /// # Panics
    /// If already reverted. Calls to `undo` and `redo` must alternate.
    pub fn undo(&mut self, scene: &mut Scene) -> Result<(), CommandError> {
        assert!(self.applied, "undid reparent of {} twice", self.target);
        self.swap(scene)?;
        if let Err(err) = apply_all(scene, self.pushed.iter().rev().map(DoUndo::Undo)) {
            // Put the target back where the pushed commands expect it.
            self.swap(scene)?;
            return Err(err);
        }
        self.applied = false;
        Ok(())
    }
    /// Move the target again, then reapply pushed commands in order.
    ///
    /// # Panics
    /// If already applied. Calls to `undo` and `redo` must alternate.
    pub fn redo(&mut self, scene: &mut Scene) -> Result<(), CommandError> {
        assert!(!self.applied, "redid reparent of {} twice", self.target);
        self.swap(scene)?;
        if let Err(err) = apply_all(scene, self.pushed.iter().map(DoUndo::Do)) {
            self.swap(scene)?;
            return Err(err);
        }
        self.applied = true;
        Ok(())
    }
    /// Shared by both directions: move the target to `previous`, which then becomes `next`.
    fn swap(&mut self, scene: &mut Scene) -> Result<(), CommandError> {
        let graph = scene.graph_mut();
        if graph.location_of(self.target) != Some((self.next.parent, self.next.child_idx)) {
            return Err(CommandError::MismatchedState);
        }
        graph.set_parent(self.target, self.previous.location())?;
        std::mem::swap(&mut self.next, &mut self.previous);
        Ok(())
    }
    #[must_use]
    pub fn target(&self) -> NodeID {
        self.target
    }
    /// The parent the target currently has, as far as this command is concerned.
    #[must_use]
    pub fn next_parent(&self) -> Option<NodeID> {
        self.next.parent
    }
    #[must_use]
    pub fn previous_parent(&self) -> Option<NodeID> {
        self.previous.parent
    }
    /// Whether the target ended up right where it started, with nothing pushed.
    #[must_use]
    pub fn is_noop(&self) -> bool {
        self.next == self.previous && self.pushed.is_empty()
    }
    #[must_use]
    pub fn is_applied(&self) -> bool {
        self.applied
    }
    #[must_use]
    pub fn pushed(&self) -> &[Command] {
        &self.pushed
    }
    /// Convert into a command for the history. A plain reparent if nothing was pushed,
    /// otherwise the reparent with its pushed commands.
    ///
    /// None if the command is currently reverted, as there is then nothing to record.
    #[must_use]
    pub fn into_command(self) -> Option<Command> {
        if !self.applied {
            return None;
        }
        let primary = Command::Graph(GraphCommand::Reparent {
            target: self.target,
            old_parent: self.previous.parent,
            old_child_idx: self.previous.child_idx,
            new_parent: self.next.parent,
            new_child_idx: self.next.child_idx,
        });
        Some(if self.pushed.is_empty() {
            primary
        } else {
            Command::Meta(MetaCommand::Pushed {
                primary: Box::new(primary),
                pushed: self.pushed.into_boxed_slice(),
            })
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::commands::CommandConsumer;
    use crate::id::IdServer;
    use crate::state::{node_type::NodeKind, transform::Transform};
    use ultraviolet::Vec3;

    fn scene() -> Scene {
        Scene::new(IdServer::new().allocate(), &hashbrown::HashMap::new())
    }
    macro_rules! node {
        ($scene:expr, $parent:expr, $name:literal, $kind:ident) => {
            $scene
                .add_node(
                    Location::end_of($parent),
                    $name.to_owned(),
                    NodeKind::$kind,
                )
                .unwrap()
        };
    }

    #[test]
    fn reparent_undo_redo() {
        let mut scene = scene();
        let x = node!(scene, None, "X", Group);
        let y = node!(scene, None, "Y", Group);

        let mut command = ParentCommand::new(&mut scene, y, Some(x), ReparentPolicy::default())
            .unwrap();
        assert_eq!(scene.graph().children_of(None), Some(vec![x]));
        assert_eq!(scene.graph().children_of(Some(x)), Some(vec![y]));
        assert_eq!(command.previous_parent(), None);
        assert_eq!(command.next_parent(), Some(x));

        command.undo(&mut scene).unwrap();
        assert_eq!(scene.graph().children_of(None), Some(vec![x, y]));
        assert_eq!(scene.graph().children_of(Some(x)), Some(vec![]));

        command.redo(&mut scene).unwrap();
        assert_eq!(scene.graph().children_of(None), Some(vec![x]));
        assert_eq!(scene.graph().children_of(Some(x)), Some(vec![y]));
        // Registry is never involved.
        assert_eq!(scene.types().instance_count(), 2);
    }
    #[test]
    fn alternating_parity() {
        let mut scene = scene();
        let a = node!(scene, None, "A", Group);
        let b = node!(scene, None, "B", Group);
        let n = node!(scene, Some(a), "N", Entity);

        let mut command =
            ParentCommand::new(&mut scene, n, Some(b), ReparentPolicy::default()).unwrap();
        for calls in 1..=8 {
            if command.is_applied() {
                command.undo(&mut scene).unwrap();
            } else {
                command.redo(&mut scene).unwrap();
            }
            let expected = if calls % 2 == 0 { Some(b) } else { Some(a) };
            assert_eq!(scene.graph().parent_of(n), Some(expected));
        }
    }
    #[test]
    fn cycle_rejected() {
        let mut scene = scene();
        let a = node!(scene, None, "A", Group);
        let b = node!(scene, Some(a), "B", Group);
        let c = node!(scene, Some(b), "C", Group);

        assert_eq!(
            ParentCommand::new(&mut scene, a, Some(c), ReparentPolicy::default()).unwrap_err(),
            ReparentError::WouldCycle
        );
        assert_eq!(
            ParentCommand::new(&mut scene, b, Some(b), ReparentPolicy::default()).unwrap_err(),
            ReparentError::WouldCycle
        );
        assert_eq!(scene.graph().parent_of(a), Some(None));
        assert_eq!(scene.graph().parent_of(b), Some(Some(a)));
        assert_eq!(scene.graph().parent_of(c), Some(Some(b)));
    }
    #[test]
    fn pushed_commands_unwind_in_reverse() {
        let mut scene = scene();
        let x = node!(scene, None, "X", Group);
        let y = node!(scene, None, "first", Group);
        let mut command =
            ParentCommand::new(&mut scene, y, Some(x), ReparentPolicy::default()).unwrap();

        // Each rename only applies on top of the one before it,
        // so the wrong order would fail with a mismatch.
        let renames = [("first", "second"), ("second", "third"), ("third", "fourth")].map(
            |(from, to)| GraphCommand::Renamed {
                target: y,
                from: from.to_owned(),
                to: to.to_owned(),
            },
        );
        for rename in renames {
            scene.apply(DoUndo::Do(&rename)).unwrap();
            command.push(rename);
        }
        assert_eq!(command.pushed().len(), 3);

        command.undo(&mut scene).unwrap();
        assert_eq!(scene.graph().get(y).map(|n| n.name()), Some("first"));
        assert_eq!(scene.graph().parent_of(y), Some(None));
        command.redo(&mut scene).unwrap();
        assert_eq!(scene.graph().get(y).map(|n| n.name()), Some("fourth"));
        assert_eq!(scene.graph().parent_of(y), Some(Some(x)));
    }
    #[test]
    #[should_panic(expected = "twice")]
    fn double_undo_panics() {
        let mut scene = scene();
        let x = node!(scene, None, "X", Group);
        let y = node!(scene, None, "Y", Group);
        let mut command =
            ParentCommand::new(&mut scene, y, Some(x), ReparentPolicy::default()).unwrap();
        command.undo(&mut scene).unwrap();
        let _ = command.undo(&mut scene);
    }
    #[test]
    fn preserve_world_pushes_recompute() {
        let mut scene = scene();
        let frame = node!(scene, None, "frame", Pivot);
        let lamp = node!(scene, None, "lamp", PointLight);
        let start = Transform::from_translation(Vec3::new(1.0, 1.0, 0.0));
        scene
            .graph_mut()
            .set_local_transform(frame, Transform::from_translation(Vec3::new(5.0, 0.0, 0.0)))
            .unwrap();
        scene.graph_mut().set_local_transform(lamp, start).unwrap();

        let mut command =
            ParentCommand::new(&mut scene, lamp, Some(frame), ReparentPolicy::PreserveWorld)
                .unwrap();
        assert_eq!(command.pushed().len(), 1);
        assert!(scene
            .graph()
            .world_transform(lamp)
            .unwrap()
            .approx_eq(&start, 1e-5));

        command.undo(&mut scene).unwrap();
        assert_eq!(scene.graph().local_transform(lamp), Some(start));
        command.redo(&mut scene).unwrap();
        assert!(scene
            .graph()
            .world_transform(lamp)
            .unwrap()
            .approx_eq(&start, 1e-5));
    }
    #[test]
    fn keep_local_moves_with_parent() {
        let mut scene = scene();
        let frame = node!(scene, None, "frame", Pivot);
        let lamp = node!(scene, None, "lamp", PointLight);
        scene
            .graph_mut()
            .set_local_transform(frame, Transform::from_translation(Vec3::new(5.0, 0.0, 0.0)))
            .unwrap();

        let command =
            ParentCommand::new(&mut scene, lamp, Some(frame), ReparentPolicy::KeepLocal).unwrap();
        assert!(command.pushed().is_empty());
        assert_eq!(scene.graph().local_transform(lamp), Some(Transform::identity()));
        assert_eq!(
            scene.graph().world_transform(lamp).map(|t| t.translation),
            Some(Vec3::new(5.0, 0.0, 0.0))
        );
    }
    #[test]
    fn recorded_command_replays() {
        let mut scene = scene();
        let frame = node!(scene, None, "frame", Pivot);
        let lamp = node!(scene, None, "lamp", SpotLight);
        scene
            .graph_mut()
            .set_local_transform(frame, Transform::from_translation(Vec3::new(0.0, 3.0, 0.0)))
            .unwrap();

        let command = ParentCommand::new(&mut scene, lamp, Some(frame), ReparentPolicy::PreserveWorld)
            .unwrap()
            .into_command()
            .unwrap();
        assert!(matches!(
            command,
            Command::Meta(MetaCommand::Pushed { ref pushed, .. }) if pushed.len() == 1
        ));
        let moved = scene.graph().local_transform(lamp);

        scene.apply(DoUndo::Undo(&command)).unwrap();
        assert_eq!(scene.graph().parent_of(lamp), Some(None));
        assert_eq!(scene.graph().local_transform(lamp), Some(Transform::identity()));
        scene.apply(DoUndo::Do(&command)).unwrap();
        assert_eq!(scene.graph().parent_of(lamp), Some(Some(frame)));
        assert_eq!(scene.graph().local_transform(lamp), moved);
    }
    #[test]
    fn reverted_records_nothing() {
        let mut scene = scene();
        let x = node!(scene, None, "X", Group);
        let y = node!(scene, None, "Y", Group);
        let mut command =
            ParentCommand::new(&mut scene, y, Some(x), ReparentPolicy::default()).unwrap();
        command.undo(&mut scene).unwrap();
        assert!(command.into_command().is_none());
    }
    #[test]
    fn unknown_or_deleted_target() {
        let mut scene = scene();
        let x = node!(scene, None, "X", Group);
        let y = node!(scene, None, "Y", Group);
        scene.delete(y).unwrap();
        assert_eq!(
            ParentCommand::new(&mut scene, y, Some(x), ReparentPolicy::default()).unwrap_err(),
            ReparentError::TargetError(TargetError::TargetDeleted)
        );
        assert_eq!(
            ParentCommand::new(&mut scene, x, Some(y), ReparentPolicy::default()).unwrap_err(),
            ReparentError::DestinationError(TargetError::TargetDeleted)
        );
    }
}
