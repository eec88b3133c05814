use super::{commands::Command as GraphCommand, Location, NodeID, ReparentError, TargetError};
use crate::commands::{parent::ParentCommand, Command};
use crate::queue::writer::CommandWrite;
use crate::state::{
    node_type::NodeKind,
    transform::{ReparentPolicy, Transform},
    Scene,
};

/// Modifies a scene, recording every change into `Write`.
pub struct GraphWriter<'a, Write: CommandWrite<Command>> {
    writer: Write,
    scene: &'a mut Scene,
    policy: ReparentPolicy,
}
impl<'a, Write: CommandWrite<Command>> std::ops::Deref for GraphWriter<'a, Write> {
    type Target = Scene;
    fn deref(&self) -> &Self::Target {
        &*self.scene
    }
}
impl<'a, Write: CommandWrite<Command>> GraphWriter<'a, Write> {
    pub fn new(writer: Write, scene: &'a mut Scene, policy: ReparentPolicy) -> Self {
        Self {
            writer,
            scene,
            policy,
        }
    }
    /// How spatial nodes are treated by [`Self::reparent`].
    pub fn set_reparent_policy(&mut self, policy: ReparentPolicy) {
        self.policy = policy;
    }
    pub fn add_node(
        &mut self,
        kind: NodeKind,
        location: Location,
        name: impl Into<String>,
    ) -> Result<NodeID, TargetError> {
        let target = self.scene.add_node(location, name.into(), kind)?;
        let (destination, child_idx) = self
            .scene
            .graph()
            .location_of(target)
            .ok_or(TargetError::TargetNotFound)?;
        self.writer.write(
            GraphCommand::NodeCreated {
                target,
                kind,
                destination,
                child_idx,
            }
            .into(),
        );
        Ok(target)
    }
    /// Move the node and its children to a new location.
    pub fn reparent(&mut self, target: NodeID, location: Location) -> Result<(), ReparentError> {
        let command = ParentCommand::with_location(self.scene, target, location, self.policy)?;
        if command.is_noop() {
            return Ok(());
        }
        if let Some(command) = command.into_command() {
            self.writer.write(command);
        }
        Ok(())
    }
    pub fn set_local_transform(
        &mut self,
        target: NodeID,
        to: Transform,
    ) -> Result<(), TargetError> {
        self.expect_live(target)?;
        let from = self.scene.graph_mut().set_local_transform(target, to)?;
        if from != to {
            self.writer
                .write(GraphCommand::LocalTransformChanged { target, from, to }.into());
        }
        Ok(())
    }
    pub fn rename(&mut self, target: NodeID, to: impl Into<String>) -> Result<(), TargetError> {
        self.expect_live(target)?;
        let to = to.into();
        let from = self.scene.graph_mut().rename(target, to.clone())?;
        if from != to {
            self.writer
                .write(GraphCommand::Renamed { target, from, to }.into());
        }
        Ok(())
    }
    /// Delete the node. Its children go with it, and come back with it if undone.
    pub fn delete(&mut self, target: NodeID) -> Result<(), TargetError> {
        self.expect_live(target)?;
        self.scene.delete(target)?;
        self.writer
            .write(GraphCommand::NodeDeleted { target }.into());
        Ok(())
    }
    fn expect_live(&self, target: NodeID) -> Result<(), TargetError> {
        let graph = self.scene.graph();
        if graph.get(target).is_none() {
            Err(TargetError::TargetNotFound)
        } else if graph.is_live(target) {
            Ok(())
        } else {
            Err(TargetError::TargetDeleted)
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::commands::{CommandConsumer, DoUndo};
    use crate::id::IdServer;

    fn scene() -> Scene {
        Scene::new(IdServer::new().allocate(), &hashbrown::HashMap::new())
    }
    #[test]
    fn records_every_change() {
        let mut scene = scene();
        let mut written = smallvec::SmallVec::<[Command; 1]>::new();
        let mut writer = GraphWriter::new(&mut written, &mut scene, ReparentPolicy::default());

        let group = writer
            .add_node(NodeKind::Group, Location::end_of(None), "group")
            .unwrap();
        let mesh = writer
            .add_node(NodeKind::Mesh, Location::end_of(None), "mesh")
            .unwrap();
        writer.rename(mesh, "hull").unwrap();
        // Unchanged name, nothing written.
        writer.rename(mesh, "hull").unwrap();
        writer.reparent(mesh, Location::end_of(Some(group))).unwrap();
        writer.delete(group).unwrap();
        assert_eq!(writer.rename(mesh, "gone"), Err(TargetError::TargetDeleted));
        assert_eq!(
            writer.set_local_transform(group, Transform::identity()),
            Err(TargetError::TargetDeleted)
        );
        assert_eq!(writer.types().instance_count(), 0);
        drop(writer);

        assert_eq!(written.len(), 5);
        assert_eq!(
            written[0],
            Command::Graph(GraphCommand::NodeCreated {
                target: group,
                kind: NodeKind::Group,
                destination: None,
                child_idx: 0,
            })
        );

        // Unwind it all.
        for command in written.iter().rev() {
            scene.apply(DoUndo::Undo(command)).unwrap();
        }
        assert_eq!(scene.graph().iter().count(), 0);
        assert_eq!(scene.types().instance_count(), 0);
        // And back again.
        for command in &written {
            scene.apply(DoUndo::Do(command)).unwrap();
        }
        assert_eq!(scene.graph().iter().count(), 0);
        assert!(!scene.graph().is_live(mesh));
        assert_eq!(scene.graph().parent_of(mesh), Some(Some(group)));
        assert_eq!(scene.graph().get(mesh).map(|n| n.name()), Some("hull"));
    }
    #[test]
    fn noop_reparent_not_recorded() {
        let mut scene = scene();
        let mut written = smallvec::SmallVec::<[Command; 1]>::new();
        let mut writer = GraphWriter::new(&mut written, &mut scene, ReparentPolicy::default());
        let node = writer
            .add_node(NodeKind::Locator, Location::end_of(None), "locator")
            .unwrap();
        writer
            .reparent(node, Location::AboveSelection(node))
            .unwrap();
        drop(writer);
        assert_eq!(written.len(), 1);
    }
}
