use crate::commands::{Command, CommandConsumer, CommandError, DoUndo};
use crate::state::Scene;

pub struct State {
    pub scene: Scene,
    /// The node in the command tree that this state corresponds to
    pub present: slab_tree::NodeId,
}
impl State {
    pub fn new(scene: Scene, present: slab_tree::NodeId) -> Self {
        Self { scene, present }
    }
}
impl CommandConsumer<Command> for State {
    fn apply(&mut self, action: DoUndo<'_, Command>) -> Result<(), CommandError> {
        self.scene.apply(action)
    }
}
