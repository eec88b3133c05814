use crate::commands::{self, Command};
use crate::state::{graph::writer::GraphWriter, Scene};

/// Any type which can sink commands.
pub trait CommandWrite<Command> {
    /// Inserts a command.
    fn write(&mut self, command: Command);
}
impl<Write, Command> CommandWrite<Command> for &mut Write
where
    Write: CommandWrite<Command>,
{
    fn write(&mut self, command: Command) {
        (**self).write(command);
    }
}
// Any subcommand that can be wrapped in Command can be written into any
// smallvec of Command.
impl<Subcommand, Array> CommandWrite<Subcommand> for smallvec::SmallVec<Array>
where
    Subcommand: Into<Command>,
    Array: smallvec::Array<Item = Command>,
{
    fn write(&mut self, command: Subcommand) {
        self.push(command.into());
    }
}

pub struct CommandQueueWriter<'a> {
    pub(super) lock: parking_lot::RwLockWriteGuard<'a, super::SceneCommandQueueInner>,
    // Optimize for exactly one command (the most common case)
    pub(super) commands: smallvec::SmallVec<[Command; 1]>,
}
// This is weirdly leak-safe, as even though the state will be corrupted if this is not destructed,
// as the state will no longer match the commands in the queue,
// the lock will be mutably held for all of time thus not allowing anyone one else to observe it.
// Obviously not great, but sound at least.
impl Drop for CommandQueueWriter<'_> {
    fn drop(&mut self) {
        // Skip if nothing to write.
        if self.commands.is_empty() {
            return;
        }

        // We always write exactly one command - bundle into one if more!
        // If panic exit, write as a panic scope (even if the scope is just one command long)
        let command = if std::thread::panicking() {
            Command::Meta(commands::MetaCommand::Scope(
                commands::ScopeType::WritePanic,
                std::mem::take(&mut self.commands).into_boxed_slice(),
            ))
        } else {
            match self.commands.pop() {
                // Not panicking. Write the single command, or write as Atoms scope if multiple.
                Some(only) if self.commands.is_empty() => only,
                last => {
                    self.commands.extend(last);
                    Command::Meta(commands::MetaCommand::Scope(
                        commands::ScopeType::Atoms,
                        std::mem::take(&mut self.commands).into_boxed_slice(),
                    ))
                }
            }
        };

        let present = self.lock.state.present;

        log::trace!("Writing new command: {:#?}", command);

        // Write the command or scope (as last child, as that corresponds to "latest change")
        // and update cursor.
        let new = self
            .lock
            .command_tree
            .get_mut(present)
            // It's a logic error for "present" node to not exist. Not much error handling we could do here!
            // Neglecting to write the command is just as bad, as then the State and command queue would be mismatched.
            .expect("Present node not found in the command tree.")
            .append(command)
            .node_id();
        self.lock.state.present = new;
        self.lock.evict_excess();
    }
}
impl CommandQueueWriter<'_> {
    #[must_use]
    pub fn changed(&self) -> bool {
        !self.commands.is_empty()
    }
    /// The scene as it is, including changes written so far.
    #[must_use]
    pub fn scene(&self) -> &Scene {
        &self.lock.state.scene
    }
    pub fn graph(&'_ mut self) -> GraphWriter<'_, &mut smallvec::SmallVec<[Command; 1]>> {
        let inner = &mut *self.lock;
        let policy = inner.preferences.reparent_policy;
        GraphWriter::new(&mut self.commands, &mut inner.state.scene, policy)
    }
}
