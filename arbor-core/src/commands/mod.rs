//! # Commands
//!
//! Commands are the way the shared state of a scene is modified. Every change (even trivial ones, like renaming a node)
//! is recorded automatically as a command by a [`crate::queue::writer`].
//!
//! Commands are plain data describing both sides of a change, so the same command can be applied forwards or
//! backwards by a [`CommandConsumer`]. Edits that compute follow-up changes, like [`parent::ParentCommand`], are
//! built immediately against the scene and then converted into a recorded command.

pub mod parent;

pub use crate::state::graph::commands::Command as GraphCommand;

#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandError {
    #[error("command constructed for a state that does not match the current state")]
    MismatchedState,
    #[error("resource referenced by the command is not found")]
    UnknownResource,
    #[error("command makes no changes")]
    NoOp,
}
impl From<crate::state::graph::ReparentError> for CommandError {
    fn from(value: crate::state::graph::ReparentError) -> Self {
        use crate::state::graph::{ReparentError, TargetError};
        match value {
            ReparentError::TargetError(TargetError::TargetNotFound)
            | ReparentError::DestinationError(TargetError::TargetNotFound) => {
                Self::UnknownResource
            }
            _ => Self::MismatchedState,
        }
    }
}
impl From<crate::state::graph::TargetError> for CommandError {
    fn from(value: crate::state::graph::TargetError) -> Self {
        match value {
            crate::state::graph::TargetError::TargetNotFound => Self::UnknownResource,
            _ => Self::MismatchedState,
        }
    }
}
pub trait CommandConsumer<C> {
    /// Apply a single command. If this generates an error,
    /// the state of `self` should *not* be observably changed.
    fn apply(&mut self, command: DoUndo<'_, C>) -> Result<(), CommandError>;
}
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ScopeType {
    /// Commands are grouped because they were individual parts in part of a single, larger operation.
    Atoms,
    /// A command writer panicked mid write. The commands contained may be part of an incomplete operation,
    /// but are still tracked to ensure integrity of the tree as a whole.
    WritePanic,
}
/// Commands about commands!
#[derive(Clone, Debug, PartialEq)]
pub enum MetaCommand {
    /// Bundle many commands into one big group. Can be nested many times.
    /// Grouped commands are treated as a single command, as far as the user can tell.
    ///
    /// Done in order, undone in reverse order.
    // Instead of storing these inline to the tree, store them in a separate slice.
    // Prevents invalid usage (i.e., tree branching in the middle of a scope!)
    Scope(ScopeType, Box<[Command]>),
    /// A primary command, with follow-up commands it caused.
    ///
    /// Done as primary then pushed in order. Undone as primary *first*, then pushed in reverse order.
    Pushed {
        primary: Box<Command>,
        pushed: Box<[Command]>,
    },
}

#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    Meta(MetaCommand),
    Graph(GraphCommand),
    // We need a dummy command to serve as the root of the command tree. :V
    // Invalid anywhere else.
    Dummy,
}
impl From<MetaCommand> for Command {
    fn from(value: MetaCommand) -> Self {
        Self::Meta(value)
    }
}
impl From<GraphCommand> for Command {
    fn from(value: GraphCommand) -> Self {
        Self::Graph(value)
    }
}
impl Command {
    #[must_use]
    pub fn meta(&self) -> Option<&MetaCommand> {
        match self {
            Self::Meta(m) => Some(m),
            _ => None,
        }
    }
    #[must_use]
    pub fn graph(&self) -> Option<&GraphCommand> {
        match self {
            Self::Graph(m) => Some(m),
            _ => None,
        }
    }
    #[must_use]
    pub fn dummy(&self) -> Option<()> {
        match self {
            Self::Dummy => Some(()),
            _ => None,
        }
    }
    /// Iterate over every graph command contained in this command, flattening scopes, in the order they were done.
    pub fn iter_graph(&self) -> Box<dyn Iterator<Item = &GraphCommand> + '_> {
        match self {
            Self::Graph(graph) => Box::new(std::iter::once(graph)),
            Self::Meta(MetaCommand::Scope(_, commands)) => {
                Box::new(commands.iter().flat_map(Self::iter_graph))
            }
            Self::Meta(MetaCommand::Pushed { primary, pushed }) => Box::new(
                primary
                    .iter_graph()
                    .chain(pushed.iter().flat_map(Self::iter_graph)),
            ),
            Self::Dummy => Box::new(std::iter::empty()),
        }
    }
}

#[derive(PartialEq, Eq, Debug)]
pub enum DoUndo<'c, T> {
    Do(&'c T),
    Undo(&'c T),
}
// Derive would needlessly require T: Clone
impl<T> Clone for DoUndo<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}
impl<T> Copy for DoUndo<'_, T> {}
impl<'c, T> DoUndo<'c, T> {
    /// Apply a closure to the inner type T, maintaining the
    /// Do or Undo status. Returns None if the closure returns None.
    pub fn filter_map<Func, Return>(&self, f: Func) -> Option<DoUndo<'c, Return>>
    where
        Func: FnOnce(&'c T) -> Option<&'c Return>,
        Return: 'c,
    {
        match self {
            Self::Do(c) => Some(DoUndo::Do(f(c)?)),
            Self::Undo(c) => Some(DoUndo::Undo(f(c)?)),
        }
    }
    /// The same command, in the other direction.
    #[must_use]
    pub fn inverse(self) -> Self {
        match self {
            Self::Do(c) => Self::Undo(c),
            Self::Undo(c) => Self::Do(c),
        }
    }
    #[must_use]
    pub fn command(&self) -> &'c T {
        match self {
            Self::Do(c) | Self::Undo(c) => c,
        }
    }
}
/// An owned version of [`DoUndo`], for handing commands out past the lifetime of the queue's lock.
#[derive(PartialEq, Debug, Clone)]
pub enum OwnedDoUndo<C> {
    Do(C),
    Undo(C),
}
impl<C> From<DoUndo<'_, C>> for OwnedDoUndo<C>
where
    C: Clone,
{
    fn from(value: DoUndo<'_, C>) -> Self {
        match value {
            DoUndo::Do(c) => Self::Do(c.clone()),
            DoUndo::Undo(c) => Self::Undo(c.clone()),
        }
    }
}
impl<C> OwnedDoUndo<C> {
    #[must_use]
    pub fn as_ref(&self) -> DoUndo<'_, C> {
        match self {
            Self::Do(c) => DoUndo::Do(c),
            Self::Undo(c) => DoUndo::Undo(c),
        }
    }
}

/// Apply each step in order. If any step fails, the steps already applied are reverted in reverse order
/// before the error is returned, leaving `consumer` as it was.
pub(crate) fn apply_all<'c, Consumer, C>(
    consumer: &mut Consumer,
    steps: impl IntoIterator<Item = DoUndo<'c, C>>,
) -> Result<(), CommandError>
where
    Consumer: CommandConsumer<C> + ?Sized,
    C: 'c,
{
    let mut applied = Vec::new();
    for step in steps {
        if let Err(err) = consumer.apply(step) {
            for done in applied.into_iter().rev() {
                // Reverting what was just applied can't mismatch.
                let _ = consumer.apply(DoUndo::inverse(done));
            }
            return Err(err);
        }
        applied.push(step);
    }
    Ok(())
}
