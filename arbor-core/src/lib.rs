//! # Arbor
//!
//! An editable scene hierarchy with undo/redo. Scenes are opened from a [`context::SceneContext`], and modified through
//! their [`queue::SceneCommandQueue`], which records every change as a [`commands::Command`].

pub mod commands;
pub mod context;
pub mod events;
pub mod id;
pub mod preferences;
pub mod queue;
pub mod state;

pub use id::ArborID;
