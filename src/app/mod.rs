//! The `app` module drives the console.
//!
//! It owns the application state, routes keyboard input to the visible screen
//! and turns the results of background requests into screen updates.

/// Navigation between screens and form submission.
mod actions;
/// Construction of `App`.
mod init;
/// Keyboard routing.
mod keyboard;
/// Input prompts and delete confirmation.
mod overlays;
/// `App` and the per-screen state types.
mod state;
/// Polling of background requests on every tick.
mod tick;

pub use state::{
    AgentFormState, App, ChatPane, Composer, ConfirmDeleteState, DeleteTarget, InputPromptState,
    KnowledgePane, OverlayState, PendingInputAction, Screen,
};
