//! Terminal console for managing conversational agents on a remote agent
//! service, with an in-memory fallback when the service is unreachable.

pub mod app;
pub mod client;
pub mod config;
pub mod error;
pub mod event;
pub mod forms;
pub mod i18n;
pub mod logging;
pub mod model;
pub mod state;
pub mod store;
pub mod tui;
pub mod ui;
