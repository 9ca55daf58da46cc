//! Core: configuration, shared state, errors, startup
//!
//! - [`Config`] - environment-driven settings
//! - [`ServerState`] - handles shared by every handler
//! - [`Server`] - startup sequence and graceful shutdown
//! - [`BackgroundTasks`] - registry of long-running tasks
//! - [`ServerError`] - startup failures

pub mod config;
pub mod error;
pub mod server;
pub mod state;
pub mod tasks;

pub use config::Config;
pub use error::{Result, ServerError};
pub use server::Server;
pub use state::ServerState;
pub use tasks::{BackgroundTasks, TaskKind};
