//! Shared types for the comanda backend
//!
//! Error system, entity models and kitchen broadcast events used by the
//! server and by any Rust client.

pub mod error;
pub mod message;
pub mod models;
pub mod util;

// Re-exports
pub use axum::{Json, body};
pub use error::{ApiResponse, AppError, AppResult, ErrorCategory, ErrorCode};
pub use http;
pub use message::KitchenEvent;
pub use serde::{Deserialize, Serialize};
