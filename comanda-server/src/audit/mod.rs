//! Audit trail
//!
//! ```text
//! handler ── AuditService::log() ── mpsc ──▶ AuditWorker ──▶ audit_log table
//! ```
//!
//! Best effort: a lost entry is logged and never fails the request.

pub mod service;
pub mod types;
pub mod worker;

pub use service::{AuditLogRequest, AuditService};
pub use types::AuditAction;
pub use worker::AuditWorker;
