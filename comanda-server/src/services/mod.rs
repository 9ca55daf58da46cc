//! Services
//!
//! - [`backup`] - database backup files and retention
//! - [`web`] - router assembly and HTTP middleware

pub mod backup;
pub mod web;

pub use backup::BackupService;
pub use web::build_app;
