//! Repository Module
//!
//! Free functions over `&SqlitePool` (or an open transaction) per table.

pub mod audit_log;
pub mod category;
pub mod dining_table;
pub mod discount;
pub mod modifier;
pub mod note;
pub mod order;
pub mod payment;
pub mod product;
pub mod report;
pub mod user;

use shared::error::{AppError, ErrorCode};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Duplicate: {0}")]
    Duplicate(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Validation error: {0}")]
    Validation(String),
}

impl From<sqlx::Error> for RepoError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err
            && db_err.is_unique_violation()
        {
            return RepoError::Duplicate(db_err.message().to_string());
        }
        RepoError::Database(err.to_string())
    }
}

impl From<RepoError> for AppError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::NotFound(msg) => AppError::with_message(ErrorCode::NotFound, msg),
            RepoError::Duplicate(msg) => AppError::with_message(ErrorCode::AlreadyExists, msg),
            RepoError::Validation(msg) => AppError::validation(msg),
            RepoError::Database(msg) => AppError::database(msg),
        }
    }
}

impl RepoError {
    /// Convert to [`AppError`], using `code` for a missing row
    pub fn not_found_as(self, code: ErrorCode) -> AppError {
        match self {
            RepoError::NotFound(msg) => AppError::with_message(code, msg),
            other => other.into(),
        }
    }
}

pub type RepoResult<T> = Result<T, RepoError>;
