use thiserror::Error;

use crate::auth::JwtError;
use crate::utils::{AppError, ErrorCode};

/// Startup and lifecycle failures. Request errors use [`AppError`].
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JWT error: {0}")]
    Jwt(#[from] JwtError),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<AppError> for ServerError {
    fn from(err: AppError) -> Self {
        match err.code {
            ErrorCode::ConfigError => ServerError::Config(err.message),
            ErrorCode::DatabaseError => ServerError::Database(err.message),
            _ => ServerError::Internal(anyhow::anyhow!(err.message)),
        }
    }
}

impl From<crate::db::repository::RepoError> for ServerError {
    fn from(err: crate::db::repository::RepoError) -> Self {
        ServerError::Database(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ServerError>;
