//! Audit service
//!
//! `log()` never waits on the database: it pushes onto a bounded channel and
//! the [`AuditWorker`](super::AuditWorker) writes rows in the background.
//! A full or closed channel loses the entry with a warning.

use std::sync::Arc;

use shared::error::AppResult;
use shared::models::{AuditListResponse, AuditQuery};
use sqlx::SqlitePool;
use tokio::sync::mpsc;

use super::types::AuditAction;
use crate::auth::CurrentUser;
use crate::db::repository::audit_log;

/// One audit entry on its way to the worker
#[derive(Debug, Clone)]
pub struct AuditLogRequest {
    pub action: AuditAction,
    pub entity: &'static str,
    pub entity_id: Option<i64>,
    pub user_id: Option<i64>,
    pub user_name: Option<String>,
    pub details: serde_json::Value,
    pub ip: Option<String>,
    pub created_at: i64,
}

impl AuditLogRequest {
    pub fn new(action: AuditAction, entity: &'static str, entity_id: Option<i64>) -> Self {
        Self {
            action,
            entity,
            entity_id,
            user_id: None,
            user_name: None,
            details: serde_json::Value::Null,
            ip: None,
            created_at: shared::util::now_millis(),
        }
    }

    pub fn details(mut self, details: serde_json::Value) -> Self {
        self.details = details;
        self
    }

    /// Operator from the request token, if any
    pub fn operator(mut self, user: Option<&CurrentUser>) -> Self {
        if let Some(user) = user {
            self.user_id = Some(user.id);
            self.user_name = Some(user.name.clone());
        }
        self
    }

    pub fn ip(mut self, ip: Option<String>) -> Self {
        self.ip = ip;
        self
    }
}

#[derive(Debug)]
pub struct AuditService {
    pool: SqlitePool,
    tx: mpsc::Sender<AuditLogRequest>,
}

impl AuditService {
    pub fn new(pool: SqlitePool, buffer_size: usize) -> (Arc<Self>, mpsc::Receiver<AuditLogRequest>) {
        let (tx, rx) = mpsc::channel(buffer_size.max(1));
        (Arc::new(Self { pool, tx }), rx)
    }

    /// Queue an entry. Failures are logged, never returned.
    pub fn log(&self, request: AuditLogRequest) {
        if let Err(e) = self.tx.try_send(request) {
            let (reason, request) = match e {
                mpsc::error::TrySendError::Full(r) => ("channel full", r),
                mpsc::error::TrySendError::Closed(r) => ("channel closed", r),
            };
            tracing::warn!(
                action = %request.action,
                entity = request.entity,
                entity_id = ?request.entity_id,
                reason,
                "Audit entry dropped"
            );
        }
    }

    pub async fn query(&self, query: &AuditQuery) -> AppResult<AuditListResponse> {
        let (items, total) = audit_log::query(&self.pool, query).await?;
        Ok(AuditListResponse { items, total })
    }
}
