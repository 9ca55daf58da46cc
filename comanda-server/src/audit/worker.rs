//! Audit background worker
//!
//! Drains the audit channel into `audit_log`. Exits when the channel closes
//! or, after flushing what is already queued, on shutdown.

use sqlx::SqlitePool;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use super::service::AuditLogRequest;
use crate::db::repository::audit_log::{self, NewAuditEntry};

pub struct AuditWorker {
    pool: SqlitePool,
}

impl AuditWorker {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn run(self, mut rx: mpsc::Receiver<AuditLogRequest>, shutdown: CancellationToken) {
        tracing::info!("Audit log worker started");

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    rx.close();
                    let mut flushed = 0usize;
                    while let Some(req) = rx.recv().await {
                        self.write(req).await;
                        flushed += 1;
                    }
                    tracing::info!(flushed, "Audit log worker stopped");
                    return;
                }
                next = rx.recv() => match next {
                    Some(req) => self.write(req).await,
                    None => break,
                },
            }
        }

        tracing::info!("Audit log channel closed, worker stopping");
    }

    pub(crate) async fn write(&self, req: AuditLogRequest) {
        let details = match &req.details {
            serde_json::Value::Null => None,
            other => Some(other.to_string()),
        };
        let entry = NewAuditEntry {
            user_id: req.user_id,
            user_name: req.user_name,
            action: req.action.as_str().to_string(),
            entity: req.entity.to_string(),
            entity_id: req.entity_id,
            details,
            ip: req.ip,
            created_at: req.created_at,
        };
        match audit_log::insert(&self.pool, &entry).await {
            Ok(id) => {
                tracing::debug!(audit_id = id, action = %req.action, entity = req.entity, "Audit entry recorded");
            }
            Err(e) => {
                tracing::error!(action = %req.action, error = %e, "Failed to write audit entry");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::{AuditAction, AuditService};
    use crate::db::DbService;
    use shared::models::AuditQuery;

    #[tokio::test]
    async fn worker_persists_until_channel_closes() {
        let pool = DbService::open_in_memory().await.unwrap().pool;
        let (service, rx) = AuditService::new(pool.clone(), 8);
        service.log(
            AuditLogRequest::new(AuditAction::PaymentAdded, "order", Some(9))
                .details(serde_json::json!({"amount": 12.5}))
                .ip(Some("10.0.0.7".into())),
        );
        service.log(AuditLogRequest::new(AuditAction::Create, "product", Some(2)));

        let worker = tokio::spawn(AuditWorker::new(pool.clone()).run(rx, CancellationToken::new()));
        drop(service);
        worker.await.unwrap();

        let (items, total) = audit_log::query(&pool, &AuditQuery::default()).await.unwrap();
        assert_eq!(total, 2);
        let payment = items.iter().find(|e| e.action == "payment_added").unwrap();
        assert_eq!(payment.ip.as_deref(), Some("10.0.0.7"));
        assert_eq!(payment.details.as_deref(), Some(r#"{"amount":12.5}"#));
        let created = items.iter().find(|e| e.action == "create").unwrap();
        assert_eq!(created.details, None);
    }

    #[tokio::test]
    async fn shutdown_flushes_queued_entries() {
        let pool = DbService::open_in_memory().await.unwrap().pool;
        let (service, rx) = AuditService::new(pool.clone(), 8);
        for id in 1..=3 {
            service.log(AuditLogRequest::new(AuditAction::Delete, "note", Some(id)));
        }

        let token = CancellationToken::new();
        token.cancel();
        AuditWorker::new(pool.clone()).run(rx, token).await;

        let (_, total) = audit_log::query(&pool, &AuditQuery::default()).await.unwrap();
        assert_eq!(total, 3);
        // Service is still alive; the worker returned anyway
        drop(service);
    }
}
