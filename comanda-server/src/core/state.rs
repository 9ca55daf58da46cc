use std::sync::Arc;

use shared::message::KitchenEvent;
use sqlx::SqlitePool;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::audit::{AuditLogRequest, AuditService};
use crate::auth::{JwtConfig, JwtService, RateLimiter};
use crate::core::{Config, Result};
use crate::message::{BroadcastReport, KitchenHub};
use crate::orders::OrderService;

/// Shared handles for every request handler
///
/// Cloning is cheap: every field is an `Arc` or wraps one.
///
/// | Field | Purpose |
/// |-------|---------|
/// | config | immutable settings |
/// | db | SQLite pool |
/// | orders | order mutations, per-order locking |
/// | hub | kitchen broadcast group |
/// | audit | audit queue |
/// | jwt | token issue/validation |
/// | rate_limiter | PIN check throttling |
/// | shutdown | cancelled on graceful shutdown |
#[derive(Clone, Debug)]
pub struct ServerState {
    pub config: Arc<Config>,
    pub db: SqlitePool,
    pub orders: OrderService,
    pub hub: KitchenHub,
    pub audit: Arc<AuditService>,
    pub jwt: Arc<JwtService>,
    pub rate_limiter: RateLimiter,
    pub shutdown: CancellationToken,
}

impl ServerState {
    /// Build the state over an open pool.
    ///
    /// The returned receiver feeds the [`AuditWorker`](crate::audit::AuditWorker).
    pub fn new(config: Config, db: SqlitePool) -> Result<(Self, mpsc::Receiver<AuditLogRequest>)> {
        let jwt_config = JwtConfig::resolve(config.jwt_secret.as_deref(), config.jwt_expiration_minutes)?;
        let (audit, audit_rx) = AuditService::new(db.clone(), config.audit_buffer);

        let state = Self {
            orders: OrderService::new(db.clone()),
            hub: KitchenHub::new(),
            audit,
            jwt: Arc::new(JwtService::with_config(jwt_config)),
            rate_limiter: RateLimiter::new(),
            shutdown: CancellationToken::new(),
            config: Arc::new(config),
            db,
        };
        Ok((state, audit_rx))
    }

    /// Fan an event out to the kitchen after the mutation committed
    pub fn broadcast(&self, event: KitchenEvent) -> BroadcastReport {
        self.hub.broadcast(&event)
    }

    /// Queue an audit entry
    pub fn audit(&self, request: AuditLogRequest) {
        self.audit.log(request);
    }

    /// In-memory state for handler tests
    #[cfg(test)]
    pub(crate) async fn for_tests() -> (Self, mpsc::Receiver<AuditLogRequest>) {
        let pool = crate::db::DbService::open_in_memory()
            .await
            .expect("in-memory database")
            .pool;
        let config = Config {
            jwt_secret: Some("test-secret-with-at-least-32-characters".into()),
            pin_rate_limit: 1000,
            ..Config::default()
        };
        Self::new(config, pool).expect("test state")
    }
}
