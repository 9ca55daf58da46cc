//! Server startup and graceful shutdown
//!
//! ```text
//! work dir ─▶ startup backup copy ─▶ open pool + migrate ─▶ admin bootstrap
//!          ─▶ ServerState ─▶ background tasks ─▶ bind + serve ─▶ Ctrl-C
//!          ─▶ stop accepting ─▶ cancel tasks (audit flush) ─▶ close pool
//! ```

use std::net::SocketAddr;
use std::time::Duration;

use serde_json::json;
use shared::models::UserRole;
use sqlx::SqlitePool;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::audit::{AuditAction, AuditLogRequest, AuditWorker};
use crate::auth::pin::hash_pin;
use crate::core::{BackgroundTasks, Config, Result, ServerState, TaskKind};
use crate::db::DbService;
use crate::db::repository::user;
use crate::services::{BackupService, build_app};
use crate::utils::validation::validate_pin;

/// Name given to the admin created from `ADMIN_PIN`
pub const BOOTSTRAP_ADMIN_NAME: &str = "Administrador";

const MAINTENANCE_INTERVAL: Duration = Duration::from_secs(60);

pub struct Server {
    config: Config,
}

impl Server {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    pub async fn run(self) -> Result<()> {
        let config = self.config;
        config.ensure_work_dir_structure()?;

        let db_path = config.database_path();
        let backups = BackupService::new(config.backups_dir(), config.backup_retention);
        match backups.copy_file(&db_path, "startup").await {
            Ok(Some(_)) => {}
            Ok(None) => tracing::info!(path = %db_path.display(), "No database yet, skipping startup backup"),
            Err(e) => tracing::warn!(error = %e, "Startup backup failed"),
        }

        let db = DbService::new(&db_path.to_string_lossy()).await?;
        bootstrap_admin(&db.pool, config.admin_pin.as_deref()).await?;

        let (state, audit_rx) = ServerState::new(config, db.pool)?;
        if state.config.reset_orders_on_startup {
            let removed = state.orders.reset().await?;
            state.audit(
                AuditLogRequest::new(AuditAction::OrdersReset, "order", None)
                    .details(json!({ "removed": removed })),
            );
        }

        let mut tasks = BackgroundTasks::with_token(state.shutdown.clone());
        register_tasks(&mut tasks, &state, audit_rx, backups);
        tasks.log_summary();

        let app = build_app(state.clone());
        let addr = state.config.bind_address();
        let listener = TcpListener::bind(&addr).await?;
        tracing::info!(
            address = %addr,
            environment = %state.config.environment,
            timezone = %state.config.timezone,
            "comanda server listening"
        );

        axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
            .with_graceful_shutdown(shutdown_signal(state.shutdown.clone()))
            .await?;

        tasks.shutdown().await;
        state.db.close().await;
        tracing::info!("Server stopped");
        Ok(())
    }
}

/// Resolves on Ctrl-C or when the token is cancelled elsewhere, and cancels
/// the token so open kitchen sockets close too.
async fn shutdown_signal(token: CancellationToken) {
    tokio::select! {
        result = tokio::signal::ctrl_c() => {
            if let Err(e) = result {
                tracing::error!(error = %e, "Failed to listen for Ctrl-C");
            }
            tracing::info!("Shutdown signal received");
        }
        _ = token.cancelled() => {}
    }
    token.cancel();
}

fn register_tasks(
    tasks: &mut BackgroundTasks,
    state: &ServerState,
    audit_rx: mpsc::Receiver<AuditLogRequest>,
    backups: BackupService,
) {
    let worker = AuditWorker::new(state.db.clone());
    let token = tasks.shutdown_token();
    tasks.spawn("audit_worker", TaskKind::Worker, worker.run(audit_rx, token));

    let interval = state.config.backup_interval_secs;
    if interval > 0 {
        let state = state.clone();
        tasks.spawn_periodic("database_backup", Duration::from_secs(interval), move || {
            let state = state.clone();
            let backups = backups.clone();
            async move { run_backup(&state, &backups).await }
        });
    } else {
        tracing::info!("Periodic backups disabled");
    }

    let state = state.clone();
    tasks.spawn_periodic("maintenance", MAINTENANCE_INTERVAL, move || {
        let state = state.clone();
        async move {
            let limits = state.rate_limiter.cleanup();
            let locks = state.orders.locks().prune_idle();
            if limits + locks > 0 {
                tracing::debug!(rate_limit_entries = limits, order_locks = locks, "Maintenance pass");
            }
        }
    });
}

async fn run_backup(state: &ServerState, backups: &BackupService) {
    match backups.snapshot(&state.db, "auto").await {
        Ok(path) => {
            state.audit(
                AuditLogRequest::new(AuditAction::BackupCreated, "backup", None)
                    .details(json!({ "path": path.display().to_string() })),
            );
        }
        Err(e) => tracing::error!(error = %e, "Periodic backup failed"),
    }
}

/// Create the first admin from `ADMIN_PIN` when no active admin exists.
///
/// Returns the new user's id, or `None` when nothing was created.
pub async fn bootstrap_admin(pool: &SqlitePool, admin_pin: Option<&str>) -> Result<Option<i64>> {
    if user::count_active_admins(pool).await? > 0 {
        return Ok(None);
    }
    let Some(pin) = admin_pin.map(str::trim).filter(|p| !p.is_empty()) else {
        tracing::warn!("No active admin and ADMIN_PIN is unset; admin routes are unreachable");
        return Ok(None);
    };
    validate_pin(pin)?;
    let pin_hash = hash_pin(pin)?;
    let admin = user::create(pool, BOOTSTRAP_ADMIN_NAME, UserRole::Admin, &pin_hash).await?;
    tracing::info!(user_id = admin.id, "Bootstrap admin created from ADMIN_PIN");
    Ok(Some(admin.id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::pin::verify_pin;

    #[tokio::test]
    async fn bootstrap_admin_only_once() {
        let pool = DbService::open_in_memory().await.unwrap().pool;

        assert_eq!(bootstrap_admin(&pool, None).await.unwrap(), None);
        assert_eq!(bootstrap_admin(&pool, Some("  ")).await.unwrap(), None);

        let id = bootstrap_admin(&pool, Some("4321")).await.unwrap().unwrap();
        let admin = user::find_by_id(&pool, id).await.unwrap().unwrap();
        assert_eq!(admin.role, UserRole::Admin);
        assert_eq!(admin.name, BOOTSTRAP_ADMIN_NAME);
        assert!(verify_pin("4321", &admin.pin_hash));

        assert_eq!(bootstrap_admin(&pool, Some("9999")).await.unwrap(), None);
        assert_eq!(user::count_active_admins(&pool).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn bootstrap_rejects_malformed_pin() {
        let pool = DbService::open_in_memory().await.unwrap().pool;
        assert!(bootstrap_admin(&pool, Some("12")).await.is_err());
        assert_eq!(user::count_active_admins(&pool).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn shutdown_signal_follows_token() {
        let token = CancellationToken::new();
        let waiter = tokio::spawn(shutdown_signal(token.clone()));
        token.cancel();
        waiter.await.unwrap();
        assert!(token.is_cancelled());
    }
}
