//! Audit log API (admin)

mod handler;

use axum::{Router, middleware, routing::get};

use crate::auth::require_admin;
use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new()
        .route("/api/audit-log", get(handler::list))
        .layer(middleware::from_fn(require_admin))
}
