//! Daily reports (admin)

mod handler;

use axum::{Router, middleware, routing::get};

use crate::auth::require_admin;
use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new()
        .route("/api/reports/daily", get(handler::daily))
        .route("/api/reports/orders.csv", get(handler::orders_csv))
        .layer(middleware::from_fn(require_admin))
}
