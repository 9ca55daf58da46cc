//! Order API
//!
//! Staff screens create and move orders without a token; the full edit is
//! admin only. Every committed change is broadcast to the kitchen.

mod handler;

use axum::{
    Router, middleware,
    routing::{get, post, put},
};

use crate::auth::require_admin;
use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    let staff_routes = Router::new()
        .route("/api/orders", get(handler::list).post(handler::create))
        .route("/api/orders/{id}", get(handler::get_by_id))
        .route("/api/orders/{id}/items", post(handler::add_items))
        .route("/api/orders/{id}/status", put(handler::update_status))
        .route("/api/orders/{id}/cancel", post(handler::cancel))
        .route("/api/orders/{id}/restore", post(handler::restore));

    let manage_routes = Router::new()
        .route("/api/orders/{id}", put(handler::edit))
        .layer(middleware::from_fn(require_admin));

    staff_routes.merge(manage_routes)
}
