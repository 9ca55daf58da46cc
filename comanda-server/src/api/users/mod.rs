//! Staff users
//!
//! Listing is open so login screens can show names; everything else is admin.

mod handler;

use axum::{
    Router, middleware,
    routing::{get, put},
};

use crate::auth::require_admin;
use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    let read_routes = Router::new().route("/api/users", get(handler::list));

    let manage_routes = Router::new()
        .route("/api/users", axum::routing::post(handler::create))
        .route("/api/users/{id}", put(handler::update).delete(handler::delete))
        .layer(middleware::from_fn(require_admin));

    read_routes.merge(manage_routes)
}
