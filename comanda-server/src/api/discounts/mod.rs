//! Discount API

mod handler;

use axum::{
    Router, middleware,
    routing::{delete, get, post},
};

use crate::auth::require_admin;
use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    let read_routes =
        Router::new().route("/api/orders/{id}/discounts", get(handler::list));

    let manage_routes = Router::new()
        .route("/api/orders/{id}/discounts", post(handler::apply))
        .route("/api/discounts/{id}", delete(handler::remove))
        .layer(middleware::from_fn(require_admin));

    read_routes.merge(manage_routes)
}
