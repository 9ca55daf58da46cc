//! Payment API

mod handler;

use axum::{Router, routing::get};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().route(
        "/api/orders/{id}/payments",
        get(handler::list).post(handler::create),
    )
}
