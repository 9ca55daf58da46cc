//! Authentication routes
//!
//! - POST /api/auth/pin-check: open, throttled per client IP

mod handler;

use axum::{Router, middleware, routing::post};

use crate::auth::pin_rate_limit;
use crate::core::ServerState;

pub fn router(state: &ServerState) -> Router<ServerState> {
    Router::new().route(
        "/api/auth/pin-check",
        post(handler::pin_check)
            .route_layer(middleware::from_fn_with_state(state.clone(), pin_rate_limit)),
    )
}
