//! Kitchen push channel
//!
//! `GET /ws/kitchen` upgrades to a WebSocket that receives every
//! [`KitchenEvent`](shared::message::KitchenEvent) as a JSON text frame.
//! Inbound frames are ignored; the server pings to keep idle proxies open.

mod handler;

use axum::{Router, routing::get};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().route("/ws/kitchen", get(handler::kitchen_ws))
}
