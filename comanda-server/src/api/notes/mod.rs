//! Kitchen note API

mod handler;

use axum::{
    Router,
    routing::{delete, get},
};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new()
        .route("/api/notes", get(handler::list).post(handler::create))
        .route("/api/notes/{id}", delete(handler::delete))
}
