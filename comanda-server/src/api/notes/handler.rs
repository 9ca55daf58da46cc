//! Kitchen note handlers

use axum::{
    Json,
    extract::{Path, State},
};
use serde_json::json;
use shared::message::KitchenEvent;
use shared::models::{Note, NoteCreate};

use crate::api::ApiJson;
use crate::audit::{AuditAction, AuditLogRequest};
use crate::auth::{ClientIp, Operator};
use crate::core::ServerState;
use crate::db::repository::note;
use crate::utils::validation::{MAX_NOTE_LEN, validate_required_text};
use crate::utils::{AppError, AppResult, ErrorCode};

const RESOURCE: &str = "note";

/// GET /api/notes
pub async fn list(State(state): State<ServerState>) -> AppResult<Json<Vec<Note>>> {
    let notes = note::find_recent(&state.db).await?;
    Ok(Json(notes))
}

/// POST /api/notes
pub async fn create(
    State(state): State<ServerState>,
    operator: Operator,
    ClientIp(ip): ClientIp,
    ApiJson(payload): ApiJson<NoteCreate>,
) -> AppResult<Json<Note>> {
    validate_required_text(&payload.content, "content", MAX_NOTE_LEN)?;
    let created = note::create(&state.db, payload.content.trim()).await?;
    tracing::info!(note_id = created.id, "Kitchen note posted");

    state.broadcast(KitchenEvent::NewNota {
        id: created.id,
        nota: created.clone(),
    });
    state.audit(
        AuditLogRequest::new(AuditAction::Create, RESOURCE, Some(created.id))
            .details(json!({ "content": created.content }))
            .operator(operator.user())
            .ip(Some(ip)),
    );
    Ok(Json(created))
}

/// DELETE /api/notes/{id}
pub async fn delete(
    State(state): State<ServerState>,
    operator: Operator,
    ClientIp(ip): ClientIp,
    Path(id): Path<i64>,
) -> AppResult<Json<bool>> {
    if !note::delete(&state.db, id).await? {
        return Err(AppError::with_message(
            ErrorCode::NoteNotFound,
            format!("Note {id} not found"),
        ));
    }
    state.broadcast(KitchenEvent::NotaDeleted { id });
    state.audit(
        AuditLogRequest::new(AuditAction::Delete, RESOURCE, Some(id))
            .operator(operator.user())
            .ip(Some(ip)),
    );
    Ok(Json(true))
}
