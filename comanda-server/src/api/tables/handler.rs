//! Dining table handlers

use axum::{
    Json,
    extract::{Path, State},
};
use shared::models::{DiningTable, DiningTableCreate, DiningTableUpdate};

use crate::api::ApiJson;
use crate::audit::{AuditAction, AuditLogRequest};
use crate::auth::{ClientIp, CurrentUser};
use crate::core::ServerState;
use crate::db::repository::dining_table;
use crate::utils::validation::{MAX_NAME_LEN, validate_required_text};
use crate::utils::{AppError, AppResult, ErrorCode};

const RESOURCE: &str = "table";

/// GET /api/tables
pub async fn list(State(state): State<ServerState>) -> AppResult<Json<Vec<DiningTable>>> {
    let tables = dining_table::find_all(&state.db).await?;
    Ok(Json(tables))
}

/// POST /api/tables
pub async fn create(
    State(state): State<ServerState>,
    current_user: CurrentUser,
    ClientIp(ip): ClientIp,
    ApiJson(mut payload): ApiJson<DiningTableCreate>,
) -> AppResult<Json<DiningTable>> {
    validate_required_text(&payload.name, "name", MAX_NAME_LEN)?;
    payload.name = payload.name.trim().to_string();
    let table = dining_table::create(&state.db, payload).await?;

    state.audit(
        AuditLogRequest::new(AuditAction::Create, RESOURCE, Some(table.id))
            .details(serde_json::json!({ "name": table.name }))
            .operator(Some(&current_user))
            .ip(Some(ip)),
    );
    Ok(Json(table))
}

/// PUT /api/tables/{id}
pub async fn update(
    State(state): State<ServerState>,
    current_user: CurrentUser,
    ClientIp(ip): ClientIp,
    Path(id): Path<i64>,
    ApiJson(mut payload): ApiJson<DiningTableUpdate>,
) -> AppResult<Json<DiningTable>> {
    if let Some(name) = &payload.name {
        validate_required_text(name, "name", MAX_NAME_LEN)?;
    }
    payload.name = payload.name.map(|n| n.trim().to_string());
    let table = dining_table::update(&state.db, id, payload)
        .await
        .map_err(|e| e.not_found_as(ErrorCode::TableNotFound))?;

    state.audit(
        AuditLogRequest::new(AuditAction::Update, RESOURCE, Some(id))
            .details(serde_json::json!({ "name": table.name, "is_active": table.is_active }))
            .operator(Some(&current_user))
            .ip(Some(ip)),
    );
    Ok(Json(table))
}

/// DELETE /api/tables/{id} (soft delete)
pub async fn delete(
    State(state): State<ServerState>,
    current_user: CurrentUser,
    ClientIp(ip): ClientIp,
    Path(id): Path<i64>,
) -> AppResult<Json<bool>> {
    if !dining_table::delete(&state.db, id).await? {
        return Err(AppError::with_message(
            ErrorCode::TableNotFound,
            format!("Table {id} not found"),
        ));
    }

    state.audit(
        AuditLogRequest::new(AuditAction::Delete, RESOURCE, Some(id))
            .operator(Some(&current_user))
            .ip(Some(ip)),
    );
    Ok(Json(true))
}
