//! Modifier handlers

use axum::{
    Json,
    extract::{Path, State},
};
use shared::models::{Modifier, ModifierCreate, ModifierUpdate};

use crate::api::ApiJson;
use crate::audit::{AuditAction, AuditLogRequest};
use crate::auth::{ClientIp, CurrentUser};
use crate::core::ServerState;
use crate::db::repository::modifier;
use crate::utils::validation::{MAX_NAME_LEN, validate_amount, validate_required_text};
use crate::utils::{AppError, AppResult, ErrorCode};

const RESOURCE: &str = "modifier";

/// GET /api/modifiers
pub async fn list(State(state): State<ServerState>) -> AppResult<Json<Vec<Modifier>>> {
    let modifiers = modifier::find_all(&state.db).await?;
    Ok(Json(modifiers))
}

/// POST /api/modifiers
pub async fn create(
    State(state): State<ServerState>,
    current_user: CurrentUser,
    ClientIp(ip): ClientIp,
    ApiJson(mut payload): ApiJson<ModifierCreate>,
) -> AppResult<Json<Modifier>> {
    validate_required_text(&payload.name, "name", MAX_NAME_LEN)?;
    validate_amount(payload.extra_price, "extra_price")?;
    payload.name = payload.name.trim().to_string();
    let created = modifier::create(&state.db, payload).await?;

    state.audit(
        AuditLogRequest::new(AuditAction::Create, RESOURCE, Some(created.id))
            .details(serde_json::json!({ "name": created.name, "extra_price": created.extra_price }))
            .operator(Some(&current_user))
            .ip(Some(ip)),
    );
    Ok(Json(created))
}

/// PUT /api/modifiers/{id}
pub async fn update(
    State(state): State<ServerState>,
    current_user: CurrentUser,
    ClientIp(ip): ClientIp,
    Path(id): Path<i64>,
    ApiJson(mut payload): ApiJson<ModifierUpdate>,
) -> AppResult<Json<Modifier>> {
    if let Some(name) = &payload.name {
        validate_required_text(name, "name", MAX_NAME_LEN)?;
    }
    if let Some(extra_price) = payload.extra_price {
        validate_amount(extra_price, "extra_price")?;
    }
    payload.name = payload.name.map(|n| n.trim().to_string());
    let updated = modifier::update(&state.db, id, payload)
        .await
        .map_err(|e| e.not_found_as(ErrorCode::ModifierNotFound))?;

    state.audit(
        AuditLogRequest::new(AuditAction::Update, RESOURCE, Some(id))
            .details(serde_json::json!({
                "name": updated.name,
                "extra_price": updated.extra_price,
                "is_active": updated.is_active,
            }))
            .operator(Some(&current_user))
            .ip(Some(ip)),
    );
    Ok(Json(updated))
}

/// DELETE /api/modifiers/{id} (soft delete)
pub async fn delete(
    State(state): State<ServerState>,
    current_user: CurrentUser,
    ClientIp(ip): ClientIp,
    Path(id): Path<i64>,
) -> AppResult<Json<bool>> {
    if !modifier::delete(&state.db, id).await? {
        return Err(AppError::with_message(
            ErrorCode::ModifierNotFound,
            format!("Modifier {id} not found"),
        ));
    }

    state.audit(
        AuditLogRequest::new(AuditAction::Delete, RESOURCE, Some(id))
            .operator(Some(&current_user))
            .ip(Some(ip)),
    );
    Ok(Json(true))
}
