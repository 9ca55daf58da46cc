//! User API handlers

use axum::{
    Json,
    extract::{Path, State},
};
use shared::models::{User, UserCreate, UserQuery, UserRole, UserUpdate};

use crate::api::{ApiJson, ApiQuery};
use crate::audit::{AuditAction, AuditLogRequest};
use crate::auth::pin::hash_pin;
use crate::auth::{ClientIp, CurrentUser};
use crate::core::ServerState;
use crate::db::repository::user::{self, UserChanges};
use crate::utils::validation::{MAX_NAME_LEN, validate_pin, validate_required_text};
use crate::utils::{AppError, AppResult, ErrorCode};

const RESOURCE: &str = "user";

fn user_not_found(id: i64) -> AppError {
    AppError::with_message(ErrorCode::UserNotFound, format!("User {id} not found"))
}

/// Refuse a change that would leave no active admin
async fn guard_last_admin(state: &ServerState, existing: &User) -> AppResult<()> {
    if existing.is_active
        && existing.role == UserRole::Admin
        && user::count_active_admins(&state.db).await? <= 1
    {
        return Err(AppError::new(ErrorCode::CannotDeleteAdmin));
    }
    Ok(())
}

/// GET /api/users?role=
pub async fn list(
    State(state): State<ServerState>,
    ApiQuery(query): ApiQuery<UserQuery>,
) -> AppResult<Json<Vec<User>>> {
    let users = user::find_all(&state.db, query.role).await?;
    Ok(Json(users))
}

/// POST /api/users
pub async fn create(
    State(state): State<ServerState>,
    current_user: CurrentUser,
    ClientIp(ip): ClientIp,
    ApiJson(payload): ApiJson<UserCreate>,
) -> AppResult<Json<User>> {
    validate_required_text(&payload.name, "name", MAX_NAME_LEN)?;
    validate_pin(&payload.pin)?;
    let pin_hash = hash_pin(&payload.pin)?;

    let created = user::create(&state.db, payload.name.trim(), payload.role, &pin_hash).await?;

    state.audit(
        AuditLogRequest::new(AuditAction::Create, RESOURCE, Some(created.id))
            .details(serde_json::json!({ "name": created.name, "role": created.role }))
            .operator(Some(&current_user))
            .ip(Some(ip)),
    );
    Ok(Json(created))
}

/// PUT /api/users/{id}
pub async fn update(
    State(state): State<ServerState>,
    current_user: CurrentUser,
    ClientIp(ip): ClientIp,
    Path(id): Path<i64>,
    ApiJson(payload): ApiJson<UserUpdate>,
) -> AppResult<Json<User>> {
    let existing = user::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| user_not_found(id))?;

    if let Some(name) = &payload.name {
        validate_required_text(name, "name", MAX_NAME_LEN)?;
    }
    let demoted = payload.role.is_some_and(|r| r != UserRole::Admin);
    let disabled = payload.is_active == Some(false);
    if demoted || disabled {
        guard_last_admin(&state, &existing).await?;
    }
    let pin_hash = match &payload.pin {
        Some(pin) => {
            validate_pin(pin)?;
            Some(hash_pin(pin)?)
        }
        None => None,
    };

    let changes = UserChanges {
        name: payload.name.as_deref().map(|n| n.trim().to_string()),
        role: payload.role,
        pin_hash,
        is_active: payload.is_active,
    };
    let updated = user::update(&state.db, id, changes)
        .await
        .map_err(|e| e.not_found_as(ErrorCode::UserNotFound))?;

    state.audit(
        AuditLogRequest::new(AuditAction::Update, RESOURCE, Some(id))
            .details(serde_json::json!({
                "name": updated.name,
                "role": updated.role,
                "is_active": updated.is_active,
                "pin_changed": payload.pin.is_some(),
            }))
            .operator(Some(&current_user))
            .ip(Some(ip)),
    );
    Ok(Json(updated))
}

/// DELETE /api/users/{id} (soft delete)
pub async fn delete(
    State(state): State<ServerState>,
    current_user: CurrentUser,
    ClientIp(ip): ClientIp,
    Path(id): Path<i64>,
) -> AppResult<Json<bool>> {
    let existing = user::find_by_id(&state.db, id)
        .await?
        .filter(|u| u.is_active)
        .ok_or_else(|| user_not_found(id))?;
    guard_last_admin(&state, &existing).await?;

    if !user::deactivate(&state.db, id).await? {
        return Err(user_not_found(id));
    }

    state.audit(
        AuditLogRequest::new(AuditAction::Delete, RESOURCE, Some(id))
            .details(serde_json::json!({ "name": existing.name }))
            .operator(Some(&current_user))
            .ip(Some(ip)),
    );
    Ok(Json(true))
}
