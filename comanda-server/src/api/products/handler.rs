//! Product handlers

use axum::{
    Json,
    extract::{Path, State},
};
use shared::models::{Product, ProductCreate, ProductQuery, ProductUpdate};

use crate::api::{ApiJson, ApiQuery};
use crate::audit::{AuditAction, AuditLogRequest};
use crate::auth::{ClientIp, CurrentUser};
use crate::core::ServerState;
use crate::db::repository::{category, product};
use crate::utils::validation::{MAX_NAME_LEN, validate_amount, validate_required_text};
use crate::utils::{AppError, AppResult, ErrorCode};

const RESOURCE: &str = "product";

fn product_not_found(id: i64) -> AppError {
    AppError::with_message(ErrorCode::ProductNotFound, format!("Product {id} not found"))
}

fn invalid_price(err: AppError) -> AppError {
    AppError::with_message(ErrorCode::ProductInvalidPrice, err.message)
}

async fn ensure_category(state: &ServerState, category_id: Option<i64>) -> AppResult<()> {
    if let Some(id) = category_id
        && category::find_by_id(&state.db, id).await?.is_none()
    {
        return Err(AppError::with_message(
            ErrorCode::CategoryNotFound,
            format!("Category {id} not found"),
        ));
    }
    Ok(())
}

/// GET /api/products?category_id=
pub async fn list(
    State(state): State<ServerState>,
    ApiQuery(query): ApiQuery<ProductQuery>,
) -> AppResult<Json<Vec<Product>>> {
    let products = product::find_all(&state.db, query.category_id).await?;
    Ok(Json(products))
}

/// GET /api/products/{id}
///
/// Soft-deleted products are still returned, with `is_active = false`.
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<Json<Product>> {
    let product = product::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| product_not_found(id))?;
    Ok(Json(product))
}

/// POST /api/products
pub async fn create(
    State(state): State<ServerState>,
    current_user: CurrentUser,
    ClientIp(ip): ClientIp,
    ApiJson(mut payload): ApiJson<ProductCreate>,
) -> AppResult<Json<Product>> {
    validate_required_text(&payload.name, "name", MAX_NAME_LEN)?;
    validate_amount(payload.price, "price").map_err(invalid_price)?;
    ensure_category(&state, payload.category_id).await?;
    payload.name = payload.name.trim().to_string();

    let created = product::create(&state.db, payload).await?;

    state.audit(
        AuditLogRequest::new(AuditAction::Create, RESOURCE, Some(created.id))
            .details(serde_json::json!({
                "name": created.name,
                "price": created.price,
                "category_id": created.category_id,
            }))
            .operator(Some(&current_user))
            .ip(Some(ip)),
    );
    Ok(Json(created))
}

/// PUT /api/products/{id}
pub async fn update(
    State(state): State<ServerState>,
    current_user: CurrentUser,
    ClientIp(ip): ClientIp,
    Path(id): Path<i64>,
    ApiJson(mut payload): ApiJson<ProductUpdate>,
) -> AppResult<Json<Product>> {
    if let Some(name) = &payload.name {
        validate_required_text(name, "name", MAX_NAME_LEN)?;
    }
    if let Some(price) = payload.price {
        validate_amount(price, "price").map_err(invalid_price)?;
    }
    ensure_category(&state, payload.category_id).await?;
    payload.name = payload.name.map(|n| n.trim().to_string());

    let before = product::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| product_not_found(id))?;
    let updated = product::update(&state.db, id, payload)
        .await
        .map_err(|e| e.not_found_as(ErrorCode::ProductNotFound))?;

    state.audit(
        AuditLogRequest::new(AuditAction::Update, RESOURCE, Some(id))
            .details(serde_json::json!({
                "name": updated.name,
                "price": { "from": before.price, "to": updated.price },
                "category_id": updated.category_id,
                "is_active": updated.is_active,
            }))
            .operator(Some(&current_user))
            .ip(Some(ip)),
    );
    Ok(Json(updated))
}

/// DELETE /api/products/{id} (soft delete)
pub async fn delete(
    State(state): State<ServerState>,
    current_user: CurrentUser,
    ClientIp(ip): ClientIp,
    Path(id): Path<i64>,
) -> AppResult<Json<bool>> {
    if !product::delete(&state.db, id).await? {
        return Err(product_not_found(id));
    }

    state.audit(
        AuditLogRequest::new(AuditAction::Delete, RESOURCE, Some(id))
            .operator(Some(&current_user))
            .ip(Some(ip)),
    );
    Ok(Json(true))
}
