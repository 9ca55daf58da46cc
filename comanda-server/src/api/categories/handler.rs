//! Category handlers

use axum::{
    Json,
    extract::{Path, State},
};
use shared::models::{Category, CategoryCreate, CategoryUpdate};

use crate::api::ApiJson;
use crate::audit::{AuditAction, AuditLogRequest};
use crate::auth::{ClientIp, CurrentUser};
use crate::core::ServerState;
use crate::db::repository::{RepoError, category};
use crate::utils::validation::{MAX_NAME_LEN, validate_required_text};
use crate::utils::{AppError, AppResult, ErrorCode};

const RESOURCE: &str = "category";

/// Duplicate names become 409 `CategoryNameExists`
fn map_repo_error(err: RepoError, name: Option<&str>) -> AppError {
    match err {
        RepoError::Duplicate(_) => {
            let mut e = AppError::new(ErrorCode::CategoryNameExists);
            if let Some(name) = name {
                e = e.with_detail("name", name);
            }
            e
        }
        other => other.not_found_as(ErrorCode::CategoryNotFound),
    }
}

/// GET /api/categories
pub async fn list(State(state): State<ServerState>) -> AppResult<Json<Vec<Category>>> {
    let categories = category::find_all(&state.db).await?;
    Ok(Json(categories))
}

/// POST /api/categories
pub async fn create(
    State(state): State<ServerState>,
    current_user: CurrentUser,
    ClientIp(ip): ClientIp,
    ApiJson(mut payload): ApiJson<CategoryCreate>,
) -> AppResult<Json<Category>> {
    validate_required_text(&payload.name, "name", MAX_NAME_LEN)?;
    payload.name = payload.name.trim().to_string();
    let name = payload.name.clone();
    let created = category::create(&state.db, payload)
        .await
        .map_err(|e| map_repo_error(e, Some(&name)))?;

    state.audit(
        AuditLogRequest::new(AuditAction::Create, RESOURCE, Some(created.id))
            .details(serde_json::json!({ "name": created.name, "sort_order": created.sort_order }))
            .operator(Some(&current_user))
            .ip(Some(ip)),
    );
    Ok(Json(created))
}

/// PUT /api/categories/{id}
pub async fn update(
    State(state): State<ServerState>,
    current_user: CurrentUser,
    ClientIp(ip): ClientIp,
    Path(id): Path<i64>,
    ApiJson(mut payload): ApiJson<CategoryUpdate>,
) -> AppResult<Json<Category>> {
    if let Some(name) = &payload.name {
        validate_required_text(name, "name", MAX_NAME_LEN)?;
    }
    payload.name = payload.name.map(|n| n.trim().to_string());
    let name = payload.name.clone();
    let updated = category::update(&state.db, id, payload)
        .await
        .map_err(|e| map_repo_error(e, name.as_deref()))?;

    state.audit(
        AuditLogRequest::new(AuditAction::Update, RESOURCE, Some(id))
            .details(serde_json::json!({ "name": updated.name, "sort_order": updated.sort_order }))
            .operator(Some(&current_user))
            .ip(Some(ip)),
    );
    Ok(Json(updated))
}

/// DELETE /api/categories/{id}
///
/// Physical delete; products of the category stay, uncategorized.
pub async fn delete(
    State(state): State<ServerState>,
    current_user: CurrentUser,
    ClientIp(ip): ClientIp,
    Path(id): Path<i64>,
) -> AppResult<Json<bool>> {
    let existing = category::find_by_id(&state.db, id).await?.ok_or_else(|| {
        AppError::with_message(ErrorCode::CategoryNotFound, format!("Category {id} not found"))
    })?;
    category::delete(&state.db, id).await?;

    state.audit(
        AuditLogRequest::new(AuditAction::Delete, RESOURCE, Some(id))
            .details(serde_json::json!({ "name": existing.name }))
            .operator(Some(&current_user))
            .ip(Some(ip)),
    );
    Ok(Json(true))
}

#[cfg(test)]
mod tests {
    use crate::api::testing::TestApp;
    use http::StatusCode;
    use serde_json::json;

    #[tokio::test]
    async fn listing_orders_by_sort_order_then_name() {
        let app = TestApp::new().await;
        let token = app.admin_token();
        for (name, order) in [("Postres", 2), ("Bebidas", 1), ("Entradas", 1)] {
            let (status, _) = app
                .send("POST", "/api/categories", Some(&token), Some(json!({ "name": name, "sort_order": order })))
                .await;
            assert_eq!(status, StatusCode::OK);
        }
        let (_, list) = app.send("GET", "/api/categories", None, None).await;
        let names: Vec<_> = list.as_array().unwrap().iter().map(|c| c["name"].as_str().unwrap().to_string()).collect();
        assert_eq!(names, vec!["Bebidas", "Entradas", "Postres"]);
    }

    #[tokio::test]
    async fn duplicate_name_conflicts() {
        let app = TestApp::new().await;
        let token = app.admin_token();
        app.send("POST", "/api/categories", Some(&token), Some(json!({ "name": "Bebidas" })))
            .await;
        let (status, body) = app
            .send("POST", "/api/categories", Some(&token), Some(json!({ "name": "Bebidas" })))
            .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["code"], 6103);
        assert_eq!(body["details"]["name"], "Bebidas");
    }

    #[tokio::test]
    async fn delete_keeps_products_uncategorized() {
        let app = TestApp::new().await;
        let token = app.admin_token();
        let (_, category) = app
            .send("POST", "/api/categories", Some(&token), Some(json!({ "name": "Cafetería" })))
            .await;
        let category_id = category["id"].as_i64().unwrap();
        let (_, product) = app
            .send(
                "POST",
                "/api/products",
                Some(&token),
                Some(json!({ "name": "Cortado", "price": 1800, "category_id": category_id })),
            )
            .await;
        assert_eq!(product["category_name"], "Cafetería");

        let (status, _) = app
            .send("DELETE", &format!("/api/categories/{category_id}"), Some(&token), None)
            .await;
        assert_eq!(status, StatusCode::OK);

        let (_, product) = app
            .send("GET", &format!("/api/products/{}", product["id"]), None, None)
            .await;
        assert_eq!(product["name"], "Cortado");
        assert!(product["category_id"].is_null());
        assert!(product["category_name"].is_null());

        let (status, body) = app
            .send("DELETE", &format!("/api/categories/{category_id}"), Some(&token), None)
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["code"], 6101);
    }
}
