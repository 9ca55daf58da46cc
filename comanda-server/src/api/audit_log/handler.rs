//! Audit log handlers

use axum::{Json, extract::State};
use shared::models::{AuditListResponse, AuditQuery};

use crate::api::ApiQuery;
use crate::core::ServerState;
use crate::utils::AppResult;

/// GET /api/audit-log?entity=&action=&from=&to=&offset=&limit=
pub async fn list(
    State(state): State<ServerState>,
    ApiQuery(query): ApiQuery<AuditQuery>,
) -> AppResult<Json<AuditListResponse>> {
    let page = state.audit.query(&query).await?;
    Ok(Json(page))
}

#[cfg(test)]
mod tests {
    use crate::api::testing::TestApp;
    use http::StatusCode;

    #[tokio::test]
    async fn lists_recorded_mutations() {
        let mut app = TestApp::new().await;
        let token = app.admin_token();
        let table = app.create_table("Mesa 1").await;
        app.create_product("Agua", 900.0).await;
        app.send("DELETE", &format!("/api/tables/{table}"), Some(&token), None)
            .await;
        app.flush_audit().await;

        let (status, page) = app.send("GET", "/api/audit-log", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK, "{page}");
        assert_eq!(page["total"], 3);
        assert_eq!(page["items"][0]["action"], "delete");
        assert_eq!(page["items"][0]["entity"], "table");
        assert_eq!(page["items"][0]["user_name"], "Admin");

        let (_, tables) = app
            .send("GET", "/api/audit-log?entity=table&limit=1", Some(&token), None)
            .await;
        assert_eq!(tables["total"], 2);
        assert_eq!(tables["items"].as_array().unwrap().len(), 1);

        let (_, created) = app
            .send("GET", "/api/audit-log?action=create&entity=product", Some(&token), None)
            .await;
        assert_eq!(created["total"], 1);
        let details: serde_json::Value =
            serde_json::from_str(created["items"][0]["details"].as_str().unwrap()).unwrap();
        assert_eq!(details["name"], "Agua");
    }

    #[tokio::test]
    async fn requires_admin() {
        let app = TestApp::new().await;
        let waiter = app.waiter_token();
        let (status, body) = app.send("GET", "/api/audit-log", Some(&waiter), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["code"], 2003);

        let token = app.admin_token();
        let (status, _) = app.send("GET", "/api/audit-log?limit=abc", Some(&token), None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
