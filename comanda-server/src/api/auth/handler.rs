//! PIN check handler

use std::time::Duration;

use axum::{Json, extract::State};
use shared::models::{PinCheckRequest, PinCheckResponse, User};
use tokio::time::Instant;

use crate::api::ApiJson;
use crate::audit::{AuditAction, AuditLogRequest};
use crate::auth::ClientIp;
use crate::auth::pin::verify_pin;
use crate::core::ServerState;
use crate::db::repository::user;
use crate::security_log;
use crate::utils::{AppError, AppResult};

/// Every PIN check answers no sooner than this after it started
const PIN_CHECK_DELAY_MS: u64 = 500;

/// POST /api/auth/pin-check
///
/// With `user_id` the PIN must match that active user; without it, any active
/// admin. Failures of any kind return the same `InvalidCredentials` error.
pub async fn pin_check(
    State(state): State<ServerState>,
    ClientIp(ip): ClientIp,
    ApiJson(req): ApiJson<PinCheckRequest>,
) -> AppResult<Json<PinCheckResponse>> {
    let started = Instant::now();
    let matched = find_match(&state, &req).await;
    tokio::time::sleep_until(started + Duration::from_millis(PIN_CHECK_DELAY_MS)).await;

    let Some(user) = matched? else {
        security_log!(WARN, "pin_check_failed", ip = %ip, user_id = ?req.user_id);
        state.audit(
            AuditLogRequest::new(AuditAction::PinCheckFailed, "auth", req.user_id)
                .details(serde_json::json!({ "reason": "invalid_credentials" }))
                .ip(Some(ip)),
        );
        return Err(AppError::invalid_credentials());
    };

    let token = state
        .jwt
        .generate_token(&user)
        .map_err(|e| AppError::internal(format!("Failed to generate token: {e}")))?;

    tracing::info!(user_id = user.id, role = %user.role, "PIN check succeeded");
    let mut entry = AuditLogRequest::new(AuditAction::PinCheckSuccess, "auth", Some(user.id))
        .details(serde_json::json!({ "role": user.role }))
        .ip(Some(ip));
    entry.user_id = Some(user.id);
    entry.user_name = Some(user.name.clone());
    state.audit(entry);

    Ok(Json(PinCheckResponse {
        token,
        expires_in: state.jwt.expires_in(),
        user,
    }))
}

/// The user whose hash matches, if any. Hash checks run off the async runtime.
async fn find_match(state: &ServerState, req: &PinCheckRequest) -> AppResult<Option<User>> {
    let candidates = match req.user_id {
        Some(id) => user::find_by_id(&state.db, id)
            .await?
            .filter(|u| u.is_active)
            .into_iter()
            .collect(),
        None => user::find_active_admins(&state.db).await?,
    };
    if candidates.is_empty() || req.pin.is_empty() {
        return Ok(None);
    }

    let pin = req.pin.clone();
    tokio::task::spawn_blocking(move || {
        candidates
            .into_iter()
            .find(|candidate| verify_pin(&pin, &candidate.pin_hash))
    })
    .await
    .map_err(|e| AppError::internal(format!("PIN verification task failed: {e}")))
}

#[cfg(test)]
mod tests {
    use crate::api::testing::TestApp;
    use crate::audit::AuditAction;
    use crate::auth::pin::hash_pin;
    use crate::db::repository::user;
    use http::StatusCode;
    use serde_json::json;
    use shared::models::UserRole;

    async fn seed(app: &TestApp) -> (i64, i64) {
        let admin = user::create(&app.state.db, "Marta", UserRole::Admin, &hash_pin("4321").unwrap())
            .await
            .unwrap();
        let waiter = user::create(&app.state.db, "Pablo", UserRole::Mozo, &hash_pin("1111").unwrap())
            .await
            .unwrap();
        (admin.id, waiter.id)
    }

    #[tokio::test]
    async fn admin_pin_without_user_id_issues_token() {
        let mut app = TestApp::new().await;
        let (admin_id, _) = seed(&app).await;

        let (status, body) = app
            .send("POST", "/api/auth/pin-check", None, Some(json!({ "pin": "4321" })))
            .await;
        assert_eq!(status, StatusCode::OK, "{body}");
        assert_eq!(body["user"]["id"], admin_id);
        assert_eq!(body["user"]["role"], "admin");
        assert!(body["user"].get("pin_hash").is_none());
        assert_eq!(body["expires_in"], 720 * 60);

        let claims = app.state.jwt.validate_token(body["token"].as_str().unwrap()).unwrap();
        assert_eq!(claims.sub, admin_id.to_string());

        let audited = app.audited();
        assert_eq!(audited[0].action, AuditAction::PinCheckSuccess);
        assert_eq!(audited[0].user_name.as_deref(), Some("Marta"));
    }

    #[tokio::test]
    async fn waiter_pin_with_user_id() {
        let app = TestApp::new().await;
        let (_, waiter_id) = seed(&app).await;

        let (status, body) = app
            .send(
                "POST",
                "/api/auth/pin-check",
                None,
                Some(json!({ "user_id": waiter_id, "pin": "1111" })),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["user"]["role"], "mozo");

        // a waiter PIN is not an admin PIN
        let (status, _) = app
            .send("POST", "/api/auth/pin-check", None, Some(json!({ "pin": "1111" })))
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn failures_are_uniform_and_delayed() {
        let mut app = TestApp::new().await;
        let (_, waiter_id) = seed(&app).await;
        user::deactivate(&app.state.db, waiter_id).await.unwrap();

        let cases = [
            json!({ "pin": "0000" }),
            json!({ "user_id": 999, "pin": "1111" }),
            json!({ "user_id": waiter_id, "pin": "1111" }),
        ];
        for case in cases {
            let started = std::time::Instant::now();
            let (status, body) = app.send("POST", "/api/auth/pin-check", None, Some(case)).await;
            assert!(started.elapsed() >= std::time::Duration::from_millis(500));
            assert_eq!(status, StatusCode::UNAUTHORIZED);
            assert_eq!(body["code"], 1002);
            assert_eq!(body["message"], "Invalid credentials");
        }

        let audited = app.audited();
        assert_eq!(audited.len(), 3);
        assert!(audited.iter().all(|e| e.action == AuditAction::PinCheckFailed));
    }

    #[tokio::test]
    async fn rate_limited_after_threshold() {
        let mut app = TestApp::new().await;
        let mut config = (*app.state.config).clone();
        config.pin_rate_limit = 2;
        app.state.config = std::sync::Arc::new(config);
        app.app = crate::services::build_app(app.state.clone());

        for _ in 0..2 {
            let (status, _) = app
                .send("POST", "/api/auth/pin-check", None, Some(json!({ "pin": "9999" })))
                .await;
            assert_eq!(status, StatusCode::UNAUTHORIZED);
        }
        let (status, body) = app
            .send("POST", "/api/auth/pin-check", None, Some(json!({ "pin": "9999" })))
            .await;
        assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(body["code"], 1008);
        assert!(body["details"]["retry_after"].as_u64().unwrap() > 0);
    }
}
