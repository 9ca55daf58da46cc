//! Authentication middleware
//!
//! [`authenticate`] runs on every request and attaches a [`CurrentUser`] when a
//! valid bearer token is present. [`require_admin`] guards the admin route groups.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use crate::auth::{CurrentUser, JwtError, JwtService};
use crate::core::ServerState;
use crate::security_log;
use crate::utils::{AppError, ErrorCode};

/// Resolve the bearer token, if any, into a [`CurrentUser`] request extension.
///
/// | Request | Result |
/// |---------|--------|
/// | no `Authorization` header | passes through anonymously |
/// | valid token | passes through with `CurrentUser` |
/// | malformed or invalid token | 401 `TokenInvalid` |
/// | expired token | 401 `TokenExpired` |
pub async fn authenticate(
    State(state): State<ServerState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let Some(header) = req
        .headers()
        .get(http::header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
    else {
        return Ok(next.run(req).await);
    };

    let token = JwtService::extract_from_header(header)
        .ok_or_else(|| AppError::invalid_token("Invalid authorization header"))?;

    match state.jwt.validate_token(token).and_then(CurrentUser::try_from) {
        Ok(user) => {
            req.extensions_mut().insert(user);
            Ok(next.run(req).await)
        }
        Err(e) => {
            security_log!(WARN, "auth_failed", error = %e, uri = %req.uri());
            match e {
                JwtError::ExpiredToken => Err(AppError::token_expired()),
                _ => Err(AppError::invalid_token("Invalid token")),
            }
        }
    }
}

/// 401 without a user, 403 for non-admin roles
pub async fn require_admin(req: Request, next: Next) -> Result<Response, AppError> {
    let Some(user) = req.extensions().get::<CurrentUser>() else {
        security_log!(WARN, "auth_missing", method = %req.method(), uri = %req.uri());
        return Err(AppError::unauthorized());
    };

    if !user.is_admin() {
        security_log!(
            WARN,
            "admin_denied",
            user_id = user.id,
            user_name = %user.name,
            role = %user.role,
            uri = %req.uri()
        );
        return Err(AppError::new(ErrorCode::AdminRequired));
    }

    Ok(next.run(req).await)
}
