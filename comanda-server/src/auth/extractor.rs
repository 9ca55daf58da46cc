//! Request extractors for the caller identity and address

use std::convert::Infallible;
use std::net::SocketAddr;

use axum::extract::{ConnectInfo, FromRequestParts};
use axum::http::request::Parts;

use crate::auth::CurrentUser;
use crate::auth::rate_limit::client_ip;
use crate::core::ServerState;
use crate::utils::AppError;

/// Required caller. Only usable behind [`authenticate`](super::authenticate).
impl<S: Send + Sync> FromRequestParts<S> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentUser>()
            .cloned()
            .ok_or_else(AppError::unauthorized)
    }
}

/// Caller when a token was sent, `None` for anonymous staff requests
#[derive(Debug, Clone, Default)]
pub struct Operator(pub Option<CurrentUser>);

impl Operator {
    pub fn user(&self) -> Option<&CurrentUser> {
        self.0.as_ref()
    }

    pub fn name(&self) -> Option<&str> {
        self.0.as_ref().map(|u| u.name.as_str())
    }
}

impl<S: Send + Sync> FromRequestParts<S> for Operator {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Operator(parts.extensions.get::<CurrentUser>().cloned()))
    }
}

/// Client address for audit entries, resolved like the PIN rate limit key
#[derive(Debug, Clone)]
pub struct ClientIp(pub String);

impl FromRequestParts<ServerState> for ClientIp {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &ServerState,
    ) -> Result<Self, Self::Rejection> {
        let peer = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ci| ci.0);
        Ok(ClientIp(client_ip(&parts.headers, peer, state.config.trusted_proxy)))
    }
}
