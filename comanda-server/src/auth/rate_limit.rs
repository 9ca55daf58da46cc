//! Per-IP fixed-window rate limiting for the PIN check

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use axum::extract::{ConnectInfo, Request, State};
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::Response;
use parking_lot::Mutex;
use tokio::time::Instant;

use crate::core::ServerState;
use crate::security_log;
use crate::utils::AppError;

/// Entries idle longer than this are dropped by [`RateLimiter::cleanup`]
const STALE_AFTER: Duration = Duration::from_secs(300);

struct IpEntry {
    count: u32,
    window_start: Instant,
}

#[derive(Clone, Default)]
pub struct RateLimiter {
    /// route name -> (IP -> entry)
    inner: Arc<Mutex<HashMap<&'static str, HashMap<String, IpEntry>>>>,
}

impl std::fmt::Debug for RateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimiter").finish_non_exhaustive()
    }
}

impl RateLimiter {
    pub fn new() -> Self {
        Self::default()
    }

    /// `Err(retry_after_secs)` once `ip` exceeds `max_requests` in the current window
    pub fn check(
        &self,
        route: &'static str,
        ip: &str,
        max_requests: u32,
        window_secs: u64,
    ) -> Result<(), u64> {
        let mut map = self.inner.lock();
        let route_map = map.entry(route).or_default();
        let now = Instant::now();

        let entry = route_map.entry(ip.to_owned()).or_insert_with(|| IpEntry {
            count: 0,
            window_start: now,
        });

        let elapsed = now.duration_since(entry.window_start).as_secs();
        if elapsed >= window_secs {
            entry.count = 0;
            entry.window_start = now;
        }

        entry.count += 1;
        if entry.count <= max_requests {
            Ok(())
        } else {
            Err(window_secs.saturating_sub(now.duration_since(entry.window_start).as_secs()).max(1))
        }
    }

    /// Forget idle IPs
    pub fn cleanup(&self) -> usize {
        let mut map = self.inner.lock();
        let now = Instant::now();
        let mut removed = 0;
        for route_map in map.values_mut() {
            let before = route_map.len();
            route_map.retain(|_, entry| now.duration_since(entry.window_start) < STALE_AFTER);
            removed += before - route_map.len();
        }
        map.retain(|_, route_map| !route_map.is_empty());
        removed
    }
}

/// Client IP used for throttling and audit entries.
///
/// The peer address, unless the peer is `trusted_proxy`; then the last
/// `X-Forwarded-For` entry, which is the one the proxy appended.
pub fn client_ip(
    headers: &HeaderMap,
    peer: Option<SocketAddr>,
    trusted_proxy: Option<IpAddr>,
) -> String {
    let Some(peer) = peer.map(|addr| addr.ip()) else {
        return "unknown".to_owned();
    };
    if trusted_proxy == Some(peer)
        && let Some(forwarded) = headers.get("x-forwarded-for")
        && let Ok(val) = forwarded.to_str()
        && let Some(last) = val.rsplit(',').next()
        && let Ok(ip) = last.trim().parse::<IpAddr>()
    {
        return ip.to_string();
    }
    peer.to_string()
}

fn request_ip(request: &Request, trusted_proxy: Option<IpAddr>) -> String {
    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ci| ci.0);
    client_ip(request.headers(), peer, trusted_proxy)
}

/// PIN check throttle: `PIN_RATE_LIMIT` attempts per `PIN_RATE_WINDOW_SECS` per IP
pub async fn pin_rate_limit(
    State(state): State<ServerState>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let config = &state.config;
    let ip = request_ip(&request, config.trusted_proxy);
    if let Err(retry_after) =
        state
            .rate_limiter
            .check("pin_check", &ip, config.pin_rate_limit, config.pin_rate_window_secs)
    {
        security_log!(WARN, "pin_rate_limited", ip = %ip, retry_after);
        return Err(AppError::too_many_attempts(retry_after));
    }
    Ok(next.run(request).await)
}
