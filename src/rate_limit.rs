//! Rate limiting for authentication endpoints.
//!
//! Token bucket with per-IP tracking to slow brute-force and signup spam.

use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use governor::{Quota, RateLimiter, clock::DefaultClock, state::keyed::DefaultKeyedStateStore};
use std::{num::NonZeroU32, sync::Arc};

/// Per-IP keyed limiter.
pub type IpLimiter = RateLimiter<String, DefaultKeyedStateStore<String>, DefaultClock>;

/// Limiters for the two credential-bearing endpoints.
#[derive(Clone)]
pub struct RateLimitConfig {
    /// Login: 5 per second per IP, burst of 20
    pub login: Arc<IpLimiter>,
    /// Registration: 10 per minute per IP
    pub register: Arc<IpLimiter>,
}

impl RateLimitConfig {
    pub fn new() -> Self {
        Self {
            login: Arc::new(RateLimiter::keyed(
                Quota::per_second(NonZeroU32::new(5).unwrap())
                    .allow_burst(NonZeroU32::new(20).unwrap()),
            )),
            register: Arc::new(RateLimiter::keyed(Quota::per_minute(
                NonZeroU32::new(10).unwrap(),
            ))),
        }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Client key for rate limiting: first hop of X-Forwarded-For when present,
/// otherwise the socket address, otherwise a shared local bucket.
fn client_key(request: &Request) -> String {
    if let Some(forwarded_for) = request.headers().get("x-forwarded-for") {
        if let Ok(value) = forwarded_for.to_str() {
            if let Some(first) = value.split(',').next() {
                let ip = first.trim();
                if !ip.is_empty() {
                    return ip.to_string();
                }
            }
        }
    }

    request
        .extensions()
        .get::<axum::extract::ConnectInfo<std::net::SocketAddr>>()
        .map(|ci| ci.0.ip().to_string())
        .unwrap_or_else(|| "local".to_string())
}

/// Middleware for rate limiting login attempts.
pub async fn rate_limit_login(
    State(config): State<Arc<RateLimitConfig>>,
    request: Request,
    next: Next,
) -> Response {
    match config.login.check_key(&client_key(&request)) {
        Ok(_) => next.run(request).await,
        Err(_) => (
            StatusCode::TOO_MANY_REQUESTS,
            "Too many login attempts. Please wait before trying again.",
        )
            .into_response(),
    }
}

/// Middleware for rate limiting registration.
pub async fn rate_limit_register(
    State(config): State<Arc<RateLimitConfig>>,
    request: Request,
    next: Next,
) -> Response {
    match config.register.check_key(&client_key(&request)) {
        Ok(_) => next.run(request).await,
        Err(_) => (
            StatusCode::TOO_MANY_REQUESTS,
            "Too many signup attempts. Please wait before trying again.",
        )
            .into_response(),
    }
}
