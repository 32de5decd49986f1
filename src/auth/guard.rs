//! Route guard: coarse perimeter check ahead of every page request.
//!
//! Proves only that a currently valid access token exists. Endpoint-level
//! authorization (role checks, ownership checks) is each endpoint's own
//! concern, and the guard never attempts a refresh; recovering an expired
//! session is client-driven.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};

use super::cookie::{ACCESS_COOKIE_NAME, get_cookie};
use crate::jwt::JwtConfig;

/// Path prefixes that require a valid access token.
pub const PROTECTED_PREFIXES: &[&str] = &[
    "/dashboard",
    "/profile",
    "/admin",
    "/properties",
    "/occupancy",
    "/utilities",
    "/agreement",
    "/tenant",
    "/accounting",
];

/// Public landing route unauthenticated requests are sent to.
pub const LANDING_PATH: &str = "/";

/// Where an authenticated request to the bare root is forwarded.
pub const DASHBOARD_PATH: &str = "/dashboard";

/// Prefix for auth endpoints, always passed through untouched.
const AUTH_PATH_PREFIX: &str = "/api/auth";

#[derive(Clone)]
pub struct GuardState {
    pub jwt: Arc<JwtConfig>,
}

fn is_protected(path: &str) -> bool {
    PROTECTED_PREFIXES.iter().any(|prefix| {
        path.strip_prefix(prefix)
            .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
    })
}

/// Middleware run ahead of every page request.
pub async fn route_guard(
    State(state): State<GuardState>,
    request: Request,
    next: Next,
) -> Response {
    let path = request.uri().path();

    if path.starts_with(AUTH_PATH_PREFIX) {
        return next.run(request).await;
    }

    let authenticated = get_cookie(request.headers(), ACCESS_COOKIE_NAME)
        .is_some_and(|token| state.jwt.verify_access_token(token).is_ok());

    if is_protected(path) && !authenticated {
        return Redirect::temporary(LANDING_PATH).into_response();
    }

    if path == LANDING_PATH && authenticated {
        return Redirect::temporary(DASHBOARD_PATH).into_response();
    }

    next.run(request).await
}
