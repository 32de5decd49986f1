//! API router composition.

pub mod auth;
pub mod error;

use axum::Router;
use std::sync::Arc;

use crate::db::Database;
use crate::jwt::JwtConfig;
use crate::rate_limit::RateLimitConfig;

pub use auth::AuthState;

/// Build the `/api` router.
pub fn create_api_router(
    db: Database,
    jwt: Arc<JwtConfig>,
    secure_cookies: bool,
    cookie_domain: Option<String>,
) -> Router {
    let limits = Arc::new(RateLimitConfig::new());
    let auth_state = AuthState {
        db,
        jwt,
        secure_cookies,
        cookie_domain,
    };

    Router::new().nest("/auth", auth::router(auth_state, limits))
}
