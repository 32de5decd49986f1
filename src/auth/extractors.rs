//! Axum extractors for authenticated API endpoints.

use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts},
};

use super::cookie::{ACCESS_COOKIE_NAME, get_cookie};
use super::errors::{ApiAuthError, AuthErrorKind};
use super::state::HasAuthState;
use crate::jwt::AccessClaims;

/// Authenticated user information extracted from a verified access token.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub claims: AccessClaims,
}

/// Pull the presented access token out of the request: `Authorization:
/// Bearer` takes precedence, the access cookie is the fallback.
fn presented_token<'a>(parts: &'a Parts) -> Option<&'a str> {
    if let Some(value) = parts.headers.get(header::AUTHORIZATION) {
        if let Ok(value) = value.to_str() {
            if let Some(token) = value.strip_prefix("Bearer ") {
                return Some(token.trim());
            }
        }
    }
    get_cookie(&parts.headers, ACCESS_COOKIE_NAME)
}

/// Extractor for API endpoints that require a currently valid access token.
///
/// Verification is stateless (signature + expiry). The extractor never
/// attempts a refresh; recovering from an expired access token is a
/// client-driven action.
pub struct ApiAuth(pub AuthenticatedUser);

impl<S> FromRequestParts<S> for ApiAuth
where
    S: HasAuthState + Send + Sync,
{
    type Rejection = ApiAuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let token =
            presented_token(parts).ok_or(ApiAuthError(AuthErrorKind::NotAuthenticated))?;

        let claims = state
            .jwt()
            .verify_access_token(token)
            .map_err(|_| ApiAuthError(AuthErrorKind::InvalidOrExpiredToken))?;

        Ok(ApiAuth(AuthenticatedUser { claims }))
    }
}
