//! Session protocol endpoints.
//!
//! - POST `/login` - Verify credentials, issue an access/refresh pair
//! - POST `/register` - Create an account, then proceed as login
//! - POST `/refresh` - Rotate the refresh token, issue a new access token
//! - POST `/logout` - Best-effort revoke, clear cookies, always succeeds
//! - GET `/me` - Current user for a valid bearer/cookie access token

use axum::{
    Json, Router,
    extract::State,
    http::{HeaderMap, StatusCode, header::SET_COOKIE},
    middleware,
    response::{AppendHeaders, IntoResponse},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::warn;

use super::error::{ApiError, ResultExt};
use crate::auth::{
    ACCESS_COOKIE_NAME, ApiAuth, HasAuthState, REFRESH_COOKIE_NAME, REFRESH_COOKIE_PATH, SetCookie,
    get_cookie,
};
use crate::db::{Database, PublicUser, RotateError, User, UserRole};
use crate::jwt::JwtConfig;
use crate::password;
use crate::rate_limit::{RateLimitConfig, rate_limit_login, rate_limit_register};

#[derive(Clone)]
pub struct AuthState {
    pub db: Database,
    pub jwt: Arc<JwtConfig>,
    pub secure_cookies: bool,
    pub cookie_domain: Option<String>,
}

impl HasAuthState for AuthState {
    fn jwt(&self) -> &JwtConfig {
        &self.jwt
    }
}

pub fn router(state: AuthState, limits: Arc<RateLimitConfig>) -> Router {
    let login_routes = Router::new()
        .route("/login", post(login))
        .layer(middleware::from_fn_with_state(
            limits.clone(),
            rate_limit_login,
        ));

    let register_routes = Router::new()
        .route("/register", post(register))
        .layer(middleware::from_fn_with_state(limits, rate_limit_register));

    Router::new()
        .route("/refresh", post(refresh))
        .route("/logout", post(logout))
        .route("/me", get(me))
        .merge(login_routes)
        .merge(register_routes)
        .with_state(state)
}

#[derive(Deserialize)]
struct LoginRequest {
    email: String,
    password: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RegisterRequest {
    full_name: String,
    email: String,
    phone_number: Option<String>,
    role: UserRole,
    password: String,
    confirm_password: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SessionResponse {
    user: PublicUser,
    access_token: String,
    expires_in: u64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RefreshResponse {
    access_token: String,
    expires_in: u64,
}

#[derive(Serialize)]
struct MessageResponse {
    message: &'static str,
}

/// An issued access/refresh pair plus the Set-Cookie headers carrying it.
struct IssuedSession {
    access_token: String,
    expires_in: u64,
    cookies: AppendHeaders<[(axum::http::HeaderName, String); 2]>,
}

/// Mint a token pair for the user, persist the refresh token in the ledger,
/// and build the two session cookies.
async fn issue_session(state: &AuthState, user: &User) -> Result<IssuedSession, ApiError> {
    let access = state
        .jwt
        .sign_access_token(&user.uuid, &user.full_name, &user.email, user.role)
        .map_err(|e| ApiError::internal("Failed to sign access token", e))?;

    let refresh = state
        .jwt
        .sign_refresh_token(&user.uuid)
        .map_err(|e| ApiError::internal("Failed to sign refresh token", e))?;

    state
        .db
        .tokens()
        .record(&refresh.token, user.id, refresh.expires_at)
        .await
        .db_err("Failed to record refresh token")?;

    Ok(IssuedSession {
        cookies: session_cookies(state, &access.token, access.expires_in, &refresh.token),
        access_token: access.token,
        expires_in: access.expires_in,
    })
}

fn session_cookies(
    state: &AuthState,
    access_token: &str,
    access_expires_in: u64,
    refresh_token: &str,
) -> AppendHeaders<[(axum::http::HeaderName, String); 2]> {
    let access_cookie = SetCookie::new(ACCESS_COOKIE_NAME, access_token)
        .max_age(access_expires_in)
        .secure(state.secure_cookies)
        .domain(state.cookie_domain.as_deref());
    let refresh_cookie = SetCookie::new(REFRESH_COOKIE_NAME, refresh_token)
        .path(REFRESH_COOKIE_PATH)
        .max_age(state.jwt.refresh_ttl_secs())
        .secure(state.secure_cookies)
        .domain(state.cookie_domain.as_deref());

    AppendHeaders([
        (SET_COOKIE, access_cookie.to_header_string()),
        (SET_COOKIE, refresh_cookie.to_header_string()),
    ])
}

fn clear_session_cookies(
    state: &AuthState,
) -> AppendHeaders<[(axum::http::HeaderName, String); 2]> {
    let access_cookie = SetCookie::clear(ACCESS_COOKIE_NAME)
        .secure(state.secure_cookies)
        .domain(state.cookie_domain.as_deref());
    let refresh_cookie = SetCookie::clear(REFRESH_COOKIE_NAME)
        .path(REFRESH_COOKIE_PATH)
        .secure(state.secure_cookies)
        .domain(state.cookie_domain.as_deref());

    AppendHeaders([
        (SET_COOKIE, access_cookie.to_header_string()),
        (SET_COOKIE, refresh_cookie.to_header_string()),
    ])
}

/// Verify credentials and open a session.
async fn login(
    State(state): State<AuthState>,
    Json(body): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if body.email.trim().is_empty() || !body.email.contains('@') {
        return Err(ApiError::validation("A valid email is required"));
    }
    if body.password.is_empty() {
        return Err(ApiError::validation("Password is required"));
    }

    // Unknown email and wrong password take the same path out.
    let user = state
        .db
        .users()
        .get_by_email(&body.email)
        .await
        .db_err("Failed to look up user")?
        .ok_or(ApiError::InvalidCredentials)?;

    let hash = user.password_hash.clone();
    let matches = tokio::task::spawn_blocking(move || password::compare_password(&body.password, &hash))
        .await
        .map_err(|e| ApiError::internal("Password comparison task failed", e))?;
    if !matches {
        return Err(ApiError::InvalidCredentials);
    }

    let session = issue_session(&state, &user).await?;

    Ok((
        StatusCode::OK,
        session.cookies,
        Json(SessionResponse {
            user: PublicUser::from(&user),
            access_token: session.access_token,
            expires_in: session.expires_in,
        }),
    ))
}

/// Create an account, then open a session exactly as login does.
async fn register(
    State(state): State<AuthState>,
    Json(body): Json<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if body.full_name.trim().is_empty() {
        return Err(ApiError::validation("Full name is required"));
    }
    if body.email.trim().is_empty() || !body.email.contains('@') {
        return Err(ApiError::validation("A valid email is required"));
    }
    if body.password.len() < password::MIN_PASSWORD_LENGTH {
        return Err(ApiError::validation(format!(
            "Password must be at least {} characters",
            password::MIN_PASSWORD_LENGTH
        )));
    }
    if body.password != body.confirm_password {
        return Err(ApiError::validation("Passwords do not match"));
    }

    if state
        .db
        .users()
        .email_exists(&body.email)
        .await
        .db_err("Failed to check email")?
    {
        return Err(ApiError::EmailInUse);
    }

    let plain = body.password.clone();
    let password_hash = tokio::task::spawn_blocking(move || password::hash_password(&plain))
        .await
        .map_err(|e| ApiError::internal("Password hashing task failed", e))?
        .map_err(|e| ApiError::internal("Failed to hash password", e))?;

    let uuid = uuid::Uuid::new_v4().to_string();
    let user_id = match state
        .db
        .users()
        .create(
            &uuid,
            body.full_name.trim(),
            &body.email,
            body.phone_number.as_deref(),
            &password_hash,
            body.role,
        )
        .await
    {
        Ok(id) => id,
        // Two concurrent registrations can pass the exists check; the
        // unique constraint decides the winner.
        Err(e) if is_unique_violation(&e) => return Err(ApiError::EmailInUse),
        Err(e) => return Err(ApiError::db_error("Failed to create user", e)),
    };

    let user = state
        .db
        .users()
        .get_by_id(user_id)
        .await
        .db_err("Failed to load new user")?
        .ok_or_else(|| ApiError::Internal("User vanished after insert".into()))?;

    let session = issue_session(&state, &user).await?;

    Ok((
        StatusCode::CREATED,
        session.cookies,
        Json(SessionResponse {
            user: PublicUser::from(&user),
            access_token: session.access_token,
            expires_in: session.expires_in,
        }),
    ))
}

fn is_unique_violation(e: &sqlx::Error) -> bool {
    e.as_database_error()
        .is_some_and(|db| db.is_unique_violation())
}

/// Exchange the refresh cookie for a new access/refresh pair.
///
/// The presented token must verify cryptographically AND still be the live
/// one in its rotation chain. A stolen-then-reused old token fails the
/// ledger check even while its signature and expiry are technically valid.
async fn refresh(
    State(state): State<AuthState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    let old_token = get_cookie(&headers, REFRESH_COOKIE_NAME)
        .ok_or(ApiError::InvalidOrExpiredToken)?
        .to_string();

    let claims = state
        .jwt
        .verify_refresh_token(&old_token)
        .map_err(|_| ApiError::InvalidOrExpiredToken)?;

    let record = state
        .db
        .tokens()
        .lookup(&old_token)
        .await
        .db_err("Failed to look up refresh token")?
        .ok_or(ApiError::TokenNotFoundOrRevoked)?;
    if record.revoked {
        return Err(ApiError::TokenNotFoundOrRevoked);
    }

    let user = state
        .db
        .users()
        .get_by_uuid(&claims.sub)
        .await
        .db_err("Failed to look up user")?
        .ok_or(ApiError::UserNotFound)?;

    let new_refresh = state
        .jwt
        .sign_refresh_token(&user.uuid)
        .map_err(|e| ApiError::internal("Failed to sign refresh token", e))?;
    let new_access = state
        .jwt
        .sign_access_token(&user.uuid, &user.full_name, &user.email, user.role)
        .map_err(|e| ApiError::internal("Failed to sign access token", e))?;

    match state
        .db
        .tokens()
        .rotate(&old_token, &new_refresh.token, user.id, new_refresh.expires_at)
        .await
    {
        Ok(()) => {}
        // Lost the race: another refresh already redeemed this token.
        Err(RotateError::AlreadyRotated) => return Err(ApiError::TokenNotFoundOrRevoked),
        Err(RotateError::Database(e)) => {
            return Err(ApiError::db_error("Failed to rotate refresh token", e));
        }
    }

    Ok((
        StatusCode::OK,
        session_cookies(&state, &new_access.token, new_access.expires_in, &new_refresh.token),
        Json(RefreshResponse {
            access_token: new_access.token,
            expires_in: new_access.expires_in,
        }),
    ))
}

/// Close the session. Always succeeds from the client's perspective; the
/// ledger revoke is best-effort.
async fn logout(State(state): State<AuthState>, headers: HeaderMap) -> impl IntoResponse {
    if let Some(token) = get_cookie(&headers, REFRESH_COOKIE_NAME) {
        if let Err(e) = state.db.tokens().revoke(token).await {
            warn!("Failed to revoke refresh token on logout: {}", e);
        }
    }

    (
        StatusCode::OK,
        clear_session_cookies(&state),
        Json(MessageResponse {
            message: "Logged out",
        }),
    )
}

/// Current user for a valid access token.
async fn me(
    State(state): State<AuthState>,
    ApiAuth(auth): ApiAuth,
) -> Result<impl IntoResponse, ApiError> {
    let user = state
        .db
        .users()
        .get_by_uuid(&auth.claims.sub)
        .await
        .db_err("Failed to look up user")?
        .ok_or(ApiError::UserNotFound)?;

    Ok((StatusCode::OK, Json(PublicUser::from(&user))))
}
