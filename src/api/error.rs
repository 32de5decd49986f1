//! Shared error handling for API endpoints.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use tracing::error;

/// Extension trait for concise error mapping on Results.
pub trait ResultExt<T> {
    fn db_err(self, msg: &str) -> Result<T, ApiError>;
}

impl<T, E: std::fmt::Display> ResultExt<T> for Result<T, E> {
    fn db_err(self, msg: &str) -> Result<T, ApiError> {
        self.map_err(|e| ApiError::db_error(msg, e))
    }
}

/// API error taxonomy. Every authentication failure maps to 401 with a
/// non-specific message so responses never reveal which check failed.
pub enum ApiError {
    /// Malformed input; carries the first validation message.
    Validation(String),
    /// Unknown email and wrong password return the same generic message to
    /// avoid user enumeration.
    InvalidCredentials,
    EmailInUse,
    /// Bad signature and expiry collapse to one message.
    InvalidOrExpiredToken,
    /// Replay/reuse detection: a syntactically valid token that is no
    /// longer the live one in its chain.
    TokenNotFoundOrRevoked,
    /// The subject of a valid token no longer exists.
    UserNotFound,
    Internal(String),
}

impl ApiError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn db_error(context: &str, e: impl std::fmt::Display) -> Self {
        error!("{}: {}", context, e);
        Self::Internal("Database error".into())
    }

    pub fn internal(context: &str, e: impl std::fmt::Display) -> Self {
        error!("{}: {}", context, e);
        Self::Internal(context.into())
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Validation(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::InvalidCredentials => {
                (StatusCode::UNAUTHORIZED, "Invalid credentials".into())
            }
            ApiError::EmailInUse => (StatusCode::CONFLICT, "Email already in use".into()),
            ApiError::InvalidOrExpiredToken => {
                (StatusCode::UNAUTHORIZED, "Invalid or expired token".into())
            }
            ApiError::TokenNotFoundOrRevoked => {
                (StatusCode::UNAUTHORIZED, "Token not found or revoked".into())
            }
            ApiError::UserNotFound => (StatusCode::UNAUTHORIZED, "User not found".into()),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };
        (status, Json(ErrorResponse { message })).into_response()
    }
}
