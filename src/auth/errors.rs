//! Authentication error types.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

/// Why an inbound request failed authentication.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthErrorKind {
    NotAuthenticated,
    InvalidOrExpiredToken,
}

/// API authentication error. All kinds collapse to a non-specific 401 so
/// the response never reveals which check failed.
#[derive(Debug)]
pub struct ApiAuthError(pub AuthErrorKind);

#[derive(Serialize)]
struct ErrorBody {
    message: &'static str,
}

impl IntoResponse for ApiAuthError {
    fn into_response(self) -> Response {
        (
            StatusCode::UNAUTHORIZED,
            Json(ErrorBody {
                message: "Invalid or expired token",
            }),
        )
            .into_response()
    }
}
