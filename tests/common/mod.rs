#![allow(dead_code)]

use axum::body::Body;
use axum::http::{Request, Response, header};
use lodgekey::jwt::{ACCESS_TOKEN_DURATION_SECS, JwtConfig, REFRESH_TOKEN_DURATION_SECS};
use lodgekey::{ServerConfig, create_app, db::Database};
use tower::ServiceExt;

pub const ACCESS_SECRET: &[u8] = b"test-access-secret-0123456789abcdef";
pub const REFRESH_SECRET: &[u8] = b"test-refresh-secret-0123456789abcdef";

/// Create a test app and return (app, db, jwt_config).
pub async fn create_test_app() -> (axum::Router, Database, JwtConfig) {
    create_test_app_with_ttls(ACCESS_TOKEN_DURATION_SECS, REFRESH_TOKEN_DURATION_SECS).await
}

/// Create a test app with explicit token lifetimes in seconds.
pub async fn create_test_app_with_ttls(
    access_ttl_secs: u64,
    refresh_ttl_secs: u64,
) -> (axum::Router, Database, JwtConfig) {
    let db = Database::open(":memory:")
        .await
        .expect("Failed to open test database");
    let jwt_config =
        JwtConfig::with_lifetimes(ACCESS_SECRET, REFRESH_SECRET, access_ttl_secs, refresh_ttl_secs);
    let config = ServerConfig {
        db: db.clone(),
        access_secret: ACCESS_SECRET.to_vec(),
        refresh_secret: REFRESH_SECRET.to_vec(),
        access_ttl_secs,
        refresh_ttl_secs,
        secure_cookies: false,
        cookie_domain: None,
    };
    (create_app(&config), db, jwt_config)
}

/// Build a POST request with a JSON body.
pub fn json_post(path: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(path)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .expect("Failed to build request")
}

/// Read a response body as JSON.
pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Failed to read body");
    serde_json::from_slice(&bytes).expect("Body is not valid JSON")
}

/// All Set-Cookie header values from a response.
pub fn extract_set_cookies(response: &Response<Body>) -> Vec<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .map(|s| s.to_string())
        .collect()
}

/// The value of a named cookie set by the response, if any.
pub fn extract_cookie_value(response: &Response<Body>, name: &str) -> Option<String> {
    extract_set_cookies(response).into_iter().find_map(|raw| {
        let pair = raw.split(';').next()?.trim().to_string();
        let (n, value) = pair.split_once('=')?;
        (n == name).then(|| value.to_string())
    })
}

/// Whether the response clears the named cookie (Max-Age=0).
pub fn has_cleared_cookie(response: &Response<Body>, name: &str) -> bool {
    extract_set_cookies(response)
        .iter()
        .any(|c| c.starts_with(&format!("{}=", name)) && c.contains("Max-Age=0"))
}

pub const TEST_NAME: &str = "Ada Property";
pub const TEST_EMAIL: &str = "ada@example.com";
pub const TEST_PASSWORD: &str = "correct horse battery";

/// Register a user through the API and return the response.
pub async fn register(
    app: &axum::Router,
    full_name: &str,
    email: &str,
    password: &str,
) -> Response<Body> {
    let body = serde_json::json!({
        "fullName": full_name,
        "email": email,
        "role": "landlord",
        "password": password,
        "confirmPassword": password,
    });
    app.clone()
        .oneshot(json_post("/api/auth/register", body))
        .await
        .expect("Request failed")
}

/// Log in through the API and return the response.
pub async fn login(app: &axum::Router, email: &str, password: &str) -> Response<Body> {
    let body = serde_json::json!({ "email": email, "password": password });
    app.clone()
        .oneshot(json_post("/api/auth/login", body))
        .await
        .expect("Request failed")
}

/// Register the default test user and return (access_token, refresh_token)
/// as set in the session cookies.
pub async fn register_default(app: &axum::Router) -> (String, String) {
    let response = register(app, TEST_NAME, TEST_EMAIL, TEST_PASSWORD).await;
    assert_eq!(response.status(), axum::http::StatusCode::CREATED);
    let access = extract_cookie_value(&response, "access_token").expect("No access cookie");
    let refresh = extract_cookie_value(&response, "refresh_token").expect("No refresh cookie");
    (access, refresh)
}
