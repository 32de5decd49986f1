//! Tests for the route guard fronting the page routes.

mod common;

use axum::{
    body::Body,
    http::{Request, StatusCode, header},
};
use common::*;
use jsonwebtoken::{EncodingKey, Header};
use lodgekey::db::UserRole;
use lodgekey::jwt::AccessClaims;
use std::time::{SystemTime, UNIX_EPOCH};
use tower::ServiceExt;

async fn get_page(app: &axum::Router, path: &str, access_token: Option<&str>) -> axum::http::Response<Body> {
    let mut builder = Request::builder().uri(path);
    if let Some(token) = access_token {
        builder = builder.header(header::COOKIE, format!("access_token={}", token));
    }
    let request = builder.body(Body::empty()).unwrap();
    app.clone().oneshot(request).await.unwrap()
}

fn location(response: &axum::http::Response<Body>) -> &str {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
}

/// An access token whose exp is already in the past.
fn expired_access_token() -> String {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs();
    let claims = AccessClaims {
        sub: "uuid-expired".to_string(),
        name: "Expired".to_string(),
        email: "expired@example.com".to_string(),
        role: UserRole::Tenant,
        iat: now - 100,
        exp: now - 50,
    };
    jsonwebtoken::encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(ACCESS_SECRET),
    )
    .unwrap()
}

#[tokio::test]
async fn test_protected_page_redirects_unauthenticated() {
    let (app, _db, _jwt) = create_test_app().await;

    for path in ["/dashboard", "/properties", "/properties/42/units", "/accounting"] {
        let response = get_page(&app, path, None).await;
        assert_eq!(
            response.status(),
            StatusCode::TEMPORARY_REDIRECT,
            "{} should redirect without a session",
            path
        );
        assert_eq!(location(&response), "/");
    }
}

#[tokio::test]
async fn test_protected_page_with_valid_token() {
    let (app, _db, jwt) = create_test_app().await;
    let token = jwt
        .sign_access_token("uuid-1", "Ada", "ada@example.com", UserRole::Landlord)
        .unwrap();

    let response = get_page(&app, "/dashboard", Some(&token.token)).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_protected_page_with_garbage_token() {
    let (app, _db, _jwt) = create_test_app().await;

    let response = get_page(&app, "/dashboard", Some("not.a.jwt")).await;
    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(location(&response), "/");
}

#[tokio::test]
async fn test_protected_page_with_expired_token() {
    let (app, _db, _jwt) = create_test_app().await;

    // The guard never refreshes; an expired token is as good as none.
    let response = get_page(&app, "/dashboard", Some(&expired_access_token())).await;
    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(location(&response), "/");
}

#[tokio::test]
async fn test_landing_redirects_authenticated() {
    let (app, _db, jwt) = create_test_app().await;
    let token = jwt
        .sign_access_token("uuid-1", "Ada", "ada@example.com", UserRole::Tenant)
        .unwrap();

    let response = get_page(&app, "/", Some(&token.token)).await;
    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(location(&response), "/dashboard");
}

#[tokio::test]
async fn test_landing_serves_unauthenticated() {
    let (app, _db, _jwt) = create_test_app().await;

    let response = get_page(&app, "/", None).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_auth_endpoints_not_redirected() {
    let (app, _db, _jwt) = create_test_app().await;

    // Guard passes auth endpoints through; they answer for themselves.
    let request = Request::builder()
        .uri("/api/auth/me")
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_prefix_match_is_segment_aware() {
    let (app, _db, _jwt) = create_test_app().await;

    // "/dashboards" is not under "/dashboard"; with no route it is a plain 404.
    let response = get_page(&app, "/dashboards", None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
