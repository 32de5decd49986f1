//! Tests for the client-side session manager driving the session protocol
//! against the real router.

mod common;

use axum::http::{Method, StatusCode};
use common::*;
use lodgekey::client::SessionClient;
use std::time::Duration;

#[tokio::test]
async fn test_login_establishes_session() {
    let (app, _db, _jwt) = create_test_app().await;
    register_default(&app).await;

    let mut client = SessionClient::new(app);
    let status = client.login(TEST_EMAIL, TEST_PASSWORD).await;

    assert_eq!(status, StatusCode::OK);
    assert!(client.access_token().is_some());
    assert_eq!(client.user().map(|u| u.email.as_str()), Some(TEST_EMAIL));
}

#[tokio::test]
async fn test_login_failure_leaves_no_session() {
    let (app, _db, _jwt) = create_test_app().await;
    register_default(&app).await;

    let mut client = SessionClient::new(app);
    let status = client.login(TEST_EMAIL, "wrong password").await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(client.access_token().is_none());
    assert!(client.user().is_none());
}

#[tokio::test]
async fn test_authorized_request() {
    let (app, _db, _jwt) = create_test_app().await;
    register_default(&app).await;

    let mut client = SessionClient::new(app);
    client.login(TEST_EMAIL, TEST_PASSWORD).await;

    let response = client.send(Method::GET, "/api/auth/me", None).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["email"], TEST_EMAIL);
}

#[tokio::test]
async fn test_expired_access_token_recovered_transparently() {
    // One-second access tokens so the session goes stale mid-test.
    let (app, _db, _jwt) = create_test_app_with_ttls(1, 3600).await;
    register_default(&app).await;

    let mut client = SessionClient::new(app);
    client.login(TEST_EMAIL, TEST_PASSWORD).await;
    let old_token = client.access_token().unwrap().to_string();

    tokio::time::sleep(Duration::from_secs(2)).await;

    // The stale token draws a 401; the client refreshes once and retries.
    let response = client.send(Method::GET, "/api/auth/me", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_ne!(
        client.access_token(),
        Some(old_token.as_str()),
        "Recovery must have minted a new access token"
    );
}

#[tokio::test]
async fn test_failed_refresh_returns_original_401() {
    let (app, db, _jwt) = create_test_app_with_ttls(1, 3600).await;
    register_default(&app).await;

    let mut client = SessionClient::new(app);
    client.login(TEST_EMAIL, TEST_PASSWORD).await;

    // Revoke every live refresh token behind the client's back.
    let user = db.users().get_by_email(TEST_EMAIL).await.unwrap().unwrap();
    for record in db.tokens().list_active_by_user(user.id).await.unwrap() {
        assert!(db.tokens().revoke(&record.token).await.unwrap());
    }

    tokio::time::sleep(Duration::from_secs(2)).await;

    let response = client.send(Method::GET, "/api/auth/me", None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(response).await;
    assert_eq!(body["message"], "Invalid or expired token");
}

#[tokio::test]
async fn test_unauthenticated_send_stays_401() {
    let (app, _db, _jwt) = create_test_app().await;

    // No session at all: the refresh attempt fails and the original
    // 401 comes back, no retry loop.
    let mut client = SessionClient::new(app);
    let response = client.send(Method::GET, "/api/auth/me", None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_malformed_path_answered_locally() {
    let (app, _db, _jwt) = create_test_app().await;

    // A path that is not a valid URI never reaches the server.
    let mut client = SessionClient::new(app);
    let response = client.send(Method::GET, "/bad path", None).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_reload_recovers_via_refresh_cookie() {
    let (app, _db, _jwt) = create_test_app().await;
    register_default(&app).await;

    let mut client = SessionClient::new(app);
    client.login(TEST_EMAIL, TEST_PASSWORD).await;

    // In-memory token is gone after a reload; the refresh cookie survives.
    client.reload();
    assert!(client.access_token().is_none());

    assert!(client.try_refresh().await);
    assert!(client.access_token().is_some());

    let response = client.send(Method::GET, "/api/auth/me", None).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_logout_ends_session() {
    let (app, _db, _jwt) = create_test_app().await;
    register_default(&app).await;

    let mut client = SessionClient::new(app);
    client.login(TEST_EMAIL, TEST_PASSWORD).await;

    let status = client.logout().await;
    assert_eq!(status, StatusCode::OK);
    assert!(client.access_token().is_none());
    assert!(client.user().is_none());

    // The cleared, revoked refresh cookie cannot reopen the session.
    assert!(!client.try_refresh().await);
}
