//! Client-side session manager.
//!
//! Wraps a tower service (an `axum::Router` in tests, an HTTP connector in
//! a real client) and emulates the browser side of the session protocol:
//! a cookie jar, an in-memory access token, and one-shot recovery from
//! access-token expiry. The access token lives only in memory; a fresh
//! `SessionClient` has no token until a refresh call re-establishes one
//! from the refresh cookie.

use std::collections::HashMap;
use std::convert::Infallible;

use axum::body::Body;
use axum::http::{Method, Request, Response, StatusCode, header};
use axum::response::IntoResponse;
use serde::Deserialize;
use tower::{Service, ServiceExt};

use crate::db::PublicUser;

const DEFAULT_AUTH_BASE: &str = "/api/auth";

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SessionBody {
    user: Option<PublicUser>,
    access_token: String,
}

/// Browser-session holder: in-memory access token, user summary, and the
/// cookie jar the server writes into.
pub struct SessionClient<S> {
    inner: S,
    auth_base: String,
    access_token: Option<String>,
    user: Option<PublicUser>,
    cookies: HashMap<String, String>,
}

impl<S> SessionClient<S>
where
    S: Service<Request<Body>, Response = Response<Body>, Error = Infallible> + Clone + Send,
    S::Future: Send,
{
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            auth_base: DEFAULT_AUTH_BASE.to_string(),
            access_token: None,
            user: None,
            cookies: HashMap::new(),
        }
    }

    /// The access token currently held in memory, if any.
    pub fn access_token(&self) -> Option<&str> {
        self.access_token.as_deref()
    }

    /// The authenticated user summary, if a session is established.
    pub fn user(&self) -> Option<&PublicUser> {
        self.user.as_ref()
    }

    /// Send an authorized request. Attaches `Authorization: Bearer` when a
    /// token is held plus all stored cookies. On a 401 response, performs
    /// the refresh flow exactly once and retries the original request once
    /// with the new token; if the refresh fails, the original 401 response
    /// is returned unmodified.
    pub async fn send(
        &mut self,
        method: Method,
        path: &str,
        json_body: Option<serde_json::Value>,
    ) -> Response<Body> {
        let body_bytes = json_body.map(|v| v.to_string().into_bytes());

        let response = self.dispatch(&method, path, body_bytes.clone()).await;
        if response.status() != StatusCode::UNAUTHORIZED {
            return response;
        }

        if !self.try_refresh().await {
            return response;
        }

        self.dispatch(&method, path, body_bytes).await
    }

    /// Log in and establish the in-memory session from the response body.
    pub async fn login(&mut self, email: &str, password: &str) -> StatusCode {
        let body = serde_json::json!({ "email": email, "password": password });
        let path = format!("{}/login", self.auth_base);
        let response = self
            .dispatch(&Method::POST, &path, Some(body.to_string().into_bytes()))
            .await;
        let status = response.status();
        if status == StatusCode::OK {
            self.adopt_session(response).await;
        }
        status
    }

    /// Log out: the server clears the cookies, we drop the in-memory state.
    pub async fn logout(&mut self) -> StatusCode {
        let path = format!("{}/logout", self.auth_base);
        let response = self.dispatch(&Method::POST, &path, None).await;
        self.access_token = None;
        self.user = None;
        response.status()
    }

    /// Simulate a page reload: in-memory state is gone, cookies survive.
    pub fn reload(&mut self) {
        self.access_token = None;
        self.user = None;
    }

    /// Run the refresh flow once. Returns whether a new access token was
    /// obtained.
    pub async fn try_refresh(&mut self) -> bool {
        let path = format!("{}/refresh", self.auth_base);
        let response = self.dispatch(&Method::POST, &path, None).await;
        if response.status() != StatusCode::OK {
            return false;
        }
        self.adopt_session(response).await;
        self.access_token.is_some()
    }

    /// Parse a session-opening response body and store token and user.
    async fn adopt_session(&mut self, response: Response<Body>) {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap_or_default();
        if let Ok(session) = serde_json::from_slice::<SessionBody>(&bytes) {
            self.access_token = Some(session.access_token);
            if session.user.is_some() {
                self.user = session.user;
            }
        }
    }

    /// Perform one request, applying and collecting cookies.
    async fn dispatch(
        &mut self,
        method: &Method,
        path: &str,
        body_bytes: Option<Vec<u8>>,
    ) -> Response<Body> {
        let mut builder = Request::builder().method(method.clone()).uri(path);

        if let Some(token) = &self.access_token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        if !self.cookies.is_empty() {
            let cookie_header = self
                .cookies
                .iter()
                .map(|(k, v)| format!("{}={}", k, v))
                .collect::<Vec<_>>()
                .join("; ");
            builder = builder.header(header::COOKIE, cookie_header);
        }

        let request = match body_bytes {
            Some(bytes) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(bytes)),
            None => builder.body(Body::empty()),
        };
        let request = match request {
            Ok(request) => request,
            // A path that fails URI parsing never reaches the server;
            // answer with a local 400 instead of panicking.
            Err(_) => return StatusCode::BAD_REQUEST.into_response(),
        };

        let response = match self.inner.clone().oneshot(request).await {
            Ok(response) => response,
            Err(e) => match e {},
        };

        self.store_cookies(&response);
        response
    }

    /// Apply Set-Cookie headers to the jar. Max-Age=0 deletes.
    fn store_cookies(&mut self, response: &Response<Body>) {
        for value in response.headers().get_all(header::SET_COOKIE) {
            let Ok(raw) = value.to_str() else { continue };
            let mut parts = raw.split(';');
            let Some((name, cookie_value)) = parts.next().and_then(|p| p.split_once('=')) else {
                continue;
            };
            let name = name.trim().to_string();
            let expired = parts
                .any(|attr| attr.trim().eq_ignore_ascii_case("max-age=0"));
            if expired {
                self.cookies.remove(&name);
            } else {
                self.cookies.insert(name, cookie_value.trim().to_string());
            }
        }
    }
}
