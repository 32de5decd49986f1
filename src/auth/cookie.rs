//! Typed cookie handling for the session protocol.
//!
//! All cookie reads and writes go through this module; call sites never
//! assemble or split cookie strings themselves.

use axum::http::{HeaderMap, header};

/// Cookie name for the access token (short-lived).
pub const ACCESS_COOKIE_NAME: &str = "access_token";

/// Cookie name for the refresh token (long-lived).
pub const REFRESH_COOKIE_NAME: &str = "refresh_token";

/// The refresh cookie is scoped to the refresh endpoint only.
pub const REFRESH_COOKIE_PATH: &str = "/api/auth/refresh";

/// Extract a cookie value from the Cookie header.
pub fn get_cookie<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    let cookie_header = headers.get(header::COOKIE)?.to_str().ok()?;
    cookie_header.split(';').find_map(|part| {
        let (key, value) = part.split_once('=')?;
        (key.trim() == name).then_some(value.trim())
    })
}

/// Builder for a Set-Cookie header. Always HttpOnly and SameSite=Lax; the
/// refresh cookie's CSRF surface is already narrowed by its Path scope.
#[derive(Debug, Clone)]
pub struct SetCookie {
    name: &'static str,
    value: String,
    path: &'static str,
    max_age: u64,
    secure: bool,
    domain: Option<String>,
}

impl SetCookie {
    pub fn new(name: &'static str, value: impl Into<String>) -> Self {
        Self {
            name,
            value: value.into(),
            path: "/",
            max_age: 0,
            secure: false,
            domain: None,
        }
    }

    /// A cookie that expires immediately, clearing any stored value.
    pub fn clear(name: &'static str) -> Self {
        Self::new(name, "")
    }

    pub fn path(mut self, path: &'static str) -> Self {
        self.path = path;
        self
    }

    pub fn max_age(mut self, secs: u64) -> Self {
        self.max_age = secs;
        self
    }

    pub fn secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }

    pub fn domain(mut self, domain: Option<&str>) -> Self {
        self.domain = domain.map(|d| d.to_string());
        self
    }

    pub fn to_header_string(&self) -> String {
        let mut s = format!(
            "{}={}; HttpOnly; SameSite=Lax; Path={}; Max-Age={}",
            self.name, self.value, self.path, self.max_age
        );
        if let Some(domain) = &self.domain {
            s.push_str("; Domain=");
            s.push_str(domain);
        }
        if self.secure {
            s.push_str("; Secure");
        }
        s
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_get_cookie_simple() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("access_token=abc123"),
        );

        assert_eq!(get_cookie(&headers, "access_token"), Some("abc123"));
    }

    #[test]
    fn test_get_cookie_multiple() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("foo=bar; access_token=abc123; refresh_token=xyz789"),
        );

        assert_eq!(get_cookie(&headers, "access_token"), Some("abc123"));
        assert_eq!(get_cookie(&headers, "refresh_token"), Some("xyz789"));
        assert_eq!(get_cookie(&headers, "foo"), Some("bar"));
    }

    #[test]
    fn test_get_cookie_not_found() {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_static("foo=bar"));

        assert_eq!(get_cookie(&headers, "access_token"), None);
        assert_eq!(get_cookie(&HeaderMap::new(), "access_token"), None);
    }

    #[test]
    fn test_get_cookie_with_spaces() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("  access_token = abc123  ; foo=bar"),
        );

        assert_eq!(get_cookie(&headers, "access_token"), Some("abc123"));
    }

    #[test]
    fn test_set_cookie_defaults() {
        let cookie = SetCookie::new(ACCESS_COOKIE_NAME, "tok").max_age(900);
        assert_eq!(
            cookie.to_header_string(),
            "access_token=tok; HttpOnly; SameSite=Lax; Path=/; Max-Age=900"
        );
    }

    #[test]
    fn test_set_cookie_scoped_secure() {
        let cookie = SetCookie::new(REFRESH_COOKIE_NAME, "tok")
            .path(REFRESH_COOKIE_PATH)
            .max_age(604800)
            .secure(true)
            .domain(Some("example.com"));
        assert_eq!(
            cookie.to_header_string(),
            "refresh_token=tok; HttpOnly; SameSite=Lax; Path=/api/auth/refresh; Max-Age=604800; Domain=example.com; Secure"
        );
    }

    #[test]
    fn test_clear_cookie_expires_immediately() {
        let cookie = SetCookie::clear(ACCESS_COOKIE_NAME);
        let s = cookie.to_header_string();
        assert!(s.starts_with("access_token=;"));
        assert!(s.contains("Max-Age=0"));
    }
}
