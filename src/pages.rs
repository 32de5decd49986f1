//! Minimal page shells the route guard fronts.
//!
//! The real UI is a separate frontend; these handlers only give the guard
//! something to protect and the redirects somewhere to land.

use axum::{Router, http::Uri, response::Html, routing::get};

use crate::auth::PROTECTED_PREFIXES;

pub fn router() -> Router {
    let mut router = Router::new().route("/", get(landing));
    for prefix in PROTECTED_PREFIXES {
        router = router
            .route(prefix, get(app_shell))
            .route(&format!("{}/{{*path}}", prefix), get(app_shell));
    }
    router
}

async fn landing() -> Html<&'static str> {
    Html("<!doctype html><title>LodgeKey</title><h1>LodgeKey</h1><p>Sign in to manage your properties.</p>")
}

async fn app_shell(uri: Uri) -> Html<String> {
    let section = uri
        .path()
        .trim_start_matches('/')
        .split('/')
        .next()
        .unwrap_or("dashboard");
    Html(format!(
        "<!doctype html><title>LodgeKey</title><main data-section=\"{}\"></main>",
        section
    ))
}
