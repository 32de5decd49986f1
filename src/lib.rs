pub mod api;
pub mod auth;
pub mod cleanup;
pub mod cli;
pub mod client;
pub mod db;
pub mod jwt;
pub mod pages;
pub mod password;
pub mod rate_limit;

use auth::{GuardState, route_guard};
use axum::{Router, middleware};
use db::Database;
use jwt::JwtConfig;
use std::sync::Arc;
use tokio::net::TcpListener;

pub struct ServerConfig {
    /// Database connection (cloneable, uses connection pool internally)
    pub db: Database,
    /// Secret for signing access tokens
    pub access_secret: Vec<u8>,
    /// Secret for signing refresh tokens (distinct from the access secret)
    pub refresh_secret: Vec<u8>,
    /// Access token lifetime in seconds
    pub access_ttl_secs: u64,
    /// Refresh token lifetime in seconds
    pub refresh_ttl_secs: u64,
    /// Whether to set the Secure flag on cookies (true behind HTTPS)
    pub secure_cookies: bool,
    /// Optional Domain attribute for session cookies
    pub cookie_domain: Option<String>,
}

/// Create the application router with the given configuration.
pub fn create_app(config: &ServerConfig) -> Router {
    let jwt = Arc::new(JwtConfig::with_lifetimes(
        &config.access_secret,
        &config.refresh_secret,
        config.access_ttl_secs,
        config.refresh_ttl_secs,
    ));

    let api_router = api::create_api_router(
        config.db.clone(),
        jwt.clone(),
        config.secure_cookies,
        config.cookie_domain.clone(),
    );

    let page_routes = pages::router().layer(middleware::from_fn_with_state(
        GuardState { jwt },
        route_guard,
    ));

    Router::new().nest("/api", api_router).merge(page_routes)
}

/// Run cleanup on startup and spawn the background scheduler.
/// Call this before starting the server.
pub async fn init_cleanup(db: &Database) {
    cleanup::run_cleanup(db).await;
    cleanup::spawn_cleanup_scheduler(db.clone());
}

/// Run the server on the given listener. Blocks until the server exits.
pub async fn run_server(config: ServerConfig, listener: TcpListener) -> Result<(), std::io::Error> {
    let app = create_app(&config);
    axum::serve(listener, app).await
}
