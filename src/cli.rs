//! CLI argument parsing, validation, and startup helpers.

use crate::ServerConfig;
use crate::db::Database;
use crate::jwt::{ACCESS_TOKEN_DURATION_SECS, REFRESH_TOKEN_DURATION_SECS};
use clap::Parser;
use tracing::{error, info};

const MIN_SECRET_LENGTH: usize = 32;

#[derive(clap::ValueEnum, Clone, Debug, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
    Compact,
}

#[derive(Parser, Debug, Clone)]
#[command(
    name = "LodgeKey",
    about = "Authentication backend for the LodgeKey property-management suite"
)]
pub struct Args {
    /// Port to listen on
    #[arg(short, long, default_value = "7410")]
    pub port: u16,

    /// Path to SQLite database file
    #[arg(short, long, default_value = "lodgekey.db")]
    pub database: String,

    /// Secret for signing access tokens
    #[arg(long, env = "ACCESS_TOKEN_SECRET", hide_env_values = true)]
    pub access_token_secret: Option<String>,

    /// Secret for signing refresh tokens (must differ from the access secret)
    #[arg(long, env = "REFRESH_TOKEN_SECRET", hide_env_values = true)]
    pub refresh_token_secret: Option<String>,

    /// Access token lifetime in seconds
    #[arg(long, env = "ACCESS_TOKEN_TTL_SECS", default_value_t = ACCESS_TOKEN_DURATION_SECS)]
    pub access_ttl_secs: u64,

    /// Refresh token lifetime in seconds
    #[arg(long, env = "REFRESH_TOKEN_TTL_SECS", default_value_t = REFRESH_TOKEN_DURATION_SECS)]
    pub refresh_ttl_secs: u64,

    /// Set the Secure flag on session cookies (use behind HTTPS)
    #[arg(long, env = "COOKIE_SECURE")]
    pub secure_cookies: bool,

    /// Domain attribute for session cookies
    #[arg(long, env = "COOKIE_DOMAIN")]
    pub cookie_domain: Option<String>,

    /// Log output format
    #[arg(short, long, default_value = "pretty")]
    pub log_format: LogFormat,
}

/// Initialize logging based on the specified format.
pub fn init_logging(format: &LogFormat) {
    match format {
        LogFormat::Pretty => tracing_subscriber::fmt::init(),
        LogFormat::Json => tracing_subscriber::fmt().json().init(),
        LogFormat::Compact => tracing_subscriber::fmt().compact().init(),
    }
}

/// Load and validate the two signing secrets.
///
/// A missing or weak secret is a deployment error: the caller is expected
/// to refuse to start, not to limp along with a default.
pub fn load_secrets(args: &Args) -> Option<(Vec<u8>, Vec<u8>)> {
    let Some(access) = args.access_token_secret.as_deref() else {
        error!("Access token secret is required. Set ACCESS_TOKEN_SECRET or --access-token-secret");
        return None;
    };
    let Some(refresh) = args.refresh_token_secret.as_deref() else {
        error!(
            "Refresh token secret is required. Set REFRESH_TOKEN_SECRET or --refresh-token-secret"
        );
        return None;
    };

    if access.len() < MIN_SECRET_LENGTH || refresh.len() < MIN_SECRET_LENGTH {
        error!(
            "Token secrets must be at least {} characters. Use longer secrets",
            MIN_SECRET_LENGTH
        );
        return None;
    }

    if access == refresh {
        error!("Access and refresh token secrets must differ");
        return None;
    }

    Some((access.as_bytes().to_vec(), refresh.as_bytes().to_vec()))
}

/// Open the database, logging errors if it fails.
pub async fn open_database(path: &str) -> Option<Database> {
    match Database::open(path).await {
        Ok(db) => {
            info!(path = %path, "Database opened");
            Some(db)
        }
        Err(e) => {
            error!(path = %path, error = %e, "Failed to open database");
            None
        }
    }
}

/// Build ServerConfig from validated arguments.
pub fn build_config(
    args: Args,
    db: Database,
    access_secret: Vec<u8>,
    refresh_secret: Vec<u8>,
) -> ServerConfig {
    ServerConfig {
        db,
        access_secret,
        refresh_secret,
        access_ttl_secs: args.access_ttl_secs,
        refresh_ttl_secs: args.refresh_ttl_secs,
        secure_cookies: args.secure_cookies,
        cookie_domain: args.cookie_domain,
    }
}
