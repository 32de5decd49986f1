//! Access and refresh token signing and verification.
//!
//! Dual-token system: short-lived access tokens (15 min, stateless) and
//! long-lived refresh tokens (7 days, ledger-tracked). The two token types
//! are signed with distinct secrets, so compromising one signing key does
//! not let an attacker mint the other token type.

use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, errors::ErrorKind};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::db::UserRole;

/// Access token duration: 15 minutes.
pub const ACCESS_TOKEN_DURATION_SECS: u64 = 15 * 60;

/// Refresh token duration: 7 days.
pub const REFRESH_TOKEN_DURATION_SECS: u64 = 7 * 24 * 60 * 60;

/// JWT claims for access tokens. Stateless: no server-side record exists,
/// validity is proven purely by signature and expiry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessClaims {
    /// Subject (user UUID)
    pub sub: String,
    /// Full name
    pub name: String,
    /// Email address
    pub email: String,
    /// User role
    pub role: UserRole,
    /// Issued at (Unix timestamp)
    pub iat: u64,
    /// Expiration time (Unix timestamp)
    pub exp: u64,
}

/// JWT claims for refresh tokens. Carries only the subject; everything else
/// is re-derived from the user record at redemption time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshClaims {
    /// Subject (user UUID)
    pub sub: String,
    /// Random nonce so two tokens minted for the same user within the same
    /// second still produce distinct strings (the ledger keys on the token
    /// string)
    pub jti: String,
    /// Issued at (Unix timestamp)
    pub iat: u64,
    /// Expiration time (Unix timestamp)
    pub exp: u64,
}

/// Result of signing an access token.
#[derive(Debug, Clone)]
pub struct AccessToken {
    pub token: String,
    /// Token duration in seconds
    pub expires_in: u64,
}

/// Result of signing a refresh token.
#[derive(Debug, Clone)]
pub struct RefreshToken {
    pub token: String,
    /// Issued at timestamp (Unix seconds)
    pub issued_at: u64,
    /// Expiration timestamp (Unix seconds)
    pub expires_at: u64,
    /// Token duration in seconds
    pub expires_in: u64,
}

/// Signing and verification keys plus configured lifetimes.
#[derive(Clone)]
pub struct JwtConfig {
    access_encoding: EncodingKey,
    access_decoding: DecodingKey,
    refresh_encoding: EncodingKey,
    refresh_decoding: DecodingKey,
    access_ttl_secs: u64,
    refresh_ttl_secs: u64,
}

impl JwtConfig {
    /// Create a configuration with the given secrets and default lifetimes.
    pub fn new(access_secret: &[u8], refresh_secret: &[u8]) -> Self {
        Self::with_lifetimes(
            access_secret,
            refresh_secret,
            ACCESS_TOKEN_DURATION_SECS,
            REFRESH_TOKEN_DURATION_SECS,
        )
    }

    /// Create a configuration with explicit token lifetimes in seconds.
    pub fn with_lifetimes(
        access_secret: &[u8],
        refresh_secret: &[u8],
        access_ttl_secs: u64,
        refresh_ttl_secs: u64,
    ) -> Self {
        Self {
            access_encoding: EncodingKey::from_secret(access_secret),
            access_decoding: DecodingKey::from_secret(access_secret),
            refresh_encoding: EncodingKey::from_secret(refresh_secret),
            refresh_decoding: DecodingKey::from_secret(refresh_secret),
            access_ttl_secs,
            refresh_ttl_secs,
        }
    }

    pub fn access_ttl_secs(&self) -> u64 {
        self.access_ttl_secs
    }

    pub fn refresh_ttl_secs(&self) -> u64 {
        self.refresh_ttl_secs
    }

    /// Sign an access token carrying the user's public identity fields.
    pub fn sign_access_token(
        &self,
        uuid: &str,
        name: &str,
        email: &str,
        role: UserRole,
    ) -> Result<AccessToken, JwtError> {
        let now = unix_now()?;
        let claims = AccessClaims {
            sub: uuid.to_string(),
            name: name.to_string(),
            email: email.to_string(),
            role,
            iat: now,
            exp: now + self.access_ttl_secs,
        };

        let token = jsonwebtoken::encode(&Header::default(), &claims, &self.access_encoding)
            .map_err(JwtError::Encoding)?;

        Ok(AccessToken {
            token,
            expires_in: self.access_ttl_secs,
        })
    }

    /// Sign a refresh token carrying only the subject.
    pub fn sign_refresh_token(&self, uuid: &str) -> Result<RefreshToken, JwtError> {
        let now = unix_now()?;
        let exp = now + self.refresh_ttl_secs;
        let claims = RefreshClaims {
            sub: uuid.to_string(),
            jti: uuid::Uuid::new_v4().to_string(),
            iat: now,
            exp,
        };

        let token = jsonwebtoken::encode(&Header::default(), &claims, &self.refresh_encoding)
            .map_err(JwtError::Encoding)?;

        Ok(RefreshToken {
            token,
            issued_at: now,
            expires_at: exp,
            expires_in: self.refresh_ttl_secs,
        })
    }

    /// Verify an access token's signature and expiry.
    ///
    /// This is a pure cryptographic/time check; it never consults the
    /// refresh token ledger.
    pub fn verify_access_token(&self, token: &str) -> Result<AccessClaims, JwtError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        jsonwebtoken::decode::<AccessClaims>(token, &self.access_decoding, &validation)
            .map(|data| data.claims)
            .map_err(JwtError::from_decode)
    }

    /// Verify a refresh token's signature and expiry. Whether the token is
    /// still the live one in its rotation chain is the caller's concern.
    pub fn verify_refresh_token(&self, token: &str) -> Result<RefreshClaims, JwtError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        jsonwebtoken::decode::<RefreshClaims>(token, &self.refresh_decoding, &validation)
            .map(|data| data.claims)
            .map_err(JwtError::from_decode)
    }
}

fn unix_now() -> Result<u64, JwtError> {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .map_err(|_| JwtError::TimeError)
}

/// Errors from token signing and verification.
#[derive(Debug)]
pub enum JwtError {
    /// Error encoding the token
    Encoding(jsonwebtoken::errors::Error),
    /// Bad signature or malformed token
    Invalid(jsonwebtoken::errors::Error),
    /// Signature is fine but the token has expired
    Expired,
    /// System time error
    TimeError,
}

impl JwtError {
    fn from_decode(e: jsonwebtoken::errors::Error) -> Self {
        match e.kind() {
            ErrorKind::ExpiredSignature => JwtError::Expired,
            _ => JwtError::Invalid(e),
        }
    }
}

impl std::fmt::Display for JwtError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JwtError::Encoding(e) => write!(f, "Failed to encode token: {}", e),
            JwtError::Invalid(e) => write!(f, "Invalid token: {}", e),
            JwtError::Expired => write!(f, "Token expired"),
            JwtError::TimeError => write!(f, "System time error"),
        }
    }
}

impl std::error::Error for JwtError {}
