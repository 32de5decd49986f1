//! Refresh token ledger: the source of truth for whether a syntactically
//! valid refresh token is still usable.
//!
//! Each issued refresh token gets one row. Rotation revokes the old row and
//! records its successor in the same transaction, so a concurrent refresh
//! racing on the same token observes `revoked = 1` and fails closed.
//! Signature and expiry checks live in `jwt`; the ledger only answers
//! "is this token still the live one in its chain".

use sqlx::sqlite::SqlitePool;
use std::time::{SystemTime, UNIX_EPOCH};

/// One issued refresh token.
#[derive(Debug, Clone)]
pub struct RefreshTokenRecord {
    pub id: i64,
    pub token: String,
    pub user_id: i64,
    pub revoked: bool,
    /// Token string of the successor, set when this record was rotated.
    pub replaced_by: Option<String>,
    /// Expiration as Unix seconds.
    pub expires_at: i64,
    pub created_at: String,
}

#[derive(sqlx::FromRow)]
struct RecordRow {
    id: i64,
    token: String,
    user_id: i64,
    revoked: i32,
    replaced_by: Option<String>,
    expires_at: i64,
    created_at: String,
}

impl From<RecordRow> for RefreshTokenRecord {
    fn from(row: RecordRow) -> Self {
        Self {
            id: row.id,
            token: row.token,
            user_id: row.user_id,
            revoked: row.revoked != 0,
            replaced_by: row.replaced_by,
            expires_at: row.expires_at,
            created_at: row.created_at,
        }
    }
}

/// Outcome of a rotation attempt.
#[derive(Debug)]
pub enum RotateError {
    /// The old token was already revoked or never recorded. Treated as
    /// replay/reuse by the session protocol.
    AlreadyRotated,
    Database(sqlx::Error),
}

impl std::fmt::Display for RotateError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RotateError::AlreadyRotated => write!(f, "Token already rotated or revoked"),
            RotateError::Database(e) => write!(f, "Database error: {}", e),
        }
    }
}

impl std::error::Error for RotateError {}

/// Ledger of issued refresh tokens.
#[derive(Clone)]
pub struct RefreshTokenLedger {
    pool: SqlitePool,
}

const RECORD_COLUMNS: &str = "id, token, user_id, revoked, replaced_by, expires_at, created_at";

impl RefreshTokenLedger {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert a new active record for an issued token.
    pub async fn record(
        &self,
        token: &str,
        user_id: i64,
        expires_at: u64,
    ) -> Result<i64, sqlx::Error> {
        let result =
            sqlx::query("INSERT INTO refresh_tokens (token, user_id, expires_at) VALUES (?, ?, ?)")
                .bind(token)
                .bind(user_id)
                .bind(expires_at as i64)
                .execute(&self.pool)
                .await?;
        Ok(result.last_insert_rowid())
    }

    /// Look up a record by its token string.
    pub async fn lookup(&self, token: &str) -> Result<Option<RefreshTokenRecord>, sqlx::Error> {
        let query = format!(
            "SELECT {} FROM refresh_tokens WHERE token = ?",
            RECORD_COLUMNS
        );
        let row: Option<RecordRow> = sqlx::query_as(&query)
            .bind(token)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(RefreshTokenRecord::from))
    }

    /// Mark a token revoked. Returns whether a live record was revoked.
    pub async fn revoke(&self, token: &str) -> Result<bool, sqlx::Error> {
        let result =
            sqlx::query("UPDATE refresh_tokens SET revoked = 1 WHERE token = ? AND revoked = 0")
                .bind(token)
                .execute(&self.pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Atomically exchange `old_token` for `new_token`.
    ///
    /// The revoke is conditional on `revoked = 0`: when two refresh calls
    /// race on the same token, exactly one update takes effect and the
    /// loser gets `AlreadyRotated`. The successor row is inserted in the
    /// same transaction so the chain never has zero or two live children.
    pub async fn rotate(
        &self,
        old_token: &str,
        new_token: &str,
        user_id: i64,
        new_expires_at: u64,
    ) -> Result<(), RotateError> {
        let mut tx = self.pool.begin().await.map_err(RotateError::Database)?;

        let updated = sqlx::query(
            "UPDATE refresh_tokens SET revoked = 1, replaced_by = ? WHERE token = ? AND revoked = 0",
        )
        .bind(new_token)
        .bind(old_token)
        .execute(&mut *tx)
        .await
        .map_err(RotateError::Database)?;

        if updated.rows_affected() == 0 {
            return Err(RotateError::AlreadyRotated);
        }

        sqlx::query("INSERT INTO refresh_tokens (token, user_id, expires_at) VALUES (?, ?, ?)")
            .bind(new_token)
            .bind(user_id)
            .bind(new_expires_at as i64)
            .execute(&mut *tx)
            .await
            .map_err(RotateError::Database)?;

        tx.commit().await.map_err(RotateError::Database)?;
        Ok(())
    }

    /// Delete all expired records. Cleanup only; expiry is re-checked
    /// cryptographically at verification time.
    pub async fn delete_expired(&self) -> Result<u64, sqlx::Error> {
        let now = unix_now();
        let result = sqlx::query("DELETE FROM refresh_tokens WHERE expires_at < ?")
            .bind(now)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    /// List non-revoked, non-expired records for a user.
    pub async fn list_active_by_user(
        &self,
        user_id: i64,
    ) -> Result<Vec<RefreshTokenRecord>, sqlx::Error> {
        let query = format!(
            "SELECT {} FROM refresh_tokens WHERE user_id = ? AND revoked = 0 AND expires_at >= ? ORDER BY created_at DESC",
            RECORD_COLUMNS
        );
        let rows: Vec<RecordRow> = sqlx::query_as(&query)
            .bind(user_id)
            .bind(unix_now())
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(RefreshTokenRecord::from).collect())
    }
}

fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}
