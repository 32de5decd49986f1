use sqlx::sqlite::SqlitePool;

#[derive(Clone)]
pub struct UserStore {
    pool: SqlitePool,
}

/// Account role within the property-management suite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Tenant,
    Landlord,
    Agent,
    Investor,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Tenant => "tenant",
            UserRole::Landlord => "landlord",
            UserRole::Agent => "agent",
            UserRole::Investor => "investor",
        }
    }

    pub fn from_str(s: &str) -> Self {
        match s {
            "landlord" => UserRole::Landlord,
            "agent" => UserRole::Agent,
            "investor" => UserRole::Investor,
            _ => UserRole::Tenant,
        }
    }
}

/// Full user record. The password hash never leaves the server.
#[derive(Debug, Clone)]
pub struct User {
    pub id: i64,
    pub uuid: String,
    pub full_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub password_hash: String,
    pub role: UserRole,
    pub created_at: String,
}

#[derive(sqlx::FromRow)]
struct UserRow {
    id: i64,
    uuid: String,
    full_name: String,
    email: String,
    phone: Option<String>,
    password_hash: String,
    role: String,
    created_at: String,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        Self {
            id: row.id,
            uuid: row.uuid,
            full_name: row.full_name,
            email: row.email,
            phone: row.phone,
            password_hash: row.password_hash,
            role: UserRole::from_str(&row.role),
            created_at: row.created_at,
        }
    }
}

/// Public user fields returned to clients. No internal ID, no hash.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct PublicUser {
    pub id: String,
    #[serde(rename = "fullName")]
    pub full_name: String,
    pub email: String,
    pub role: UserRole,
}

impl From<&User> for PublicUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.uuid.clone(),
            full_name: user.full_name.clone(),
            email: user.email.clone(),
            role: user.role,
        }
    }
}

const USER_COLUMNS: &str = "id, uuid, full_name, email, phone, password_hash, role, created_at";

impl UserStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a new user. The email is lowercased before insert; a duplicate
    /// email surfaces as a unique-constraint violation.
    pub async fn create(
        &self,
        uuid: &str,
        full_name: &str,
        email: &str,
        phone: Option<&str>,
        password_hash: &str,
        role: UserRole,
    ) -> Result<i64, sqlx::Error> {
        let result = sqlx::query(
            "INSERT INTO users (uuid, full_name, email, phone, password_hash, role) VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(uuid)
        .bind(full_name)
        .bind(email.to_lowercase())
        .bind(phone)
        .bind(password_hash)
        .bind(role.as_str())
        .execute(&self.pool)
        .await?;
        Ok(result.last_insert_rowid())
    }

    /// Get a user by email (case-insensitive).
    pub async fn get_by_email(&self, email: &str) -> Result<Option<User>, sqlx::Error> {
        let query = format!("SELECT {} FROM users WHERE email = ?", USER_COLUMNS);
        let row: Option<UserRow> = sqlx::query_as(&query)
            .bind(email.to_lowercase())
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(User::from))
    }

    /// Get a user by UUID.
    pub async fn get_by_uuid(&self, uuid: &str) -> Result<Option<User>, sqlx::Error> {
        let query = format!("SELECT {} FROM users WHERE uuid = ?", USER_COLUMNS);
        let row: Option<UserRow> = sqlx::query_as(&query)
            .bind(uuid)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(User::from))
    }

    /// Get a user by internal ID.
    pub async fn get_by_id(&self, id: i64) -> Result<Option<User>, sqlx::Error> {
        let query = format!("SELECT {} FROM users WHERE id = ?", USER_COLUMNS);
        let row: Option<UserRow> = sqlx::query_as(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(User::from))
    }

    /// Whether an account already exists for this email.
    pub async fn email_exists(&self, email: &str) -> Result<bool, sqlx::Error> {
        let count: (i32,) = sqlx::query_as("SELECT COUNT(*) FROM users WHERE email = ?")
            .bind(email.to_lowercase())
            .fetch_one(&self.pool)
            .await?;
        Ok(count.0 > 0)
    }

    /// Delete a user by ID.
    pub async fn delete(&self, id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
