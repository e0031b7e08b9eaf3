/// User model and database operations
///
/// Accounts go through an approval flow: registration creates a `pending`
/// user, an admin approves it to `active`, and pending accounts that are never
/// approved are pruned by the worker. The very first account registered on an
/// empty database is created as an active admin.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE users (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     email VARCHAR(255) NOT NULL,           -- unique on LOWER(email)
///     password_hash VARCHAR(255) NOT NULL,
///     name VARCHAR(100),
///     role user_role NOT NULL DEFAULT 'user',
///     status user_status NOT NULL DEFAULT 'pending',
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     last_login_at TIMESTAMPTZ
/// );
/// ```
///
/// # Example
///
/// ```no_run
/// use tshare_shared::models::user::User;
/// use tshare_shared::db::pool::{create_pool, DatabaseConfig};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::from_env()?).await?;
///
/// let user = User::register(&pool, "user@example.com", "$argon2id$...", Some("Hanako")).await?;
/// println!("Registered {} as {:?}", user.id, user.status);
///
/// let found = User::find_by_email(&pool, "USER@example.com").await?;
/// # Ok(())
/// # }
/// ```

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use super::pagination::PageParams;
use crate::transfer::{IdMap, TransferRecord};

const USER_COLUMNS: &str =
    "id, email, password_hash, name, role, status, created_at, updated_at, last_login_at";

/// Advisory lock key serializing registrations so only one first user wins
const REGISTRATION_LOCK: i64 = 0x7473_6861_7265;

/// Account role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    /// Manages users, settings and bulk data
    Admin,

    /// Regular member
    User,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Admin => "admin",
            UserRole::User => "user",
        }
    }
}

/// Account approval status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "user_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum UserStatus {
    /// Registered, waiting for an admin
    Pending,

    /// Allowed to log in
    Active,

    /// Blocked by an admin
    Suspended,
}

impl UserStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserStatus::Pending => "pending",
            UserStatus::Active => "active",
            UserStatus::Suspended => "suspended",
        }
    }
}

/// User account row
///
/// Includes the password hash so exports can be restored; API responses use
/// [`UserProfile`] instead.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: Uuid,

    /// Email address, unique ignoring case
    pub email: String,

    /// Argon2id PHC string
    pub password_hash: String,

    pub name: Option<String>,
    pub role: UserRole,
    pub status: UserStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub last_login_at: Option<DateTime<Utc>>,
}

/// Public view of a user, without the password hash
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: Uuid,
    pub email: String,
    pub name: Option<String>,
    pub role: UserRole,
    pub status: UserStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub last_login_at: Option<DateTime<Utc>>,
}

impl From<User> for UserProfile {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            name: user.name,
            role: user.role,
            status: user.status,
            created_at: user.created_at,
            updated_at: user.updated_at,
            last_login_at: user.last_login_at,
        }
    }
}

/// Input for creating a user directly (admin tooling, tests)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUser {
    pub email: String,

    /// Argon2id password hash (NOT plaintext password!)
    pub password_hash: String,

    pub name: Option<String>,
    pub role: UserRole,
    pub status: UserStatus,
}

/// Partial update of a user
///
/// Only non-None fields are updated.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateUser {
    /// New display name (use Some(None) to clear)
    pub name: Option<Option<String>>,

    pub role: Option<UserRole>,

    pub status: Option<UserStatus>,

    /// New password hash
    pub password_hash: Option<String>,
}

impl UpdateUser {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.role.is_none()
            && self.status.is_none()
            && self.password_hash.is_none()
    }
}

impl User {
    /// Inserts a user with an explicit role and status
    ///
    /// # Errors
    ///
    /// Returns a database error if the email is already taken (any case)
    pub async fn create(pool: &PgPool, data: CreateUser) -> Result<Self, sqlx::Error> {
        let sql = format!(
            "INSERT INTO users (email, password_hash, name, role, status)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {USER_COLUMNS}"
        );

        sqlx::query_as::<_, User>(&sql)
            .bind(data.email.trim())
            .bind(data.password_hash)
            .bind(data.name)
            .bind(data.role)
            .bind(data.status)
            .fetch_one(pool)
            .await
    }

    /// Self-service registration
    ///
    /// Creates a `pending` user, except on an empty table where the account
    /// becomes an `active` admin. Concurrent registrations are serialized with
    /// a transaction-scoped advisory lock so at most one bootstrap admin exists.
    pub async fn register(
        pool: &PgPool,
        email: &str,
        password_hash: &str,
        name: Option<&str>,
    ) -> Result<Self, sqlx::Error> {
        let mut tx = pool.begin().await?;

        sqlx::query("SELECT pg_advisory_xact_lock($1)")
            .bind(REGISTRATION_LOCK)
            .execute(&mut *tx)
            .await?;

        let has_users: bool = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM users)")
            .fetch_one(&mut *tx)
            .await?;

        let (role, status) = if has_users {
            (UserRole::User, UserStatus::Pending)
        } else {
            (UserRole::Admin, UserStatus::Active)
        };

        let sql = format!(
            "INSERT INTO users (email, password_hash, name, role, status)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {USER_COLUMNS}"
        );

        let user = sqlx::query_as::<_, User>(&sql)
            .bind(email.trim())
            .bind(password_hash)
            .bind(name)
            .bind(role)
            .bind(status)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(user)
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");

        sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Finds a user by email address, ignoring case
    pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<Self>, sqlx::Error> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE LOWER(email) = LOWER($1)");

        sqlx::query_as::<_, User>(&sql)
            .bind(email.trim())
            .fetch_optional(pool)
            .await
    }

    /// Updates an existing user
    ///
    /// Only non-None fields in `data` will be updated. The `updated_at` timestamp
    /// is automatically set to the current time.
    ///
    /// # Returns
    ///
    /// The updated user if found, None if user doesn't exist
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        data: UpdateUser,
    ) -> Result<Option<Self>, sqlx::Error> {
        // Build dynamic update query based on which fields are present
        let mut query = String::from("UPDATE users SET updated_at = NOW()");
        let mut bind_count = 1;

        if data.name.is_some() {
            bind_count += 1;
            query.push_str(&format!(", name = ${}", bind_count));
        }
        if data.role.is_some() {
            bind_count += 1;
            query.push_str(&format!(", role = ${}", bind_count));
        }
        if data.status.is_some() {
            bind_count += 1;
            query.push_str(&format!(", status = ${}", bind_count));
        }
        if data.password_hash.is_some() {
            bind_count += 1;
            query.push_str(&format!(", password_hash = ${}", bind_count));
        }

        query.push_str(&format!(" WHERE id = $1 RETURNING {USER_COLUMNS}"));

        let mut q = sqlx::query_as::<_, User>(&query).bind(id);

        if let Some(name) = data.name {
            q = q.bind(name);
        }
        if let Some(role) = data.role {
            q = q.bind(role);
        }
        if let Some(status) = data.status {
            q = q.bind(status);
        }
        if let Some(password_hash) = data.password_hash {
            q = q.bind(password_hash);
        }

        q.fetch_optional(pool).await
    }

    /// Marks a user as active
    pub async fn approve(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        Self::update(
            pool,
            id,
            UpdateUser {
                status: Some(UserStatus::Active),
                ..Default::default()
            },
        )
        .await
    }

    pub async fn update_password(
        pool: &PgPool,
        id: Uuid,
        password_hash: &str,
    ) -> Result<bool, sqlx::Error> {
        let result =
            sqlx::query("UPDATE users SET password_hash = $2, updated_at = NOW() WHERE id = $1")
                .bind(id)
                .bind(password_hash)
                .execute(pool)
                .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Deletes a user by ID
    ///
    /// Owned projects, variables, memos and preferences cascade. Templates,
    /// scenes and usage rows keep existing with their author cleared.
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Deletes `pending` users created before `cutoff`
    ///
    /// Returns the number of deleted accounts. Active and suspended users are
    /// never touched regardless of age.
    pub async fn delete_stale_pending(
        pool: &PgPool,
        cutoff: DateTime<Utc>,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM users WHERE status = $1 AND created_at < $2")
            .bind(UserStatus::Pending)
            .bind(cutoff)
            .execute(pool)
            .await?;

        Ok(result.rows_affected())
    }

    pub async fn update_last_login(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE users SET last_login_at = NOW() WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Lists users, newest first, filtered by `q` (email or name) and status
    ///
    /// Returns the page of users and the total number of matches.
    pub async fn list(
        pool: &PgPool,
        params: &PageParams,
        status: Option<UserStatus>,
    ) -> Result<(Vec<Self>, i64), sqlx::Error> {
        const FILTER: &str = "($1::text IS NULL OR email ILIKE $1 OR name ILIKE $1)
             AND ($2::user_status IS NULL OR status = $2)";

        let pattern = params.search_pattern();

        let sql = format!(
            "SELECT {USER_COLUMNS} FROM users WHERE {FILTER}
             ORDER BY created_at DESC, id
             LIMIT $3 OFFSET $4"
        );
        let users = sqlx::query_as::<_, User>(&sql)
            .bind(pattern.as_deref())
            .bind(status)
            .bind(params.limit())
            .bind(params.offset())
            .fetch_all(pool)
            .await?;

        let total: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM users WHERE {FILTER}"))
            .bind(pattern.as_deref())
            .bind(status)
            .fetch_one(pool)
            .await?;

        Ok((users, total))
    }

    pub async fn count(pool: &PgPool) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(pool)
            .await
    }

    /// Number of users per status
    pub async fn count_by_status(pool: &PgPool) -> Result<Vec<(UserStatus, i64)>, sqlx::Error> {
        sqlx::query_as::<_, (UserStatus, i64)>(
            "SELECT status, COUNT(*) FROM users GROUP BY status ORDER BY status",
        )
        .fetch_all(pool)
        .await
    }
}

#[async_trait]
impl TransferRecord for User {
    const TABLE: &'static str = "users";
    const KEY: &'static str = "users";

    fn id(&self) -> Uuid {
        self.id
    }

    fn set_id(&mut self, id: Uuid) {
        self.id = id;
    }

    fn remap_references(&mut self, _ids: &IdMap) {}

    async fn insert_exact(&self, conn: &mut PgConnection) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO users (id, email, password_hash, name, role, status,
                               created_at, updated_at, last_login_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(self.id)
        .bind(&self.email)
        .bind(&self.password_hash)
        .bind(&self.name)
        .bind(self.role)
        .bind(self.status)
        .bind(self.created_at)
        .bind(self.updated_at)
        .bind(self.last_login_at)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_user() -> User {
        User {
            id: Uuid::new_v4(),
            email: "user@example.com".to_string(),
            password_hash: "$argon2id$v=19$...".to_string(),
            name: Some("Test User".to_string()),
            role: UserRole::User,
            status: UserStatus::Pending,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            last_login_at: None,
        }
    }

    #[test]
    fn test_profile_hides_password_hash() {
        let user = sample_user();
        let json = serde_json::to_value(UserProfile::from(user.clone())).unwrap();

        assert_eq!(json["email"], "user@example.com");
        assert_eq!(json["role"], "user");
        assert_eq!(json["status"], "pending");
        assert!(json.get("password_hash").is_none());
    }

    #[test]
    fn test_export_row_keeps_password_hash() {
        let json = serde_json::to_value(sample_user()).unwrap();
        assert!(json["password_hash"].as_str().unwrap().starts_with("$argon2id$"));
    }

    #[test]
    fn test_update_user_default() {
        let update = UpdateUser::default();
        assert!(update.is_empty());

        let update = UpdateUser {
            status: Some(UserStatus::Suspended),
            ..Default::default()
        };
        assert!(!update.is_empty());
    }

    #[test]
    fn test_enum_strings() {
        assert_eq!(UserRole::Admin.as_str(), "admin");
        assert_eq!(UserStatus::Suspended.as_str(), "suspended");
        assert_eq!(
            serde_json::from_str::<UserStatus>("\"active\"").unwrap(),
            UserStatus::Active
        );
    }
}
