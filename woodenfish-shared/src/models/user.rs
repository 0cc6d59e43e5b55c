/// User model and database operations
///
/// A user is either a registered account (username + email + password) or a
/// phone-only account created by verification-code login, in which case
/// `email` and `password_hash` are NULL.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE users (
///     id BIGSERIAL PRIMARY KEY,
///     username VARCHAR(64) NOT NULL UNIQUE,
///     email VARCHAR(255) UNIQUE,
///     phone VARCHAR(20) UNIQUE,
///     password_hash VARCHAR(255),
///     avatar VARCHAR(512),
///     is_vip BOOLEAN NOT NULL DEFAULT FALSE,
///     vip_expire_date TIMESTAMPTZ,
///     merit_points BIGINT NOT NULL DEFAULT 0,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// # Example
///
/// ```no_run
/// use woodenfish_shared::models::user::{CreateUser, User};
/// use sqlx::PgPool;
///
/// # async fn example(pool: PgPool) -> Result<(), sqlx::Error> {
/// let user = User::create(
///     &pool,
///     CreateUser {
///         username: "xiaoming".to_string(),
///         email: Some("xiaoming@example.com".to_string()),
///         phone: None,
///         password_hash: Some("$argon2id$...".to_string()),
///         avatar: None,
///     },
/// )
/// .await?;
///
/// let found = User::find_by_username(&pool, "xiaoming").await?;
/// assert_eq!(found.map(|u| u.id), Some(user.id));
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgExecutor;

/// Unique constraint guarding `users.username`
pub const USERNAME_CONSTRAINT: &str = "users_username_key";

/// Unique constraint guarding `users.email`
pub const EMAIL_CONSTRAINT: &str = "users_email_key";

/// Unique constraint guarding `users.phone`
pub const PHONE_CONSTRAINT: &str = "users_phone_key";

/// User account
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: i64,

    /// Display name, unique across all users
    pub username: String,

    pub email: Option<String>,

    /// 11-digit mobile number for phone-login accounts
    pub phone: Option<String>,

    /// Argon2id PHC string; None for phone-only accounts
    #[serde(skip_serializing)]
    pub password_hash: Option<String>,

    pub avatar: Option<String>,

    pub is_vip: bool,

    pub vip_expire_date: Option<DateTime<Utc>>,

    /// Gamification currency (功德)
    pub merit_points: i64,

    pub created_at: DateTime<Utc>,
}

/// Input for creating a user
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateUser {
    pub username: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    /// Already hashed, never plaintext
    pub password_hash: Option<String>,
    pub avatar: Option<String>,
}

impl User {
    /// Inserts a new user.
    ///
    /// # Errors
    ///
    /// Fails with a database error naming [`USERNAME_CONSTRAINT`],
    /// [`EMAIL_CONSTRAINT`] or [`PHONE_CONSTRAINT`] when the value is taken.
    pub async fn create<'e, E>(executor: E, data: CreateUser) -> Result<Self, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (username, email, phone, password_hash, avatar)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, username, email, phone, password_hash, avatar,
                      is_vip, vip_expire_date, merit_points, created_at
            "#,
        )
        .bind(data.username)
        .bind(data.email)
        .bind(data.phone)
        .bind(data.password_hash)
        .bind(data.avatar)
        .fetch_one(executor)
        .await?;

        Ok(user)
    }

    pub async fn find_by_id<'e, E>(executor: E, id: i64) -> Result<Option<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, email, phone, password_hash, avatar,
                   is_vip, vip_expire_date, merit_points, created_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(executor)
        .await?;

        Ok(user)
    }

    pub async fn find_by_username<'e, E>(
        executor: E,
        username: &str,
    ) -> Result<Option<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, email, phone, password_hash, avatar,
                   is_vip, vip_expire_date, merit_points, created_at
            FROM users
            WHERE username = $1
            "#,
        )
        .bind(username)
        .fetch_optional(executor)
        .await?;

        Ok(user)
    }

    pub async fn find_by_email<'e, E>(executor: E, email: &str) -> Result<Option<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, email, phone, password_hash, avatar,
                   is_vip, vip_expire_date, merit_points, created_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(executor)
        .await?;

        Ok(user)
    }

    pub async fn find_by_phone<'e, E>(executor: E, phone: &str) -> Result<Option<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, email, phone, password_hash, avatar,
                   is_vip, vip_expire_date, merit_points, created_at
            FROM users
            WHERE phone = $1
            "#,
        )
        .bind(phone)
        .fetch_optional(executor)
        .await?;

        Ok(user)
    }

    /// Cheap existence check used before writing join rows.
    pub async fn exists<'e, E>(executor: E, id: i64) -> Result<bool, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM users WHERE id = $1)")
            .bind(id)
            .fetch_one(executor)
            .await
    }

    /// Adds `amount` merit points and returns the new balance.
    ///
    /// Returns None when the user does not exist.
    pub async fn add_merit_points<'e, E>(
        executor: E,
        id: i64,
        amount: i64,
    ) -> Result<Option<i64>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_scalar(
            r#"
            UPDATE users
            SET merit_points = merit_points + $2
            WHERE id = $1
            RETURNING merit_points
            "#,
        )
        .bind(id)
        .bind(amount)
        .fetch_optional(executor)
        .await
    }

    /// Deletes a user; dependent rows go with it (ON DELETE CASCADE).
    pub async fn delete<'e, E>(executor: E, id: i64) -> Result<bool, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_user() -> User {
        User {
            id: 7,
            username: "xiaoming".to_string(),
            email: Some("xiaoming@example.com".to_string()),
            phone: None,
            password_hash: Some("$argon2id$v=19$secret".to_string()),
            avatar: None,
            is_vip: false,
            vip_expire_date: None,
            merit_points: 0,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_password_hash_not_serialized() {
        let json = serde_json::to_value(sample_user()).expect("serialize");

        assert!(json.get("password_hash").is_none());
        assert_eq!(json["username"], "xiaoming");
        assert_eq!(json["id"], 7);
    }

    #[test]
    fn test_create_user_default_is_phone_ready() {
        let data = CreateUser {
            username: "用户8000".to_string(),
            phone: Some("13800138000".to_string()),
            ..Default::default()
        };

        assert!(data.email.is_none());
        assert!(data.password_hash.is_none());
    }
}
