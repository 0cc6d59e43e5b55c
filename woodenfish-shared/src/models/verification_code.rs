/// Verification codes for phone login
///
/// # Schema
///
/// ```sql
/// CREATE TABLE verification_codes (
///     id BIGSERIAL PRIMARY KEY,
///     phone VARCHAR(20) NOT NULL,
///     code VARCHAR(6) NOT NULL,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     expires_at TIMESTAMPTZ NOT NULL,
///     used BOOLEAN NOT NULL DEFAULT FALSE
/// );
/// ```
///
/// # Lifecycle
///
/// 1. [`VerificationCode::lock_phone`] serializes issuers for the phone
/// 2. [`VerificationCode::invalidate_for_phone`] retires outstanding codes
/// 3. [`VerificationCode::create`] stores the new one
/// 4. [`VerificationCode::redeem`] claims it: a single conditional UPDATE,
///    so of two concurrent redemptions exactly one sees the row
///
/// Steps 1 to 3 must share a transaction. The lock is released at commit,
/// after the new code is visible, so at most one unused code per phone
/// survives any number of concurrent issuers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgExecutor;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct VerificationCode {
    pub id: i64,
    pub phone: String,
    pub code: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub used: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateVerificationCode {
    pub phone: String,
    pub code: String,
    pub expires_at: DateTime<Utc>,
}

impl VerificationCode {
    /// Takes a transaction-scoped advisory lock keyed on `phone`.
    ///
    /// Only meaningful inside a transaction; on a bare connection the lock
    /// is dropped as soon as the statement finishes.
    pub async fn lock_phone<'e, E>(executor: E, phone: &str) -> Result<(), sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query("SELECT pg_advisory_xact_lock(hashtext($1))")
            .bind(phone)
            .execute(executor)
            .await?;

        Ok(())
    }

    pub async fn create<'e, E>(executor: E, data: CreateVerificationCode) -> Result<Self, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, VerificationCode>(
            r#"
            INSERT INTO verification_codes (phone, code, expires_at)
            VALUES ($1, $2, $3)
            RETURNING id, phone, code, created_at, expires_at, used
            "#,
        )
        .bind(data.phone)
        .bind(data.code)
        .bind(data.expires_at)
        .fetch_one(executor)
        .await
    }

    /// Marks every unused code of `phone` as used; returns how many.
    pub async fn invalidate_for_phone<'e, E>(executor: E, phone: &str) -> Result<u64, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let result = sqlx::query(
            r#"
            UPDATE verification_codes
            SET used = TRUE
            WHERE phone = $1 AND used = FALSE
            "#,
        )
        .bind(phone)
        .execute(executor)
        .await?;

        Ok(result.rows_affected())
    }

    /// Claims a matching, unused, unexpired code.
    ///
    /// Returns the claimed code, or None when nothing matched (wrong code,
    /// expired, or already used).
    pub async fn redeem<'e, E>(executor: E, phone: &str, code: &str) -> Result<Option<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, VerificationCode>(
            r#"
            UPDATE verification_codes
            SET used = TRUE
            WHERE phone = $1
              AND code = $2
              AND used = FALSE
              AND expires_at > NOW()
            RETURNING id, phone, code, created_at, expires_at, used
            "#,
        )
        .bind(phone)
        .bind(code)
        .fetch_optional(executor)
        .await
    }
}
