/// Meditation session log (append-only)
///
/// ```sql
/// CREATE TABLE meditation_sessions (
///     id BIGSERIAL PRIMARY KEY,
///     user_id BIGINT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     duration INTEGER NOT NULL CHECK (duration >= 0),   -- seconds
///     tap_count INTEGER NOT NULL CHECK (tap_count >= 0),
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgExecutor;

/// Default page size when listing sessions
pub const DEFAULT_LIST_LIMIT: i64 = 10;

/// Largest page a client may request
pub const MAX_LIST_LIMIT: i64 = 100;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct MeditationSession {
    pub id: i64,
    pub user_id: i64,
    /// Length of the session in seconds
    pub duration: i32,
    pub tap_count: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateMeditationSession {
    pub user_id: i64,
    pub duration: i32,
    pub tap_count: i32,
}

/// Clamps a client-supplied page size into `1..=MAX_LIST_LIMIT`.
pub fn clamp_limit(limit: Option<i64>) -> i64 {
    limit.unwrap_or(DEFAULT_LIST_LIMIT).clamp(1, MAX_LIST_LIMIT)
}

impl MeditationSession {
    pub async fn create<'e, E>(executor: E, data: CreateMeditationSession) -> Result<Self, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let session = sqlx::query_as::<_, MeditationSession>(
            r#"
            INSERT INTO meditation_sessions (user_id, duration, tap_count)
            VALUES ($1, $2, $3)
            RETURNING id, user_id, duration, tap_count, created_at
            "#,
        )
        .bind(data.user_id)
        .bind(data.duration)
        .bind(data.tap_count)
        .fetch_one(executor)
        .await?;

        Ok(session)
    }

    /// Most recent sessions of a user, newest first.
    pub async fn list_by_user<'e, E>(
        executor: E,
        user_id: i64,
        limit: i64,
    ) -> Result<Vec<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let sessions = sqlx::query_as::<_, MeditationSession>(
            r#"
            SELECT id, user_id, duration, tap_count, created_at
            FROM meditation_sessions
            WHERE user_id = $1
            ORDER BY created_at DESC, id DESC
            LIMIT $2
            "#,
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(executor)
        .await?;

        Ok(sessions)
    }

    pub async fn count_by_user<'e, E>(executor: E, user_id: i64) -> Result<i64, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM meditation_sessions WHERE user_id = $1")
                .bind(user_id)
                .fetch_one(executor)
                .await?;

        Ok(count)
    }
}
