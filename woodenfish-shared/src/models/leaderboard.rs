/// Leaderboard rows
///
/// Rankings are computed by an offline job and written here; the API only
/// reads them. `period` is free-form (`daily`, `weekly`, ...), so an unknown
/// period simply has no rows.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgExecutor;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct LeaderboardEntry {
    pub user_id: i64,
    /// None when the ranked user has since been renamed away or removed
    pub username: Option<String>,
    pub period: String,
    pub rank: i32,
    pub tap_count: i64,
    pub created_at: DateTime<Utc>,
}

/// Row written by the ranking job
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateLeaderboardEntry {
    pub user_id: i64,
    pub period: String,
    pub rank: i32,
    pub tap_count: i64,
}

impl LeaderboardEntry {
    /// Top `limit` rows of `period`, best rank first.
    pub async fn list_by_period<'e, E>(
        executor: E,
        period: &str,
        limit: i64,
    ) -> Result<Vec<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, LeaderboardEntry>(
            r#"
            SELECT l.user_id, u.username, l.period, l.rank, l.tap_count, l.created_at
            FROM leaderboard l
            LEFT JOIN users u ON u.id = l.user_id
            WHERE l.period = $1
            ORDER BY l.rank, l.id
            LIMIT $2
            "#,
        )
        .bind(period)
        .bind(limit)
        .fetch_all(executor)
        .await
    }

    pub async fn create<'e, E>(executor: E, data: CreateLeaderboardEntry) -> Result<i64, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_scalar(
            r#"
            INSERT INTO leaderboard (user_id, period, rank, tap_count)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            "#,
        )
        .bind(data.user_id)
        .bind(data.period)
        .bind(data.rank)
        .bind(data.tap_count)
        .fetch_one(executor)
        .await
    }
}
