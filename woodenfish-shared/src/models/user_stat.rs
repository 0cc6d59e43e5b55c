/// Per-user tap statistics
///
/// One row per user, created together with the account and advanced every
/// time a meditation session is logged.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE user_stats (
///     user_id BIGINT PRIMARY KEY REFERENCES users(id) ON DELETE CASCADE,
///     total_taps BIGINT NOT NULL DEFAULT 0,
///     today_taps BIGINT NOT NULL DEFAULT 0,
///     consecutive_days INTEGER NOT NULL DEFAULT 0,
///     last_tap_date TIMESTAMPTZ
/// );
/// ```
///
/// # Day boundaries
///
/// Days are UTC calendar days. A session on the day after the last tap
/// extends the streak; any longer gap restarts it at 1.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgConnection, PgExecutor};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct UserStat {
    pub user_id: i64,
    pub total_taps: i64,
    pub today_taps: i64,
    pub consecutive_days: i32,
    pub last_tap_date: Option<DateTime<Utc>>,
}

impl UserStat {
    /// Returns the statistics after `taps` more taps at instant `now`.
    pub fn record_taps(&self, taps: i64, now: DateTime<Utc>) -> Self {
        let today = now.date_naive();

        let (today_taps, consecutive_days) = match self.last_tap_date {
            None => (taps, 1),
            Some(last) => match today.signed_duration_since(last.date_naive()).num_days() {
                // a last tap "in the future" (clock skew) counts as today
                days if days <= 0 => (self.today_taps + taps, self.consecutive_days.max(1)),
                1 => (taps, self.consecutive_days + 1),
                _ => (taps, 1),
            },
        };

        Self {
            user_id: self.user_id,
            total_taps: self.total_taps + taps,
            today_taps,
            consecutive_days,
            last_tap_date: Some(now),
        }
    }

    /// Inserts an empty row for `user_id` unless one exists.
    pub async fn create<'e, E>(executor: E, user_id: i64) -> Result<(), sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query(
            r#"
            INSERT INTO user_stats (user_id)
            VALUES ($1)
            ON CONFLICT (user_id) DO NOTHING
            "#,
        )
        .bind(user_id)
        .execute(executor)
        .await?;

        Ok(())
    }

    pub async fn find_by_user<'e, E>(executor: E, user_id: i64) -> Result<Option<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let stat = sqlx::query_as::<_, UserStat>(
            r#"
            SELECT user_id, total_taps, today_taps, consecutive_days, last_tap_date
            FROM user_stats
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(executor)
        .await?;

        Ok(stat)
    }

    /// Applies `taps` at `now` to the stored row, creating it if needed.
    ///
    /// Must run inside a transaction: the row is locked with `FOR UPDATE`
    /// so concurrent sessions for one user are applied one after another.
    pub async fn apply_taps(
        conn: &mut PgConnection,
        user_id: i64,
        taps: i64,
        now: DateTime<Utc>,
    ) -> Result<Self, sqlx::Error> {
        Self::create(&mut *conn, user_id).await?;

        let current = sqlx::query_as::<_, UserStat>(
            r#"
            SELECT user_id, total_taps, today_taps, consecutive_days, last_tap_date
            FROM user_stats
            WHERE user_id = $1
            FOR UPDATE
            "#,
        )
        .bind(user_id)
        .fetch_one(&mut *conn)
        .await?;

        let next = current.record_taps(taps, now);

        sqlx::query(
            r#"
            UPDATE user_stats
            SET total_taps = $2,
                today_taps = $3,
                consecutive_days = $4,
                last_tap_date = $5
            WHERE user_id = $1
            "#,
        )
        .bind(next.user_id)
        .bind(next.total_taps)
        .bind(next.today_taps)
        .bind(next.consecutive_days)
        .bind(next.last_tap_date)
        .execute(&mut *conn)
        .await?;

        Ok(next)
    }
}
