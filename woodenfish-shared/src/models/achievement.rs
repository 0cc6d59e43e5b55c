/// Achievement catalog and per-user unlocks
///
/// # Schema
///
/// ```sql
/// CREATE TABLE achievements (
///     id BIGSERIAL PRIMARY KEY,
///     name VARCHAR(100) NOT NULL,
///     description TEXT NOT NULL DEFAULT '',
///     icon VARCHAR(255) NOT NULL DEFAULT ''
/// );
///
/// CREATE TABLE user_achievements (
///     id BIGSERIAL PRIMARY KEY,
///     user_id BIGINT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     achievement_id BIGINT NOT NULL REFERENCES achievements(id) ON DELETE CASCADE,
///     unlocked_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     UNIQUE (user_id, achievement_id)
/// );
/// ```
///
/// Unlocking is idempotent: the unique pair makes a second unlock a no-op
/// that returns the original `unlocked_at`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgConnection, PgExecutor};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Achievement {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub icon: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateAchievement {
    pub name: String,
    pub description: String,
    pub icon: String,
}

/// An achievement as unlocked by one user
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct UnlockedAchievement {
    #[sqlx(flatten)]
    pub achievement: Achievement,
    pub unlocked_at: DateTime<Utc>,
}

impl Achievement {
    pub async fn create<'e, E>(executor: E, data: CreateAchievement) -> Result<Self, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, Achievement>(
            r#"
            INSERT INTO achievements (name, description, icon)
            VALUES ($1, $2, $3)
            RETURNING id, name, description, icon
            "#,
        )
        .bind(data.name)
        .bind(data.description)
        .bind(data.icon)
        .fetch_one(executor)
        .await
    }

    pub async fn find_by_id<'e, E>(executor: E, id: i64) -> Result<Option<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, Achievement>(
            "SELECT id, name, description, icon FROM achievements WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(executor)
        .await
    }

    /// Whole catalog, ordered by id.
    pub async fn list<'e, E>(executor: E) -> Result<Vec<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, Achievement>(
            "SELECT id, name, description, icon FROM achievements ORDER BY id",
        )
        .fetch_all(executor)
        .await
    }

    pub async fn delete<'e, E>(executor: E, id: i64) -> Result<bool, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let result = sqlx::query("DELETE FROM achievements WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

impl UnlockedAchievement {
    /// Unlocks `achievement_id` for `user_id` if not already unlocked.
    ///
    /// Returns the unlock and whether this call created it. Both ids must
    /// exist; a dangling id surfaces as a foreign-key violation.
    pub async fn unlock(
        conn: &mut PgConnection,
        user_id: i64,
        achievement_id: i64,
    ) -> Result<(Self, bool), sqlx::Error> {
        let inserted = sqlx::query(
            r#"
            INSERT INTO user_achievements (user_id, achievement_id)
            VALUES ($1, $2)
            ON CONFLICT (user_id, achievement_id) DO NOTHING
            "#,
        )
        .bind(user_id)
        .bind(achievement_id)
        .execute(&mut *conn)
        .await?
        .rows_affected()
            > 0;

        let unlocked = sqlx::query_as::<_, UnlockedAchievement>(
            r#"
            SELECT a.id, a.name, a.description, a.icon, ua.unlocked_at
            FROM user_achievements ua
            JOIN achievements a ON a.id = ua.achievement_id
            WHERE ua.user_id = $1 AND ua.achievement_id = $2
            "#,
        )
        .bind(user_id)
        .bind(achievement_id)
        .fetch_one(&mut *conn)
        .await?;

        Ok((unlocked, inserted))
    }

    /// Achievements unlocked by a user, oldest unlock first.
    pub async fn list_by_user<'e, E>(executor: E, user_id: i64) -> Result<Vec<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, UnlockedAchievement>(
            r#"
            SELECT a.id, a.name, a.description, a.icon, ua.unlocked_at
            FROM user_achievements ua
            JOIN achievements a ON a.id = ua.achievement_id
            WHERE ua.user_id = $1
            ORDER BY ua.unlocked_at, ua.id
            "#,
        )
        .bind(user_id)
        .fetch_all(executor)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unlocked_achievement_serializes_nested() {
        let unlocked = UnlockedAchievement {
            achievement: Achievement {
                id: 3,
                name: "初心".to_string(),
                description: "完成第一次冥想".to_string(),
                icon: "first.png".to_string(),
            },
            unlocked_at: Utc::now(),
        };

        let json = serde_json::to_value(&unlocked).expect("serialize");
        assert_eq!(json["achievement"]["id"], 3);
        assert_eq!(json["achievement"]["name"], "初心");
        assert!(json["unlocked_at"].is_string());
    }
}
