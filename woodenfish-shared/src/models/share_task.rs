/// Share tasks and per-user completions
///
/// # Schema
///
/// ```sql
/// CREATE TABLE share_tasks (
///     id BIGSERIAL PRIMARY KEY,
///     title VARCHAR(100) NOT NULL,
///     description TEXT NOT NULL DEFAULT '',
///     merit BIGINT NOT NULL DEFAULT 0,
///     icon VARCHAR(255) NOT NULL DEFAULT ''
/// );
///
/// CREATE TABLE user_share_tasks (
///     id BIGSERIAL PRIMARY KEY,
///     user_id BIGINT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     task_id BIGINT NOT NULL REFERENCES share_tasks(id) ON DELETE CASCADE,
///     completed BOOLEAN NOT NULL DEFAULT FALSE,
///     completed_at TIMESTAMPTZ,
///     UNIQUE (user_id, task_id)
/// );
/// ```
///
/// A task is completed at most once per user; only that first completion
/// is reported as new, so callers award `merit` exactly once.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgConnection, PgExecutor};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct ShareTask {
    pub id: i64,
    pub title: String,
    pub description: String,
    /// Merit points awarded on completion
    pub merit: i64,
    pub icon: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateShareTask {
    pub title: String,
    pub description: String,
    pub merit: i64,
    pub icon: String,
}

/// A user's progress on one share task
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct UserShareTask {
    #[sqlx(flatten)]
    pub task: ShareTask,
    pub completed: bool,
    pub completed_at: Option<DateTime<Utc>>,
}

impl ShareTask {
    pub async fn create<'e, E>(executor: E, data: CreateShareTask) -> Result<Self, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, ShareTask>(
            r#"
            INSERT INTO share_tasks (title, description, merit, icon)
            VALUES ($1, $2, $3, $4)
            RETURNING id, title, description, merit, icon
            "#,
        )
        .bind(data.title)
        .bind(data.description)
        .bind(data.merit)
        .bind(data.icon)
        .fetch_one(executor)
        .await
    }

    pub async fn find_by_id<'e, E>(executor: E, id: i64) -> Result<Option<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, ShareTask>(
            "SELECT id, title, description, merit, icon FROM share_tasks WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(executor)
        .await
    }

    pub async fn list<'e, E>(executor: E) -> Result<Vec<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, ShareTask>(
            "SELECT id, title, description, merit, icon FROM share_tasks ORDER BY id",
        )
        .fetch_all(executor)
        .await
    }

    pub async fn delete<'e, E>(executor: E, id: i64) -> Result<bool, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let result = sqlx::query("DELETE FROM share_tasks WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

impl UserShareTask {
    /// Marks `task_id` completed for `user_id`.
    ///
    /// Returns the completion and whether this call completed it. A row
    /// left incomplete by older data is upgraded; an already completed row
    /// keeps its original `completed_at`.
    pub async fn complete(
        conn: &mut PgConnection,
        user_id: i64,
        task_id: i64,
    ) -> Result<(Self, bool), sqlx::Error> {
        let newly_completed = sqlx::query(
            r#"
            INSERT INTO user_share_tasks (user_id, task_id, completed, completed_at)
            VALUES ($1, $2, TRUE, NOW())
            ON CONFLICT (user_id, task_id) DO UPDATE
                SET completed = TRUE, completed_at = NOW()
                WHERE user_share_tasks.completed = FALSE
            "#,
        )
        .bind(user_id)
        .bind(task_id)
        .execute(&mut *conn)
        .await?
        .rows_affected()
            > 0;

        let progress = sqlx::query_as::<_, UserShareTask>(
            r#"
            SELECT t.id, t.title, t.description, t.merit, t.icon,
                   ust.completed, ust.completed_at
            FROM user_share_tasks ust
            JOIN share_tasks t ON t.id = ust.task_id
            WHERE ust.user_id = $1 AND ust.task_id = $2
            "#,
        )
        .bind(user_id)
        .bind(task_id)
        .fetch_one(&mut *conn)
        .await?;

        Ok((progress, newly_completed))
    }

    pub async fn list_by_user<'e, E>(executor: E, user_id: i64) -> Result<Vec<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, UserShareTask>(
            r#"
            SELECT t.id, t.title, t.description, t.merit, t.icon,
                   ust.completed, ust.completed_at
            FROM user_share_tasks ust
            JOIN share_tasks t ON t.id = ust.task_id
            WHERE ust.user_id = $1
            ORDER BY ust.id
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
    fn test_user_share_task_serializes_nested() {
        let progress = UserShareTask {
            task: ShareTask {
                id: 1,
                title: "分享到朋友圈".to_string(),
                description: "把今日功德分享给好友".to_string(),
                merit: 50,
                icon: "moments.png".to_string(),
            },
            completed: true,
            completed_at: Some(Utc::now()),
        };

        let json = serde_json::to_value(&progress).expect("serialize");
        assert_eq!(json["task"]["merit"], 50);
        assert_eq!(json["completed"], true);
        assert!(json["completed_at"].is_string());
    }
}
