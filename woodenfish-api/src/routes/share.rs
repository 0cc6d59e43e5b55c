/// Share task endpoints
///
/// # Endpoints
///
/// - `GET /share/tasks` - Task catalog
/// - `POST /share/:user_id/complete/:task_id` - Complete a task (idempotent)
/// - `GET /share/:user_id/user` - A user's completions

use crate::{
    app::AppState,
    error::{messages, ApiError, ApiResult},
};
use axum::{
    extract::{Path, State},
    Json,
};
use woodenfish_shared::models::{
    share_task::{ShareTask, UserShareTask},
    user::User,
};

pub async fn list_tasks(State(state): State<AppState>) -> ApiResult<Json<Vec<ShareTask>>> {
    Ok(Json(ShareTask::list(&state.db).await?))
}

/// Complete a share task
///
/// The task's merit is credited on the first completion only; repeating
/// the call returns the existing completion.
///
/// # Errors
///
/// - `404 Not Found`: Unknown user or task
pub async fn complete_task(
    State(state): State<AppState>,
    Path((user_id, task_id)): Path<(i64, i64)>,
) -> ApiResult<Json<UserShareTask>> {
    let mut tx = state.db.begin().await?;

    if !User::exists(&mut *tx, user_id).await? {
        return Err(ApiError::NotFound(messages::USER_NOT_FOUND.to_string()));
    }

    let task = ShareTask::find_by_id(&mut *tx, task_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(messages::SHARE_TASK_NOT_FOUND.to_string()))?;

    let (progress, newly_completed) = UserShareTask::complete(&mut tx, user_id, task_id).await?;

    if newly_completed {
        User::add_merit_points(&mut *tx, user_id, task.merit).await?;
        tracing::info!(user_id, task_id, merit = task.merit, "Share task completed");
    }

    tx.commit().await?;

    Ok(Json(progress))
}

pub async fn list_user_tasks(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> ApiResult<Json<Vec<UserShareTask>>> {
    Ok(Json(UserShareTask::list_by_user(&state.db, user_id).await?))
}
