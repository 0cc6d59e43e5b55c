/// Achievement endpoints
///
/// # Endpoints
///
/// - `GET /achievements` - Whole catalog
/// - `POST /achievements/:user_id/unlock/:achievement_id` - Unlock (idempotent)
/// - `GET /achievements/:user_id/user` - A user's unlocks

use crate::{
    app::AppState,
    error::{messages, ApiError, ApiResult},
};
use axum::{
    extract::{Path, State},
    Json,
};
use woodenfish_shared::models::{
    achievement::{Achievement, UnlockedAchievement},
    user::User,
};

pub async fn list_achievements(State(state): State<AppState>) -> ApiResult<Json<Vec<Achievement>>> {
    Ok(Json(Achievement::list(&state.db).await?))
}

/// Unlock an achievement for a user
///
/// Unlocking twice returns the first unlock unchanged.
///
/// # Response
///
/// ```json
/// {
///   "achievement": { "id": 1, "name": "初心", "description": "...", "icon": "..." },
///   "unlocked_at": "2025-03-01T08:30:00Z"
/// }
/// ```
///
/// # Errors
///
/// - `404 Not Found`: Unknown user or achievement
pub async fn unlock_achievement(
    State(state): State<AppState>,
    Path((user_id, achievement_id)): Path<(i64, i64)>,
) -> ApiResult<Json<UnlockedAchievement>> {
    let mut conn = state.db.acquire().await?;

    if !User::exists(&mut *conn, user_id).await? {
        return Err(ApiError::NotFound(messages::USER_NOT_FOUND.to_string()));
    }

    if Achievement::find_by_id(&mut *conn, achievement_id).await?.is_none() {
        return Err(ApiError::NotFound(messages::ACHIEVEMENT_NOT_FOUND.to_string()));
    }

    let (unlocked, created) = UnlockedAchievement::unlock(&mut conn, user_id, achievement_id).await?;

    if created {
        tracing::info!(user_id, achievement_id, "Achievement unlocked");
    }

    Ok(Json(unlocked))
}

pub async fn list_user_achievements(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> ApiResult<Json<Vec<UnlockedAchievement>>> {
    Ok(Json(UnlockedAchievement::list_by_user(&state.db, user_id).await?))
}
