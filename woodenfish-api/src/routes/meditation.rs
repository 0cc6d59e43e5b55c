/// Meditation session endpoints
///
/// Logging a session is the only thing that moves a user's statistics and
/// earns tap merit, and it does all of it in one transaction.
///
/// # Endpoints
///
/// - `POST /meditation/:user_id/sessions` - Log a session
/// - `GET /meditation/:user_id/sessions?limit=` - Recent sessions, newest first

use crate::{
    app::AppState,
    error::{messages, ApiError, ApiResult},
};
use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;
use woodenfish_shared::models::{
    meditation_session::{clamp_limit, CreateMeditationSession, MeditationSession},
    user::User,
    user_stat::UserStat,
};

/// Create session request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateSessionRequest {
    /// Seconds
    #[validate(range(min = 0, message = "时长不能为负数"))]
    pub duration: i32,

    #[validate(range(min = 0, message = "敲击次数不能为负数"))]
    pub tap_count: i32,
}

/// Session response
#[derive(Debug, Serialize, Deserialize)]
pub struct MeditationSessionOut {
    pub id: i64,
    pub duration: i32,
    pub tap_count: i32,
    pub created_at: DateTime<Utc>,
}

impl From<MeditationSession> for MeditationSessionOut {
    fn from(session: MeditationSession) -> Self {
        Self {
            id: session.id,
            duration: session.duration,
            tap_count: session.tap_count,
            created_at: session.created_at,
        }
    }
}

/// Pagination query
#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub limit: Option<i64>,
}

/// Log a meditation session
///
/// Inserts the session, advances the user's statistics and adds one merit
/// point per tap.
///
/// # Errors
///
/// - `404 Not Found`: Unknown user
/// - `422 Unprocessable Entity`: Negative duration or tap count
pub async fn create_session(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
    Json(req): Json<CreateSessionRequest>,
) -> ApiResult<Json<MeditationSessionOut>> {
    req.validate()?;

    let mut tx = state.db.begin().await?;

    if !User::exists(&mut *tx, user_id).await? {
        return Err(ApiError::NotFound(messages::USER_NOT_FOUND.to_string()));
    }

    let session = MeditationSession::create(
        &mut *tx,
        CreateMeditationSession {
            user_id,
            duration: req.duration,
            tap_count: req.tap_count,
        },
    )
    .await?;

    let taps = i64::from(req.tap_count);
    let stat = UserStat::apply_taps(&mut tx, user_id, taps, session.created_at).await?;
    User::add_merit_points(&mut *tx, user_id, taps).await?;

    tx.commit().await?;

    tracing::debug!(
        user_id,
        session_id = session.id,
        taps,
        consecutive_days = stat.consecutive_days,
        "Meditation session logged"
    );

    Ok(Json(session.into()))
}

pub async fn list_sessions(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<Vec<MeditationSessionOut>>> {
    let sessions = MeditationSession::list_by_user(&state.db, user_id, clamp_limit(query.limit)).await?;

    Ok(Json(sessions.into_iter().map(Into::into).collect()))
}
