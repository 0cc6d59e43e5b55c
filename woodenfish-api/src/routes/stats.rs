/// Tap statistics endpoint
///
/// # Endpoint
///
/// ```text
/// GET /stats/:user_id
/// ```
///
/// # Response
///
/// ```json
/// {
///   "total_taps": 1080,
///   "today_taps": 108,
///   "consecutive_days": 7,
///   "last_tap_date": "2025-03-01T08:30:00Z"
/// }
/// ```

use crate::{
    app::AppState,
    error::{messages, ApiError, ApiResult},
};
use axum::{
    extract::{Path, State},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use woodenfish_shared::models::user_stat::UserStat;

/// Statistics response
#[derive(Debug, Serialize, Deserialize)]
pub struct StatsOut {
    pub total_taps: i64,
    pub today_taps: i64,
    pub consecutive_days: i32,
    pub last_tap_date: Option<DateTime<Utc>>,
}

impl From<UserStat> for StatsOut {
    fn from(stat: UserStat) -> Self {
        Self {
            total_taps: stat.total_taps,
            today_taps: stat.today_taps,
            consecutive_days: stat.consecutive_days,
            last_tap_date: stat.last_tap_date,
        }
    }
}

pub async fn get_stats(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> ApiResult<Json<StatsOut>> {
    let stat = UserStat::find_by_user(&state.db, user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(messages::STATS_NOT_FOUND.to_string()))?;

    Ok(Json(stat.into()))
}
