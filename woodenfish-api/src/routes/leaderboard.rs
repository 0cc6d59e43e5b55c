/// Leaderboard endpoint
///
/// ```text
/// GET /leaderboard/:period?limit=10
/// ```
///
/// Rows are written by an offline ranking job; any period string is
/// accepted and an unknown one yields an empty list.

use crate::{app::AppState, error::ApiResult};
use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use woodenfish_shared::models::{leaderboard::LeaderboardEntry, meditation_session::clamp_limit};

#[derive(Debug, Deserialize)]
pub struct LeaderboardQuery {
    pub limit: Option<i64>,
}

pub async fn get_leaderboard(
    State(state): State<AppState>,
    Path(period): Path<String>,
    Query(query): Query<LeaderboardQuery>,
) -> ApiResult<Json<Vec<LeaderboardEntry>>> {
    let rows = LeaderboardEntry::list_by_period(&state.db, &period, clamp_limit(query.limit)).await?;

    Ok(Json(rows))
}
