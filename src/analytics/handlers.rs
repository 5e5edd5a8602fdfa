use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{error, instrument};

use super::report::{DailyBucket, MacroSplit, WeeklyBucket};
use crate::auth::AuthUser;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct WeeklyParams {
    #[serde(default = "default_weeks_back")]
    pub weeks_back: u32,
}

#[derive(Debug, Deserialize)]
pub struct DailyParams {
    #[serde(default = "default_days_back")]
    pub days_back: u32,
}

fn default_weeks_back() -> u32 {
    4
}

fn default_days_back() -> u32 {
    7
}

#[derive(Debug, Serialize, Deserialize)]
pub struct GoalBody {
    pub daily_calories_goal: i32,
}

#[derive(Debug, Serialize)]
pub struct GoalResponse {
    pub daily_calories_goal: Option<i32>,
}

#[instrument(skip(state))]
pub async fn weekly(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Query(p): Query<WeeklyParams>,
) -> Json<Vec<WeeklyBucket>> {
    Json(state.reports.weekly_totals(Some(user_id), p.weeks_back).await)
}

#[instrument(skip(state))]
pub async fn daily_goals(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Query(p): Query<DailyParams>,
) -> Json<Vec<DailyBucket>> {
    Json(
        state
            .reports
            .daily_goal_progress(Some(user_id), p.days_back)
            .await,
    )
}

#[instrument(skip(state))]
pub async fn macros(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Query(p): Query<DailyParams>,
) -> Json<Option<MacroSplit>> {
    Json(
        state
            .reports
            .macro_distribution(Some(user_id), p.days_back)
            .await,
    )
}

#[instrument(skip(state))]
pub async fn get_goal(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<GoalResponse>, (StatusCode, String)> {
    let goal = super::repo::daily_goal(&state.db, user_id)
        .await
        .map_err(|e| {
            error!(error = %e, %user_id, "goal lookup failed");
            (StatusCode::INTERNAL_SERVER_ERROR, "goal lookup failed".into())
        })?;
    Ok(Json(GoalResponse {
        daily_calories_goal: goal,
    }))
}

#[instrument(skip(state))]
pub async fn put_goal(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(body): Json<GoalBody>,
) -> Result<Json<GoalBody>, (StatusCode, String)> {
    if body.daily_calories_goal <= 0 {
        return Err((
            StatusCode::UNPROCESSABLE_ENTITY,
            "daily_calories_goal must be positive".into(),
        ));
    }
    super::repo::set_daily_goal(&state.db, user_id, body.daily_calories_goal)
        .await
        .map_err(|e| {
            error!(error = %e, %user_id, "goal update failed");
            (StatusCode::INTERNAL_SERVER_ERROR, "goal update failed".into())
        })?;
    Ok(Json(body))
}
