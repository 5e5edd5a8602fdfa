use axum::{
    extract::{DefaultBodyLimit, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use bytes::Bytes;
use tracing::instrument;

use super::dto::{CaptureRequest, CaptureResponse, ClearResponse, HistoryQuery};
use super::services;
use super::store::ClearOutcome;
use crate::auth::AuthUser;
use crate::history::record::AnalysisRecord;
use crate::quota::QuotaDecision;
use crate::state::AppState;

pub fn read_routes() -> Router<AppState> {
    Router::new()
        .route("/quota", get(get_quota))
        .route("/history", get(list_history).delete(clear_history))
}

pub fn write_routes() -> Router<AppState> {
    Router::new()
        .route("/capture", post(capture))
        .layer(DefaultBodyLimit::max(20 * 1024 * 1024)) // 20MB
}

#[instrument(skip(state))]
async fn get_quota(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<QuotaDecision>, (StatusCode, String)> {
    let decision = state
        .quota
        .can_proceed(Some(user_id))
        .await
        .map_err(|e| e.http())?;
    Ok(Json(decision))
}

#[instrument(skip(state, body))]
async fn capture(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(body): Json<CaptureRequest>,
) -> Result<Json<CaptureResponse>, (StatusCode, String)> {
    if body.image.is_empty() {
        return Err((StatusCode::BAD_REQUEST, "image is required".into()));
    }
    let content_type = body.content_type.as_deref().unwrap_or("image/jpeg");

    let outcome = services::analyze_and_record(
        &state.quota,
        state.inference.as_ref(),
        state.images.as_ref(),
        &state.history,
        Some(user_id),
        Bytes::from(body.image.into_vec()),
        content_type,
    )
    .await
    .map_err(|e| e.http())?;

    Ok(Json(CaptureResponse {
        record: outcome.record,
        tier: outcome.tier,
        stored: outcome.stored,
        quota: outcome.quota,
    }))
}

#[instrument(skip(state))]
async fn list_history(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Query(p): Query<HistoryQuery>,
) -> Result<Json<Vec<AnalysisRecord>>, (StatusCode, String)> {
    let records = state
        .history
        .list(Some(user_id), p.q.as_deref())
        .await
        .map_err(|e| e.http())?;
    Ok(Json(records))
}

#[instrument(skip(state))]
async fn clear_history(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<ClearResponse>, (StatusCode, String)> {
    let outcome = state
        .history
        .clear(Some(user_id))
        .await
        .map_err(|e| e.http())?;
    Ok(Json(match outcome {
        ClearOutcome::Hidden(count) => ClearResponse {
            cleared: true,
            hidden: Some(count),
        },
        ClearOutcome::Wiped => ClearResponse {
            cleared: true,
            hidden: None,
        },
    }))
}
