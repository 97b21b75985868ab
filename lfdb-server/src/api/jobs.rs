//! Admin-triggered sync and extraction jobs

use axum::{
    extract::{Path, State},
    response::{IntoResponse, Response},
    routing::post,
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;

use super::CurrentUser;

use crate::services::extraction::{
    self, BatchItemResult, BatchStats, ExtractionOutcome, DEFAULT_BATCH_LIMIT,
};
use crate::services::sync::{self, SyncStats, DEFAULT_BACKFILL_RESULTS};
use crate::{ApiResult, AppState};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncRequest {
    pub max_results: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct SyncResponse {
    pub success: bool,
    pub message: String,
    pub stats: SyncStats,
}

#[derive(Debug, Serialize)]
pub struct ExtractResponse {
    pub success: bool,
    pub message: String,
    pub data: ExtractionOutcome,
}

#[derive(Debug, Default, Deserialize)]
pub struct BatchRequest {
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct BatchResponse {
    pub success: bool,
    pub message: String,
    pub stats: BatchStats,
    pub results: Vec<BatchItemResult>,
}

/// POST /api/videos/sync
///
/// The body is optional; `maxResults` defaults to 50.
pub async fn sync_videos(
    State(state): State<AppState>,
    Extension(CurrentUser(admin)): Extension<CurrentUser>,
    body: Option<Json<SyncRequest>>,
) -> ApiResult<Json<SyncResponse>> {
    let max_results = body
        .and_then(|Json(b)| b.max_results)
        .unwrap_or(DEFAULT_BACKFILL_RESULTS);
    info!(admin = %admin.email, max_results, "Manual sync requested");

    let stats = sync::sync_channel(&state, max_results).await?;

    Ok(Json(SyncResponse {
        success: true,
        message: "Manual sync completed".to_string(),
        stats,
    }))
}

/// POST /api/extract/:videoId
pub async fn extract_video(
    State(state): State<AppState>,
    Extension(CurrentUser(admin)): Extension<CurrentUser>,
    Path(video_id): Path<String>,
) -> ApiResult<Json<ExtractResponse>> {
    info!(admin = %admin.email, video_id = %video_id, "Extraction requested");
    let data = extraction::process_video(&state, &video_id).await?;

    Ok(Json(ExtractResponse {
        success: true,
        message: "Repair data extracted successfully".to_string(),
        data,
    }))
}

/// POST /api/extract/batch
pub async fn extract_batch(
    State(state): State<AppState>,
    Extension(CurrentUser(admin)): Extension<CurrentUser>,
    body: Option<Json<BatchRequest>>,
) -> ApiResult<Response> {
    let limit = body
        .and_then(|Json(b)| b.limit)
        .unwrap_or(DEFAULT_BATCH_LIMIT);
    info!(admin = %admin.email, limit, "Batch extraction requested");

    let outcome = extraction::process_batch(&state, limit).await?;

    if outcome.stats.total == 0 {
        return Ok(Json(json!({
            "success": true,
            "message": "No unprocessed videos found",
            "processed": 0,
        }))
        .into_response());
    }

    Ok(Json(BatchResponse {
        success: true,
        message: "Batch extraction completed".to_string(),
        stats: outcome.stats,
        results: outcome.results,
    })
    .into_response())
}

pub fn jobs_routes() -> Router<AppState> {
    Router::new()
        .route("/api/videos/sync", post(sync_videos))
        .route("/api/extract/batch", post(extract_batch))
        .route("/api/extract/:video_id", post(extract_video))
}
