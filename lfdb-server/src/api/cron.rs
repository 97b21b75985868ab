//! Cron-triggered jobs, guarded by [`super::require_cron_secret`]

use axum::{extract::State, routing::get, Json, Router};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

use lfdb_common::time;

use crate::services::health_check::{self, HealthReport};
use crate::services::sync;
use crate::{ApiResult, AppState};

#[derive(Debug, Serialize)]
pub struct CronSyncStats {
    pub total: usize,
    pub saved: usize,
    pub skipped: usize,
}

#[derive(Debug, Serialize)]
pub struct CronSyncResponse {
    pub success: bool,
    pub message: String,
    pub stats: CronSyncStats,
}

#[derive(Debug, Serialize)]
pub struct CronHealthResponse {
    pub success: bool,
    pub timestamp: DateTime<Utc>,
    #[serde(flatten)]
    pub report: HealthReport,
}

/// GET /api/cron/sync-videos
pub async fn sync_videos(State(state): State<AppState>) -> ApiResult<Json<CronSyncResponse>> {
    info!("Starting scheduled video sync");
    let stats = sync::sync_new_videos(&state).await?;
    info!(saved = stats.saved, skipped = stats.skipped, "Video sync finished");

    Ok(Json(CronSyncResponse {
        success: true,
        message: "Sync completed".to_string(),
        stats: CronSyncStats {
            total: stats.total,
            saved: stats.saved,
            skipped: stats.skipped,
        },
    }))
}

/// GET /api/cron/check-video-health
pub async fn check_video_health(
    State(state): State<AppState>,
) -> ApiResult<Json<CronHealthResponse>> {
    info!("Starting video health check");
    let report = health_check::check_video_health(&state).await?;

    Ok(Json(CronHealthResponse {
        success: true,
        timestamp: time::now(),
        report,
    }))
}

pub fn cron_routes() -> Router<AppState> {
    Router::new()
        .route("/api/cron/sync-videos", get(sync_videos))
        .route("/api/cron/check-video-health", get(check_video_health))
}
