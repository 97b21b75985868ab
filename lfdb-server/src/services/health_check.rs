//! Video availability reconciliation
//!
//! Active videos are looked up in batches of 50 (one quota unit each) and
//! moved to PRIVATE, BLOCKED, UNAVAILABLE or DELETED when YouTube reports
//! them so. Only ACTIVE videos are checked; a video never returns to
//! ACTIVE through this job.

use serde::Serialize;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{info, warn};

use lfdb_common::db::models::{Video, VideoStatus};
use lfdb_common::time;

use crate::db::videos;
use crate::youtube::VideoStatusInfo;
use crate::{ApiResult, AppState};

pub const HEALTH_BATCH_SIZE: usize = 50;
pub const BATCH_PAUSE: Duration = Duration::from_millis(100);
pub const NOT_FOUND_REASON: &str = "Video not found in YouTube API response";

/// Local status for a video YouTube returned, with the reason if not ACTIVE
pub fn classify(info: &VideoStatusInfo) -> (VideoStatus, Option<String>) {
    if info.privacy_status == "private" {
        (VideoStatus::Private, Some("Video is private".to_string()))
    } else if !info.embeddable {
        (VideoStatus::Blocked, Some("Embedding disabled".to_string()))
    } else if info.upload_status != "processed" {
        (
            VideoStatus::Unavailable,
            Some(format!("Upload status: {}", info.upload_status)),
        )
    } else {
        (VideoStatus::Active, None)
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusChange {
    pub youtube_id: String,
    pub title: String,
    pub previous_status: VideoStatus,
    pub new_status: VideoStatus,
    pub reason: String,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthReport {
    pub checked: usize,
    pub unchanged: usize,
    pub now_unavailable: usize,
    pub newly_available: usize,
    pub details: Vec<StatusChange>,
}

/// Record one video's outcome; `Ok(None)` means still ACTIVE
async fn apply_one(
    state: &AppState,
    video: &Video,
    found: &HashMap<String, VideoStatusInfo>,
) -> ApiResult<Option<StatusChange>> {
    let now = time::now();

    let (new_status, reason) = match found.get(&video.youtube_id) {
        Some(info) => classify(info),
        None => (VideoStatus::Deleted, Some(NOT_FOUND_REASON.to_string())),
    };

    if new_status == VideoStatus::Active {
        videos::touch_last_checked(&state.db, &video.id, now).await?;
        return Ok(None);
    }

    let reason = reason.unwrap_or_default();
    videos::set_video_status(&state.db, &video.id, new_status, Some(&reason), now).await?;
    info!(
        youtube_id = %video.youtube_id,
        status = %new_status,
        "Video no longer available: {}",
        reason
    );

    Ok(Some(StatusChange {
        youtube_id: video.youtube_id.clone(),
        title: video.title.clone(),
        previous_status: video.status,
        new_status,
        reason,
    }))
}

/// Apply a batch lookup; videos whose update fails are left out of the report
async fn apply_batch(
    state: &AppState,
    batch: &[Video],
    found: &HashMap<String, VideoStatusInfo>,
    report: &mut HealthReport,
) {
    for video in batch {
        match apply_one(state, video, found).await {
            Ok(None) => {
                report.checked += 1;
                report.unchanged += 1;
            }
            Ok(Some(change)) => {
                report.checked += 1;
                report.now_unavailable += 1;
                report.details.push(change);
            }
            Err(e) => {
                warn!(youtube_id = %video.youtube_id, error = %e, "Failed to record video status");
            }
        }
    }
}

/// Check every ACTIVE video against the YouTube API
///
/// A batch whose API call fails is skipped and its videos are not counted,
/// nor is a video whose status could not be written.
pub async fn check_video_health(state: &AppState) -> ApiResult<HealthReport> {
    let youtube = state.youtube()?;

    let active = videos::list_by_status(&state.db, VideoStatus::Active).await?;
    info!("Checking health of {} active videos", active.len());

    let mut report = HealthReport::default();

    for (index, batch) in active.chunks(HEALTH_BATCH_SIZE).enumerate() {
        if index > 0 {
            tokio::time::sleep(BATCH_PAUSE).await;
        }

        let ids: Vec<String> = batch.iter().map(|v| v.youtube_id.clone()).collect();
        let found = match youtube.get_video_statuses(&ids).await {
            Ok(found) => found,
            Err(e) => {
                warn!(batch = index, error = %e, "Status lookup failed, skipping batch");
                continue;
            }
        };

        apply_batch(state, batch, &found, &mut report).await;
    }

    info!(
        checked = report.checked,
        unchanged = report.unchanged,
        now_unavailable = report.now_unavailable,
        "Video health check complete"
    );

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info(privacy: &str, embeddable: bool, upload: &str) -> VideoStatusInfo {
        VideoStatusInfo {
            youtube_id: "x".into(),
            upload_status: upload.into(),
            privacy_status: privacy.into(),
            embeddable,
            title: "t".into(),
        }
    }

    #[test]
    fn test_classify_active() {
        assert_eq!(classify(&info("public", true, "processed")), (VideoStatus::Active, None));
        assert_eq!(classify(&info("unlisted", true, "processed")).0, VideoStatus::Active);
    }

    #[test]
    fn test_classify_precedence() {
        // Private wins over every other signal
        let (status, reason) = classify(&info("private", false, "failed"));
        assert_eq!(status, VideoStatus::Private);
        assert_eq!(reason.as_deref(), Some("Video is private"));

        let (status, reason) = classify(&info("public", false, "failed"));
        assert_eq!(status, VideoStatus::Blocked);
        assert_eq!(reason.as_deref(), Some("Embedding disabled"));

        let (status, reason) = classify(&info("public", true, "rejected"));
        assert_eq!(status, VideoStatus::Unavailable);
        assert_eq!(reason.as_deref(), Some("Upload status: rejected"));
    }
}
