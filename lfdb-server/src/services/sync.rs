//! Channel synchronization
//!
//! Two entry points: the incremental sync run by cron (videos newer than
//! the latest one stored) and the manual paginated backfill.

use serde::Serialize;
use tracing::{debug, info};

use lfdb_common::time;

use crate::db::videos;
use crate::youtube::{VideoData, MAX_PAGE_SIZE};
use crate::{ApiResult, AppState};

/// How far back the first incremental sync reaches
pub const INITIAL_LOOKBACK_DAYS: i64 = 365;

/// Upper bound on videos fetched by one backfill
pub const BACKFILL_CAP: usize = 500;

pub const DEFAULT_BACKFILL_RESULTS: usize = 50;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncStats {
    pub total: usize,
    pub saved: usize,
    pub updated: usize,
    pub skipped: usize,
}

async fn save_new_video(state: &AppState, mut video: VideoData) -> ApiResult<()> {
    video.transcript = state.transcripts.fetch(&video.youtube_id).await;
    videos::insert_video(&state.db, &video).await?;
    info!(
        youtube_id = %video.youtube_id,
        has_transcript = video.transcript.is_some(),
        "Saved video: {}",
        video.title
    );
    Ok(())
}

/// Store videos published since the newest one in the library
pub async fn sync_new_videos(state: &AppState) -> ApiResult<SyncStats> {
    let youtube = state.youtube()?;
    let channel_id = state.channel_id()?;

    let after = videos::latest_published_at(&state.db)
        .await?
        .unwrap_or_else(|| time::days_ago(INITIAL_LOOKBACK_DAYS));
    info!(%after, "Fetching videos published after");

    let new_videos = youtube
        .get_new_videos(channel_id, after, MAX_PAGE_SIZE)
        .await?;
    info!("Found {} new videos", new_videos.len());

    let mut stats = SyncStats {
        total: new_videos.len(),
        ..Default::default()
    };

    for video in new_videos {
        if videos::exists_by_youtube_id(&state.db, &video.youtube_id).await? {
            debug!(youtube_id = %video.youtube_id, "Video already exists, skipping");
            stats.skipped += 1;
            continue;
        }

        save_new_video(state, video).await?;
        stats.saved += 1;
    }

    Ok(stats)
}

/// Fetch up to `max_results` of the channel's videos, following page tokens
async fn fetch_backfill(state: &AppState, max_results: usize) -> ApiResult<Vec<VideoData>> {
    let youtube = state.youtube()?;
    let channel_id = state.channel_id()?;

    let target = max_results.clamp(1, BACKFILL_CAP);
    let mut collected: Vec<VideoData> = Vec::with_capacity(target);
    let mut page_token: Option<String> = None;
    let mut page = 0usize;

    loop {
        page += 1;
        let page_size = (target - collected.len()).min(MAX_PAGE_SIZE as usize) as u32;
        let result = youtube
            .get_channel_videos(channel_id, page_size, page_token.as_deref())
            .await?;

        let fetched = result.videos.len();
        collected.extend(result.videos);
        debug!(page, fetched, total = collected.len(), "Fetched backfill page");

        match result.next_page_token {
            Some(token) if fetched > 0 && collected.len() < target => page_token = Some(token),
            _ => break,
        }
    }

    collected.truncate(target);
    Ok(collected)
}

/// Manual backfill: refresh known videos and store new ones
pub async fn sync_channel(state: &AppState, max_results: usize) -> ApiResult<SyncStats> {
    info!("Manually fetching up to {} videos", max_results.min(BACKFILL_CAP));

    let fetched = fetch_backfill(state, max_results).await?;
    info!("Found {} videos", fetched.len());

    let mut stats = SyncStats {
        total: fetched.len(),
        ..Default::default()
    };

    for video in fetched {
        if videos::update_video_metadata(&state.db, &video).await? {
            stats.updated += 1;
            continue;
        }

        save_new_video(state, video).await?;
        stats.saved += 1;
    }

    Ok(stats)
}
