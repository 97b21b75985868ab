//! Dashboard counters

use serde::Serialize;
use sqlx::SqlitePool;

use lfdb_common::Result;

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct VideoCounts {
    pub total: i64,
    pub processed: i64,
    pub unprocessed: i64,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RepairCounts {
    pub total: i64,
    pub pending: i64,
    pub approved: i64,
    pub rejected: i64,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct VideoHealthCounts {
    pub active: i64,
    pub unavailable: i64,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Stats {
    pub videos: VideoCounts,
    pub repairs: RepairCounts,
    pub brands: i64,
    pub problem_types: i64,
    pub video_health: VideoHealthCounts,
}

async fn count(pool: &SqlitePool, sql: &str) -> Result<i64> {
    let n: i64 = sqlx::query_scalar(sql).fetch_one(pool).await?;
    Ok(n)
}

pub async fn collect_stats(pool: &SqlitePool) -> Result<Stats> {
    let total_videos = count(pool, "SELECT COUNT(*) FROM videos").await?;
    let processed = count(pool, "SELECT COUNT(*) FROM videos WHERE processed = 1").await?;
    let active = count(pool, "SELECT COUNT(*) FROM videos WHERE status = 'ACTIVE'").await?;

    Ok(Stats {
        videos: VideoCounts {
            total: total_videos,
            processed,
            unprocessed: total_videos - processed,
        },
        repairs: RepairCounts {
            total: count(pool, "SELECT COUNT(*) FROM repairs").await?,
            pending: count(pool, "SELECT COUNT(*) FROM repairs WHERE status = 'PENDING_REVIEW'")
                .await?,
            approved: count(pool, "SELECT COUNT(*) FROM repairs WHERE status = 'APPROVED'").await?,
            rejected: count(pool, "SELECT COUNT(*) FROM repairs WHERE status = 'REJECTED'").await?,
        },
        brands: count(pool, "SELECT COUNT(*) FROM brands").await?,
        problem_types: count(pool, "SELECT COUNT(*) FROM problem_types").await?,
        video_health: VideoHealthCounts {
            active,
            unavailable: total_videos - active,
        },
    })
}
