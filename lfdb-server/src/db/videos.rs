//! Video persistence

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use lfdb_common::db::models::{RepairStatus, Video, VideoStatus};
use lfdb_common::normalize::search_key;
use lfdb_common::{time, Result};

use crate::youtube::VideoData;

const VIDEO_COLUMNS: &str = "id, youtube_id, title, description, thumbnail_url, duration, \
     published_at, transcript, processed, status, unavailable_at, unavailable_reason, \
     last_checked_at, created_at, updated_at";

pub(crate) fn video_from_row(row: &SqliteRow) -> Result<Video> {
    let status: String = row.try_get("status")?;
    Ok(Video {
        id: row.try_get("id")?,
        youtube_id: row.try_get("youtube_id")?,
        title: row.try_get("title")?,
        description: row.try_get("description")?,
        thumbnail_url: row.try_get("thumbnail_url")?,
        duration: row.try_get("duration")?,
        published_at: row.try_get("published_at")?,
        transcript: row.try_get("transcript")?,
        processed: row.try_get("processed")?,
        status: status.parse()?,
        unavailable_at: row.try_get("unavailable_at")?,
        unavailable_reason: row.try_get("unavailable_reason")?,
        last_checked_at: row.try_get("last_checked_at")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

/// Newest `published_at` in the library
pub async fn latest_published_at(pool: &SqlitePool) -> Result<Option<DateTime<Utc>>> {
    let latest: Option<DateTime<Utc>> = sqlx::query_scalar("SELECT MAX(published_at) FROM videos")
        .fetch_one(pool)
        .await?;
    Ok(latest)
}

pub async fn exists_by_youtube_id(pool: &SqlitePool, youtube_id: &str) -> Result<bool> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM videos WHERE youtube_id = ?")
        .bind(youtube_id)
        .fetch_one(pool)
        .await?;
    Ok(count > 0)
}

fn video_search_key(video: &VideoData) -> String {
    search_key(&format!("{}\n{}", video.title, video.description))
}

/// Insert a new, unprocessed, active video; returns its ID
pub async fn insert_video(pool: &SqlitePool, video: &VideoData) -> Result<String> {
    let id = Uuid::new_v4().to_string();
    let now = time::now();

    sqlx::query(
        r#"
        INSERT INTO videos (
            id, youtube_id, title, description, thumbnail_url, duration,
            published_at, transcript, search_key, processed, status, created_at, updated_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, 0, 'ACTIVE', ?, ?)
        "#,
    )
    .bind(&id)
    .bind(&video.youtube_id)
    .bind(&video.title)
    .bind(&video.description)
    .bind(&video.thumbnail_url)
    .bind(&video.duration)
    .bind(video.published_at)
    .bind(&video.transcript)
    .bind(video_search_key(video))
    .bind(now)
    .bind(now)
    .execute(pool)
    .await?;

    Ok(id)
}

/// Refresh title, description, thumbnail and duration of a known video
///
/// Returns false when no row has this YouTube ID.
pub async fn update_video_metadata(pool: &SqlitePool, video: &VideoData) -> Result<bool> {
    let result = sqlx::query(
        r#"
        UPDATE videos
        SET title = ?, description = ?, search_key = ?, thumbnail_url = ?, duration = ?,
            updated_at = ?
        WHERE youtube_id = ?
        "#,
    )
    .bind(&video.title)
    .bind(&video.description)
    .bind(video_search_key(video))
    .bind(&video.thumbnail_url)
    .bind(&video.duration)
    .bind(time::now())
    .bind(&video.youtube_id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

pub async fn get_video(pool: &SqlitePool, id: &str) -> Result<Option<Video>> {
    let row = sqlx::query(&format!("SELECT {} FROM videos WHERE id = ?", VIDEO_COLUMNS))
        .bind(id)
        .fetch_optional(pool)
        .await?;

    row.as_ref().map(video_from_row).transpose()
}

/// Unprocessed videos, newest first
pub async fn list_unprocessed(pool: &SqlitePool, limit: i64) -> Result<Vec<Video>> {
    let rows = sqlx::query(&format!(
        "SELECT {} FROM videos WHERE processed = 0 ORDER BY published_at DESC LIMIT ?",
        VIDEO_COLUMNS
    ))
    .bind(limit)
    .fetch_all(pool)
    .await?;

    rows.iter().map(video_from_row).collect()
}

pub async fn list_by_status(pool: &SqlitePool, status: VideoStatus) -> Result<Vec<Video>> {
    let rows = sqlx::query(&format!(
        "SELECT {} FROM videos WHERE status = ? ORDER BY published_at DESC",
        VIDEO_COLUMNS
    ))
    .bind(status.as_str())
    .fetch_all(pool)
    .await?;

    rows.iter().map(video_from_row).collect()
}

pub async fn mark_processed(pool: &SqlitePool, id: &str) -> Result<()> {
    sqlx::query("UPDATE videos SET processed = 1, updated_at = ? WHERE id = ?")
        .bind(time::now())
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

/// Record an availability change detected by the health check
pub async fn set_video_status(
    pool: &SqlitePool,
    id: &str,
    status: VideoStatus,
    reason: Option<&str>,
    checked_at: DateTime<Utc>,
) -> Result<()> {
    sqlx::query(
        r#"
        UPDATE videos
        SET status = ?, unavailable_at = ?, unavailable_reason = ?,
            last_checked_at = ?, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(status.as_str())
    .bind(checked_at)
    .bind(reason)
    .bind(checked_at)
    .bind(checked_at)
    .bind(id)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn touch_last_checked(
    pool: &SqlitePool,
    id: &str,
    checked_at: DateTime<Utc>,
) -> Result<()> {
    sqlx::query("UPDATE videos SET last_checked_at = ? WHERE id = ?")
        .bind(checked_at)
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

/// Repair link shown next to a video in the admin list
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RepairRef {
    pub id: String,
    pub status: RepairStatus,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminVideo {
    #[serde(flatten)]
    pub video: Video,
    pub repair: Option<RepairRef>,
}

/// Page of videos for the admin list, newest first
pub async fn list_videos_admin(
    pool: &SqlitePool,
    processed: Option<bool>,
    limit: i64,
    offset: i64,
) -> Result<(Vec<AdminVideo>, i64)> {
    let filter = match processed {
        Some(true) => "WHERE v.processed = 1",
        Some(false) => "WHERE v.processed = 0",
        None => "",
    };

    let total: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM videos v {}", filter))
        .fetch_one(pool)
        .await?;

    let columns = VIDEO_COLUMNS
        .split(", ")
        .map(|c| format!("v.{}", c.trim()))
        .collect::<Vec<_>>()
        .join(", ");

    let rows = sqlx::query(&format!(
        r#"
        SELECT {columns}, r.id AS repair_id, r.status AS repair_status
        FROM videos v
        LEFT JOIN repairs r ON r.video_id = v.id
        {filter}
        ORDER BY v.published_at DESC
        LIMIT ? OFFSET ?
        "#
    ))
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;

    let videos = rows
        .iter()
        .map(|row| -> Result<AdminVideo> {
            let repair_id: Option<String> = row.try_get("repair_id")?;
            let repair_status: Option<String> = row.try_get("repair_status")?;
            let repair = match (repair_id, repair_status) {
                (Some(id), Some(status)) => Some(RepairRef {
                    id,
                    status: status.parse()?,
                }),
                _ => None,
            };
            Ok(AdminVideo {
                video: video_from_row(row)?,
                repair,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok((videos, total))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use lfdb_common::db::init_memory_database;

    fn sample(youtube_id: &str, published_at: DateTime<Utc>) -> VideoData {
        VideoData {
            youtube_id: youtube_id.to_string(),
            title: format!("Video {}", youtube_id),
            description: "desc".into(),
            thumbnail_url: "thumb".into(),
            duration: "PT10M".into(),
            published_at,
            transcript: None,
        }
    }

    #[tokio::test]
    async fn test_insert_and_get() {
        let pool = init_memory_database().await.unwrap();
        let id = insert_video(&pool, &sample("a", time::now())).await.unwrap();

        let video = get_video(&pool, &id).await.unwrap().unwrap();
        assert_eq!(video.youtube_id, "a");
        assert_eq!(video.status, VideoStatus::Active);
        assert!(!video.processed);
        assert!(exists_by_youtube_id(&pool, "a").await.unwrap());
        assert!(!exists_by_youtube_id(&pool, "b").await.unwrap());
    }

    #[tokio::test]
    async fn test_latest_published_at() {
        let pool = init_memory_database().await.unwrap();
        assert_eq!(latest_published_at(&pool).await.unwrap(), None);

        let newest = time::now();
        insert_video(&pool, &sample("old", newest - Duration::days(3))).await.unwrap();
        insert_video(&pool, &sample("new", newest)).await.unwrap();

        let latest = latest_published_at(&pool).await.unwrap().unwrap();
        assert_eq!(latest.timestamp(), newest.timestamp());
    }

    #[tokio::test]
    async fn test_list_unprocessed_newest_first() {
        let pool = init_memory_database().await.unwrap();
        let now = time::now();
        let old = insert_video(&pool, &sample("old", now - Duration::days(2))).await.unwrap();
        insert_video(&pool, &sample("mid", now - Duration::days(1))).await.unwrap();
        insert_video(&pool, &sample("new", now)).await.unwrap();
        mark_processed(&pool, &old).await.unwrap();

        let videos = list_unprocessed(&pool, 10).await.unwrap();
        let ids: Vec<&str> = videos.iter().map(|v| v.youtube_id.as_str()).collect();
        assert_eq!(ids, vec!["new", "mid"]);
    }

    #[tokio::test]
    async fn test_update_metadata_leaves_transcript() {
        let pool = init_memory_database().await.unwrap();
        let mut data = sample("a", time::now());
        data.transcript = Some("kept".into());
        let id = insert_video(&pool, &data).await.unwrap();

        data.title = "Renamed".into();
        data.transcript = None;
        assert!(update_video_metadata(&pool, &data).await.unwrap());

        let video = get_video(&pool, &id).await.unwrap().unwrap();
        assert_eq!(video.title, "Renamed");
        assert_eq!(video.transcript.as_deref(), Some("kept"));

        assert!(!update_video_metadata(&pool, &sample("missing", time::now())).await.unwrap());
    }

    #[tokio::test]
    async fn test_set_video_status() {
        let pool = init_memory_database().await.unwrap();
        let id = insert_video(&pool, &sample("a", time::now())).await.unwrap();

        set_video_status(&pool, &id, VideoStatus::Private, Some("Video is private"), time::now())
            .await
            .unwrap();

        let video = get_video(&pool, &id).await.unwrap().unwrap();
        assert_eq!(video.status, VideoStatus::Private);
        assert_eq!(video.unavailable_reason.as_deref(), Some("Video is private"));
        assert!(video.unavailable_at.is_some());
        assert!(video.last_checked_at.is_some());
        assert!(list_by_status(&pool, VideoStatus::Active).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_admin_list_filters_processed() {
        let pool = init_memory_database().await.unwrap();
        let a = insert_video(&pool, &sample("a", time::now())).await.unwrap();
        insert_video(&pool, &sample("b", time::now())).await.unwrap();
        mark_processed(&pool, &a).await.unwrap();

        let (all, total) = list_videos_admin(&pool, None, 20, 0).await.unwrap();
        assert_eq!(total, 2);
        assert_eq!(all.len(), 2);
        assert!(all.iter().all(|v| v.repair.is_none()));

        let (done, total) = list_videos_admin(&pool, Some(true), 20, 0).await.unwrap();
        assert_eq!(total, 1);
        assert_eq!(done[0].video.youtube_id, "a");
    }
}
