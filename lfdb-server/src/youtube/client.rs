//! YouTube Data API v3 client
//!
//! Wraps the four endpoints the service uses (`search`, `videos`,
//! `channels`) and maps responses onto [`VideoData`]. Requests are
//! rate limited client-side; the API itself meters a daily quota.

use chrono::{DateTime, Utc};
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::num::NonZeroU32;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// The API returns at most 50 items per page and per `videos.list` call
pub const MAX_PAGE_SIZE: u32 = 50;

const REQUESTS_PER_SECOND: NonZeroU32 = match NonZeroU32::new(10) {
    Some(n) => n,
    None => panic!("rate must be non-zero"),
};

/// YouTube client errors
#[derive(Debug, Error)]
pub enum YouTubeError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("YouTube API error {0}: {1}")]
    Api(u16, String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Video not found: {0}")]
    NotFound(String),
}

/// Video metadata as stored by the sync service
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoData {
    pub youtube_id: String,
    pub title: String,
    pub description: String,
    pub thumbnail_url: String,
    pub duration: String,
    pub published_at: DateTime<Utc>,
    pub transcript: Option<String>,
}

/// One page of channel search results
#[derive(Debug, Clone, Default)]
pub struct ChannelPage {
    pub videos: Vec<VideoData>,
    pub next_page_token: Option<String>,
}

/// Availability fields of a video (`part=status,snippet`)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoStatusInfo {
    pub youtube_id: String,
    pub upload_status: String,
    pub privacy_status: String,
    pub embeddable: bool,
    pub title: String,
}

/// Channel summary for diagnostics
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelInfo {
    pub title: String,
    pub description: String,
    pub custom_url: Option<String>,
    pub subscriber_count: Option<String>,
    pub video_count: Option<String>,
    pub view_count: Option<String>,
}

// Wire formats

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchResponse {
    #[serde(default)]
    items: Vec<SearchItem>,
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    id: Option<SearchItemId>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchItemId {
    video_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ListResponse<T> {
    #[serde(default = "Vec::new")]
    items: Vec<T>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VideoItem {
    id: String,
    snippet: Option<Snippet>,
    content_details: Option<ContentDetails>,
    status: Option<StatusPart>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Snippet {
    title: Option<String>,
    description: Option<String>,
    published_at: Option<String>,
    thumbnails: Option<Thumbnails>,
    custom_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Thumbnails {
    high: Option<Thumbnail>,
}

#[derive(Debug, Deserialize)]
struct Thumbnail {
    url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ContentDetails {
    duration: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StatusPart {
    upload_status: Option<String>,
    privacy_status: Option<String>,
    embeddable: Option<bool>,
}

#[derive(Debug, Deserialize)]
struct ChannelItem {
    snippet: Option<Snippet>,
    statistics: Option<ChannelStatistics>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChannelStatistics {
    subscriber_count: Option<String>,
    video_count: Option<String>,
    view_count: Option<String>,
}

impl From<VideoItem> for VideoData {
    fn from(item: VideoItem) -> Self {
        let snippet = item.snippet.unwrap_or_default();
        let published_at = snippet
            .published_at
            .as_deref()
            .and_then(lfdb_common::time::parse_rfc3339)
            .unwrap_or_else(Utc::now);

        VideoData {
            youtube_id: item.id,
            title: snippet.title.unwrap_or_default(),
            description: snippet.description.unwrap_or_default(),
            thumbnail_url: snippet
                .thumbnails
                .and_then(|t| t.high)
                .and_then(|h| h.url)
                .unwrap_or_default(),
            duration: item
                .content_details
                .and_then(|c| c.duration)
                .unwrap_or_default(),
            published_at,
            transcript: None,
        }
    }
}

/// YouTube Data API client
pub struct YouTubeClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
    rate_limiter: DefaultDirectRateLimiter,
}

impl YouTubeClient {
    pub fn new(api_key: impl Into<String>, base_url: impl Into<String>) -> Result<Self, YouTubeError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| YouTubeError::Network(e.to_string()))?;

        Ok(Self {
            http,
            api_key: api_key.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            rate_limiter: RateLimiter::direct(Quota::per_second(REQUESTS_PER_SECOND)),
        })
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        resource: &str,
        params: &[(&str, String)],
    ) -> Result<T, YouTubeError> {
        self.rate_limiter.until_ready().await;

        let url = format!("{}/{}", self.base_url, resource);
        debug!(resource, ?params, "Querying YouTube Data API");

        let response = self
            .http
            .get(&url)
            .query(params)
            .query(&[("key", self.api_key.as_str())])
            .send()
            .await
            .map_err(|e| YouTubeError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(YouTubeError::Api(status.as_u16(), body));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| YouTubeError::Parse(e.to_string()))
    }

    /// `videos.list` with snippet and contentDetails for up to 50 IDs
    async fn fetch_video_details(&self, ids: &[String]) -> Result<Vec<VideoData>, YouTubeError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let response: ListResponse<VideoItem> = self
            .get_json(
                "videos",
                &[
                    ("part", "snippet,contentDetails".to_string()),
                    ("id", ids.join(",")),
                ],
            )
            .await?;

        Ok(response.items.into_iter().map(VideoData::from).collect())
    }

    async fn search_channel(
        &self,
        channel_id: &str,
        max_results: u32,
        page_token: Option<&str>,
        published_after: Option<DateTime<Utc>>,
    ) -> Result<(Vec<String>, Option<String>), YouTubeError> {
        let mut params = vec![
            ("part", "snippet".to_string()),
            ("channelId", channel_id.to_string()),
            ("maxResults", max_results.clamp(1, MAX_PAGE_SIZE).to_string()),
            ("order", "date".to_string()),
            ("type", "video".to_string()),
        ];
        if let Some(token) = page_token {
            params.push(("pageToken", token.to_string()));
        }
        if let Some(after) = published_after {
            params.push((
                "publishedAfter",
                after.to_rfc3339_opts(chrono::SecondsFormat::Secs, true),
            ));
        }

        let response: SearchResponse = self.get_json("search", &params).await?;

        let ids: Vec<String> = response
            .items
            .into_iter()
            .filter_map(|item| item.id.and_then(|id| id.video_id))
            .filter(|id| !id.is_empty())
            .collect();

        Ok((ids, response.next_page_token))
    }

    /// One page of a channel's videos, newest first
    ///
    /// An empty search result ends pagination (no token is returned).
    pub async fn get_channel_videos(
        &self,
        channel_id: &str,
        max_results: u32,
        page_token: Option<&str>,
    ) -> Result<ChannelPage, YouTubeError> {
        let (ids, next_page_token) = self
            .search_channel(channel_id, max_results, page_token, None)
            .await?;

        if ids.is_empty() {
            debug!(channel_id, "No video IDs in search results");
            return Ok(ChannelPage::default());
        }

        let videos = self.fetch_video_details(&ids).await?;
        debug!(channel_id, found = ids.len(), detailed = videos.len(), "Fetched channel page");

        Ok(ChannelPage {
            videos,
            next_page_token,
        })
    }

    /// Videos published after `after` (single page)
    pub async fn get_new_videos(
        &self,
        channel_id: &str,
        after: DateTime<Utc>,
        max_results: u32,
    ) -> Result<Vec<VideoData>, YouTubeError> {
        let (ids, _) = self
            .search_channel(channel_id, max_results, None, Some(after))
            .await?;

        self.fetch_video_details(&ids).await
    }

    pub async fn get_video_details(&self, youtube_id: &str) -> Result<VideoData, YouTubeError> {
        self.fetch_video_details(&[youtube_id.to_string()])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| YouTubeError::NotFound(youtube_id.to_string()))
    }

    /// Availability of up to 50 videos, keyed by YouTube ID
    ///
    /// IDs missing from the map were not returned by the API (deleted,
    /// or private to the caller).
    pub async fn get_video_statuses(
        &self,
        ids: &[String],
    ) -> Result<HashMap<String, VideoStatusInfo>, YouTubeError> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let response: ListResponse<VideoItem> = self
            .get_json(
                "videos",
                &[("part", "status,snippet".to_string()), ("id", ids.join(","))],
            )
            .await?;

        Ok(response
            .items
            .into_iter()
            .map(|item| {
                let status = item.status;
                let info = VideoStatusInfo {
                    youtube_id: item.id.clone(),
                    upload_status: status
                        .as_ref()
                        .and_then(|s| s.upload_status.clone())
                        .unwrap_or_default(),
                    privacy_status: status
                        .as_ref()
                        .and_then(|s| s.privacy_status.clone())
                        .unwrap_or_default(),
                    embeddable: status.as_ref().and_then(|s| s.embeddable).unwrap_or(true),
                    title: item.snippet.and_then(|s| s.title).unwrap_or_default(),
                };
                (item.id, info)
            })
            .collect())
    }

    /// Channel title and statistics, `None` when the ID is unknown
    pub async fn get_channel_info(
        &self,
        channel_id: &str,
    ) -> Result<Option<ChannelInfo>, YouTubeError> {
        let response: ListResponse<ChannelItem> = self
            .get_json(
                "channels",
                &[
                    ("part", "snippet,statistics".to_string()),
                    ("id", channel_id.to_string()),
                ],
            )
            .await?;

        Ok(response.items.into_iter().next().map(|item| {
            let snippet = item.snippet.unwrap_or_default();
            let stats = item.statistics;
            ChannelInfo {
                title: snippet.title.unwrap_or_default(),
                description: snippet
                    .description
                    .unwrap_or_default()
                    .chars()
                    .take(200)
                    .collect(),
                custom_url: snippet.custom_url,
                subscriber_count: stats.as_ref().and_then(|s| s.subscriber_count.clone()),
                video_count: stats.as_ref().and_then(|s| s.video_count.clone()),
                view_count: stats.and_then(|s| s.view_count),
            }
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_video_item_maps_missing_fields_to_defaults() {
        let item: VideoItem = serde_json::from_str(r#"{"id": "abc"}"#).unwrap();
        let before = Utc::now();
        let video = VideoData::from(item);

        assert_eq!(video.youtube_id, "abc");
        assert_eq!(video.title, "");
        assert_eq!(video.thumbnail_url, "");
        assert_eq!(video.duration, "");
        assert!(video.published_at >= before, "missing publishedAt falls back to now");
    }

    #[test]
    fn test_video_item_full_mapping() {
        let item: VideoItem = serde_json::from_str(
            r#"{
                "id": "xyz",
                "snippet": {
                    "title": "Dell XPS 15 no power",
                    "description": "desc",
                    "publishedAt": "2024-05-01T12:00:00Z",
                    "thumbnails": {"high": {"url": "https://i.ytimg.com/vi/xyz/hqdefault.jpg"}}
                },
                "contentDetails": {"duration": "PT25M3S"}
            }"#,
        )
        .unwrap();
        let video = VideoData::from(item);

        assert_eq!(video.title, "Dell XPS 15 no power");
        assert_eq!(video.thumbnail_url, "https://i.ytimg.com/vi/xyz/hqdefault.jpg");
        assert_eq!(video.duration, "PT25M3S");
        assert_eq!(video.published_at.to_rfc3339(), "2024-05-01T12:00:00+00:00");
    }

    #[test]
    fn test_search_response_skips_non_video_items() {
        let response: SearchResponse = serde_json::from_str(
            r#"{
                "nextPageToken": "CAUQAA",
                "items": [
                    {"id": {"kind": "youtube#video", "videoId": "a"}},
                    {"id": {"kind": "youtube#channel"}},
                    {}
                ]
            }"#,
        )
        .unwrap();

        let ids: Vec<String> = response
            .items
            .into_iter()
            .filter_map(|item| item.id.and_then(|id| id.video_id))
            .collect();
        assert_eq!(ids, vec!["a".to_string()]);
        assert_eq!(response.next_page_token.as_deref(), Some("CAUQAA"));
    }

    #[test]
    fn test_list_response_without_items() {
        let response: ListResponse<VideoItem> = serde_json::from_str(r#"{"kind": "x"}"#).unwrap();
        assert!(response.items.is_empty());
    }

    #[test]
    fn test_client_creation_trims_base_url() {
        let client = YouTubeClient::new("key", "http://localhost:9/").unwrap();
        assert_eq!(client.base_url, "http://localhost:9");
    }
}
