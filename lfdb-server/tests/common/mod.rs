//! Shared fixtures for lfdb-server integration tests
//!
//! Provides an in-memory database, a canned text generator standing in for
//! Gemini, and a local fake of the YouTube Data API endpoints the client
//! uses (`search`, `videos`, `channels`).

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    body::Body,
    extract::{Query, State},
    http::{Request, StatusCode},
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Duration, TimeZone, Utc};
use serde_json::{json, Value};
use sqlx::SqlitePool;

use lfdb_common::config::{CliOverrides, ServiceConfig, TomlConfig};
use lfdb_common::db::init::init_memory_database;
use lfdb_common::db::models::Role;
use lfdb_server::ai::{GeminiError, RepairExtractor, TextGenerator};
use lfdb_server::db::{users, videos};
use lfdb_server::youtube::{NoTranscripts, VideoData, YouTubeClient};
use lfdb_server::AppState;

pub const CHANNEL_ID: &str = "UC_TEST_CHANNEL";
pub const ADMIN_EMAIL: &str = "admin@example.com";
pub const ADMIN_PASSWORD: &str = "correct horse battery staple";
pub const CRON_SECRET: &str = "cron-test-secret";

pub const HIGH_CONFIDENCE_REPLY: &str = r#"{
    "brand": "Lenovo",
    "model": "Yoga Pro 7",
    "problemType": "No Power",
    "troubleshooting": "Measured the 20V rail and found it shorted.",
    "solution": "Replaced the charging MOSFET.",
    "confidence": "high",
    "reasoning": "Title and description name the fault."
}"#;

/// Text generator that always answers with the same reply
pub struct CannedGenerator {
    reply: Result<String, String>,
    calls: AtomicUsize,
}

impl CannedGenerator {
    pub fn replying(reply: &str) -> Self {
        Self {
            reply: Ok(reply.to_string()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            reply: Err(message.to_string()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TextGenerator for CannedGenerator {
    async fn generate(&self, _prompt: &str) -> Result<String, GeminiError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.reply {
            Ok(text) => Ok(text.clone()),
            Err(message) => Err(GeminiError::Api(500, message.clone())),
        }
    }
}

/// Video served by the fake YouTube API
#[derive(Debug, Clone)]
pub struct FakeVideo {
    pub id: String,
    pub title: String,
    pub published_at: DateTime<Utc>,
    pub privacy_status: String,
    pub upload_status: String,
    pub embeddable: bool,
}

impl FakeVideo {
    pub fn public(id: &str, title: &str, published_at: DateTime<Utc>) -> Self {
        Self {
            id: id.to_string(),
            title: title.to_string(),
            published_at,
            privacy_status: "public".to_string(),
            upload_status: "processed".to_string(),
            embeddable: true,
        }
    }

    pub fn private(mut self) -> Self {
        self.privacy_status = "private".to_string();
        self
    }

    fn video_resource(&self) -> Value {
        json!({
            "id": self.id,
            "snippet": {
                "title": self.title,
                "description": format!("Description of {}", self.title),
                "publishedAt": self.published_at.to_rfc3339(),
                "thumbnails": { "high": { "url": format!("https://i.ytimg.com/vi/{}/hq.jpg", self.id) } },
            },
            "contentDetails": { "duration": "PT12M30S" },
            "status": {
                "uploadStatus": self.upload_status,
                "privacyStatus": self.privacy_status,
                "embeddable": self.embeddable,
            },
        })
    }
}

/// `n` public videos, newest first, one day apart, the newest a day old
pub fn fake_channel(n: usize) -> Vec<FakeVideo> {
    let newest = Utc.timestamp_opt(Utc::now().timestamp(), 0).unwrap() - Duration::days(1);
    (0..n)
        .map(|i| {
            FakeVideo::public(
                &format!("yt{:03}", i),
                &format!("Laptop repair #{}", i),
                newest - Duration::days(i as i64),
            )
        })
        .collect()
}

/// Sentinel for "no status lookup fails"
const NO_FAILURE: usize = usize::MAX;

#[derive(Clone)]
struct FakeYouTube {
    videos: Arc<Vec<FakeVideo>>,
    search_calls: Arc<AtomicUsize>,
    status_calls: Arc<AtomicUsize>,
    failing_status_call: Arc<AtomicUsize>,
}

async fn fake_search(
    State(fake): State<FakeYouTube>,
    Query(params): Query<HashMap<String, String>>,
) -> Json<Value> {
    fake.search_calls.fetch_add(1, Ordering::SeqCst);

    let after = params
        .get("publishedAfter")
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|d| d.with_timezone(&Utc));
    let matching: Vec<&FakeVideo> = fake
        .videos
        .iter()
        .filter(|v| after.map_or(true, |a| v.published_at > a))
        .collect();

    let offset: usize = params
        .get("pageToken")
        .and_then(|t| t.parse().ok())
        .unwrap_or(0);
    let max: usize = params
        .get("maxResults")
        .and_then(|m| m.parse().ok())
        .unwrap_or(5);

    let page: Vec<Value> = matching
        .iter()
        .skip(offset)
        .take(max)
        .map(|v| json!({ "id": { "kind": "youtube#video", "videoId": v.id } }))
        .collect();
    let next = offset + max;

    let mut body = json!({ "items": page });
    if next < matching.len() {
        body["nextPageToken"] = json!(next.to_string());
    }
    Json(body)
}

async fn fake_videos(
    State(fake): State<FakeYouTube>,
    Query(params): Query<HashMap<String, String>>,
) -> (StatusCode, Json<Value>) {
    let is_status_lookup = params
        .get("part")
        .is_some_and(|part| part.split(',').any(|p| p == "status"));
    if is_status_lookup {
        let call = fake.status_calls.fetch_add(1, Ordering::SeqCst);
        if call == fake.failing_status_call.load(Ordering::SeqCst) {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": { "code": 500, "message": "Backend Error" } })),
            );
        }
    }

    let ids: Vec<&str> = params
        .get("id")
        .map(|s| s.split(',').collect())
        .unwrap_or_default();
    let items: Vec<Value> = fake
        .videos
        .iter()
        .filter(|v| ids.contains(&v.id.as_str()))
        .map(FakeVideo::video_resource)
        .collect();
    (StatusCode::OK, Json(json!({ "items": items })))
}

async fn fake_channels(Query(params): Query<HashMap<String, String>>) -> Json<Value> {
    if params.get("id").map(String::as_str) != Some(CHANNEL_ID) {
        return Json(json!({ "items": [] }));
    }
    Json(json!({
        "items": [{
            "snippet": {
                "title": "Test Repair Channel",
                "description": "Board level laptop repair",
                "customUrl": "@testrepair",
            },
            "statistics": {
                "subscriberCount": "1200",
                "videoCount": "42",
                "viewCount": "99000",
            },
        }]
    }))
}

/// Running fake YouTube API
pub struct FakeYouTubeServer {
    pub base_url: String,
    search_calls: Arc<AtomicUsize>,
    status_calls: Arc<AtomicUsize>,
    failing_status_call: Arc<AtomicUsize>,
}

impl FakeYouTubeServer {
    pub fn search_calls(&self) -> usize {
        self.search_calls.load(Ordering::SeqCst)
    }

    /// `videos.list` calls that asked for `status` (health checks)
    pub fn status_calls(&self) -> usize {
        self.status_calls.load(Ordering::SeqCst)
    }

    /// Make the zero-based `n`th status lookup answer HTTP 500
    pub fn fail_status_call(&self, n: usize) {
        self.failing_status_call.store(n, Ordering::SeqCst);
    }
}

pub async fn spawn_fake_youtube(videos: Vec<FakeVideo>) -> FakeYouTubeServer {
    let search_calls = Arc::new(AtomicUsize::new(0));
    let status_calls = Arc::new(AtomicUsize::new(0));
    let failing_status_call = Arc::new(AtomicUsize::new(NO_FAILURE));
    let fake = FakeYouTube {
        videos: Arc::new(videos),
        search_calls: search_calls.clone(),
        status_calls: status_calls.clone(),
        failing_status_call: failing_status_call.clone(),
    };

    let app = Router::new()
        .route("/search", get(fake_search))
        .route("/videos", get(fake_videos))
        .route("/channels", get(fake_channels))
        .with_state(fake);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    FakeYouTubeServer {
        base_url: format!("http://{}", addr),
        search_calls,
        status_calls,
        failing_status_call,
    }
}

/// Configuration with no environment influence
pub fn test_config() -> ServiceConfig {
    let mut config =
        ServiceConfig::resolve_with_env(CliOverrides::default(), TomlConfig::default(), |_| None);
    config.public_url = "https://laptopfixdb.test".to_string();
    config.cron_secret = Some(CRON_SECRET.to_string());
    config.youtube.channel_id = Some(CHANNEL_ID.to_string());
    config
}

pub async fn test_db() -> SqlitePool {
    init_memory_database()
        .await
        .expect("Should create in-memory database")
}

/// State wired to an optional fake YouTube server and a canned generator
pub fn test_state(
    db: SqlitePool,
    youtube_base: Option<&str>,
    generator: Arc<CannedGenerator>,
) -> AppState {
    let mut config = test_config();
    let youtube = youtube_base.map(|base| {
        config.youtube.api_key = Some("test-key".to_string());
        config.youtube.base_url = base.to_string();
        Arc::new(YouTubeClient::new("test-key", base).expect("Should build YouTube client"))
    });
    config.gemini.api_key = Some("test-key".to_string());

    AppState::new(
        db,
        config,
        youtube,
        Arc::new(NoTranscripts),
        Arc::new(RepairExtractor::new(generator)),
    )
}

pub async fn create_admin(db: &SqlitePool) {
    users::upsert_user(db, ADMIN_EMAIL, ADMIN_PASSWORD, Some("Admin"), Role::Admin)
        .await
        .expect("Should create admin");
}

/// Store a video directly, bypassing the sync job
pub async fn seed_video(db: &SqlitePool, youtube_id: &str, title: &str, days_old: i64) -> String {
    let video = VideoData {
        youtube_id: youtube_id.to_string(),
        title: title.to_string(),
        description: format!("Description of {}", title),
        thumbnail_url: String::new(),
        duration: "PT10M".to_string(),
        published_at: Utc::now() - Duration::days(days_old),
        transcript: None,
    };
    videos::insert_video(db, &video)
        .await
        .expect("Should insert video")
}

pub fn request(method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {}", token));
    }
    match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

pub async fn body_json(response: axum::response::Response) -> (StatusCode, Value) {
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Should read body");
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("Should parse JSON")
    };
    (status, json)
}
