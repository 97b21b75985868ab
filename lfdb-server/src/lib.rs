//! lfdb-server library - LaptopFixDB curation service
//!
//! Ingests videos from one YouTube channel, extracts structured repair
//! facts with Gemini, and serves the curated catalog plus an admin review
//! workflow over a JSON API.

use axum::Router;
use sqlx::SqlitePool;
use std::sync::Arc;
use std::time::Instant;
use tower_http::trace::TraceLayer;

use lfdb_common::config::ServiceConfig;

pub mod ai;
pub mod api;
pub mod db;
pub mod error;
pub mod logging;
pub mod services;
pub mod youtube;

pub use error::{ApiError, ApiResult};

use ai::RepairExtractor;
use youtube::{TranscriptSource, YouTubeClient};

/// Application state shared across HTTP handlers and background jobs
#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub config: Arc<ServiceConfig>,
    /// Present only when an API key is configured
    pub youtube: Option<Arc<YouTubeClient>>,
    pub transcripts: Arc<dyn TranscriptSource>,
    pub extractor: Arc<RepairExtractor>,
    pub startup_time: Instant,
}

impl AppState {
    pub fn new(
        db: SqlitePool,
        config: ServiceConfig,
        youtube: Option<Arc<YouTubeClient>>,
        transcripts: Arc<dyn TranscriptSource>,
        extractor: Arc<RepairExtractor>,
    ) -> Self {
        Self {
            db,
            config: Arc::new(config),
            youtube,
            transcripts,
            extractor,
            startup_time: Instant::now(),
        }
    }

    /// YouTube client, or a configuration error when no key is set
    pub fn youtube(&self) -> ApiResult<&YouTubeClient> {
        self.youtube
            .as_deref()
            .ok_or_else(|| ApiError::Config("YouTube API key not configured".into()))
    }

    pub fn channel_id(&self) -> ApiResult<&str> {
        self.config
            .youtube
            .channel_id
            .as_deref()
            .ok_or_else(|| ApiError::Config("YOUTUBE_CHANNEL_ID not configured".into()))
    }
}

/// Build application router
///
/// Admin routes require an admin session; cron routes require the cron
/// secret when one is configured.
pub fn build_router(state: AppState) -> Router {
    use axum::middleware;

    let admin = api::admin_routes()
        .merge(api::jobs_routes())
        .merge(api::diagnostics_routes())
        .layer(middleware::from_fn_with_state(
            state.clone(),
            api::require_admin,
        ));

    let cron = api::cron_routes().layer(middleware::from_fn_with_state(
        state.clone(),
        api::require_cron_secret,
    ));

    let public = Router::new()
        .merge(api::health_routes())
        .merge(api::auth_routes())
        .merge(api::catalog_routes())
        .merge(api::sitemap_routes());

    Router::new()
        .merge(admin)
        .merge(cron)
        .merge(public)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
