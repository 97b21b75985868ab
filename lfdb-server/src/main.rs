//! lfdb-server - LaptopFixDB curation service entry point
//!
//! `serve` (the default) runs the HTTP API and the optional scheduler.
//! The other subcommands run one job against the configured database and
//! exit, for use from shell scripts or system cron.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio::signal;
use tracing::{info, warn};

use lfdb_common::config::{CliOverrides, RootFolderInitializer, ServiceConfig, TomlConfig};
use lfdb_common::db::init::init_database;
use lfdb_common::db::models::Role;
use lfdb_server::ai::{GeminiClient, RepairExtractor};
use lfdb_server::db::users;
use lfdb_server::logging::init_tracing;
use lfdb_server::services::{extraction, health_check, scheduler, sync};
use lfdb_server::youtube::{TranscriptFetcher, YouTubeClient};
use lfdb_server::{build_router, AppState};

/// Command-line arguments for lfdb-server
#[derive(Parser, Debug)]
#[command(name = "lfdb-server")]
#[command(about = "LaptopFixDB video ingestion and repair catalog service")]
#[command(version)]
struct Cli {
    /// Root folder holding the database
    #[arg(short, long, env = "LFDB_ROOT_FOLDER")]
    root_folder: Option<PathBuf>,

    /// Address to listen on, e.g. 127.0.0.1:5780
    #[arg(short, long)]
    bind: Option<String>,

    /// TOML config file
    #[arg(short, long, env = "LFDB_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP server (default)
    Serve,
    /// Create an admin user, or promote an existing one
    CreateAdmin {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
        #[arg(long)]
        name: Option<String>,
    },
    /// Fetch new videos; with --max-results, backfill that many instead
    Sync {
        #[arg(long)]
        max_results: Option<usize>,
    },
    /// Extract repairs from unprocessed videos
    Extract {
        #[arg(long, default_value_t = extraction::DEFAULT_BATCH_LIMIT)]
        limit: i64,
    },
    /// Check whether stored videos are still available
    CheckHealth,
}

async fn build_state(config: ServiceConfig) -> Result<AppState> {
    let initializer = RootFolderInitializer::new(config.root_folder.clone());
    initializer.ensure_directory_exists()?;

    let db_path = config.database_path();
    info!("Database path: {}", db_path.display());
    let pool = init_database(&db_path)
        .await
        .context("Failed to open database")?;

    let youtube = match config.youtube.api_key.as_deref() {
        Some(key) => Some(Arc::new(YouTubeClient::new(key, config.youtube.base_url.as_str())?)),
        None => {
            warn!("YOUTUBE_API_KEY not set; sync and health checks are unavailable");
            None
        }
    };
    if config.youtube.channel_id.is_none() {
        warn!("YOUTUBE_CHANNEL_ID not set");
    }

    let transcripts = Arc::new(TranscriptFetcher::new(config.youtube.watch_base_url.as_str())?);

    let gemini = GeminiClient::new(&config.gemini)?;
    if !gemini.has_api_key() {
        warn!("GEMINI_API_KEY not set; extractions will be recorded as failed");
    }
    info!("Gemini model: {}", gemini.model());
    let extractor = Arc::new(RepairExtractor::new(Arc::new(gemini)));

    Ok(AppState::new(pool, config, youtube, transcripts, extractor))
}

async fn serve(state: AppState) -> Result<()> {
    let purged = users::purge_expired_sessions(&state.db).await?;
    if purged > 0 {
        info!("Removed {} expired sessions", purged);
    }

    let jobs = scheduler::spawn_jobs(&state);

    let bind = state.config.bind.clone();
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&bind)
        .await
        .with_context(|| format!("Failed to bind to {}", bind))?;
    info!("lfdb-server listening on http://{}", bind);
    info!("Health check: http://{}/health", bind);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    for job in jobs {
        job.abort();
    }
    info!("Server shutdown complete");
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Config warnings are held until the subscriber exists
    let loaded = TomlConfig::read(cli.config.as_deref());
    let config = ServiceConfig::resolve(
        CliOverrides {
            root_folder: cli.root_folder,
            bind: cli.bind,
        },
        loaded.config.clone(),
    );

    let _log_guard = init_tracing(&config.log_level, config.log_file.as_deref())?;
    loaded.log();

    // Log build identification before any slow startup work
    info!(
        "Starting LaptopFixDB server (lfdb-server) v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );
    info!("Root folder: {}", config.root_folder.display());
    if let Some(log_file) = &config.log_file {
        info!("Log file: {}", log_file.display());
    }

    let state = build_state(config).await?;

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(state).await?,
        Command::CreateAdmin {
            email,
            password,
            name,
        } => {
            let user =
                users::upsert_user(&state.db, &email, &password, name.as_deref(), Role::Admin)
                    .await?;
            info!("Admin user ready: {} ({})", user.email, user.id);
        }
        Command::Sync { max_results } => {
            let stats = match max_results {
                Some(max) => sync::sync_channel(&state, max).await?,
                None => sync::sync_new_videos(&state).await?,
            };
            info!(
                "Sync complete: {} fetched, {} saved, {} updated, {} skipped",
                stats.total, stats.saved, stats.updated, stats.skipped
            );
        }
        Command::Extract { limit } => {
            let outcome = extraction::process_batch(&state, limit).await?;
            info!(
                "Extraction complete: {} videos, {} succeeded, {} failed",
                outcome.stats.total, outcome.stats.success, outcome.stats.errors
            );
        }
        Command::CheckHealth => {
            let report = health_check::check_video_health(&state).await?;
            info!(
                "Health check complete: {} checked, {} unchanged, {} now unavailable",
                report.checked, report.unchanged, report.now_unavailable
            );
        }
    }

    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
