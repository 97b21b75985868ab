//! In-process job scheduler
//!
//! Runs the incremental sync and the health check on fixed intervals, as
//! an alternative to triggering the cron endpoints externally.

use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{error, info};

use lfdb_common::config::SchedulerConfig;

use super::{health_check, sync};
use crate::AppState;

/// Shortest interval accepted from configuration
pub const MIN_INTERVAL_SECS: u64 = 60;

/// Sync and health-check periods, or `None` when the scheduler is off
pub fn job_periods(config: &SchedulerConfig) -> Option<(Duration, Duration)> {
    if !config.enabled {
        return None;
    }
    Some((
        Duration::from_secs(config.sync_interval_secs.max(MIN_INTERVAL_SECS)),
        Duration::from_secs(config.health_interval_secs.max(MIN_INTERVAL_SECS)),
    ))
}

/// Start the periodic jobs; returns no handles when the scheduler is disabled
pub fn spawn_jobs(state: &AppState) -> Vec<JoinHandle<()>> {
    let Some((sync_period, health_period)) = job_periods(&state.config.scheduler) else {
        info!("Scheduler disabled by configuration");
        return Vec::new();
    };
    info!(
        "Starting scheduler (sync every {}s, health check every {}s)",
        sync_period.as_secs(),
        health_period.as_secs()
    );

    let sync_state = state.clone();
    let sync_job = tokio::spawn(async move {
        let mut timer = interval(sync_period);
        timer.set_missed_tick_behavior(MissedTickBehavior::Skip);
        // First tick completes immediately; the first run waits one period
        timer.tick().await;

        loop {
            timer.tick().await;
            match sync::sync_new_videos(&sync_state).await {
                Ok(stats) => info!(
                    total = stats.total,
                    saved = stats.saved,
                    skipped = stats.skipped,
                    "Scheduled video sync complete"
                ),
                Err(e) => error!("Scheduled video sync failed: {}", e),
            }
        }
    });

    let health_state = state.clone();
    let health_job = tokio::spawn(async move {
        let mut timer = interval(health_period);
        timer.set_missed_tick_behavior(MissedTickBehavior::Skip);
        timer.tick().await;

        loop {
            timer.tick().await;
            match health_check::check_video_health(&health_state).await {
                Ok(report) => info!(
                    checked = report.checked,
                    now_unavailable = report.now_unavailable,
                    "Scheduled health check complete"
                ),
                Err(e) => error!("Scheduled health check failed: {}", e),
            }
        }
    });

    vec![sync_job, health_job]
}
