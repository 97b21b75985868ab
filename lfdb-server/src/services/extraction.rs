//! Turning videos into repair records
//!
//! Extracted names are resolved to catalog rows by slug, then the video's
//! repair is created or overwritten and the video is marked processed.

use serde::Serialize;
use sqlx::SqlitePool;
use tracing::{info, warn};

use lfdb_common::db::models::{Brand, Confidence, LaptopModel, ProblemType, Repair, Video};
use lfdb_common::normalize::{create_slug, standardize_problem_type};

use crate::ai::ExtractedRepairData;
use crate::db::catalog;
use crate::db::repairs::{self, RepairUpsert};
use crate::db::videos;
use crate::{ApiError, ApiResult, AppState};

pub const DEFAULT_BATCH_LIMIT: i64 = 10;

/// Catalog rows an extraction resolved to
#[derive(Debug, Clone, Default)]
pub struct ResolvedEntities {
    pub brand: Option<Brand>,
    pub model: Option<LaptopModel>,
    pub problem_type: Option<ProblemType>,
}

/// Names of the resolved entities, as reported to clients
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityNames {
    pub brand: Option<String>,
    pub model: Option<String>,
    pub problem_type: Option<String>,
}

impl From<&ResolvedEntities> for EntityNames {
    fn from(entities: &ResolvedEntities) -> Self {
        Self {
            brand: entities.brand.as_ref().map(|b| b.name.clone()),
            model: entities.model.as_ref().map(|m| m.name.clone()),
            problem_type: entities.problem_type.as_ref().map(|p| p.name.clone()),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionOutcome {
    pub repair: Repair,
    pub extracted: ExtractedRepairData,
    pub entities: EntityNames,
}

fn usable_name(name: Option<&str>) -> Option<&str> {
    name.filter(|n| !create_slug(n).is_empty())
}

/// Upsert brand, model and problem type named by an extraction
///
/// A model is only recorded together with its brand.
pub async fn resolve_entities(
    pool: &SqlitePool,
    extracted: &ExtractedRepairData,
) -> ApiResult<ResolvedEntities> {
    let mut resolved = ResolvedEntities::default();

    if let Some(brand_name) = usable_name(extracted.brand.as_deref()) {
        let brand = catalog::upsert_brand(pool, brand_name).await?;

        if let Some(model_name) = usable_name(extracted.model.as_deref()) {
            resolved.model = Some(catalog::upsert_model(pool, &brand.id, model_name).await?);
        }
        resolved.brand = Some(brand);
    }

    if let Some(standardized) = standardize_problem_type(extracted.problem_type.as_deref()) {
        resolved.problem_type = Some(catalog::upsert_problem_type(pool, &standardized).await?);
    }

    Ok(resolved)
}

async fn process_loaded_video(state: &AppState, video: &Video) -> ApiResult<ExtractionOutcome> {
    info!(video_id = %video.id, "Extracting repair data for video: {}", video.title);

    let extracted = state
        .extractor
        .extract_repair_data(
            &video.title,
            video.description.as_deref(),
            video.transcript.as_deref(),
        )
        .await;

    let entities = resolve_entities(&state.db, &extracted).await?;

    let repair = repairs::upsert_repair(
        &state.db,
        &RepairUpsert {
            video_id: video.id.clone(),
            model_id: entities.model.as_ref().map(|m| m.id.clone()),
            problem_type_id: entities.problem_type.as_ref().map(|p| p.id.clone()),
            troubleshooting: extracted.troubleshooting.clone(),
            solution: extracted.solution.clone(),
            status: extracted.confidence.initial_repair_status(),
        },
    )
    .await?;

    videos::mark_processed(&state.db, &video.id).await?;

    Ok(ExtractionOutcome {
        repair,
        entities: EntityNames::from(&entities),
        extracted,
    })
}

/// Extract and store the repair of one video
pub async fn process_video(state: &AppState, video_id: &str) -> ApiResult<ExtractionOutcome> {
    let video = videos::get_video(&state.db, video_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Video not found".into()))?;

    process_loaded_video(state, &video).await
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BatchItemStatus {
    Success,
    Error,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchExtracted {
    #[serde(flatten)]
    pub entities: EntityNames,
    pub confidence: Confidence,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchItemResult {
    pub video_id: String,
    pub title: String,
    pub status: BatchItemStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extracted: Option<BatchExtracted>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchStats {
    pub total: usize,
    pub success: usize,
    pub errors: usize,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchOutcome {
    pub stats: BatchStats,
    pub results: Vec<BatchItemResult>,
}

/// Process up to `limit` unprocessed videos, newest first
///
/// A failing video is recorded in the results and the batch continues.
pub async fn process_batch(state: &AppState, limit: i64) -> ApiResult<BatchOutcome> {
    let pending = videos::list_unprocessed(&state.db, limit.max(1)).await?;
    info!("Found {} unprocessed videos", pending.len());

    let mut outcome = BatchOutcome {
        stats: BatchStats {
            total: pending.len(),
            ..Default::default()
        },
        results: Vec::with_capacity(pending.len()),
    };

    for video in &pending {
        match process_loaded_video(state, video).await {
            Ok(done) => {
                outcome.stats.success += 1;
                outcome.results.push(BatchItemResult {
                    video_id: video.id.clone(),
                    title: video.title.clone(),
                    status: BatchItemStatus::Success,
                    extracted: Some(BatchExtracted {
                        entities: done.entities,
                        confidence: done.extracted.confidence,
                    }),
                    error: None,
                });
                info!(video_id = %video.id, "Processed: {}", video.title);
            }
            Err(e) => {
                outcome.stats.errors += 1;
                warn!(video_id = %video.id, error = %e, "Failed to process video");
                outcome.results.push(BatchItemResult {
                    video_id: video.id.clone(),
                    title: video.title.clone(),
                    status: BatchItemStatus::Error,
                    extracted: None,
                    error: Some(e.to_string()),
                });
            }
        }
    }

    Ok(outcome)
}
