//! Admin dashboard endpoints: counters, video list and repair review
//!
//! All routes here sit behind [`super::require_admin`].

use axum::{
    extract::{Path, Query, State},
    routing::get,
    Extension, Json, Router,
};
use serde::{Deserialize, Deserializer, Serialize};
use tracing::info;

use lfdb_common::api::types::{PageRequest, PaginationMeta, DEFAULT_ADMIN_LIMIT};
use lfdb_common::db::models::RepairStatus;

use crate::db::repairs::{self, RepairDetail, RepairFilter, RepairListItem, RepairOrder, RepairPatch};
use crate::db::stats::{self, Stats};
use crate::db::videos::{self, AdminVideo};
use crate::db::catalog;
use super::CurrentUser;
use crate::{ApiError, ApiResult, AppState};

#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub stats: Stats,
}

#[derive(Debug, Default, Deserialize)]
pub struct VideoQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub processed: Option<bool>,
}

#[derive(Debug, Serialize)]
pub struct VideoListResponse {
    pub videos: Vec<AdminVideo>,
    pub pagination: PaginationMeta,
}

#[derive(Debug, Default, Deserialize)]
pub struct AdminRepairQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub status: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AdminRepairListResponse {
    pub repairs: Vec<RepairListItem>,
    pub pagination: PaginationMeta,
}

#[derive(Debug, Serialize)]
pub struct AdminRepairResponse {
    pub repair: RepairDetail,
}

/// Distinguishes an absent field from an explicit `null`
fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Body of PATCH /api/admin/repairs/:id
///
/// Omitted fields are left unchanged. `null` or an empty string for
/// `modelId`/`problemTypeId` clears the link.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepairUpdateRequest {
    pub status: Option<RepairStatus>,
    pub troubleshooting: Option<String>,
    pub solution: Option<String>,
    #[serde(default, deserialize_with = "present")]
    pub model_id: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub problem_type_id: Option<Option<String>>,
}

fn normalize_link(link: Option<Option<String>>) -> Option<Option<String>> {
    link.map(|id| id.map(|s| s.trim().to_string()).filter(|s| !s.is_empty()))
}

/// GET /api/admin/stats
pub async fn get_stats(State(state): State<AppState>) -> ApiResult<Json<StatsResponse>> {
    Ok(Json(StatsResponse {
        stats: stats::collect_stats(&state.db).await?,
    }))
}

/// GET /api/admin/videos
pub async fn list_videos(
    State(state): State<AppState>,
    Query(query): Query<VideoQuery>,
) -> ApiResult<Json<VideoListResponse>> {
    let page = PageRequest::new(query.page, query.limit, DEFAULT_ADMIN_LIMIT);
    let (videos, total) =
        videos::list_videos_admin(&state.db, query.processed, page.limit, page.offset()).await?;

    Ok(Json(VideoListResponse {
        videos,
        pagination: page.meta(total),
    }))
}

/// GET /api/admin/repairs
pub async fn list_repairs(
    State(state): State<AppState>,
    Query(query): Query<AdminRepairQuery>,
) -> ApiResult<Json<AdminRepairListResponse>> {
    let page = PageRequest::new(query.page, query.limit, DEFAULT_ADMIN_LIMIT);
    let status = match query.status.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(raw) => Some(raw.parse::<RepairStatus>()?),
    };

    let filter = RepairFilter {
        status,
        ..Default::default()
    };
    let (repairs, total) = repairs::list_repairs(
        &state.db,
        &filter,
        RepairOrder::NewestRepair,
        page.limit,
        page.offset(),
    )
    .await?;

    Ok(Json(AdminRepairListResponse {
        repairs,
        pagination: page.meta(total),
    }))
}

async fn load_detail(state: &AppState, id: &str) -> ApiResult<RepairDetail> {
    repairs::get_repair_detail(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Repair not found".into()))
}

/// GET /api/admin/repairs/:id
///
/// Unlike the public route, any status is visible.
pub async fn get_repair(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<AdminRepairResponse>> {
    Ok(Json(AdminRepairResponse {
        repair: load_detail(&state, &id).await?,
    }))
}

/// PATCH /api/admin/repairs/:id
pub async fn update_repair(
    State(state): State<AppState>,
    Extension(CurrentUser(reviewer)): Extension<CurrentUser>,
    Path(id): Path<String>,
    Json(body): Json<RepairUpdateRequest>,
) -> ApiResult<Json<AdminRepairResponse>> {
    let patch = RepairPatch {
        status: body.status,
        troubleshooting: body.troubleshooting,
        solution: body.solution,
        model_id: normalize_link(body.model_id),
        problem_type_id: normalize_link(body.problem_type_id),
    };

    if let Some(Some(model_id)) = &patch.model_id {
        if !catalog::model_exists(&state.db, model_id).await? {
            return Err(ApiError::BadRequest(format!("Unknown model: {}", model_id)));
        }
    }
    if let Some(Some(problem_type_id)) = &patch.problem_type_id {
        if !catalog::problem_type_exists(&state.db, problem_type_id).await? {
            return Err(ApiError::BadRequest(format!(
                "Unknown problem type: {}",
                problem_type_id
            )));
        }
    }

    if !repairs::update_repair(&state.db, &id, &patch).await? {
        return Err(ApiError::NotFound("Repair not found".into()));
    }
    info!(
        repair_id = %id,
        status = ?patch.status,
        reviewer = %reviewer.email,
        "Repair updated"
    );

    Ok(Json(AdminRepairResponse {
        repair: load_detail(&state, &id).await?,
    }))
}

pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/api/admin/stats", get(get_stats))
        .route("/api/admin/videos", get(list_videos))
        .route("/api/admin/repairs", get(list_repairs))
        .route("/api/admin/repairs/:id", get(get_repair).patch(update_repair))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_patch_distinguishes_absent_from_null() {
        let body: RepairUpdateRequest = serde_json::from_str(r#"{"modelId": null}"#).unwrap();
        assert_eq!(body.model_id, Some(None));
        assert_eq!(body.problem_type_id, None);
    }

    #[test]
    fn test_empty_link_clears() {
        assert_eq!(normalize_link(Some(Some("  ".into()))), Some(None));
        assert_eq!(normalize_link(Some(Some("m1".into()))), Some(Some("m1".into())));
        assert_eq!(normalize_link(None), None);
    }

    #[test]
    fn test_patch_parses_status() {
        let body: RepairUpdateRequest =
            serde_json::from_str(r#"{"status": "APPROVED", "solution": "Replaced MOSFET"}"#)
                .unwrap();
        assert_eq!(body.status, Some(RepairStatus::Approved));
        assert_eq!(body.solution.as_deref(), Some("Replaced MOSFET"));
    }
}
