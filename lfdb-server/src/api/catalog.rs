//! Public catalog: approved repairs, brands and problem types

use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};

use lfdb_common::api::types::{PageRequest, PaginationMeta, DEFAULT_CATALOG_LIMIT};
use lfdb_common::db::models::RepairStatus;
use lfdb_common::normalize::problem_filter_slug;

use crate::db::catalog::{self, BrandSummary, ProblemTypeSummary};
use crate::db::repairs::{self, RepairDetail, RepairFilter, RepairListItem, RepairOrder};
use crate::{ApiError, ApiResult, AppState};

#[derive(Debug, Default, Deserialize)]
pub struct RepairQuery {
    pub search: Option<String>,
    pub brand: Option<String>,
    pub problem: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct RepairListResponse {
    pub repairs: Vec<RepairListItem>,
    pub pagination: PaginationMeta,
}

#[derive(Debug, Serialize)]
pub struct RepairResponse {
    pub repair: RepairDetail,
}

#[derive(Debug, Serialize)]
pub struct BrandsResponse {
    pub brands: Vec<BrandSummary>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProblemTypesResponse {
    pub problem_types: Vec<ProblemTypeSummary>,
}

/// GET /api/repairs
pub async fn list_repairs(
    State(state): State<AppState>,
    Query(query): Query<RepairQuery>,
) -> ApiResult<Json<RepairListResponse>> {
    let page = PageRequest::new(query.page, query.limit, DEFAULT_CATALOG_LIMIT);
    let filter = RepairFilter {
        status: Some(RepairStatus::Approved),
        search: query.search,
        brand_slug: query.brand,
        problem_slug: query.problem.as_deref().map(problem_filter_slug),
    };

    let (repairs, total) = repairs::list_repairs(
        &state.db,
        &filter,
        RepairOrder::NewestVideo,
        page.limit,
        page.offset(),
    )
    .await?;

    Ok(Json(RepairListResponse {
        repairs,
        pagination: page.meta(total),
    }))
}

/// GET /api/repairs/:id
///
/// Only approved repairs are public.
pub async fn get_repair(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<RepairResponse>> {
    let repair = repairs::get_repair_detail(&state.db, &id)
        .await?
        .filter(|detail| detail.repair.status == RepairStatus::Approved)
        .ok_or_else(|| ApiError::NotFound("Repair not found".into()))?;

    Ok(Json(RepairResponse { repair }))
}

/// GET /api/brands
pub async fn list_brands(State(state): State<AppState>) -> ApiResult<Json<BrandsResponse>> {
    Ok(Json(BrandsResponse {
        brands: catalog::list_brands(&state.db).await?,
    }))
}

/// GET /api/problem-types
pub async fn list_problem_types(
    State(state): State<AppState>,
) -> ApiResult<Json<ProblemTypesResponse>> {
    Ok(Json(ProblemTypesResponse {
        problem_types: catalog::list_problem_types(&state.db).await?,
    }))
}

pub fn catalog_routes() -> Router<AppState> {
    Router::new()
        .route("/api/repairs", get(list_repairs))
        .route("/api/repairs/:id", get(get_repair))
        .route("/api/brands", get(list_brands))
        .route("/api/problem-types", get(list_problem_types))
}
