//! Repair persistence and catalog queries

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use lfdb_common::db::models::{Brand, ProblemType, Repair, RepairStatus, Video};
use lfdb_common::normalize::search_key;
use lfdb_common::{time, Result};

use super::videos::get_video;

const REPAIR_COLUMNS: &str = "r.id, r.video_id, r.model_id, r.problem_type_id, r.troubleshooting, \
     r.solution, r.status, r.created_at, r.updated_at";

fn repair_from_row(row: &SqliteRow) -> Result<Repair> {
    let status: String = row.try_get("status")?;
    Ok(Repair {
        id: row.try_get("id")?,
        video_id: row.try_get("video_id")?,
        model_id: row.try_get("model_id")?,
        problem_type_id: row.try_get("problem_type_id")?,
        troubleshooting: row.try_get("troubleshooting")?,
        solution: row.try_get("solution")?,
        status: status.parse()?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

/// Values written by the extraction pipeline
#[derive(Debug, Clone)]
pub struct RepairUpsert {
    pub video_id: String,
    pub model_id: Option<String>,
    pub problem_type_id: Option<String>,
    pub troubleshooting: String,
    pub solution: String,
    pub status: RepairStatus,
}

/// Create the repair of a video, or overwrite it if one exists
pub async fn upsert_repair(pool: &SqlitePool, repair: &RepairUpsert) -> Result<Repair> {
    let now = time::now();

    sqlx::query(
        r#"
        INSERT INTO repairs (
            id, video_id, model_id, problem_type_id, troubleshooting, solution,
            status, created_at, updated_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(video_id) DO UPDATE SET
            model_id = excluded.model_id,
            problem_type_id = excluded.problem_type_id,
            troubleshooting = excluded.troubleshooting,
            solution = excluded.solution,
            status = excluded.status,
            updated_at = excluded.updated_at
        "#,
    )
    .bind(Uuid::new_v4().to_string())
    .bind(&repair.video_id)
    .bind(&repair.model_id)
    .bind(&repair.problem_type_id)
    .bind(&repair.troubleshooting)
    .bind(&repair.solution)
    .bind(repair.status.as_str())
    .bind(now)
    .bind(now)
    .execute(pool)
    .await?;

    let row = sqlx::query(&format!(
        "SELECT {} FROM repairs r WHERE r.video_id = ?",
        REPAIR_COLUMNS
    ))
    .bind(&repair.video_id)
    .fetch_one(pool)
    .await?;

    repair_from_row(&row)
}

pub async fn get_repair(pool: &SqlitePool, id: &str) -> Result<Option<Repair>> {
    let row = sqlx::query(&format!("SELECT {} FROM repairs r WHERE r.id = ?", REPAIR_COLUMNS))
        .bind(id)
        .fetch_optional(pool)
        .await?;

    row.as_ref().map(repair_from_row).transpose()
}

/// Admin edit; `None` leaves a field unchanged
///
/// For the links, `Some(None)` clears the link.
#[derive(Debug, Clone, Default)]
pub struct RepairPatch {
    pub status: Option<RepairStatus>,
    pub troubleshooting: Option<String>,
    pub solution: Option<String>,
    pub model_id: Option<Option<String>>,
    pub problem_type_id: Option<Option<String>>,
}

/// Apply a patch; returns false when the repair does not exist
pub async fn update_repair(pool: &SqlitePool, id: &str, patch: &RepairPatch) -> Result<bool> {
    let result = sqlx::query(
        r#"
        UPDATE repairs SET
            status = COALESCE(?, status),
            troubleshooting = COALESCE(?, troubleshooting),
            solution = COALESCE(?, solution),
            model_id = CASE WHEN ? THEN ? ELSE model_id END,
            problem_type_id = CASE WHEN ? THEN ? ELSE problem_type_id END,
            updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(patch.status.map(|s| s.as_str()))
    .bind(&patch.troubleshooting)
    .bind(&patch.solution)
    .bind(patch.model_id.is_some())
    .bind(patch.model_id.clone().flatten())
    .bind(patch.problem_type_id.is_some())
    .bind(patch.problem_type_id.clone().flatten())
    .bind(time::now())
    .bind(id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Video fields shown in repair lists
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoSummary {
    pub youtube_id: String,
    pub title: String,
    pub thumbnail_url: Option<String>,
    pub published_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelWithBrand {
    pub id: String,
    pub name: String,
    pub slug: String,
    pub brand_id: String,
    pub brand: Brand,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RepairListItem {
    #[serde(flatten)]
    pub repair: Repair,
    pub video: VideoSummary,
    pub model: Option<ModelWithBrand>,
    pub problem_type: Option<ProblemType>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RepairDetail {
    #[serde(flatten)]
    pub repair: Repair,
    pub video: Video,
    pub model: Option<ModelWithBrand>,
    pub problem_type: Option<ProblemType>,
}

/// Filters shared by the public catalog and the admin list
#[derive(Debug, Clone, Default)]
pub struct RepairFilter {
    pub status: Option<RepairStatus>,
    /// Case-insensitive substring of title, description, model or brand name
    pub search: Option<String>,
    pub brand_slug: Option<String>,
    pub problem_slug: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepairOrder {
    /// Video publication date, newest first
    NewestVideo,
    /// Repair creation date, newest first
    NewestRepair,
}

fn escape_like(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

impl RepairFilter {
    /// WHERE clause and its bind values
    fn where_clause(&self) -> (String, Vec<String>) {
        let mut conditions = Vec::new();
        let mut binds = Vec::new();

        if let Some(status) = self.status {
            conditions.push("r.status = ?".to_string());
            binds.push(status.as_str().to_string());
        }

        if let Some(search) = self.search.as_deref().filter(|s| !s.trim().is_empty()) {
            // Both sides are folded in Rust; SQLite LIKE only folds ASCII
            let pattern = format!("%{}%", escape_like(&search_key(search.trim())));
            conditions.push(
                "(v.search_key LIKE ? ESCAPE '\\' OR m.search_key LIKE ? ESCAPE '\\' \
                 OR b.search_key LIKE ? ESCAPE '\\')"
                    .to_string(),
            );
            binds.extend(std::iter::repeat(pattern).take(3));
        }

        if let Some(brand) = self.brand_slug.as_deref().filter(|s| !s.is_empty()) {
            conditions.push("b.slug = ?".to_string());
            binds.push(brand.to_string());
        }

        if let Some(problem) = self.problem_slug.as_deref().filter(|s| !s.is_empty()) {
            conditions.push("p.slug = ?".to_string());
            binds.push(problem.to_string());
        }

        if conditions.is_empty() {
            (String::new(), binds)
        } else {
            (format!("WHERE {}", conditions.join(" AND ")), binds)
        }
    }
}

const LIST_JOINS: &str = r#"
        FROM repairs r
        JOIN videos v ON v.id = r.video_id
        LEFT JOIN models m ON m.id = r.model_id
        LEFT JOIN brands b ON b.id = m.brand_id
        LEFT JOIN problem_types p ON p.id = r.problem_type_id
"#;

fn model_with_brand_from_row(row: &SqliteRow) -> Result<Option<ModelWithBrand>> {
    let model_id: Option<String> = row.try_get("m_id")?;
    let Some(model_id) = model_id else {
        return Ok(None);
    };
    let brand_id: String = row.try_get("b_id")?;

    Ok(Some(ModelWithBrand {
        id: model_id,
        name: row.try_get("m_name")?,
        slug: row.try_get("m_slug")?,
        brand_id: brand_id.clone(),
        brand: Brand {
            id: brand_id,
            name: row.try_get("b_name")?,
            slug: row.try_get("b_slug")?,
        },
    }))
}

fn problem_type_from_joined_row(row: &SqliteRow) -> Result<Option<ProblemType>> {
    let id: Option<String> = row.try_get("p_id")?;
    let Some(id) = id else {
        return Ok(None);
    };

    Ok(Some(ProblemType {
        id,
        name: row.try_get("p_name")?,
        slug: row.try_get("p_slug")?,
    }))
}

fn list_item_from_row(row: &SqliteRow) -> Result<RepairListItem> {
    Ok(RepairListItem {
        repair: repair_from_row(row)?,
        video: VideoSummary {
            youtube_id: row.try_get("v_youtube_id")?,
            title: row.try_get("v_title")?,
            thumbnail_url: row.try_get("v_thumbnail_url")?,
            published_at: row.try_get("v_published_at")?,
        },
        model: model_with_brand_from_row(row)?,
        problem_type: problem_type_from_joined_row(row)?,
    })
}

/// One page of repairs matching `filter`, plus the total match count
pub async fn list_repairs(
    pool: &SqlitePool,
    filter: &RepairFilter,
    order: RepairOrder,
    limit: i64,
    offset: i64,
) -> Result<(Vec<RepairListItem>, i64)> {
    let (where_clause, binds) = filter.where_clause();

    let count_sql = format!("SELECT COUNT(*) {} {}", LIST_JOINS, where_clause);
    let mut count_query = sqlx::query_scalar::<_, i64>(&count_sql);
    for value in &binds {
        count_query = count_query.bind(value);
    }
    let total = count_query.fetch_one(pool).await?;

    let order_by = match order {
        RepairOrder::NewestVideo => "v.published_at DESC",
        RepairOrder::NewestRepair => "r.created_at DESC",
    };

    let list_sql = format!(
        r#"
        SELECT {REPAIR_COLUMNS},
               v.youtube_id AS v_youtube_id, v.title AS v_title,
               v.thumbnail_url AS v_thumbnail_url, v.published_at AS v_published_at,
               m.id AS m_id, m.name AS m_name, m.slug AS m_slug,
               b.id AS b_id, b.name AS b_name, b.slug AS b_slug,
               p.id AS p_id, p.name AS p_name, p.slug AS p_slug
        {LIST_JOINS}
        {where_clause}
        ORDER BY {order_by}
        LIMIT ? OFFSET ?
        "#
    );
    let mut list_query = sqlx::query(&list_sql);
    for value in &binds {
        list_query = list_query.bind(value);
    }
    let rows = list_query.bind(limit).bind(offset).fetch_all(pool).await?;

    let items = rows
        .iter()
        .map(list_item_from_row)
        .collect::<Result<Vec<_>>>()?;

    Ok((items, total))
}

/// Repair with its full video, model and problem type
pub async fn get_repair_detail(pool: &SqlitePool, id: &str) -> Result<Option<RepairDetail>> {
    let Some(repair) = get_repair(pool, id).await? else {
        return Ok(None);
    };

    let Some(video) = get_video(pool, &repair.video_id).await? else {
        return Ok(None);
    };

    let model = match repair.model_id.as_deref() {
        Some(model_id) => {
            let row = sqlx::query(
                r#"
                SELECT m.id AS m_id, m.name AS m_name, m.slug AS m_slug,
                       b.id AS b_id, b.name AS b_name, b.slug AS b_slug
                FROM models m
                JOIN brands b ON b.id = m.brand_id
                WHERE m.id = ?
                "#,
            )
            .bind(model_id)
            .fetch_optional(pool)
            .await?;
            match row {
                Some(row) => model_with_brand_from_row(&row)?,
                None => None,
            }
        }
        None => None,
    };

    let problem_type = match repair.problem_type_id.as_deref() {
        Some(problem_type_id) => {
            let row = sqlx::query(
                "SELECT id AS p_id, name AS p_name, slug AS p_slug FROM problem_types WHERE id = ?",
            )
            .bind(problem_type_id)
            .fetch_optional(pool)
            .await?;
            match row {
                Some(row) => problem_type_from_joined_row(&row)?,
                None => None,
            }
        }
        None => None,
    };

    Ok(Some(RepairDetail {
        repair,
        video,
        model,
        problem_type,
    }))
}

/// IDs and modification times of approved repairs
pub async fn list_approved_ids(pool: &SqlitePool) -> Result<Vec<(String, DateTime<Utc>)>> {
    let rows = sqlx::query(
        "SELECT id, updated_at FROM repairs WHERE status = 'APPROVED' ORDER BY updated_at DESC",
    )
    .fetch_all(pool)
    .await?;

    rows.iter()
        .map(|row| -> Result<(String, DateTime<Utc>)> {
            Ok((row.try_get("id")?, row.try_get("updated_at")?))
        })
        .collect()
}
