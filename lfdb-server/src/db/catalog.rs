//! Brands, laptop models and problem types
//!
//! All three are deduplicated by slug. Upserts never modify an existing
//! row: the first spelling seen for a slug wins.

use serde::Serialize;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use lfdb_common::db::models::{Brand, LaptopModel, ProblemType};
use lfdb_common::normalize::{create_slug, search_key};
use lfdb_common::{time, Error, Result};

fn brand_from_row(row: &SqliteRow) -> Result<Brand> {
    Ok(Brand {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        slug: row.try_get("slug")?,
    })
}

fn model_from_row(row: &SqliteRow) -> Result<LaptopModel> {
    Ok(LaptopModel {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        slug: row.try_get("slug")?,
        brand_id: row.try_get("brand_id")?,
    })
}

fn problem_type_from_row(row: &SqliteRow) -> Result<ProblemType> {
    Ok(ProblemType {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        slug: row.try_get("slug")?,
    })
}

fn require_slug(name: &str) -> Result<String> {
    let slug = create_slug(name);
    if slug.is_empty() {
        return Err(Error::InvalidInput(format!("No usable slug in '{}'", name)));
    }
    Ok(slug)
}

/// Find or create a brand by the slug of `name`
pub async fn upsert_brand(pool: &SqlitePool, name: &str) -> Result<Brand> {
    let slug = require_slug(name)?;

    sqlx::query(
        r#"
        INSERT INTO brands (id, name, slug, search_key, created_at)
        VALUES (?, ?, ?, ?, ?)
        ON CONFLICT(slug) DO NOTHING
        "#,
    )
    .bind(Uuid::new_v4().to_string())
    .bind(name.trim())
    .bind(&slug)
    .bind(search_key(name.trim()))
    .bind(time::now())
    .execute(pool)
    .await?;

    let row = sqlx::query("SELECT id, name, slug FROM brands WHERE slug = ?")
        .bind(&slug)
        .fetch_one(pool)
        .await?;

    brand_from_row(&row)
}

/// Find or create a model of `brand_id` by the slug of `name`
pub async fn upsert_model(pool: &SqlitePool, brand_id: &str, name: &str) -> Result<LaptopModel> {
    let slug = require_slug(name)?;

    sqlx::query(
        r#"
        INSERT INTO models (id, name, slug, brand_id, search_key, created_at)
        VALUES (?, ?, ?, ?, ?, ?)
        ON CONFLICT(brand_id, slug) DO NOTHING
        "#,
    )
    .bind(Uuid::new_v4().to_string())
    .bind(name.trim())
    .bind(&slug)
    .bind(brand_id)
    .bind(search_key(name.trim()))
    .bind(time::now())
    .execute(pool)
    .await?;

    let row = sqlx::query("SELECT id, name, slug, brand_id FROM models WHERE brand_id = ? AND slug = ?")
        .bind(brand_id)
        .bind(&slug)
        .fetch_one(pool)
        .await?;

    model_from_row(&row)
}

/// Find or create a problem type by the slug of `name`
pub async fn upsert_problem_type(pool: &SqlitePool, name: &str) -> Result<ProblemType> {
    let slug = require_slug(name)?;

    sqlx::query(
        r#"
        INSERT INTO problem_types (id, name, slug, created_at)
        VALUES (?, ?, ?, ?)
        ON CONFLICT(slug) DO NOTHING
        "#,
    )
    .bind(Uuid::new_v4().to_string())
    .bind(name.trim())
    .bind(&slug)
    .bind(time::now())
    .execute(pool)
    .await?;

    let row = sqlx::query("SELECT id, name, slug FROM problem_types WHERE slug = ?")
        .bind(&slug)
        .fetch_one(pool)
        .await?;

    problem_type_from_row(&row)
}

pub async fn model_exists(pool: &SqlitePool, id: &str) -> Result<bool> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM models WHERE id = ?")
        .bind(id)
        .fetch_one(pool)
        .await?;
    Ok(count > 0)
}

pub async fn problem_type_exists(pool: &SqlitePool, id: &str) -> Result<bool> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM problem_types WHERE id = ?")
        .bind(id)
        .fetch_one(pool)
        .await?;
    Ok(count > 0)
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BrandSummary {
    pub id: String,
    pub name: String,
    pub slug: String,
    pub model_count: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProblemTypeSummary {
    pub id: String,
    pub name: String,
    pub slug: String,
    pub repair_count: i64,
}

/// All brands by name, with their model counts
pub async fn list_brands(pool: &SqlitePool) -> Result<Vec<BrandSummary>> {
    let rows = sqlx::query(
        r#"
        SELECT b.id, b.name, b.slug, COUNT(m.id) AS model_count
        FROM brands b
        LEFT JOIN models m ON m.brand_id = b.id
        GROUP BY b.id
        ORDER BY b.name ASC
        "#,
    )
    .fetch_all(pool)
    .await?;

    rows.iter()
        .map(|row| -> Result<BrandSummary> {
            Ok(BrandSummary {
                id: row.try_get("id")?,
                name: row.try_get("name")?,
                slug: row.try_get("slug")?,
                model_count: row.try_get("model_count")?,
            })
        })
        .collect()
}

/// All problem types by name, with their repair counts
pub async fn list_problem_types(pool: &SqlitePool) -> Result<Vec<ProblemTypeSummary>> {
    let rows = sqlx::query(
        r#"
        SELECT p.id, p.name, p.slug, COUNT(r.id) AS repair_count
        FROM problem_types p
        LEFT JOIN repairs r ON r.problem_type_id = p.id
        GROUP BY p.id
        ORDER BY p.name ASC
        "#,
    )
    .fetch_all(pool)
    .await?;

    rows.iter()
        .map(|row| -> Result<ProblemTypeSummary> {
            Ok(ProblemTypeSummary {
                id: row.try_get("id")?,
                name: row.try_get("name")?,
                slug: row.try_get("slug")?,
                repair_count: row.try_get("repair_count")?,
            })
        })
        .collect()
}
