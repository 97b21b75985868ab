//! Users and login sessions

use chrono::{DateTime, Duration, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use lfdb_common::api::auth::{generate_session_token, hash_password, SESSION_TTL_DAYS};
use lfdb_common::db::models::{Role, User};
use lfdb_common::{time, Result};

fn user_from_row(row: &SqliteRow) -> Result<User> {
    let role: String = row.try_get("role")?;
    Ok(User {
        id: row.try_get("id")?,
        email: row.try_get("email")?,
        name: row.try_get("name")?,
        role: role.parse()?,
        password_hash: row.try_get("password_hash")?,
    })
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub async fn find_user_by_email(pool: &SqlitePool, email: &str) -> Result<Option<User>> {
    let row = sqlx::query(
        "SELECT id, email, name, role, password_hash FROM users WHERE email = ?",
    )
    .bind(normalize_email(email))
    .fetch_optional(pool)
    .await?;

    row.as_ref().map(user_from_row).transpose()
}

/// Create a user, or reset the password, name and role of an existing one
pub async fn upsert_user(
    pool: &SqlitePool,
    email: &str,
    password: &str,
    name: Option<&str>,
    role: Role,
) -> Result<User> {
    let hash = hash_password(password)?;
    let now = time::now();

    sqlx::query(
        r#"
        INSERT INTO users (id, email, name, password_hash, role, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(email) DO UPDATE SET
            name = COALESCE(excluded.name, users.name),
            password_hash = excluded.password_hash,
            role = excluded.role,
            updated_at = excluded.updated_at
        "#,
    )
    .bind(Uuid::new_v4().to_string())
    .bind(normalize_email(email))
    .bind(name)
    .bind(&hash)
    .bind(role.as_str())
    .bind(now)
    .bind(now)
    .execute(pool)
    .await?;

    find_user_by_email(pool, email)
        .await?
        .ok_or_else(|| lfdb_common::Error::Internal("User vanished after upsert".into()))
}

/// Start a session; returns the bearer token
pub async fn create_session(pool: &SqlitePool, user_id: &str) -> Result<(String, DateTime<Utc>)> {
    let token = generate_session_token();
    let now = time::now();
    let expires_at = now + Duration::days(SESSION_TTL_DAYS);

    sqlx::query("INSERT INTO sessions (token, user_id, expires_at, created_at) VALUES (?, ?, ?, ?)")
        .bind(&token)
        .bind(user_id)
        .bind(expires_at)
        .bind(now)
        .execute(pool)
        .await?;

    Ok((token, expires_at))
}

/// User owning an unexpired session
pub async fn find_session_user(pool: &SqlitePool, token: &str) -> Result<Option<User>> {
    let row = sqlx::query(
        r#"
        SELECT u.id, u.email, u.name, u.role, u.password_hash
        FROM sessions s
        JOIN users u ON u.id = s.user_id
        WHERE s.token = ? AND s.expires_at > ?
        "#,
    )
    .bind(token)
    .bind(time::now())
    .fetch_optional(pool)
    .await?;

    row.as_ref().map(user_from_row).transpose()
}

pub async fn delete_session(pool: &SqlitePool, token: &str) -> Result<bool> {
    let result = sqlx::query("DELETE FROM sessions WHERE token = ?")
        .bind(token)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Remove expired sessions; returns how many were deleted
pub async fn purge_expired_sessions(pool: &SqlitePool) -> Result<u64> {
    let result = sqlx::query("DELETE FROM sessions WHERE expires_at <= ?")
        .bind(time::now())
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}

#[cfg(test)]
mod tests {
    use super::*;
    use lfdb_common::api::auth::verify_password;
    use lfdb_common::db::init_memory_database;

    #[tokio::test]
    async fn test_upsert_user_and_promote() {
        let pool = init_memory_database().await.unwrap();

        let user = upsert_user(&pool, "Admin@Example.com", "pw1", Some("Ada"), Role::User)
            .await
            .unwrap();
        assert_eq!(user.email, "admin@example.com");
        assert_eq!(user.role, Role::User);

        let promoted = upsert_user(&pool, "admin@example.com", "pw2", None, Role::Admin)
            .await
            .unwrap();
        assert_eq!(promoted.id, user.id);
        assert_eq!(promoted.role, Role::Admin);
        assert_eq!(promoted.name.as_deref(), Some("Ada"));
        assert!(verify_password("pw2", &promoted.password_hash));
        assert!(!verify_password("pw1", &promoted.password_hash));
    }

    #[tokio::test]
    async fn test_session_lifecycle() {
        let pool = init_memory_database().await.unwrap();
        let user = upsert_user(&pool, "a@b.c", "pw", None, Role::Admin).await.unwrap();

        let (token, expires_at) = create_session(&pool, &user.id).await.unwrap();
        assert!(expires_at > time::now() + Duration::days(SESSION_TTL_DAYS - 1));

        let found = find_session_user(&pool, &token).await.unwrap().unwrap();
        assert_eq!(found.id, user.id);

        assert!(delete_session(&pool, &token).await.unwrap());
        assert!(find_session_user(&pool, &token).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_expired_session_is_ignored() {
        let pool = init_memory_database().await.unwrap();
        let user = upsert_user(&pool, "a@b.c", "pw", None, Role::Admin).await.unwrap();

        sqlx::query("INSERT INTO sessions (token, user_id, expires_at, created_at) VALUES ('old', ?, ?, ?)")
            .bind(&user.id)
            .bind(time::now() - Duration::hours(1))
            .bind(time::now() - Duration::days(31))
            .execute(&pool)
            .await
            .unwrap();

        assert!(find_session_user(&pool, "old").await.unwrap().is_none());
        assert_eq!(purge_expired_sessions(&pool).await.unwrap(), 1);
    }
}
