//! Login sessions and route guards
//!
//! Admin routes take `Authorization: Bearer <session token>`; cron routes
//! take `Authorization: Bearer <cron secret>`.

use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::Response,
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use lfdb_common::api::auth::{cron_request_allowed, parse_bearer, verify_password};
use lfdb_common::db::models::{Role, User};

use crate::db::users;
use crate::{ApiError, ApiResult, AppState};

/// User attached to a request by [`require_admin`]
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserInfo {
    pub id: String,
    pub email: String,
    pub name: Option<String>,
    pub role: Role,
}

impl From<&User> for UserInfo {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            email: user.email.clone(),
            name: user.name.clone(),
            role: user.role,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub user: UserInfo,
}

#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub user: UserInfo,
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(parse_bearer)
}

async fn session_user(state: &AppState, headers: &HeaderMap) -> ApiResult<User> {
    let token = bearer_token(headers).ok_or(ApiError::Unauthorized)?;
    users::find_session_user(&state.db, token)
        .await?
        .ok_or(ApiError::Unauthorized)
}

/// Reject requests without an admin session
pub async fn require_admin(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> ApiResult<Response> {
    let user = session_user(&state, request.headers()).await?;

    if user.role != Role::Admin {
        warn!(user = %user.email, "Non-admin user attempted admin access");
        return Err(ApiError::Unauthorized);
    }

    request.extensions_mut().insert(CurrentUser(user));
    Ok(next.run(request).await)
}

/// Reject cron triggers that do not carry the configured secret
pub async fn require_cron_secret(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> ApiResult<Response> {
    let secret = state.config.cron_secret.as_deref();
    if secret.is_none() {
        warn!("CRON_SECRET not configured; accepting unauthenticated cron trigger");
    }

    let header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok());

    if !cron_request_allowed(header, secret) {
        return Err(ApiError::Unauthorized);
    }

    Ok(next.run(request).await)
}

/// POST /api/auth/login
pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> ApiResult<Json<LoginResponse>> {
    let invalid = || ApiError::InvalidCredentials;

    let user = users::find_user_by_email(&state.db, &body.email)
        .await?
        .ok_or_else(invalid)?;

    if !verify_password(&body.password, &user.password_hash) {
        warn!(email = %body.email, "Failed login attempt");
        return Err(invalid());
    }

    let (token, expires_at) = users::create_session(&state.db, &user.id).await?;
    info!(user = %user.email, "User logged in");

    Ok(Json(LoginResponse {
        token,
        expires_at,
        user: UserInfo::from(&user),
    }))
}

/// POST /api/auth/logout
pub async fn logout(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<Json<serde_json::Value>> {
    let token = bearer_token(&headers).ok_or(ApiError::Unauthorized)?;
    let removed = users::delete_session(&state.db, token).await?;
    Ok(Json(serde_json::json!({ "success": removed })))
}

/// GET /api/auth/me
pub async fn me(State(state): State<AppState>, headers: HeaderMap) -> ApiResult<Json<MeResponse>> {
    let user = session_user(&state, &headers).await?;
    Ok(Json(MeResponse {
        user: UserInfo::from(&user),
    }))
}

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/api/auth/login", post(login))
        .route("/api/auth/logout", post(logout))
        .route("/api/auth/me", get(me))
}
