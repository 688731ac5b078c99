// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Account routes: registration, availability checks, login and profile lookup.

use crate::error::{AppError, Result};
use crate::extract::AppJson;
use crate::models::user::{normalize_email, verify_password, RegisterRequest};
use crate::models::User;
use crate::time_utils::format_utc_rfc3339;
use crate::AppState;
use super::MessageResponse;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Account routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/register", post(register))
        .route("/check-email", post(check_email))
        .route("/check-nickname", post(check_nickname))
        .route("/login", post(login))
        .route("/me", get(get_me))
}

// ─── Registration ────────────────────────────────────────────

/// Create an account.
async fn register(
    State(state): State<Arc<AppState>>,
    AppJson(mut request): AppJson<RegisterRequest>,
) -> Result<(StatusCode, Json<MessageResponse>)> {
    if let Some(field) = request.first_missing_field() {
        return Err(AppError::BadRequest(format!(
            "'{}' is missing or empty",
            field
        )));
    }

    request.email = request.email.as_deref().map(normalize_email);
    request.nickname = request.nickname.as_deref().map(|n| n.trim().to_string());
    request
        .validate()
        .map_err(|_| AppError::BadRequest("'email' must be a valid email address".to_string()))?;

    let email = request.email.clone().unwrap_or_default();
    let nickname = request.nickname.clone().unwrap_or_default();

    if state.db.find_user_by_email(&email).await?.is_some() {
        return Err(AppError::Conflict("Email already registered".to_string()));
    }
    if state.db.find_user_by_nickname(&nickname).await?.is_some() {
        return Err(AppError::Conflict("Nickname already taken".to_string()));
    }

    let password = request.password.clone().unwrap_or_default();
    let password_hash =
        tokio::task::spawn_blocking(move || bcrypt::hash(password, bcrypt::DEFAULT_COST))
            .await
            .map_err(|e| anyhow::anyhow!("Password hashing task failed: {}", e))?
            .map_err(|e| anyhow::anyhow!("Password hashing error: {}", e))?;

    let user = User::from_registration(
        request,
        uuid::Uuid::new_v4().to_string(),
        password_hash,
        format_utc_rfc3339(chrono::Utc::now()),
    )
    .ok_or_else(|| AppError::BadRequest("Incomplete registration".to_string()))?;

    state.db.upsert_user(&user).await?;
    tracing::info!(user_id = %user.id, nickname = %user.nickname, "User registered");

    Ok((
        StatusCode::CREATED,
        Json(MessageResponse {
            message: "User registered successfully".to_string(),
        }),
    ))
}

// ─── Availability Checks ─────────────────────────────────────

#[derive(Deserialize)]
struct CheckEmailRequest {
    #[serde(default)]
    email: String,
}

#[derive(Deserialize)]
struct CheckNicknameRequest {
    #[serde(default)]
    nickname: String,
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ExistsResponse {
    pub exists: bool,
}

async fn check_email(
    State(state): State<Arc<AppState>>,
    AppJson(request): AppJson<CheckEmailRequest>,
) -> Result<Json<ExistsResponse>> {
    let email = normalize_email(&request.email);
    if email.is_empty() {
        return Err(AppError::BadRequest("Email is required".to_string()));
    }

    let exists = state.db.find_user_by_email(&email).await?.is_some();
    Ok(Json(ExistsResponse { exists }))
}

async fn check_nickname(
    State(state): State<Arc<AppState>>,
    AppJson(request): AppJson<CheckNicknameRequest>,
) -> Result<Json<ExistsResponse>> {
    let nickname = request.nickname.trim();
    if nickname.is_empty() {
        return Err(AppError::BadRequest("Nickname is required".to_string()));
    }

    let exists = state.db.find_user_by_nickname(nickname).await?.is_some();
    Ok(Json(ExistsResponse { exists }))
}

// ─── Login ───────────────────────────────────────────────────

#[derive(Deserialize)]
struct LoginRequest {
    email: Option<String>,
    password: Option<String>,
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct LoginResponse {
    pub message: String,
    pub nickname: String,
    pub email: String,
}

async fn login(
    State(state): State<Arc<AppState>>,
    AppJson(request): AppJson<LoginRequest>,
) -> Result<Json<LoginResponse>> {
    let email = normalize_email(request.email.as_deref().unwrap_or_default());
    let password = request.password.unwrap_or_default();
    if email.is_empty() || password.is_empty() {
        return Err(AppError::BadRequest(
            "Email and password required".to_string(),
        ));
    }

    let user = state
        .db
        .find_user_by_email(&email)
        .await?
        .ok_or(AppError::Unauthorized)?;

    let stored = user.password.clone();
    let is_valid = tokio::task::spawn_blocking(move || verify_password(&password, &stored))
        .await
        .map_err(|e| anyhow::anyhow!("Password verification task failed: {}", e))?;

    if !is_valid {
        tracing::warn!(user_id = %user.id, "Login rejected: bad password");
        return Err(AppError::Unauthorized);
    }

    tracing::info!(user_id = %user.id, "Login successful");
    Ok(Json(LoginResponse {
        message: "Login successful".to_string(),
        nickname: user.nickname,
        email: user.email,
    }))
}

// ─── Profile ─────────────────────────────────────────────────

#[derive(Deserialize)]
struct EmailQuery {
    email: Option<String>,
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct MeResponse {
    pub id: String,
    pub nickname: String,
    pub email: String,
}

async fn get_me(
    State(state): State<Arc<AppState>>,
    Query(query): Query<EmailQuery>,
) -> Result<Json<MeResponse>> {
    let email = normalize_email(query.email.as_deref().unwrap_or_default());
    if email.is_empty() {
        return Err(AppError::BadRequest(
            "Email parameter is missing".to_string(),
        ));
    }

    let user = state
        .db
        .find_user_by_email(&email)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    Ok(Json(MeResponse {
        id: user.id,
        nickname: user.nickname,
        email: user.email,
    }))
}
