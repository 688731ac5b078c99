// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Meal logging with MIND diet scoring, and meal history.

use crate::error::{AppError, Result};
use crate::extract::AppJson;
use crate::models::user::normalize_email;
use crate::models::{DietRecord, MindResult};
use crate::services::InlineImage;
use crate::time_utils::format_utc_rfc3339;
use crate::AppState;
use axum::{
    extract::{Query, State},
    http::header,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

const IMAGE_FETCH_TIMEOUT: Duration = Duration::from_secs(10);
const DEFAULT_IMAGE_MIME: &str = "image/jpeg";
const HISTORY_LIMIT: u32 = 3;
const DEFAULT_MEAL_NICKNAME: &str = "guest";

/// Meal routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/chat-meal", post(chat_meal))
        .route("/api/history", get(get_history))
}

// ─── Chat Meal ───────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct ChatMealRequest {
    pub nickname: Option<String>,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub meal_type: String,
    pub image_url: Option<String>,
}

#[derive(Debug, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ChatMealResponse {
    pub success: bool,
    pub foods: Vec<String>,
    pub mind: MindResult,
    /// `image`, `text`, or `unknown` on failure
    pub source: String,
}

impl ChatMealResponse {
    fn failed() -> Self {
        Self {
            success: false,
            foods: Vec::new(),
            mind: MindResult::unscored(),
            source: "unknown".to_string(),
        }
    }
}

/// Analyze a meal from a photo URL or a message and store the result.
///
/// Failures never surface as HTTP errors; the client gets `success: false`.
async fn chat_meal(
    State(state): State<Arc<AppState>>,
    request: std::result::Result<AppJson<ChatMealRequest>, AppError>,
) -> Json<ChatMealResponse> {
    let outcome = match request {
        Ok(AppJson(request)) => analyze_and_store(&state, request).await,
        Err(e) => Err(e),
    };

    match outcome {
        Ok(response) => Json(response),
        Err(e) => {
            tracing::error!(error = %e, "Meal analysis failed");
            Json(ChatMealResponse::failed())
        }
    }
}

async fn analyze_and_store(state: &AppState, request: ChatMealRequest) -> Result<ChatMealResponse> {
    let image_url = request
        .image_url
        .map(|u| u.trim().to_string())
        .filter(|u| !u.is_empty());

    let (foods, source) = match &image_url {
        Some(url) => {
            let image = fetch_image(&state.http, url).await?;
            let foods = state.meal_analyzer.extract_foods_from_image(&image).await;
            (foods, "image")
        }
        None => {
            let foods = state
                .meal_analyzer
                .extract_food_names(&request.message)
                .await;
            (foods, "text")
        }
    };

    let mind = state
        .meal_analyzer
        .score_foods(&foods, &request.meal_type)
        .await;

    let record = DietRecord {
        id: uuid::Uuid::new_v4().to_string(),
        nickname: request
            .nickname
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| DEFAULT_MEAL_NICKNAME.to_string()),
        meal_type: request.meal_type,
        message: request.message,
        image_url,
        foods,
        mind,
        timestamp: format_utc_rfc3339(chrono::Utc::now()),
    };
    state.db.insert_diet_record(&record).await?;

    tracing::info!(
        nickname = %record.nickname,
        source,
        foods = record.foods.len(),
        meal_score = record.mind.meal_score,
        "Meal recorded"
    );

    Ok(ChatMealResponse {
        success: true,
        foods: record.foods,
        mind: record.mind,
        source: source.to_string(),
    })
}

/// Download a meal photo. The MIME type comes from `Content-Type`.
async fn fetch_image(http: &reqwest::Client, url: &str) -> Result<InlineImage> {
    let response = http
        .get(url)
        .timeout(IMAGE_FETCH_TIMEOUT)
        .send()
        .await
        .and_then(|r| r.error_for_status())
        .map_err(|e| AppError::Upstream(format!("Image download failed: {}", e)))?;

    let mime_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .unwrap_or(DEFAULT_IMAGE_MIME)
        .to_string();

    let bytes = response
        .bytes()
        .await
        .map_err(|e| AppError::Upstream(format!("Image download failed: {}", e)))?;

    Ok(InlineImage::new(mime_type, bytes.to_vec()))
}

// ─── History ─────────────────────────────────────────────────

#[derive(Deserialize)]
struct HistoryQuery {
    email: Option<String>,
}

/// The user's most recent meals, newest first.
async fn get_history(
    State(state): State<Arc<AppState>>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<Vec<DietRecord>>> {
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

    let records = state
        .db
        .recent_diet_records(&user.nickname, HISTORY_LIMIT)
        .await?;
    Ok(Json(records))
}
