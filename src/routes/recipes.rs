// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Recipe search, views, user posts, keywords and search history.

use crate::error::{AppError, Result};
use crate::extract::AppJson;
use crate::models::recipe::{field_messages, NewPost, RecipeResponse};
use crate::models::{RecipePost, SearchHistoryEntry};
use crate::time_utils::{format_display, format_utc_rfc3339};
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use validator::Validate;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Recipe routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/posts", post(create_post))
        .route("/recipes/search", get(search_recipes))
        .route("/recipes/view/{recipe_id}", post(record_view))
        .route("/keywords", get(list_keywords))
        .route("/search-history/add", post(add_search_history))
        .route("/search-history/list", get(list_search_history))
        .route("/search-history/delete", delete(delete_search_history))
        .route("/search-history/clear", delete(clear_search_history))
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct StatusResponse {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl StatusResponse {
    fn success() -> Self {
        Self {
            status: "success".to_string(),
            message: None,
        }
    }
}

#[derive(Deserialize)]
struct KeywordQuery {
    #[serde(default)]
    keyword: String,
}

// ─── Posts ───────────────────────────────────────────────────

#[derive(Serialize)]
struct PostCreated {
    ok: bool,
    post: RecipePost,
}

#[derive(Serialize)]
struct PostRejected {
    ok: bool,
    errors: BTreeMap<String, String>,
}

/// Create a recipe post. Validation failures list one message per field.
async fn create_post(
    State(state): State<Arc<AppState>>,
    AppJson(request): AppJson<NewPost>,
) -> Result<Response> {
    let request = request.normalized();
    if let Err(errors) = request.validate() {
        let errors = field_messages(&errors);
        tracing::debug!(fields = ?errors.keys().collect::<Vec<_>>(), "Post rejected");
        return Ok((
            StatusCode::BAD_REQUEST,
            Json(PostRejected { ok: false, errors }),
        )
            .into_response());
    }

    let mut post = request.into_post(&format_utc_rfc3339(chrono::Utc::now()));
    post.id = uuid::Uuid::new_v4().to_string();
    state.db.insert_post(&post).await?;

    tracing::info!(post_id = %post.id, nickname = %post.nickname, "Post created");
    Ok((StatusCode::CREATED, Json(PostCreated { ok: true, post })).into_response())
}

// ─── Recipes ─────────────────────────────────────────────────

/// Recipes whose name or description contains the keyword.
async fn search_recipes(
    State(state): State<Arc<AppState>>,
    Query(query): Query<KeywordQuery>,
) -> Result<Json<Vec<RecipeResponse>>> {
    let keyword = query.keyword.trim();
    if keyword.is_empty() {
        return Err(AppError::BadRequest("Keyword is required".to_string()));
    }

    let recipes: Vec<RecipeResponse> = state
        .db
        .list_recipes()
        .await?
        .into_iter()
        .filter(|r| r.matches(keyword))
        .map(RecipeResponse::from)
        .collect();

    tracing::debug!(keyword, count = recipes.len(), "Recipe search");
    Ok(Json(recipes))
}

async fn record_view(
    State(state): State<Arc<AppState>>,
    Path(recipe_id): Path<String>,
) -> Result<Json<StatusResponse>> {
    if !state.db.increment_recipe_views(&recipe_id).await? {
        return Err(AppError::NotFound("Recipe not found".to_string()));
    }
    Ok(Json(StatusResponse {
        status: "success".to_string(),
        message: Some("View count increased".to_string()),
    }))
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct KeywordsResponse {
    pub status: String,
    pub keywords: Vec<String>,
}

async fn list_keywords(State(state): State<Arc<AppState>>) -> Result<Json<KeywordsResponse>> {
    let keywords = state
        .db
        .list_keywords()
        .await?
        .into_iter()
        .map(|k| k.keyword)
        .collect();

    Ok(Json(KeywordsResponse {
        status: "success".to_string(),
        keywords,
    }))
}

// ─── Search History ──────────────────────────────────────────

#[derive(Deserialize)]
struct AddKeywordRequest {
    #[serde(default)]
    keyword: String,
}

/// Record a search. Repeating a keyword moves it to the top.
async fn add_search_history(
    State(state): State<Arc<AppState>>,
    AppJson(request): AppJson<AddKeywordRequest>,
) -> Result<Json<StatusResponse>> {
    let keyword = request.keyword.trim();
    if keyword.is_empty() {
        return Err(AppError::BadRequest("Keyword required".to_string()));
    }

    state
        .db
        .upsert_search_history(&SearchHistoryEntry {
            keyword: keyword.to_string(),
            created_at: format_utc_rfc3339(chrono::Utc::now()),
        })
        .await?;
    Ok(Json(StatusResponse::success()))
}

async fn list_search_history(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<SearchHistoryEntry>>> {
    let entries = state
        .db
        .list_search_history()
        .await?
        .into_iter()
        .map(|entry| SearchHistoryEntry {
            created_at: format_display(&entry.created_at),
            keyword: entry.keyword,
        })
        .collect();
    Ok(Json(entries))
}

async fn delete_search_history(
    State(state): State<Arc<AppState>>,
    Query(query): Query<KeywordQuery>,
) -> Result<Json<StatusResponse>> {
    let keyword = query.keyword.trim();
    if !keyword.is_empty() {
        state.db.delete_search_history(keyword).await?;
    }
    Ok(Json(StatusResponse::success()))
}

async fn clear_search_history(
    State(state): State<Arc<AppState>>,
) -> Result<Json<StatusResponse>> {
    let count = state.db.clear_search_history().await?;
    tracing::info!(count, "Search history cleared");
    Ok(Json(StatusResponse::success()))
}
