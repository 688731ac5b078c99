// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Slow-aging news headlines.

use crate::error::Result;
use crate::services::news::NewsItem;
use crate::AppState;
use axum::{extract::State, routing::post, Json, Router};
use serde::Serialize;
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

const NEWS_QUERY: &str = "저속노화";
const NEWS_COUNT: u32 = 3;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/news", post(get_news))
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct NewsResponse {
    pub success: bool,
    pub news: Vec<NewsItem>,
}

async fn get_news(State(state): State<Arc<AppState>>) -> Result<Json<NewsResponse>> {
    let summarizer = state
        .config
        .news_summaries
        .then(|| (&state.gemini, state.config.gemini_text_model.as_str()));

    let news = state
        .news
        .search(NEWS_QUERY, NEWS_COUNT, summarizer)
        .await?;

    Ok(Json(NewsResponse {
        success: true,
        news,
    }))
}
