// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Raw image upload to hosted storage.

use crate::error::{AppError, Result};
use crate::AppState;
use axum::{body::Bytes, extract::State, routing::post, Json, Router};
use serde::Serialize;
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

const UPLOAD_FOLDER: &str = "uploads";

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/upload-image", post(upload_image))
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct UploadResponse {
    pub result: String,
    pub url: String,
}

/// Store the request body as an image and return its public URL.
async fn upload_image(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<UploadResponse>> {
    if body.is_empty() {
        return Err(AppError::BadRequest("No image data received".to_string()));
    }

    let now = chrono::Utc::now();
    let public_id = format!("image_{}", now.format("%Y%m%d_%H%M%S"));
    let url = state
        .storage
        .upload(&body, UPLOAD_FOLDER, &public_id, now.timestamp())
        .await?;

    Ok(Json(UploadResponse {
        result: "ok".to_string(),
        url,
    }))
}
