// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Slowage-Tracker API Server
//!
//! Serves meal logging with MIND diet scoring, water and sleep tracking,
//! step-count challenges with points, and recipes.

use slowage_tracker::{config::Config, db::FirestoreDb, AppState};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging for GCP
    init_logging()?;

    let config = Config::from_env()?;
    tracing::info!(port = config.port, "Starting Slowage-Tracker API");

    let db = FirestoreDb::new(&config.gcp_project_id).await?;

    let port = config.port;
    let state = Arc::new(AppState::new(config, db));

    if !state.news.is_configured() {
        tracing::warn!("Naver credentials not set; /news will return 502");
    }
    if !state.storage.is_configured() {
        tracing::warn!("Cloudinary not configured; /upload-image will return 502");
    }
    let app = slowage_tracker::routes::create_router(state);

    let addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging (GCP-compliant).
fn init_logging() -> Result<(), Box<dyn std::error::Error>> {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("slowage_tracker=debug".parse()?)
                .add_directive("info".parse()?),
        )
        .with(format)
        .init();
    Ok(())
}
