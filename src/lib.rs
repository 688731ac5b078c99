// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Slowage-Tracker: backend for a "slow aging" health and diet app
//!
//! This crate provides the HTTP API for meal logging with MIND diet scoring,
//! water and sleep tracking, step-count challenges with points, and recipes.

pub mod config;
pub mod db;
pub mod error;
pub mod extract;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use config::Config;
use db::FirestoreDb;
use services::{GeminiClient, ImageStorage, MealAnalyzer, NewsClient, StepCounter};

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub db: FirestoreDb,
    pub gemini: GeminiClient,
    pub meal_analyzer: MealAnalyzer,
    pub step_counter: StepCounter,
    pub news: NewsClient,
    pub storage: ImageStorage,
    /// Client for fetching meal photos by URL
    pub http: reqwest::Client,
}

impl AppState {
    /// Build the service layer from configuration.
    pub fn new(config: Config, db: FirestoreDb) -> Self {
        let gemini = GeminiClient::new(config.gemini_api_key.clone());
        Self::with_gemini(config, db, gemini)
    }

    /// Like [`AppState::new`] with an explicit model client.
    pub fn with_gemini(config: Config, db: FirestoreDb, gemini: GeminiClient) -> Self {
        let meal_analyzer = MealAnalyzer::new(
            gemini.clone(),
            config.gemini_text_model.clone(),
            config.gemini_vision_model.clone(),
        );
        let step_counter = StepCounter::new(gemini.clone(), config.gemini_step_model.clone());
        let news = NewsClient::new(
            config.naver_client_id.clone(),
            config.naver_client_secret.clone(),
        );
        let storage = ImageStorage::new(
            config.cloudinary_cloud_name.clone(),
            config.cloudinary_api_key.clone(),
            config.cloudinary_api_secret.clone(),
        );

        Self {
            config,
            db,
            gemini,
            meal_analyzer,
            step_counter,
            news,
            storage,
            http: reqwest::Client::new(),
        }
    }
}
