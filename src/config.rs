// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application configuration loaded from environment variables.
//!
//! Secrets are read once at startup and held in memory. A `.env` file is
//! honoured for local development.

use std::env;

/// Default text model for food extraction and MIND scoring.
pub const DEFAULT_TEXT_MODEL: &str = "gemini-2.5-flash";
/// Default vision model for meal photos.
pub const DEFAULT_VISION_MODEL: &str = "gemini-2.5-flash";
/// Default model for reading pedometer screenshots.
pub const DEFAULT_STEP_MODEL: &str = "gemini-2.5-pro";

/// Korea Standard Time; "today" is computed in this offset unless overridden.
const DEFAULT_UTC_OFFSET_HOURS: i32 = 9;

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    // --- Environment Variables (non-sensitive) ---
    /// Frontend URL allowed by CORS
    pub frontend_url: String,
    /// GCP project ID (Firestore)
    pub gcp_project_id: String,
    /// Server port
    pub port: u16,
    /// Model used for text prompts
    pub gemini_text_model: String,
    /// Model used for meal photos
    pub gemini_vision_model: String,
    /// Model used for pedometer screenshots
    pub gemini_step_model: String,
    /// Offset from UTC (hours) that defines the user's calendar day
    pub utc_offset_hours: i32,
    /// Summarize news items with the text model
    pub news_summaries: bool,
    /// Cloudinary cloud name (uploads disabled when unset)
    pub cloudinary_cloud_name: Option<String>,
    /// Cloudinary API key
    pub cloudinary_api_key: Option<String>,

    // --- Secrets ---
    /// Gemini API key
    pub gemini_api_key: String,
    /// Naver search client id (news disabled when unset)
    pub naver_client_id: Option<String>,
    /// Naver search client secret
    pub naver_client_secret: Option<String>,
    /// Cloudinary API secret
    pub cloudinary_api_secret: Option<String>,
}

impl Default for Config {
    /// Default config for testing only.
    fn default() -> Self {
        Self::test_default()
    }
}

impl Config {
    /// Config with dummy credentials for tests; external services are never reached.
    pub fn test_default() -> Self {
        Self {
            frontend_url: "http://localhost:5173".to_string(),
            gcp_project_id: "test-project".to_string(),
            port: 8080,
            gemini_text_model: DEFAULT_TEXT_MODEL.to_string(),
            gemini_vision_model: DEFAULT_VISION_MODEL.to_string(),
            gemini_step_model: DEFAULT_STEP_MODEL.to_string(),
            utc_offset_hours: DEFAULT_UTC_OFFSET_HOURS,
            news_summaries: false,
            cloudinary_cloud_name: None,
            cloudinary_api_key: None,
            gemini_api_key: "test_gemini_key".to_string(),
            naver_client_id: None,
            naver_client_secret: None,
            cloudinary_api_secret: None,
        }
    }

    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let utc_offset_hours = match env::var("UTC_OFFSET_HOURS") {
            Ok(raw) => {
                let hours: i32 = raw
                    .trim()
                    .parse()
                    .map_err(|_| ConfigError::Invalid("UTC_OFFSET_HOURS", raw.clone()))?;
                if !(-23..=23).contains(&hours) {
                    return Err(ConfigError::Invalid("UTC_OFFSET_HOURS", raw));
                }
                hours
            }
            Err(_) => DEFAULT_UTC_OFFSET_HOURS,
        };

        Ok(Self {
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:5173".to_string()),
            gcp_project_id: env::var("GCP_PROJECT_ID").unwrap_or_else(|_| "local-dev".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .unwrap_or(8080),
            gemini_text_model: env::var("GEMINI_TEXT_MODEL")
                .unwrap_or_else(|_| DEFAULT_TEXT_MODEL.to_string()),
            gemini_vision_model: env::var("GEMINI_VISION_MODEL")
                .unwrap_or_else(|_| DEFAULT_VISION_MODEL.to_string()),
            gemini_step_model: env::var("GEMINI_STEP_MODEL")
                .unwrap_or_else(|_| DEFAULT_STEP_MODEL.to_string()),
            utc_offset_hours,
            news_summaries: env::var("NEWS_SUMMARIES")
                .map(|v| matches!(v.trim(), "1" | "true" | "TRUE" | "yes"))
                .unwrap_or(false),
            cloudinary_cloud_name: optional_var("CLOUDINARY_CLOUD_NAME"),
            cloudinary_api_key: optional_var("CLOUDINARY_API_KEY"),

            gemini_api_key: env::var("GEMINI_API_KEY")
                .map(|v| v.trim().to_string())
                .map_err(|_| ConfigError::Missing("GEMINI_API_KEY"))?,
            naver_client_id: optional_var("NAVER_CLIENT_ID"),
            naver_client_secret: optional_var("NAVER_CLIENT_SECRET"),
            cloudinary_api_secret: optional_var("CLOUDINARY_API_SECRET"),
        })
    }
}

/// Read an optional variable, treating blank values as unset.
fn optional_var(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {0}: {1}")]
    Invalid(&'static str, String),
}
