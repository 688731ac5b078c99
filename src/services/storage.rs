// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Image uploads to Cloudinary using signed requests.

use base64::Engine;
use serde::Deserialize;
use sha2::{Digest, Sha256};

use crate::error::AppError;
use crate::services::gemini::sniff_image_mime;

const DEFAULT_BASE_URL: &str = "https://api.cloudinary.com/v1_1";

#[derive(Debug, Clone)]
struct Credentials {
    cloud_name: String,
    api_key: String,
    api_secret: String,
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    secure_url: String,
}

/// Cloudinary client. Uploads fail with [`AppError::Upstream`] when unconfigured.
#[derive(Clone)]
pub struct ImageStorage {
    http: reqwest::Client,
    base_url: String,
    credentials: Option<Credentials>,
}

impl ImageStorage {
    pub fn new(
        cloud_name: Option<String>,
        api_key: Option<String>,
        api_secret: Option<String>,
    ) -> Self {
        let credentials = match (cloud_name, api_key, api_secret) {
            (Some(cloud_name), Some(api_key), Some(api_secret)) => Some(Credentials {
                cloud_name,
                api_key,
                api_secret,
            }),
            _ => None,
        };
        Self {
            http: reqwest::Client::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            credentials,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn is_configured(&self) -> bool {
        self.credentials.is_some()
    }

    /// Upload image bytes as `{folder}/{public_id}`. Returns the HTTPS URL.
    pub async fn upload(
        &self,
        bytes: &[u8],
        folder: &str,
        public_id: &str,
        timestamp: i64,
    ) -> Result<String, AppError> {
        let creds = self
            .credentials
            .as_ref()
            .ok_or_else(|| AppError::Upstream("Image storage is not configured".to_string()))?;

        let timestamp = timestamp.to_string();
        let signature = sign_params(
            &[
                ("folder", folder),
                ("public_id", public_id),
                ("timestamp", &timestamp),
            ],
            &creds.api_secret,
        );
        let file = format!(
            "data:{};base64,{}",
            sniff_image_mime(bytes),
            base64::engine::general_purpose::STANDARD.encode(bytes)
        );

        let response = self
            .http
            .post(format!("{}/{}/image/upload", self.base_url, creds.cloud_name))
            .form(&[
                ("file", file.as_str()),
                ("api_key", creds.api_key.as_str()),
                ("timestamp", timestamp.as_str()),
                ("folder", folder),
                ("public_id", public_id),
                ("signature", signature.as_str()),
                ("signature_algorithm", "sha256"),
            ])
            .send()
            .await
            .map_err(|e| AppError::Upstream(format!("Upload request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Upstream(format!("Upload HTTP {}: {}", status, body)));
        }

        let uploaded: UploadResponse = response
            .json()
            .await
            .map_err(|e| AppError::Upstream(format!("Upload JSON parse error: {}", e)))?;

        tracing::info!(folder, public_id, size = bytes.len(), "Image uploaded");
        Ok(uploaded.secure_url)
    }
}

/// Cloudinary request signature: parameters sorted by name, joined as
/// `k=v&k=v`, followed by the API secret, SHA-256, lower-case hex.
pub fn sign_params(params: &[(&str, &str)], api_secret: &str) -> String {
    let mut sorted: Vec<&(&str, &str)> = params.iter().filter(|(_, v)| !v.is_empty()).collect();
    sorted.sort_by(|a, b| a.0.cmp(b.0));

    let to_sign = sorted
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&");

    let mut hasher = Sha256::new();
    hasher.update(to_sign.as_bytes());
    hasher.update(api_secret.as_bytes());
    hex::encode(hasher.finalize())
}
