// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Gemini `generateContent` client.
//!
//! Handles:
//! - Text and text + inline image prompts
//! - JSON response-format hint
//! - Per-attempt timeout with exponential backoff between attempts
//!
//! Failures never reach the caller: after the last attempt the call yields
//! `None` and callers fall back to an empty result.

use base64::Engine;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const DEFAULT_BACKOFF_BASE: Duration = Duration::from_millis(600);

/// Requested shape of the model's answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseFormat {
    /// Ask for `application/json`
    Json,
    /// Free text
    Text,
}

/// Timeout and attempt budget for one logical call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallPolicy {
    pub timeout: Duration,
    pub attempts: u32,
}

impl CallPolicy {
    pub const fn new(timeout_secs: u64, attempts: u32) -> Self {
        Self {
            timeout: Duration::from_secs(timeout_secs),
            attempts,
        }
    }
}

/// Image bytes sent inline with a prompt.
#[derive(Debug, Clone)]
pub struct InlineImage {
    pub mime_type: String,
    pub data: Vec<u8>,
}

impl InlineImage {
    pub fn new(mime_type: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            mime_type: mime_type.into(),
            data,
        }
    }

    /// Build from raw bytes, guessing the MIME type from magic numbers.
    pub fn sniffed(data: Vec<u8>) -> Self {
        Self::new(sniff_image_mime(&data), data)
    }
}

/// Guess an image MIME type from its leading bytes, defaulting to JPEG.
pub fn sniff_image_mime(data: &[u8]) -> &'static str {
    if data.starts_with(&[0x89, b'P', b'N', b'G']) {
        "image/png"
    } else if data.starts_with(b"GIF8") {
        "image/gif"
    } else if data.len() >= 12 && &data[..4] == b"RIFF" && &data[8..12] == b"WEBP" {
        "image/webp"
    } else {
        "image/jpeg"
    }
}

/// Errors from a single attempt. Only logged; never returned to callers.
#[derive(Debug, thiserror::Error)]
pub enum GeminiError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("timed out after {0:?}")]
    Timeout(Duration),

    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("response contained no text")]
    Empty,
}

/// Gemini API client.
#[derive(Clone)]
pub struct GeminiClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    backoff_base: Duration,
}

impl GeminiClient {
    pub fn new(api_key: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key,
            backoff_base: DEFAULT_BACKOFF_BASE,
        }
    }

    /// Point the client at another endpoint (local stubs in tests).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_backoff_base(mut self, backoff_base: Duration) -> Self {
        self.backoff_base = backoff_base;
        self
    }

    /// Delay before retry number `attempt + 1`.
    fn backoff(&self, attempt: u32) -> Duration {
        self.backoff_base * 2u32.saturating_pow(attempt)
    }

    /// Run a prompt with retries. Returns the trimmed answer text, or `None`
    /// once every attempt has failed.
    pub async fn generate(
        &self,
        model: &str,
        prompt: &str,
        image: Option<&InlineImage>,
        format: ResponseFormat,
        policy: CallPolicy,
    ) -> Option<String> {
        let request = GenerateContentRequest::build(prompt, image, format);
        let attempts = policy.attempts.max(1);

        for attempt in 0..attempts {
            match self.generate_once(model, &request, policy.timeout).await {
                Ok(text) => {
                    tracing::debug!(model, attempt = attempt + 1, "Gemini call succeeded");
                    return Some(text);
                }
                Err(e) => {
                    tracing::warn!(
                        model,
                        attempt = attempt + 1,
                        attempts,
                        error = %e,
                        "Gemini call failed"
                    );
                    if attempt + 1 < attempts {
                        tokio::time::sleep(self.backoff(attempt)).await;
                    }
                }
            }
        }

        tracing::error!(model, attempts, "Gemini call failed after all retries");
        None
    }

    async fn generate_once(
        &self,
        model: &str,
        request: &GenerateContentRequest,
        timeout: Duration,
    ) -> Result<String, GeminiError> {
        let url = format!("{}/models/{}:generateContent", self.base_url, model);

        let call = async {
            let response = self
                .http
                .post(&url)
                .header("x-goog-api-key", &self.api_key)
                .json(request)
                .send()
                .await?;

            if !response.status().is_success() {
                let status = response.status().as_u16();
                let body = response.text().await.unwrap_or_default();
                return Err(GeminiError::Status { status, body });
            }

            let parsed: GenerateContentResponse = response.json().await?;
            parsed.text().ok_or(GeminiError::Empty)
        };

        tokio::time::timeout(timeout, call)
            .await
            .map_err(|_| GeminiError::Timeout(timeout))?
    }
}

// ─── Wire types ──────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<RequestContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

impl GenerateContentRequest {
    fn build(prompt: &str, image: Option<&InlineImage>, format: ResponseFormat) -> Self {
        let mut parts = vec![RequestPart::Text {
            text: prompt.to_string(),
        }];
        if let Some(image) = image {
            parts.push(RequestPart::InlineData {
                inline_data: Blob {
                    mime_type: image.mime_type.clone(),
                    data: base64::engine::general_purpose::STANDARD.encode(&image.data),
                },
            });
        }

        Self {
            contents: vec![RequestContent {
                role: "user",
                parts,
            }],
            generation_config: (format == ResponseFormat::Json).then(|| GenerationConfig {
                response_mime_type: "application/json",
            }),
        }
    }
}

#[derive(Debug, Serialize)]
struct RequestContent {
    role: &'static str,
    parts: Vec<RequestPart>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum RequestPart {
    Text {
        text: String,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: Blob,
    },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Blob {
    mime_type: String,
    data: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_mime_type: &'static str,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

impl GenerateContentResponse {
    /// All text parts of the first candidate, joined and trimmed.
    fn text(&self) -> Option<String> {
        let content = self.candidates.first()?.content.as_ref()?;
        let text: String = content
            .parts
            .iter()
            .filter_map(|p| p.text.as_deref())
            .collect();
        let text = text.trim();
        (!text.is_empty()).then(|| text.to_string())
    }
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<ResponseContent>,
}

#[derive(Debug, Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}
