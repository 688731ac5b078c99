// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Naver news search for slow-aging headlines.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

use crate::error::AppError;
use crate::services::gemini::{CallPolicy, GeminiClient, ResponseFormat};

#[cfg(feature = "binding-generation")]
use ts_rs::TS;

const DEFAULT_BASE_URL: &str = "https://openapi.naver.com/v1/search";
const NEWS_SUMMARY: CallPolicy = CallPolicy::new(12, 2);

/// Summary used when the model gives no answer.
pub const SUMMARY_FAILED: &str = "요약 실패";

static TAG_PATTERN: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"<.*?>").ok());

/// One headline returned to clients.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct NewsItem {
    pub title: String,
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    title: String,
    link: String,
    #[serde(default)]
    description: String,
}

/// Naver search API client. Disabled when credentials are not configured.
#[derive(Clone)]
pub struct NewsClient {
    http: reqwest::Client,
    base_url: String,
    credentials: Option<(String, String)>,
}

impl NewsClient {
    pub fn new(client_id: Option<String>, client_secret: Option<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            credentials: client_id.zip(client_secret),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn is_configured(&self) -> bool {
        self.credentials.is_some()
    }

    /// Latest articles for `query`, newest first.
    ///
    /// With `summarizer`, each item gets a one-sentence summary.
    pub async fn search(
        &self,
        query: &str,
        display: u32,
        summarizer: Option<(&GeminiClient, &str)>,
    ) -> Result<Vec<NewsItem>, AppError> {
        let (client_id, client_secret) = self
            .credentials
            .as_ref()
            .ok_or_else(|| AppError::Upstream("News search is not configured".to_string()))?;

        let response = self
            .http
            .get(format!("{}/news.json", self.base_url))
            .header("X-Naver-Client-Id", client_id)
            .header("X-Naver-Client-Secret", client_secret)
            .query(&[
                ("query", query.to_string()),
                ("display", display.to_string()),
                ("sort", "date".to_string()),
            ])
            .send()
            .await
            .map_err(|e| AppError::Upstream(format!("News request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Upstream(format!("News HTTP {}: {}", status, body)));
        }

        let parsed: SearchResponse = response
            .json()
            .await
            .map_err(|e| AppError::Upstream(format!("News JSON parse error: {}", e)))?;

        let mut items = Vec::with_capacity(parsed.items.len());
        for item in parsed.items {
            let title = clean_html(&item.title);
            let summary = match summarizer {
                Some((gemini, model)) => {
                    let text = format!("{}\n{}", title, clean_html(&item.description));
                    Some(summarize(gemini, model, &text).await)
                }
                None => None,
            };
            items.push(NewsItem {
                title,
                url: item.link,
                summary,
            });
        }

        tracing::debug!(query, count = items.len(), "News fetched");
        Ok(items)
    }
}

/// One-sentence summary, or [`SUMMARY_FAILED`].
async fn summarize(gemini: &GeminiClient, model: &str, text: &str) -> String {
    let prompt = format!("다음 뉴스 내용을 한 문장으로 요약해줘:\n{}", text);
    gemini
        .generate(model, &prompt, None, ResponseFormat::Text, NEWS_SUMMARY)
        .await
        .unwrap_or_else(|| SUMMARY_FAILED.to_string())
}

/// Strip HTML tags and decode character entities.
pub fn clean_html(text: &str) -> String {
    let stripped = match TAG_PATTERN.as_ref() {
        Some(re) => re.replace_all(text, ""),
        None => text.into(),
    };
    html_escape::decode_html_entities(&stripped).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_html_strips_tags() {
        assert_eq!(
            clean_html("<b>저속노화</b> 식단이 <i>뜬다</i>"),
            "저속노화 식단이 뜬다"
        );
    }

    #[test]
    fn test_clean_html_unescapes_entities() {
        assert_eq!(
            clean_html("&quot;저속노화&quot; &amp; 건강 &lt;3 &#39;MIND&#39; &#x41;"),
            "\"저속노화\" & 건강 <3 'MIND' A"
        );
    }

    #[test]
    fn test_clean_html_decodes_named_entities() {
        assert_eq!(clean_html("A&ndash;B"), "A\u{2013}B");
        assert_eq!(clean_html("caf&eacute;"), "caf\u{e9}");
        assert_eq!(clean_html("x&mdash;y 1&times;2"), "x\u{2014}y 1\u{d7}2");
        assert_eq!(clean_html("<b>&middot;</b>&hellip;"), "\u{b7}\u{2026}");
    }

    #[test]
    fn test_unknown_entity_kept() {
        assert_eq!(clean_html("a &bogus; b"), "a &bogus; b");
    }

    #[tokio::test]
    async fn test_search_without_credentials_is_upstream_error() {
        let client = NewsClient::new(Some("id".to_string()), None);
        assert!(!client.is_configured());
        let result = client.search("저속노화", 3, None).await;
        assert!(matches!(result, Err(AppError::Upstream(_))));
    }
}
