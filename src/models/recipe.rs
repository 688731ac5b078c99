// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Recipes, user recipe posts, search history and keywords.

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::BTreeMap;
use validator::{Validate, ValidationError, ValidationErrors};

/// Difficulty levels accepted for posts.
pub const DIFFICULTIES: [&str; 3] = ["LOW", "MID", "HIGH"];
/// Author recorded for posts that do not name one.
pub const DEFAULT_POST_NICKNAME: &str = "guest";

/// A recipe from the externally seeded catalogue.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recipe {
    /// Firestore document ID; never written back as a field
    #[serde(rename = "_firestore_id", default, skip_serializing)]
    pub doc_id: Option<String>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub desc: String,
    #[serde(default)]
    pub time: String,
    #[serde(default)]
    pub level: String,
    #[serde(default)]
    pub serving: String,
    #[serde(rename = "imageUrl", default)]
    pub image_url: String,
    #[serde(default)]
    pub book: String,
    #[serde(default)]
    pub steps: serde_json::Value,
    #[serde(default)]
    pub ingredients: serde_json::Value,
    #[serde(default)]
    pub score: f64,
    #[serde(default)]
    pub views: i64,
}

impl Recipe {
    /// Case-insensitive substring match on name or description.
    pub fn matches(&self, keyword: &str) -> bool {
        let needle = keyword.to_lowercase();
        self.name.to_lowercase().contains(&needle) || self.desc.to_lowercase().contains(&needle)
    }
}

/// Recipe as returned to clients.
#[derive(Debug, Clone, Serialize)]
pub struct RecipeResponse {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(flatten)]
    pub recipe: Recipe,
}

impl From<Recipe> for RecipeResponse {
    fn from(recipe: Recipe) -> Self {
        Self {
            id: recipe.doc_id.clone().unwrap_or_default(),
            recipe,
        }
    }
}

/// Body of `POST /posts`.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct NewPost {
    #[serde(default)]
    #[validate(length(min = 1, max = 100, message = "1~100자 필수"))]
    pub title: String,
    #[serde(default)]
    #[validate(length(min = 1, max = 5000, message = "1~5000자 필수"))]
    pub content: String,
    #[serde(default)]
    #[validate(
        length(max = 10, message = "빈 값 불가, 최대 10개"),
        custom(function = "validate_categories")
    )]
    pub categories: Vec<String>,
    #[validate(range(min = 1, max = 1440, message = "1~1440 범위의 정수"))]
    pub time_min: Option<i64>,
    #[validate(custom(function = "validate_difficulty"))]
    pub difficulty: Option<String>,
    #[serde(default)]
    #[validate(custom(function = "validate_images"))]
    pub images: Vec<String>,
    pub nickname: Option<String>,
}

impl NewPost {
    /// Trim free-text fields before validation.
    pub fn normalized(mut self) -> Self {
        self.title = self.title.trim().to_string();
        self.content = self.content.trim().to_string();
        self.difficulty = self
            .difficulty
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty());
        self
    }

    /// Turn a validated post into the stored document.
    pub fn into_post(self, now: &str) -> RecipePost {
        RecipePost {
            id: String::new(),
            title: self.title,
            content: self.content,
            categories: self.categories,
            time_min: self.time_min,
            difficulty: self.difficulty.map(|d| d.to_uppercase()),
            images: self.images,
            nickname: self
                .nickname
                .map(|n| n.trim().to_string())
                .filter(|n| !n.is_empty())
                .unwrap_or_else(|| DEFAULT_POST_NICKNAME.to_string()),
            created_at: now.to_string(),
            updated_at: now.to_string(),
        }
    }
}

fn validate_categories(categories: &[String]) -> Result<(), ValidationError> {
    if categories.iter().any(|c| c.trim().is_empty()) {
        return Err(ValidationError::new("categories")
            .with_message(Cow::Borrowed("빈 값 불가, 최대 10개")));
    }
    Ok(())
}

fn validate_difficulty(difficulty: &str) -> Result<(), ValidationError> {
    if !DIFFICULTIES.contains(&difficulty.to_uppercase().as_str()) {
        return Err(ValidationError::new("difficulty")
            .with_message(Cow::Borrowed("LOW/MID/HIGH 중 하나")));
    }
    Ok(())
}

fn validate_images(images: &[String]) -> Result<(), ValidationError> {
    if images.iter().any(|u| u.is_empty()) {
        return Err(
            ValidationError::new("images").with_message(Cow::Borrowed("URL 문자열 배열"))
        );
    }
    Ok(())
}

/// Flatten validation errors to one message per field.
pub fn field_messages(errors: &ValidationErrors) -> BTreeMap<String, String> {
    errors
        .field_errors()
        .into_iter()
        .filter_map(|(field, errs)| {
            let first = errs.first()?;
            let message = first
                .message
                .as_ref()
                .map(|m| m.to_string())
                .unwrap_or_else(|| first.code.to_string());
            Some((field.to_string(), message))
        })
        .collect()
}

/// A user-submitted recipe post.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecipePost {
    #[serde(rename = "_id")]
    pub id: String,
    pub title: String,
    pub content: String,
    pub categories: Vec<String>,
    pub time_min: Option<i64>,
    pub difficulty: Option<String>,
    pub images: Vec<String>,
    pub nickname: String,
    pub created_at: String,
    pub updated_at: String,
}

/// A recent search keyword. Stored under the encoded keyword.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchHistoryEntry {
    pub keyword: String,
    /// ISO 8601 (UTC)
    pub created_at: String,
}

/// A suggested search keyword from the seeded catalogue.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Keyword {
    pub keyword: String,
}
