// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Meal records and MIND diet scoring results.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Notes shown when a meal has no recognizable foods.
pub const EMPTY_MEAL_NOTES: &str = "음식 목록이 비어있습니다.";
/// Recommendation shown when a meal has no recognizable foods.
pub const EMPTY_MEAL_RECOMMENDATION: &str = "식사를 기록해 보세요!";

/// The fifteen MIND diet food groups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "snake_case")]
pub enum MindCategory {
    GreenLeafyVeg,
    OtherVeg,
    Nuts,
    Berries,
    Beans,
    WholeGrains,
    Fish,
    Poultry,
    OliveOil,
    Wine,
    RedMeats,
    ButterMargarine,
    Cheese,
    PastriesSweets,
    FriedFastFood,
}

impl MindCategory {
    pub const ALL: [MindCategory; 15] = [
        MindCategory::GreenLeafyVeg,
        MindCategory::OtherVeg,
        MindCategory::Nuts,
        MindCategory::Berries,
        MindCategory::Beans,
        MindCategory::WholeGrains,
        MindCategory::Fish,
        MindCategory::Poultry,
        MindCategory::OliveOil,
        MindCategory::Wine,
        MindCategory::RedMeats,
        MindCategory::ButterMargarine,
        MindCategory::Cheese,
        MindCategory::PastriesSweets,
        MindCategory::FriedFastFood,
    ];

    pub fn key(self) -> &'static str {
        match self {
            MindCategory::GreenLeafyVeg => "green_leafy_veg",
            MindCategory::OtherVeg => "other_veg",
            MindCategory::Nuts => "nuts",
            MindCategory::Berries => "berries",
            MindCategory::Beans => "beans",
            MindCategory::WholeGrains => "whole_grains",
            MindCategory::Fish => "fish",
            MindCategory::Poultry => "poultry",
            MindCategory::OliveOil => "olive_oil",
            MindCategory::Wine => "wine",
            MindCategory::RedMeats => "red_meats",
            MindCategory::ButterMargarine => "butter_margarine",
            MindCategory::Cheese => "cheese",
            MindCategory::PastriesSweets => "pastries_sweets",
            MindCategory::FriedFastFood => "fried_fast_food",
        }
    }

    /// Korean display label, as used in scoring prompts.
    pub fn label(self) -> &'static str {
        match self {
            MindCategory::GreenLeafyVeg => "녹색 잎채소",
            MindCategory::OtherVeg => "기타 채소",
            MindCategory::Nuts => "견과류",
            MindCategory::Berries => "베리류",
            MindCategory::Beans => "콩/두류",
            MindCategory::WholeGrains => "통곡물",
            MindCategory::Fish => "생선",
            MindCategory::Poultry => "가금류",
            MindCategory::OliveOil => "올리브유",
            MindCategory::Wine => "와인",
            MindCategory::RedMeats => "붉은 고기",
            MindCategory::ButterMargarine => "버터/마가린",
            MindCategory::Cheese => "치즈",
            MindCategory::PastriesSweets => "과자/디저트",
            MindCategory::FriedFastFood => "튀김/패스트푸드",
        }
    }

    /// Resolve a category from either its key or its Korean label.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        Self::ALL
            .into_iter()
            .find(|c| c.key().eq_ignore_ascii_case(raw) || c.label() == raw)
    }
}

/// Score for a single food.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct MindItem {
    pub food: String,
    #[serde(default)]
    pub categories: Vec<MindCategory>,
    pub score: u32,
    #[serde(default)]
    pub note: String,
}

/// MIND evaluation of one meal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct MindResult {
    #[serde(default)]
    pub items: Vec<MindItem>,
    /// Mean of the valid item scores, one decimal place
    pub meal_score: f64,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub recommendation: String,
}

impl MindResult {
    /// Result for a meal with no foods; no model call is made.
    pub fn empty_meal() -> Self {
        Self {
            items: Vec::new(),
            meal_score: 0.0,
            notes: EMPTY_MEAL_NOTES.to_string(),
            recommendation: EMPTY_MEAL_RECOMMENDATION.to_string(),
        }
    }

    /// Result when the scoring model produced nothing usable.
    pub fn unscored() -> Self {
        Self {
            items: Vec::new(),
            meal_score: 0.0,
            notes: String::new(),
            recommendation: String::new(),
        }
    }

    /// Build a result from the model's parsed JSON object.
    ///
    /// Item scores are truncated to integers and clamped to 0..=100. Items
    /// whose score cannot be read are kept with a score of 0 but do not count
    /// toward the meal average. Unknown categories are dropped.
    pub fn from_model_output(parsed: Option<&Map<String, Value>>) -> Self {
        let Some(obj) = parsed else {
            return Self::unscored();
        };

        let mut items = Vec::new();
        let mut total: u64 = 0;
        let mut valid: u64 = 0;

        for raw in obj
            .get("items")
            .and_then(Value::as_array)
            .into_iter()
            .flatten()
            .filter_map(Value::as_object)
        {
            let score = raw.get("score").and_then(read_score);
            if let Some(s) = score {
                total += u64::from(s);
                valid += 1;
            }

            items.push(MindItem {
                food: text_field(raw, "food"),
                categories: read_categories(raw.get("categories")),
                score: score.unwrap_or(0),
                note: text_field(raw, "note"),
            });
        }

        Self {
            items,
            meal_score: mean_one_decimal(total, valid),
            notes: text_field(obj, "notes"),
            recommendation: text_field(obj, "recommendation"),
        }
    }
}

/// Read a score from a JSON number or numeric string.
fn read_score(value: &Value) -> Option<u32> {
    let raw = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    if !raw.is_finite() {
        return None;
    }
    Some(raw.trunc().clamp(0.0, 100.0) as u32)
}

fn read_categories(value: Option<&Value>) -> Vec<MindCategory> {
    let mut categories = Vec::new();
    for name in value
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(Value::as_str)
    {
        if let Some(c) = MindCategory::parse(name) {
            if !categories.contains(&c) {
                categories.push(c);
            }
        }
    }
    categories
}

fn text_field(obj: &Map<String, Value>, key: &str) -> String {
    obj.get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

/// Mean rounded to one decimal place.
///
/// Rounds the exact binary value of the mean, with ties going to the even
/// digit, so 0.25 becomes 0.2 and 0.75 becomes 0.8.
fn mean_one_decimal(total: u64, count: u64) -> f64 {
    if count == 0 {
        return 0.0;
    }
    let mean = total as f64 / count as f64;
    format!("{:.1}", mean).parse().unwrap_or(mean)
}

/// A stored meal, newest records are returned first from history.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct DietRecord {
    #[serde(rename = "_id")]
    pub id: String,
    pub nickname: String,
    pub meal_type: String,
    /// Free-text description, empty for photo-only meals
    #[serde(default)]
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    pub foods: Vec<String>,
    pub mind: MindResult,
    /// When the meal was recorded (ISO 8601, UTC)
    pub timestamp: String,
}
