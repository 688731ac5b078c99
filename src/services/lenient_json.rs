// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Tolerant JSON recovery for generative model output.
//!
//! Models often wrap JSON in Markdown code fences, prepend prose, or use
//! single quotes. These helpers try progressively looser strategies and never
//! fail: the worst case is an empty list or `None`.

use regex::Regex;
use serde_json::{Map, Value};
use std::sync::LazyLock;

/// Opening or closing code fence, with an optional `json` tag.
static FENCE_PATTERN: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"```(?:json|JSON)?").ok());

/// First bracketed list, spanning lines, shortest match.
static LIST_PATTERN: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"(?s)\[.*?\]").ok());

/// Outermost braces, spanning lines.
static OBJECT_PATTERN: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"(?s)\{.*\}").ok());

/// Remove code fences and surrounding backticks/whitespace.
pub fn strip_code_fences(text: &str) -> String {
    let unfenced = match FENCE_PATTERN.as_ref() {
        Some(re) => re.replace_all(text, "").into_owned(),
        None => text.to_string(),
    };
    unfenced
        .trim_matches(|c: char| c == '`' || c.is_whitespace())
        .to_string()
}

/// Interpret a parsed value as a list: a list as-is, or an object's `foods` list.
fn as_list(value: Value) -> Option<Vec<Value>> {
    match value {
        Value::Array(items) => Some(items),
        Value::Object(mut obj) => match obj.remove("foods") {
            Some(Value::Array(items)) => Some(items),
            _ => None,
        },
        _ => None,
    }
}

/// Recover a JSON list from model output.
pub fn parse_list(text: &str) -> Vec<Value> {
    let cleaned = strip_code_fences(text);
    if cleaned.is_empty() {
        return Vec::new();
    }

    if let Some(items) = serde_json::from_str(&cleaned).ok().and_then(as_list) {
        return items;
    }

    if cleaned.contains('\'') && !cleaned.contains('"') {
        let normalized = cleaned.replace('\'', "\"");
        if let Some(items) = serde_json::from_str(&normalized).ok().and_then(as_list) {
            return items;
        }
    }

    LIST_PATTERN
        .as_ref()
        .and_then(|re| re.find(&cleaned))
        .and_then(|m| serde_json::from_str::<Value>(m.as_str()).ok())
        .and_then(as_list)
        .unwrap_or_default()
}

/// Recover a JSON object from model output.
pub fn parse_object(text: &str) -> Option<Map<String, Value>> {
    let cleaned = strip_code_fences(text);

    if let Ok(Value::Object(obj)) = serde_json::from_str(&cleaned) {
        return Some(obj);
    }

    let fragment = OBJECT_PATTERN.as_ref()?.find(&cleaned)?;
    match serde_json::from_str(fragment.as_str()) {
        Ok(Value::Object(obj)) => Some(obj),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_fenced_list() {
        assert_eq!(
            parse_list("```json\n[\"a\",\"b\"]\n```"),
            vec![json!("a"), json!("b")]
        );
        assert_eq!(parse_list("```\n[1]\n```"), vec![json!(1)]);
    }

    #[test]
    fn test_bare_list() {
        assert_eq!(parse_list("[\"a\",\"b\"]"), vec![json!("a"), json!("b")]);
    }

    #[test]
    fn test_garbage_is_empty() {
        assert!(parse_list("no foods here").is_empty());
        assert!(parse_list("").is_empty());
        assert!(parse_list("```json\n```").is_empty());
        assert!(parse_list("{\"answer\": 3}").is_empty());
    }

    #[test]
    fn test_object_with_foods() {
        assert_eq!(
            parse_list("{\"foods\": [\"김치\", \"밥\"]}"),
            vec![json!("김치"), json!("밥")]
        );
    }

    #[test]
    fn test_single_quotes_normalized() {
        assert_eq!(parse_list("['김치', '밥']"), vec![json!("김치"), json!("밥")]);
    }

    #[test]
    fn test_list_embedded_in_prose() {
        let text = "Here are the foods:\n[\"salmon\",\n \"rice\"]\nEnjoy [your meal]";
        assert_eq!(parse_list(text), vec![json!("salmon"), json!("rice")]);
    }

    #[test]
    fn test_parse_object_fenced_and_embedded() {
        let fenced = parse_object("```json\n{\"meal_score\": 80}\n```").unwrap();
        assert_eq!(fenced["meal_score"], 80);

        let embedded = parse_object("Result: {\"items\": [{\"score\": 1}]} done").unwrap();
        assert_eq!(embedded["items"][0]["score"], 1);
    }

    #[test]
    fn test_parse_object_failure() {
        assert!(parse_object("nothing to see").is_none());
        assert!(parse_object("[1, 2]").is_none());
        assert!(parse_object("{not json}").is_none());
    }
}
