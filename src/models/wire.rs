// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Tolerant field decoders for request bodies.
//!
//! Web and mobile clients send numbers as strings and vice versa. These
//! helpers are used with `#[serde(default, deserialize_with = "...")]` so a
//! wrong-typed value reads as absent and can be reported by field name.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Accept strings, numbers and booleans, rendering non-strings as text.
pub fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        Some(Value::Bool(b)) => Some(b.to_string()),
        _ => None,
    })
}

/// Accept numbers and numeric strings.
pub fn lenient_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    })
}

/// Accept integers and integer strings. Fractions are rejected.
pub fn lenient_i64<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Number(n)) => n.as_i64(),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Deserialize)]
    struct Sample {
        #[serde(default, deserialize_with = "lenient_string")]
        text: Option<String>,
        #[serde(default, deserialize_with = "lenient_i64")]
        count: Option<i64>,
        #[serde(default, deserialize_with = "lenient_f64")]
        ratio: Option<f64>,
    }

    fn sample(value: serde_json::Value) -> Sample {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_numbers_and_strings_interchange() {
        let p = sample(json!({"text": 42, "count": "7", "ratio": "1.5"}));
        assert_eq!(p.text.as_deref(), Some("42"));
        assert_eq!(p.count, Some(7));
        assert_eq!(p.ratio, Some(1.5));
    }

    #[test]
    fn test_wrong_types_read_as_absent() {
        let p = sample(json!({"text": null, "count": 2.5, "ratio": [1]}));
        assert!(p.text.is_none());
        assert!(p.count.is_none());
        assert!(p.ratio.is_none());

        let p = sample(json!({}));
        assert!(p.text.is_none() && p.count.is_none() && p.ratio.is_none());
    }
}
