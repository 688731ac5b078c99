// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Point ledger: history entries, challenge rewards and refund requests.

use serde::{Deserialize, Serialize};

#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Direction of a point movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "lowercase")]
pub enum PointKind {
    Use,
    Earn,
}

/// One append-only ledger entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct PointHistoryEntry {
    pub id: String,
    pub nickname: String,
    #[serde(rename = "type")]
    pub kind: PointKind,
    pub description: String,
    pub points: i64,
    /// `YYYY-MM-DD` in the user's calendar
    pub date: String,
    /// ISO 8601 (UTC), used for ordering
    #[serde(default)]
    pub recorded_at: String,
}

/// Reward paid for completing a challenge. One per (user, challenge).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reward {
    pub nickname: String,
    pub challenge_id: String,
    pub points: i64,
    pub date: String,
}

/// Request to cash out points to a bank account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefundRequest {
    pub id: String,
    pub nickname: String,
    pub bank: String,
    pub account_number: String,
    pub account_holder: String,
    pub refund_amount: i64,
    pub status: String,
    pub created_at: String,
}

/// Sort entries newest first. Entries without `recorded_at` fall back to `date`.
pub fn sort_newest_first(entries: &mut [PointHistoryEntry]) {
    entries.sort_by(|a, b| {
        let key = |e: &PointHistoryEntry| {
            if e.recorded_at.is_empty() {
                e.date.clone()
            } else {
                e.recorded_at.clone()
            }
        };
        key(b).cmp(&key(a))
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: &str, date: &str, recorded_at: &str) -> PointHistoryEntry {
        PointHistoryEntry {
            id: id.to_string(),
            nickname: "mina".to_string(),
            kind: PointKind::Use,
            description: "join".to_string(),
            points: 100,
            date: date.to_string(),
            recorded_at: recorded_at.to_string(),
        }
    }

    #[test]
    fn test_kind_serializes_as_type() {
        let value = serde_json::to_value(entry("a", "2025-08-14", "")).unwrap();
        assert_eq!(value["type"], "use");
        assert!(value.get("kind").is_none());
    }

    #[test]
    fn test_sort_newest_first() {
        let mut entries = vec![
            entry("old", "2025-08-01", "2025-08-01T01:00:00Z"),
            entry("new", "2025-08-03", "2025-08-03T09:00:00Z"),
            entry("legacy", "2025-08-02", ""),
        ];
        sort_newest_first(&mut entries);

        let ids: Vec<&str> = entries.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["new", "legacy", "old"]);
    }
}
