// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Water intake and sleep records.

use serde::{Deserialize, Serialize};

/// Cups of water logged at one time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WaterRecord {
    pub id: String,
    pub nickname: String,
    pub cups: u32,
    /// Running total for the local day, including this record
    pub daily_total: u64,
    /// ISO 8601 (UTC); compared lexicographically for "today" totals
    pub timestamp: String,
}

/// Sum the cups of the given records.
pub fn total_cups<'a>(records: impl IntoIterator<Item = &'a WaterRecord>) -> u64 {
    records.into_iter().map(|r| u64::from(r.cups)).sum()
}

/// One night of sleep.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SleepRecord {
    pub id: String,
    pub nickname: String,
    pub hours: u32,
    pub minutes: u32,
    pub total_minutes: u32,
    pub timestamp: String,
}

impl SleepRecord {
    pub fn new(id: String, nickname: String, hours: u32, minutes: u32, timestamp: String) -> Self {
        Self {
            id,
            nickname,
            hours,
            minutes,
            total_minutes: hours.saturating_mul(60).saturating_add(minutes),
            timestamp,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn water(cups: u32) -> WaterRecord {
        WaterRecord {
            id: "w".to_string(),
            nickname: "mina".to_string(),
            cups,
            daily_total: 0,
            timestamp: "2025-08-14T01:00:00Z".to_string(),
        }
    }

    #[test]
    fn test_total_water() {
        let records = [water(2), water(1), water(3)];
        assert_eq!(total_cups(&records), 6);
        assert_eq!(total_cups(&[]), 0);
    }

    #[test]
    fn test_sleep_total_minutes() {
        let record = SleepRecord::new(
            "s".to_string(),
            "mina".to_string(),
            7,
            30,
            "2025-08-14T22:00:00Z".to_string(),
        );
        assert_eq!(record.total_minutes, 450);
    }
}
