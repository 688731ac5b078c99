// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shared helpers for date/time formatting.
//!
//! Timestamps are stored as RFC 3339 strings with a `Z` suffix so that
//! lexicographic order in Firestore matches chronological order.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime, Offset, SecondsFormat, Utc};

/// Format a UTC timestamp as RFC3339 using a `Z` suffix.
pub fn format_utc_rfc3339(date: DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Secs, true)
}

fn offset(utc_offset_hours: i32) -> FixedOffset {
    FixedOffset::east_opt(utc_offset_hours * 3600).unwrap_or_else(|| Utc.fix())
}

/// Calendar date of `now` in the user's offset.
pub fn local_date(now: DateTime<Utc>, utc_offset_hours: i32) -> NaiveDate {
    now.with_timezone(&offset(utc_offset_hours)).date_naive()
}

/// `YYYY-MM-DD` of `now` in the user's offset.
pub fn local_date_key(now: DateTime<Utc>, utc_offset_hours: i32) -> String {
    local_date(now, utc_offset_hours)
        .format("%Y-%m-%d")
        .to_string()
}

/// Start of the local calendar day containing `now`, expressed in UTC.
pub fn local_day_start_utc(now: DateTime<Utc>, utc_offset_hours: i32) -> DateTime<Utc> {
    let tz = offset(utc_offset_hours);
    let midnight = local_date(now, utc_offset_hours).and_time(NaiveTime::MIN);
    midnight
        .and_local_timezone(tz)
        .single()
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or(now)
}

/// Render a stored RFC 3339 timestamp as `YYYY-MM-DD HH:MM:SS` (UTC).
///
/// Unparseable input is returned unchanged.
pub fn format_display(raw: &str) -> String {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| {
            dt.with_timezone(&Utc)
                .format("%Y-%m-%d %H:%M:%S")
                .to_string()
        })
        .unwrap_or_else(|_| raw.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_local_day_start_crosses_utc_midnight() {
        // 2025-08-13 16:30 UTC is already 2025-08-14 01:30 in KST.
        let now = Utc.with_ymd_and_hms(2025, 8, 13, 16, 30, 0).unwrap();

        assert_eq!(local_date_key(now, 9), "2025-08-14");
        assert_eq!(
            format_utc_rfc3339(local_day_start_utc(now, 9)),
            "2025-08-13T15:00:00Z"
        );
    }

    #[test]
    fn test_utc_offset_zero() {
        let now = Utc.with_ymd_and_hms(2025, 1, 2, 3, 4, 5).unwrap();
        assert_eq!(local_date_key(now, 0), "2025-01-02");
        assert_eq!(
            format_utc_rfc3339(local_day_start_utc(now, 0)),
            "2025-01-02T00:00:00Z"
        );
    }

    #[test]
    fn test_format_display() {
        assert_eq!(format_display("2025-08-13T04:40:00Z"), "2025-08-13 04:40:00");
        assert_eq!(format_display("yesterday"), "yesterday");
    }
}
