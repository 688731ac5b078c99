// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Water intake and sleep logging.

use crate::error::{AppError, Result};
use crate::extract::AppJson;
use crate::models::lifestyle::total_cups;
use crate::models::wire::lenient_i64;
use crate::models::{SleepRecord, WaterRecord};
use crate::time_utils::{format_utc_rfc3339, local_day_start_utc};
use crate::AppState;
use axum::{extract::State, routing::post, Json, Router};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Lifestyle routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/record-water", post(record_water))
        .route("/record-sleep", post(record_sleep))
}

fn required_nickname(nickname: Option<String>) -> Result<String> {
    nickname
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
        .ok_or_else(|| AppError::BadRequest("Nickname is required".to_string()))
}

// ─── Water ───────────────────────────────────────────────────

#[derive(Deserialize)]
struct WaterRequest {
    nickname: Option<String>,
    #[serde(default, deserialize_with = "lenient_i64")]
    cups: Option<i64>,
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct WaterResponse {
    pub success: bool,
    pub cups: u32,
    pub daily_total: u64,
}

/// Log cups of water and report today's running total.
async fn record_water(
    State(state): State<Arc<AppState>>,
    AppJson(request): AppJson<WaterRequest>,
) -> Result<Json<WaterResponse>> {
    let nickname = required_nickname(request.nickname)?;
    let cups = request
        .cups
        .filter(|c| *c > 0)
        .and_then(|c| u32::try_from(c).ok())
        .ok_or_else(|| AppError::BadRequest("'cups' must be a positive integer".to_string()))?;

    let now = chrono::Utc::now();
    let day_start = local_day_start_utc(now, state.config.utc_offset_hours);
    let today = state
        .db
        .water_records_since(&nickname, &format_utc_rfc3339(day_start))
        .await?;
    let daily_total = total_cups(&today) + u64::from(cups);

    let record = WaterRecord {
        id: uuid::Uuid::new_v4().to_string(),
        nickname,
        cups,
        daily_total,
        timestamp: format_utc_rfc3339(now),
    };
    state.db.insert_water_record(&record).await?;

    tracing::info!(nickname = %record.nickname, cups, daily_total, "Water recorded");
    Ok(Json(WaterResponse {
        success: true,
        cups,
        daily_total,
    }))
}

// ─── Sleep ───────────────────────────────────────────────────

#[derive(Deserialize)]
struct SleepRequest {
    nickname: Option<String>,
    #[serde(default, deserialize_with = "lenient_i64")]
    hours: Option<i64>,
    #[serde(default, deserialize_with = "lenient_i64")]
    minutes: Option<i64>,
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct SleepResponse {
    pub success: bool,
    pub total_minutes: u32,
}

/// A missing value counts as zero.
fn non_negative(value: Option<i64>, field: &str) -> Result<u32> {
    u32::try_from(value.unwrap_or(0))
        .map_err(|_| AppError::BadRequest(format!("'{}' must be a non-negative integer", field)))
}

/// Log a night of sleep.
async fn record_sleep(
    State(state): State<Arc<AppState>>,
    AppJson(request): AppJson<SleepRequest>,
) -> Result<Json<SleepResponse>> {
    let nickname = required_nickname(request.nickname)?;
    let hours = non_negative(request.hours, "hours")?;
    let minutes = non_negative(request.minutes, "minutes")?;

    let record = SleepRecord::new(
        uuid::Uuid::new_v4().to_string(),
        nickname,
        hours,
        minutes,
        format_utc_rfc3339(chrono::Utc::now()),
    );
    state.db.insert_sleep_record(&record).await?;

    tracing::info!(
        nickname = %record.nickname,
        total_minutes = record.total_minutes,
        "Sleep recorded"
    );
    Ok(Json(SleepResponse {
        success: true,
        total_minutes: record.total_minutes,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_negative_bounds() {
        assert_eq!(non_negative(Some(0), "hours").unwrap(), 0);
        assert_eq!(non_negative(Some(7), "hours").unwrap(), 7);
        assert!(non_negative(Some(-1), "hours").is_err());
        assert_eq!(non_negative(None, "minutes").unwrap(), 0);
    }

    #[test]
    fn test_requests_accept_numeric_strings() {
        let water: WaterRequest =
            serde_json::from_value(serde_json::json!({"nickname": "kim", "cups": "2"})).unwrap();
        assert_eq!(water.cups, Some(2));

        let sleep: SleepRequest =
            serde_json::from_value(serde_json::json!({"nickname": "kim", "hours": "7"})).unwrap();
        assert_eq!(sleep.hours, Some(7));
        assert_eq!(sleep.minutes, None);
        assert_eq!(non_negative(sleep.minutes, "minutes").unwrap(), 0);
    }

    #[test]
    fn test_required_nickname_trims() {
        assert_eq!(required_nickname(Some(" kim ".into())).unwrap(), "kim");
        assert!(required_nickname(Some("   ".into())).is_err());
        assert!(required_nickname(None).is_err());
    }
}
