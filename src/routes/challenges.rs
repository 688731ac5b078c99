// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Step-count challenges, certification, rewards and the point ledger.

use crate::db::LedgerClock;
use crate::error::{AppError, Result};
use crate::extract::AppJson;
use crate::models::challenge::{DayKey, NewChallenge};
use crate::models::wire::{lenient_i64, lenient_string};
use crate::models::{Challenge, PointHistoryEntry, RefundRequest};
use crate::services::InlineImage;
use crate::time_utils::{format_utc_rfc3339, local_date_key};
use crate::AppState;
use super::MessageResponse;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Challenge and point routes, mounted under `/api`.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/challenges", get(list_challenges))
        .route("/api/challenges/create", post(create_challenge))
        .route("/api/challenges/join", post(join_challenge))
        .route("/api/challenges/verify", post(verify_challenge))
        .route("/api/challenges/reward", post(claim_reward))
        .route("/api/challenges/{challenge_id}", get(get_challenge))
        .route("/api/user-info", get(get_user_info))
        .route("/api/points/history/{nickname}", get(get_point_history))
        .route(
            "/api/challenge_verification/status",
            get(get_verification_status),
        )
        .route("/api/refund", post(request_refund))
}

fn required(value: Option<String>, message: &str) -> Result<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AppError::BadRequest(message.to_string()))
}

// ─── Catalogue ───────────────────────────────────────────────

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct CreateChallengeResponse {
    pub message: String,
    pub challenge_id: String,
}

async fn create_challenge(
    State(state): State<Arc<AppState>>,
    AppJson(request): AppJson<NewChallenge>,
) -> Result<(StatusCode, Json<CreateChallengeResponse>)> {
    let challenge = request
        .into_challenge(
            uuid::Uuid::new_v4().to_string(),
            &format_utc_rfc3339(chrono::Utc::now()),
        )
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    state.db.insert_challenge(&challenge).await?;
    tracing::info!(challenge_id = %challenge.id, title = %challenge.title, "Challenge created");

    Ok((
        StatusCode::CREATED,
        Json(CreateChallengeResponse {
            message: "Challenge created".to_string(),
            challenge_id: challenge.id,
        }),
    ))
}

#[derive(Deserialize)]
struct ListQuery {
    filter: Option<String>,
    nickname: Option<String>,
}

/// A challenge annotated for the requesting user.
#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ChallengeListItem {
    #[serde(flatten)]
    pub challenge: Challenge,
    pub joined: bool,
}

/// List all challenges, or with `filter=my` only those the user joined.
async fn list_challenges(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<ChallengeListItem>>> {
    let nickname = query
        .nickname
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty());

    let challenges = if query.filter.as_deref() == Some("my") {
        let joined = match &nickname {
            Some(n) => state
                .db
                .find_user_by_nickname(n)
                .await?
                .map(|u| u.joined_challenges)
                .unwrap_or_default(),
            None => Vec::new(),
        };
        if joined.is_empty() {
            return Ok(Json(Vec::new()));
        }
        state.db.get_challenges_by_ids(&joined).await?
    } else {
        state.db.list_challenges().await?
    };

    let items = challenges
        .into_iter()
        .map(|challenge| ChallengeListItem {
            joined: nickname.as_deref().is_some_and(|n| challenge.has_joined(n)),
            challenge,
        })
        .collect();
    Ok(Json(items))
}

async fn get_challenge(
    State(state): State<Arc<AppState>>,
    Path(challenge_id): Path<String>,
) -> Result<Json<Challenge>> {
    let challenge = state
        .db
        .get_challenge(&challenge_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Challenge not found".to_string()))?;
    Ok(Json(challenge))
}

// ─── Participation ───────────────────────────────────────────

#[derive(Deserialize)]
struct PairRequest {
    #[serde(default, deserialize_with = "lenient_string")]
    nickname: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    challenge_id: Option<String>,
}

impl PairRequest {
    fn into_pair(self) -> Result<(String, String)> {
        let nickname = required(self.nickname, "Missing fields")?;
        let challenge_id = required(self.challenge_id, "Missing fields")?;
        Ok((nickname, challenge_id))
    }
}

/// Join a challenge, paying its entry fee in points.
async fn join_challenge(
    State(state): State<Arc<AppState>>,
    AppJson(request): AppJson<PairRequest>,
) -> Result<(StatusCode, Json<MessageResponse>)> {
    let (nickname, challenge_id) = request.into_pair()?;

    let now = chrono::Utc::now();
    let today = local_date_key(now, state.config.utc_offset_hours);
    let now = format_utc_rfc3339(now);
    let fee = state
        .db
        .join_challenge_atomic(
            &challenge_id,
            &nickname,
            LedgerClock {
                today: &today,
                now: &now,
            },
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(MessageResponse {
            message: format!(
                "{} 님이 챌린지에 성공적으로 참여했고, {}P가 차감되었습니다.",
                nickname, fee
            ),
        }),
    ))
}

// ─── Certification ───────────────────────────────────────────

#[derive(Deserialize)]
struct VerifyRequest {
    #[serde(default, deserialize_with = "lenient_string")]
    nickname: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    challenge_id: Option<String>,
    /// Base64 screenshot of a pedometer app, optionally a `data:` URL
    #[serde(default)]
    image: Option<String>,
    #[serde(default)]
    today_day: Option<DayKey>,
    #[serde(default, deserialize_with = "lenient_i64")]
    goal_steps: Option<i64>,
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct VerifyResponse {
    pub success: bool,
    pub message: String,
    pub steps: u64,
    pub goal_steps: u64,
}

/// Decode a base64 image, accepting an optional `data:<mime>;base64,` prefix.
fn decode_image_payload(raw: &str) -> Option<Vec<u8>> {
    let raw = raw.trim();
    let payload = match raw.strip_prefix("data:") {
        Some(rest) => rest.split_once(',')?.1,
        None => raw,
    };
    base64::engine::general_purpose::STANDARD
        .decode(payload.trim())
        .ok()
        .filter(|bytes| !bytes.is_empty())
}

/// Certify a day from a step-count screenshot.
async fn verify_challenge(
    State(state): State<Arc<AppState>>,
    AppJson(request): AppJson<VerifyRequest>,
) -> Result<Json<VerifyResponse>> {
    let nickname = required(request.nickname, "Missing fields")?;
    let challenge_id = required(request.challenge_id, "Missing fields")?;
    let image = required(request.image, "Missing fields")?;
    let bytes = decode_image_payload(&image)
        .ok_or_else(|| AppError::BadRequest("'image' must be base64 image data".to_string()))?;

    let challenge = state
        .db
        .get_challenge(&challenge_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Challenge not found".to_string()))?;
    let goal_steps = request
        .goal_steps
        .and_then(|g| u64::try_from(g).ok())
        .unwrap_or(challenge.goal_steps);

    let steps = state
        .step_counter
        .count_steps(&InlineImage::sniffed(bytes))
        .await;

    if steps < goal_steps {
        tracing::info!(%nickname, %challenge_id, steps, goal_steps, "Certification rejected");
        return Ok(Json(VerifyResponse {
            success: false,
            message: "Not enough steps".to_string(),
            steps,
            goal_steps,
        }));
    }

    let day = request
        .today_day
        .and_then(DayKey::into_key)
        .unwrap_or_else(|| local_date_key(chrono::Utc::now(), state.config.utc_offset_hours));
    let verification = state.db.certify_day(&nickname, &challenge_id, &day).await?;

    tracing::info!(
        %nickname,
        %challenge_id,
        %day,
        certified = verification.distinct_days(),
        "Day certified"
    );
    Ok(Json(VerifyResponse {
        success: true,
        message: "Verified".to_string(),
        steps,
        goal_steps,
    }))
}

#[derive(Deserialize)]
struct StatusQuery {
    challenge_id: Option<String>,
    nickname: Option<String>,
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct VerificationStatus {
    pub certified_days: Vec<String>,
    pub start_date: String,
    pub title: String,
    pub goal_steps: u64,
    pub description: String,
}

async fn get_verification_status(
    State(state): State<Arc<AppState>>,
    Query(query): Query<StatusQuery>,
) -> Result<Json<VerificationStatus>> {
    let challenge_id = required(query.challenge_id, "challenge_id is required")?;
    let challenge = state
        .db
        .get_challenge(&challenge_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Challenge not found".to_string()))?;

    let certified_days = match query.nickname.as_deref().map(str::trim) {
        Some(nickname) if !nickname.is_empty() => state
            .db
            .get_verification(nickname, &challenge_id)
            .await?
            .map(|v| v.certified_days)
            .unwrap_or_default(),
        _ => Vec::new(),
    };

    Ok(Json(VerificationStatus {
        certified_days,
        start_date: challenge.start_date,
        title: challenge.title,
        goal_steps: challenge.goal_steps,
        description: challenge.description,
    }))
}

// ─── Rewards and Points ──────────────────────────────────────

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct RewardResponse {
    pub message: String,
    pub points: i64,
}

/// Pay back the entry fee after enough certified days.
async fn claim_reward(
    State(state): State<Arc<AppState>>,
    AppJson(request): AppJson<PairRequest>,
) -> Result<Json<RewardResponse>> {
    let (nickname, challenge_id) = request.into_pair()?;

    let now = chrono::Utc::now();
    let today = local_date_key(now, state.config.utc_offset_hours);
    let now = format_utc_rfc3339(now);
    let points = state
        .db
        .grant_reward_atomic(
            &nickname,
            &challenge_id,
            LedgerClock {
                today: &today,
                now: &now,
            },
        )
        .await?;

    Ok(Json(RewardResponse {
        message: "보상 지급 완료!".to_string(),
        points,
    }))
}

#[derive(Deserialize)]
struct NicknameQuery {
    nickname: Option<String>,
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct UserInfoResponse {
    pub nickname: String,
    pub point: i64,
}

async fn get_user_info(
    State(state): State<Arc<AppState>>,
    Query(query): Query<NicknameQuery>,
) -> Result<Json<UserInfoResponse>> {
    let nickname = required(query.nickname, "Nickname is required")?;
    let user = state
        .db
        .find_user_by_nickname(&nickname)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    Ok(Json(UserInfoResponse {
        nickname: user.nickname,
        point: user.point,
    }))
}

async fn get_point_history(
    State(state): State<Arc<AppState>>,
    Path(nickname): Path<String>,
) -> Result<Json<Vec<PointHistoryEntry>>> {
    let history = state.db.point_history(nickname.trim()).await?;
    Ok(Json(history))
}

#[derive(Deserialize)]
struct RefundBody {
    #[serde(default, deserialize_with = "lenient_string")]
    nickname: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    bank: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    account_number: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    account_holder: Option<String>,
    #[serde(default, deserialize_with = "lenient_i64")]
    refund_amount: Option<i64>,
}

const REFUND_FIELDS_REQUIRED: &str = "모든 필드를 입력해주세요.";

/// Request a cash-out of points to a bank account.
async fn request_refund(
    State(state): State<Arc<AppState>>,
    AppJson(body): AppJson<RefundBody>,
) -> Result<(StatusCode, Json<MessageResponse>)> {
    let nickname = required(body.nickname, REFUND_FIELDS_REQUIRED)?;
    let bank = required(body.bank, REFUND_FIELDS_REQUIRED)?;
    let account_number = required(body.account_number, REFUND_FIELDS_REQUIRED)?;
    let account_holder = required(body.account_holder, REFUND_FIELDS_REQUIRED)?;
    let refund_amount = body
        .refund_amount
        .filter(|a| *a > 0)
        .ok_or_else(|| AppError::BadRequest(REFUND_FIELDS_REQUIRED.to_string()))?;

    let now = chrono::Utc::now();
    let today = local_date_key(now, state.config.utc_offset_hours);
    let now = format_utc_rfc3339(now);
    let request = RefundRequest {
        id: uuid::Uuid::new_v4().to_string(),
        nickname,
        bank,
        account_number,
        account_holder,
        refund_amount,
        status: "pending".to_string(),
        created_at: now.clone(),
    };

    state
        .db
        .request_refund_atomic(
            &request,
            LedgerClock {
                today: &today,
                now: &now,
            },
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(MessageResponse {
            message: "환급 신청이 완료되었습니다.".to_string(),
        }),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_image_payload_strips_data_url() {
        let encoded = base64::engine::general_purpose::STANDARD.encode(b"\x89PNG\r\n\x1a\nrest");
        let with_prefix = format!("data:image/png;base64,{}", encoded);

        assert_eq!(
            decode_image_payload(&with_prefix).unwrap(),
            b"\x89PNG\r\n\x1a\nrest".to_vec()
        );
        assert_eq!(
            decode_image_payload(&encoded),
            decode_image_payload(&with_prefix)
        );
    }

    #[test]
    fn test_decode_image_payload_rejects_garbage() {
        assert!(decode_image_payload("not base64!").is_none());
        assert!(decode_image_payload("data:image/png;base64").is_none());
        assert!(decode_image_payload("").is_none());
    }

    #[test]
    fn test_pair_request_requires_both_fields() {
        let request: PairRequest =
            serde_json::from_value(serde_json::json!({"nickname": "mina"})).unwrap();
        assert!(request.into_pair().is_err());

        let request: PairRequest =
            serde_json::from_value(serde_json::json!({"nickname": " mina ", "challenge_id": 7}))
                .unwrap();
        assert_eq!(
            request.into_pair().unwrap(),
            ("mina".to_string(), "7".to_string())
        );
    }
}
