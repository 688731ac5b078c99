// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore integration tests.
//!
//! These tests require the Firestore emulator to be running.
//! Set FIRESTORE_EMULATOR_HOST (e.g. `gcloud emulators firestore start`) to run them.
//!
//! Every test uses unique nicknames and IDs so runs do not interfere.

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    response::Response,
    routing::post,
    Json, Router,
};
use base64::Engine;
use serde_json::{json, Value};
use slowage_tracker::config::Config;
use slowage_tracker::db::{FirestoreDb, LedgerClock};
use slowage_tracker::error::AppError;
use slowage_tracker::models::{Challenge, PointKind, RefundRequest, User};
use slowage_tracker::routes::create_router;
use slowage_tracker::services::GeminiClient;
use slowage_tracker::AppState;
use std::sync::Arc;
use tower::ServiceExt;

mod common;
use common::{test_db, unique};

const CLOCK: LedgerClock<'static> = LedgerClock {
    today: "2025-08-14",
    now: "2025-08-14T03:00:00.000Z",
};

fn test_user(nickname: &str, point: i64, password: &str) -> User {
    serde_json::from_value(json!({
        "id": unique("user"),
        "email": format!("{}@example.com", nickname),
        "password": password,
        "nickname": nickname,
        "birthdate": "1990-01-01",
        "gender": "F",
        "heightCm": 160.0,
        "weightKg": 52.0,
        "activityLevel": "moderate",
        "sleepHours": 7.0,
        "caffeine": "1",
        "alcohol": "0",
        "point": point
    }))
    .unwrap()
}

fn test_challenge(fee: i64, max_participants: u32) -> Challenge {
    serde_json::from_value(json!({
        "_id": unique("challenge"),
        "title": "8천보 걷기",
        "description": "4주 동안 매일 8000보",
        "image_url": "https://img.example/walk.png",
        "points_reward": fee,
        "max_participants": max_participants,
        "start_date": "2025-08-01",
        "end_date": "2025-08-28",
        "created_at": CLOCK.now
    }))
    .unwrap()
}

async fn emulator_app(db: FirestoreDb) -> axum::Router {
    let state = Arc::new(AppState::with_gemini(
        Config::test_default(),
        db,
        common::offline_gemini(),
    ));
    create_router(state)
}

async fn post_json(app: &axum::Router, uri: &str, body: Value) -> Response {
    app.clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap()
}

async fn body_json(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

// ═══════════════════════════════════════════════════════════════════════════
// ACCOUNT TESTS
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_duplicate_registration_rejected() {
    require_emulator!();

    let app = emulator_app(test_db().await).await;
    let nickname = unique("mina");
    let email = format!("{}@Example.com", nickname);
    let registration = json!({
        "email": email,
        "password": "pw1234",
        "nickname": nickname,
        "birthdate": "1990-04-01",
        "gender": "F",
        "heightCm": 162,
        "weightKg": 54.5,
        "activityLevel": "moderate",
        "sleepHours": 7,
        "caffeine": "1",
        "alcohol": "0"
    });

    let first = post_json(&app, "/register", registration.clone()).await;
    assert_eq!(first.status(), StatusCode::CREATED);

    // Same email in different case
    let mut again = registration.clone();
    again["email"] = json!(email.to_uppercase());
    again["nickname"] = json!(unique("other"));
    let second = post_json(&app, "/register", again).await;
    assert_eq!(second.status(), StatusCode::CONFLICT);

    let mut same_nickname = registration.clone();
    same_nickname["email"] = json!(format!("{}@example.com", unique("fresh")));
    let third = post_json(&app, "/register", same_nickname).await;
    assert_eq!(third.status(), StatusCode::CONFLICT);

    let login = post_json(
        &app,
        "/login",
        json!({"email": email, "password": "pw1234"}),
    )
    .await;
    assert_eq!(login.status(), StatusCode::OK);
    assert_eq!(body_json(login).await["nickname"], nickname);

    let wrong = post_json(
        &app,
        "/login",
        json!({"email": email, "password": "pw12345"}),
    )
    .await;
    assert_eq!(wrong.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_legacy_plaintext_login() {
    require_emulator!();

    let db = test_db().await;
    let nickname = unique("legacy");
    let user = test_user(&nickname, 0, "plain-secret");
    db.upsert_user(&user).await.unwrap();
    let app = emulator_app(db).await;

    let ok = post_json(
        &app,
        "/login",
        json!({"email": user.email, "password": "plain-secret"}),
    )
    .await;
    assert_eq!(ok.status(), StatusCode::OK);

    let bad = post_json(
        &app,
        "/login",
        json!({"email": user.email, "password": "plain-secreT"}),
    )
    .await;
    assert_eq!(bad.status(), StatusCode::UNAUTHORIZED);
}

// ═══════════════════════════════════════════════════════════════════════════
// CHALLENGE LEDGER TESTS
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_join_twice_charges_once() {
    require_emulator!();

    let db = test_db().await;
    let nickname = unique("walker");
    db.upsert_user(&test_user(&nickname, 300, "x")).await.unwrap();
    let challenge = test_challenge(100, 0);
    db.insert_challenge(&challenge).await.unwrap();

    let fee = db
        .join_challenge_atomic(&challenge.id, &nickname, CLOCK)
        .await
        .unwrap();
    assert_eq!(fee, 100);

    let second = db
        .join_challenge_atomic(&challenge.id, &nickname, CLOCK)
        .await;
    assert!(matches!(second, Err(AppError::BadRequest(_))));

    let user = db.find_user_by_nickname(&nickname).await.unwrap().unwrap();
    assert_eq!(user.point, 200);
    assert_eq!(user.joined_challenges, vec![challenge.id.clone()]);

    let stored = db.get_challenge(&challenge.id).await.unwrap().unwrap();
    assert_eq!(stored.participants, 1);
    assert_eq!(stored.joined_users, vec![nickname.clone()]);

    let history = db.point_history(&nickname).await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].kind, PointKind::Use);
    assert_eq!(history[0].points, 100);

    let participation = db
        .get_participation(&nickname, &challenge.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(participation.entry_fee, 100);
}

#[tokio::test]
async fn test_join_rejections() {
    require_emulator!();

    let db = test_db().await;
    let poor = unique("poor");
    db.upsert_user(&test_user(&poor, 50, "x")).await.unwrap();
    let challenge = test_challenge(100, 1);
    db.insert_challenge(&challenge).await.unwrap();

    let result = db.join_challenge_atomic(&challenge.id, &poor, CLOCK).await;
    assert!(matches!(result, Err(AppError::BadRequest(_))));
    let user = db.find_user_by_nickname(&poor).await.unwrap().unwrap();
    assert_eq!(user.point, 50);

    let rich = unique("rich");
    db.upsert_user(&test_user(&rich, 500, "x")).await.unwrap();
    db.join_challenge_atomic(&challenge.id, &rich, CLOCK)
        .await
        .unwrap();

    let late = unique("late");
    db.upsert_user(&test_user(&late, 500, "x")).await.unwrap();
    let full = db.join_challenge_atomic(&challenge.id, &late, CLOCK).await;
    assert!(matches!(full, Err(AppError::BadRequest(_))));

    let missing = db
        .join_challenge_atomic("no-such-challenge", &rich, CLOCK)
        .await;
    assert!(matches!(missing, Err(AppError::NotFound(_))));
}

/// Model stub that reads 8,532 steps from any screenshot.
async fn pedometer_gemini() -> GeminiClient {
    let base_url = common::spawn_stub(Router::new().route(
        "/models/{*call}",
        post(|| async {
            Json(json!({
                "candidates": [{"content": {"parts": [{"text": "오늘 8,532 걸음"}]}}]
            }))
        }),
    ))
    .await;
    GeminiClient::new("stub-key".to_string()).with_base_url(base_url)
}

#[tokio::test]
async fn test_verify_certifies_only_when_goal_met() {
    require_emulator!();

    let db = test_db().await;
    let nickname = unique("walker");
    let challenge = test_challenge(0, 0);
    db.insert_challenge(&challenge).await.unwrap();

    let state = Arc::new(AppState::with_gemini(
        Config::test_default(),
        db.clone(),
        pedometer_gemini().await,
    ));
    let app = create_router(state);
    let screenshot = format!(
        "data:image/png;base64,{}",
        base64::engine::general_purpose::STANDARD.encode(b"\x89PNG\r\n\x1a\nsteps")
    );

    // The request's goal overrides the challenge's 8000
    let response = post_json(
        &app,
        "/api/challenges/verify",
        json!({
            "nickname": nickname,
            "challenge_id": challenge.id,
            "image": screenshot,
            "today_day": "2025-08-14",
            "goal_steps": 10000
        }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "Not enough steps");
    assert_eq!(body["steps"], 8532);
    assert_eq!(body["goal_steps"], 10000);
    assert!(db
        .get_verification(&nickname, &challenge.id)
        .await
        .unwrap()
        .is_none());

    let response = post_json(
        &app,
        "/api/challenges/verify",
        json!({
            "nickname": nickname,
            "challenge_id": challenge.id,
            "image": screenshot,
            "today_day": "2025-08-14"
        }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["message"], "Verified");
    assert_eq!(body["goal_steps"], 8000);

    let verification = db
        .get_verification(&nickname, &challenge.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(verification.certified_days, vec!["2025-08-14".to_string()]);
}

#[tokio::test]
async fn test_verify_unknown_challenge_is_not_found() {
    require_emulator!();

    let app = emulator_app(test_db().await).await;
    let response = post_json(
        &app,
        "/api/challenges/verify",
        json!({
            "nickname": unique("walker"),
            "challenge_id": unique("missing"),
            "image": base64::engine::general_purpose::STANDARD.encode(b"\xFF\xD8\xFF")
        }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_reward_after_28_days_once() {
    require_emulator!();

    let db = test_db().await;
    let nickname = unique("finisher");
    db.upsert_user(&test_user(&nickname, 100, "x")).await.unwrap();
    let challenge = test_challenge(100, 0);
    db.insert_challenge(&challenge).await.unwrap();
    db.join_challenge_atomic(&challenge.id, &nickname, CLOCK)
        .await
        .unwrap();

    for day in 1..=27 {
        db.certify_day(&nickname, &challenge.id, &format!("2025-08-{:02}", day))
            .await
            .unwrap();
    }
    // Re-certifying a day does not add a second entry
    let verification = db
        .certify_day(&nickname, &challenge.id, "2025-08-27")
        .await
        .unwrap();
    assert_eq!(verification.distinct_days(), 27);

    let early = db.grant_reward_atomic(&nickname, &challenge.id, CLOCK).await;
    assert!(matches!(early, Err(AppError::BadRequest(_))));

    db.certify_day(&nickname, &challenge.id, "2025-08-28")
        .await
        .unwrap();
    let points = db
        .grant_reward_atomic(&nickname, &challenge.id, CLOCK)
        .await
        .unwrap();
    assert_eq!(points, 100);

    let twice = db.grant_reward_atomic(&nickname, &challenge.id, CLOCK).await;
    assert!(matches!(twice, Err(AppError::BadRequest(_))));

    let user = db.find_user_by_nickname(&nickname).await.unwrap().unwrap();
    assert_eq!(user.point, 100);

    let history = db.point_history(&nickname).await.unwrap();
    assert_eq!(history.len(), 2);
    assert!(history.iter().any(|e| e.kind == PointKind::Earn));
}

#[tokio::test]
async fn test_refund_deducts_balance() {
    require_emulator!();

    let db = test_db().await;
    let nickname = unique("saver");
    db.upsert_user(&test_user(&nickname, 1000, "x")).await.unwrap();

    let mut request = RefundRequest {
        id: unique("refund"),
        nickname: nickname.clone(),
        bank: "국민".to_string(),
        account_number: "123-456-789".to_string(),
        account_holder: "김민아".to_string(),
        refund_amount: 400,
        status: "pending".to_string(),
        created_at: CLOCK.now.to_string(),
    };
    let balance = db.request_refund_atomic(&request, CLOCK).await.unwrap();
    assert_eq!(balance, 600);

    request.id = unique("refund");
    request.refund_amount = 601;
    let too_much = db.request_refund_atomic(&request, CLOCK).await;
    assert!(matches!(too_much, Err(AppError::BadRequest(_))));

    let user = db.find_user_by_nickname(&nickname).await.unwrap().unwrap();
    assert_eq!(user.point, 600);
}

// ═══════════════════════════════════════════════════════════════════════════
// ROUTE TESTS
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_water_daily_total_accumulates() {
    require_emulator!();

    let app = emulator_app(test_db().await).await;
    let nickname = unique("drinker");

    let first = post_json(&app, "/record-water", json!({"nickname": nickname, "cups": 2})).await;
    assert_eq!(first.status(), StatusCode::OK);
    assert_eq!(body_json(first).await["daily_total"], 2);

    let second = post_json(&app, "/record-water", json!({"nickname": nickname, "cups": 3})).await;
    let body = body_json(second).await;
    assert_eq!(body["cups"], 3);
    assert_eq!(body["daily_total"], 5);
}

#[tokio::test]
async fn test_challenge_list_joined_flag() {
    require_emulator!();

    let db = test_db().await;
    let nickname = unique("lister");
    db.upsert_user(&test_user(&nickname, 0, "x")).await.unwrap();
    let challenge = test_challenge(0, 0);
    db.insert_challenge(&challenge).await.unwrap();
    let app = emulator_app(db).await;

    let joined = post_json(
        &app,
        "/api/challenges/join",
        json!({"nickname": nickname, "challenge_id": challenge.id}),
    )
    .await;
    assert_eq!(joined.status(), StatusCode::CREATED);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri(format!("/api/challenges?filter=my&nickname={}", nickname))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let list = body_json(response).await;
    assert_eq!(list.as_array().unwrap().len(), 1);
    assert_eq!(list[0]["_id"], challenge.id);
    assert_eq!(list[0]["joined"], true);
}

#[tokio::test]
async fn test_search_history_roundtrip() {
    require_emulator!();

    let db = test_db().await;
    let keyword = unique("두부 조림");
    db.upsert_search_history(&slowage_tracker::models::SearchHistoryEntry {
        keyword: keyword.clone(),
        created_at: "2025-08-14T03:00:00.000Z".to_string(),
    })
    .await
    .unwrap();

    let listed = db.list_search_history().await.unwrap();
    assert!(listed.iter().any(|e| e.keyword == keyword));

    db.delete_search_history(&keyword).await.unwrap();
    let listed = db.list_search_history().await.unwrap();
    assert!(!listed.iter().any(|e| e.keyword == keyword));
}
