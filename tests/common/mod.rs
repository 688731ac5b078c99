// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use slowage_tracker::config::Config;
use slowage_tracker::db::FirestoreDb;
use slowage_tracker::routes::create_router;
use slowage_tracker::services::GeminiClient;
use slowage_tracker::AppState;
use std::sync::Arc;
use std::time::Duration;

/// Address nothing listens on; connections are refused immediately.
#[allow(dead_code)]
pub const UNREACHABLE_BASE_URL: &str = "http://127.0.0.1:9";

/// Check if emulator is available via environment variable.
#[allow(dead_code)]
pub fn emulator_available() -> bool {
    std::env::var("FIRESTORE_EMULATOR_HOST").is_ok()
}

/// Skip test with message if emulator not available.
#[macro_export]
macro_rules! require_emulator {
    () => {
        if !crate::common::emulator_available() {
            eprintln!("⚠️  Skipping: FIRESTORE_EMULATOR_HOST not set");
            return;
        }
    };
}

/// Create a test database connection.
#[allow(dead_code)]
pub async fn test_db() -> FirestoreDb {
    FirestoreDb::new("test-project")
        .await
        .expect("Failed to connect to Firestore emulator")
}

/// Create a mock database connection (offline).
#[allow(dead_code)]
pub fn test_db_offline() -> FirestoreDb {
    FirestoreDb::new_mock()
}

/// Model client that fails fast without leaving the machine.
#[allow(dead_code)]
pub fn offline_gemini() -> GeminiClient {
    GeminiClient::new("test_gemini_key".to_string())
        .with_base_url(UNREACHABLE_BASE_URL)
        .with_backoff_base(Duration::ZERO)
}

/// Create a test app with offline mock dependencies.
/// Returns the router and the shared state.
#[allow(dead_code)]
pub fn create_test_app() -> (axum::Router, Arc<AppState>) {
    let state = Arc::new(AppState::with_gemini(
        Config::test_default(),
        test_db_offline(),
        offline_gemini(),
    ));
    (create_router(state.clone()), state)
}

/// Serve `router` on an ephemeral local port and return its base URL.
#[allow(dead_code)]
pub async fn spawn_stub(router: axum::Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind stub server");
    let addr = listener.local_addr().expect("Stub server has no address");
    tokio::spawn(async move {
        axum::serve(listener, router).await.ok();
    });
    format!("http://{}", addr)
}

/// Unique suffix so emulator tests do not collide.
#[allow(dead_code)]
pub fn unique(prefix: &str) -> String {
    format!("{}-{}", prefix, uuid::Uuid::new_v4().simple())
}
