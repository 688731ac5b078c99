// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore client wrapper with typed operations.
//!
//! Provides high-level operations for:
//! - Users (accounts and point balances)
//! - Meal, water and sleep records
//! - Challenges, participation, certification and rewards
//! - Point history and refund requests
//! - Recipes, posts, search history and keywords

use crate::db::{collections, pair_document_id};
use crate::error::AppError;
use crate::models::challenge::check_reward_eligibility;
use crate::models::{
    Challenge, ChallengeParticipation, ChallengeVerification, DietRecord, Keyword,
    PointHistoryEntry, PointKind, Recipe, RecipePost, RefundRequest, Reward, SearchHistoryEntry,
    SleepRecord, User, WaterRecord,
};
use futures_util::{stream, StreamExt};

const MAX_CONCURRENT_DB_OPS: usize = 50;
// Firestore limits batch/transaction writes to 500 operations.
// We use a safe limit of 400 to allow headroom.
const BATCH_SIZE: usize = 400;

/// Timestamps for a ledger mutation.
#[derive(Debug, Clone, Copy)]
pub struct LedgerClock<'a> {
    /// `YYYY-MM-DD` in the user's calendar
    pub today: &'a str,
    /// ISO 8601 (UTC)
    pub now: &'a str,
}

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreDb {
    client: Option<firestore::FirestoreDb>,
}

impl FirestoreDb {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self, AppError> {
        // If the emulator environment variable is set, use unauthenticated connection
        // to avoid local credential warnings and leakage.
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self, AppError> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            AppError::Database(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a mock Firestore client for testing (offline mode).
    ///
    /// All database operations will return an error if called.
    pub fn new_mock() -> Self {
        Self { client: None }
    }

    /// Helper to get the client or return an error if offline.
    fn get_client(&self) -> Result<&firestore::FirestoreDb, AppError> {
        self.client
            .as_ref()
            .ok_or_else(|| AppError::Database("Database not connected (offline mode)".to_string()))
    }

    // ─── User Operations ─────────────────────────────────────────

    /// Find a user by normalized email.
    pub async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let users: Vec<User> = self
            .get_client()?
            .fluent()
            .select()
            .from(collections::USERS)
            .filter(|q| q.for_all([q.field("email").eq(email)]))
            .limit(1)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(users.into_iter().next())
    }

    /// Find a user by nickname.
    pub async fn find_user_by_nickname(&self, nickname: &str) -> Result<Option<User>, AppError> {
        let users: Vec<User> = self
            .get_client()?
            .fluent()
            .select()
            .from(collections::USERS)
            .filter(|q| q.for_all([q.field("nickname").eq(nickname)]))
            .limit(1)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(users.into_iter().next())
    }

    /// Create or update a user.
    pub async fn upsert_user(&self, user: &User) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::USERS)
            .document_id(&user.id)
            .object(user)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    // ─── Meal Operations ─────────────────────────────────────────

    /// Store an analyzed meal.
    pub async fn insert_diet_record(&self, record: &DietRecord) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::DIET_RECORDS)
            .document_id(&record.id)
            .object(record)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Most recent meals for a user, newest first.
    pub async fn recent_diet_records(
        &self,
        nickname: &str,
        limit: u32,
    ) -> Result<Vec<DietRecord>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .from(collections::DIET_RECORDS)
            .filter(|q| q.for_all([q.field("nickname").eq(nickname)]))
            .order_by([("timestamp", firestore::FirestoreQueryDirection::Descending)])
            .limit(limit)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    // ─── Lifestyle Operations ────────────────────────────────────

    /// Water records for a user at or after `since` (ISO 8601, UTC).
    pub async fn water_records_since(
        &self,
        nickname: &str,
        since: &str,
    ) -> Result<Vec<WaterRecord>, AppError> {
        let since = since.to_string();
        self.get_client()?
            .fluent()
            .select()
            .from(collections::WATER_RECORDS)
            .filter(move |q| {
                q.for_all([
                    q.field("nickname").eq(nickname),
                    q.field("timestamp").greater_than_or_equal(since.clone()),
                ])
            })
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    pub async fn insert_water_record(&self, record: &WaterRecord) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::WATER_RECORDS)
            .document_id(&record.id)
            .object(record)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    pub async fn insert_sleep_record(&self, record: &SleepRecord) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::SLEEP_RECORDS)
            .document_id(&record.id)
            .object(record)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    // ─── Challenge Operations ────────────────────────────────────

    pub async fn insert_challenge(&self, challenge: &Challenge) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::CHALLENGES)
            .document_id(&challenge.id)
            .object(challenge)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    pub async fn get_challenge(&self, challenge_id: &str) -> Result<Option<Challenge>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::CHALLENGES)
            .obj()
            .one(challenge_id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// All challenges, newest first.
    pub async fn list_challenges(&self) -> Result<Vec<Challenge>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .from(collections::CHALLENGES)
            .order_by([("created_at", firestore::FirestoreQueryDirection::Descending)])
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Fetch challenges by ID, preserving the order of `ids` and skipping
    /// any that no longer exist.
    pub async fn get_challenges_by_ids(&self, ids: &[String]) -> Result<Vec<Challenge>, AppError> {
        let found = stream::iter(ids.iter().cloned().enumerate())
            .map(|(index, id)| async move {
                self.get_challenge(&id).await.map(|c| c.map(|c| (index, c)))
            })
            .buffer_unordered(MAX_CONCURRENT_DB_OPS)
            .collect::<Vec<Result<Option<(usize, Challenge)>, AppError>>>()
            .await
            .into_iter()
            .collect::<Result<Vec<_>, AppError>>()?;

        let mut found: Vec<(usize, Challenge)> = found.into_iter().flatten().collect();
        found.sort_by_key(|(index, _)| *index);
        Ok(found.into_iter().map(|(_, c)| c).collect())
    }

    pub async fn get_participation(
        &self,
        nickname: &str,
        challenge_id: &str,
    ) -> Result<Option<ChallengeParticipation>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::CHALLENGE_PARTICIPATION)
            .obj()
            .one(&pair_document_id(nickname, challenge_id))
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    pub async fn get_verification(
        &self,
        nickname: &str,
        challenge_id: &str,
    ) -> Result<Option<ChallengeVerification>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::CHALLENGE_VERIFICATION)
            .obj()
            .one(&pair_document_id(nickname, challenge_id))
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Add a certified day. Returns the verification document after the update.
    pub async fn certify_day(
        &self,
        nickname: &str,
        challenge_id: &str,
        day: &str,
    ) -> Result<ChallengeVerification, AppError> {
        let mut verification = self
            .get_verification(nickname, challenge_id)
            .await?
            .unwrap_or_else(|| ChallengeVerification::new(nickname, challenge_id));

        if !verification.certify(day) {
            tracing::debug!(nickname, challenge_id, day, "Day already certified");
            return Ok(verification);
        }

        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::CHALLENGE_VERIFICATION)
            .document_id(pair_document_id(nickname, challenge_id))
            .object(&verification)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(verification)
    }

    pub async fn get_reward(
        &self,
        nickname: &str,
        challenge_id: &str,
    ) -> Result<Option<Reward>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::REWARDS)
            .obj()
            .one(&pair_document_id(nickname, challenge_id))
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    // ─── Point Operations ────────────────────────────────────────

    /// Point history for a user, newest first.
    ///
    /// Sorted in memory so entries written before `recorded_at` existed are
    /// still returned.
    pub async fn point_history(&self, nickname: &str) -> Result<Vec<PointHistoryEntry>, AppError> {
        let mut entries: Vec<PointHistoryEntry> = self
            .get_client()?
            .fluent()
            .select()
            .from(collections::POINT_HISTORY)
            .filter(|q| q.for_all([q.field("nickname").eq(nickname)]))
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        crate::models::points::sort_newest_first(&mut entries);
        Ok(entries)
    }

    // ─── Atomic Ledger Operations ────────────────────────────────

    /// Atomically join a challenge: charge the entry fee, record the join on
    /// both the challenge and the user, append a `use` history entry and write
    /// the participation record.
    ///
    /// Returns the fee charged.
    pub async fn join_challenge_atomic(
        &self,
        challenge_id: &str,
        nickname: &str,
        clock: LedgerClock<'_>,
    ) -> Result<i64, AppError> {
        let client = self.get_client()?;

        let mut challenge = self
            .get_challenge(challenge_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Challenge not found".to_string()))?;
        let mut user = self
            .find_user_by_nickname(nickname)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        let fee = challenge
            .admit(&mut user)
            .map_err(|rejection| AppError::BadRequest(rejection.to_string()))?;

        let history = PointHistoryEntry {
            id: uuid::Uuid::new_v4().to_string(),
            nickname: nickname.to_string(),
            kind: PointKind::Use,
            description: format!("{} 챌린지 참여", challenge.title),
            points: fee,
            date: clock.today.to_string(),
            recorded_at: clock.now.to_string(),
        };
        let participation = ChallengeParticipation {
            nickname: nickname.to_string(),
            challenge_id: challenge_id.to_string(),
            entry_fee: fee,
            joined_at: clock.today.to_string(),
        };

        let mut transaction = client
            .begin_transaction()
            .await
            .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;

        client
            .fluent()
            .update()
            .in_col(collections::CHALLENGES)
            .document_id(&challenge.id)
            .object(&challenge)
            .add_to_transaction(&mut transaction)
            .map_err(|e| {
                AppError::Database(format!("Failed to add challenge to transaction: {}", e))
            })?;

        client
            .fluent()
            .update()
            .in_col(collections::USERS)
            .document_id(&user.id)
            .object(&user)
            .add_to_transaction(&mut transaction)
            .map_err(|e| AppError::Database(format!("Failed to add user to transaction: {}", e)))?;

        client
            .fluent()
            .update()
            .in_col(collections::POINT_HISTORY)
            .document_id(&history.id)
            .object(&history)
            .add_to_transaction(&mut transaction)
            .map_err(|e| {
                AppError::Database(format!("Failed to add history to transaction: {}", e))
            })?;

        client
            .fluent()
            .update()
            .in_col(collections::CHALLENGE_PARTICIPATION)
            .document_id(pair_document_id(nickname, challenge_id))
            .object(&participation)
            .add_to_transaction(&mut transaction)
            .map_err(|e| {
                AppError::Database(format!("Failed to add participation to transaction: {}", e))
            })?;

        transaction
            .commit()
            .await
            .map_err(|e| AppError::Database(format!("Transaction commit failed: {}", e)))?;

        tracing::info!(
            nickname,
            challenge_id,
            fee,
            balance = user.point,
            "Challenge joined"
        );

        Ok(fee)
    }

    /// Atomically pay the completion reward: credit the entry fee back,
    /// append an `earn` history entry and write the reward record.
    ///
    /// Returns the points credited.
    pub async fn grant_reward_atomic(
        &self,
        nickname: &str,
        challenge_id: &str,
        clock: LedgerClock<'_>,
    ) -> Result<i64, AppError> {
        let client = self.get_client()?;

        let verification = self.get_verification(nickname, challenge_id).await?;
        let already_rewarded = self.get_reward(nickname, challenge_id).await?.is_some();
        check_reward_eligibility(verification.as_ref(), already_rewarded)
            .map_err(|rejection| AppError::BadRequest(rejection.to_string()))?;

        let participation = self
            .get_participation(nickname, challenge_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Participation not found".to_string()))?;
        let mut user = self
            .find_user_by_nickname(nickname)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        let points = participation.entry_fee;
        user.credit(points);

        let history = PointHistoryEntry {
            id: uuid::Uuid::new_v4().to_string(),
            nickname: nickname.to_string(),
            kind: PointKind::Earn,
            description: "챌린지 완료 보상".to_string(),
            points,
            date: clock.today.to_string(),
            recorded_at: clock.now.to_string(),
        };
        let reward = Reward {
            nickname: nickname.to_string(),
            challenge_id: challenge_id.to_string(),
            points,
            date: clock.today.to_string(),
        };

        let mut transaction = client
            .begin_transaction()
            .await
            .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;

        client
            .fluent()
            .update()
            .in_col(collections::USERS)
            .document_id(&user.id)
            .object(&user)
            .add_to_transaction(&mut transaction)
            .map_err(|e| AppError::Database(format!("Failed to add user to transaction: {}", e)))?;

        client
            .fluent()
            .update()
            .in_col(collections::POINT_HISTORY)
            .document_id(&history.id)
            .object(&history)
            .add_to_transaction(&mut transaction)
            .map_err(|e| {
                AppError::Database(format!("Failed to add history to transaction: {}", e))
            })?;

        client
            .fluent()
            .update()
            .in_col(collections::REWARDS)
            .document_id(pair_document_id(nickname, challenge_id))
            .object(&reward)
            .add_to_transaction(&mut transaction)
            .map_err(|e| {
                AppError::Database(format!("Failed to add reward to transaction: {}", e))
            })?;

        transaction
            .commit()
            .await
            .map_err(|e| AppError::Database(format!("Transaction commit failed: {}", e)))?;

        tracing::info!(nickname, challenge_id, points, "Challenge reward granted");

        Ok(points)
    }

    /// Atomically store a refund request and deduct its amount.
    ///
    /// Returns the remaining balance.
    pub async fn request_refund_atomic(
        &self,
        request: &RefundRequest,
        clock: LedgerClock<'_>,
    ) -> Result<i64, AppError> {
        let client = self.get_client()?;

        let mut user = self
            .find_user_by_nickname(&request.nickname)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;
        user.debit(request.refund_amount)
            .map_err(|e| AppError::BadRequest(e.to_string()))?;

        let history = PointHistoryEntry {
            id: uuid::Uuid::new_v4().to_string(),
            nickname: request.nickname.clone(),
            kind: PointKind::Use,
            description: "포인트 환급 신청".to_string(),
            points: request.refund_amount,
            date: clock.today.to_string(),
            recorded_at: clock.now.to_string(),
        };

        let mut transaction = client
            .begin_transaction()
            .await
            .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;

        client
            .fluent()
            .update()
            .in_col(collections::USERS)
            .document_id(&user.id)
            .object(&user)
            .add_to_transaction(&mut transaction)
            .map_err(|e| AppError::Database(format!("Failed to add user to transaction: {}", e)))?;

        client
            .fluent()
            .update()
            .in_col(collections::REFUND_REQUESTS)
            .document_id(&request.id)
            .object(request)
            .add_to_transaction(&mut transaction)
            .map_err(|e| {
                AppError::Database(format!("Failed to add refund to transaction: {}", e))
            })?;

        client
            .fluent()
            .update()
            .in_col(collections::POINT_HISTORY)
            .document_id(&history.id)
            .object(&history)
            .add_to_transaction(&mut transaction)
            .map_err(|e| {
                AppError::Database(format!("Failed to add history to transaction: {}", e))
            })?;

        transaction
            .commit()
            .await
            .map_err(|e| AppError::Database(format!("Transaction commit failed: {}", e)))?;

        tracing::info!(
            nickname = %request.nickname,
            amount = request.refund_amount,
            balance = user.point,
            "Refund requested"
        );

        Ok(user.point)
    }

    // ─── Recipe Operations ───────────────────────────────────────

    pub async fn list_recipes(&self) -> Result<Vec<Recipe>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .from(collections::RECIPES)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Increment a recipe's view counter. Returns `false` if it does not exist.
    ///
    /// Only the `views` field is written so seeded fields this model does not
    /// know about are preserved.
    pub async fn increment_recipe_views(&self, recipe_id: &str) -> Result<bool, AppError> {
        let client = self.get_client()?;

        let recipe: Option<Recipe> = client
            .fluent()
            .select()
            .by_id_in(collections::RECIPES)
            .obj()
            .one(recipe_id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let Some(mut recipe) = recipe else {
            return Ok(false);
        };
        recipe.views += 1;

        let _: () = client
            .fluent()
            .update()
            .fields(["views"])
            .in_col(collections::RECIPES)
            .document_id(recipe_id)
            .object(&recipe)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        tracing::debug!(recipe_id, views = recipe.views, "Recipe view recorded");
        Ok(true)
    }

    pub async fn insert_post(&self, post: &RecipePost) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::POSTS)
            .document_id(&post.id)
            .object(post)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    pub async fn list_keywords(&self) -> Result<Vec<Keyword>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .from(collections::KEYWORDS)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    // ─── Search History Operations ───────────────────────────────

    /// Record a search keyword, replacing any earlier entry for it.
    pub async fn upsert_search_history(&self, entry: &SearchHistoryEntry) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::SEARCH_HISTORY)
            .document_id(urlencoding::encode(&entry.keyword))
            .object(entry)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Search history, newest first.
    pub async fn list_search_history(&self) -> Result<Vec<SearchHistoryEntry>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .from(collections::SEARCH_HISTORY)
            .order_by([("created_at", firestore::FirestoreQueryDirection::Descending)])
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    pub async fn delete_search_history(&self, keyword: &str) -> Result<(), AppError> {
        self.get_client()?
            .fluent()
            .delete()
            .from(collections::SEARCH_HISTORY)
            .document_id(urlencoding::encode(keyword))
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Delete every search history entry. Returns the number deleted.
    pub async fn clear_search_history(&self) -> Result<usize, AppError> {
        let entries = self.list_search_history().await?;
        let count = entries.len();

        self.batch_delete(
            &entries,
            collections::SEARCH_HISTORY,
            |entry: &SearchHistoryEntry| urlencoding::encode(&entry.keyword).into_owned(),
        )
        .await?;

        tracing::debug!(count, "Cleared search history");
        Ok(count)
    }

    // ─── Helper Methods ────────────────────────────────────────────

    /// Helper to batch delete documents using transactions.
    async fn batch_delete<T, F>(
        &self,
        items: &[T],
        collection: &str,
        id_extractor: F,
    ) -> Result<(), AppError>
    where
        F: Fn(&T) -> String,
    {
        let client = self.get_client()?;

        for chunk in items.chunks(BATCH_SIZE) {
            let mut transaction = client
                .begin_transaction()
                .await
                .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;

            for item in chunk {
                let doc_id = id_extractor(item);
                client
                    .fluent()
                    .delete()
                    .from(collection)
                    .document_id(&doc_id)
                    .add_to_transaction(&mut transaction)
                    .map_err(|e| {
                        AppError::Database(format!(
                            "Failed to add deletion to transaction for {}: {}",
                            collection, e
                        ))
                    })?;
            }

            transaction.commit().await.map_err(|e| {
                AppError::Database(format!("Failed to commit batch deletion: {}", e))
            })?;
        }

        Ok(())
    }
}
