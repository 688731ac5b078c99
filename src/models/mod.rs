// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod challenge;
pub mod diet;
pub mod lifestyle;
pub mod points;
pub mod recipe;
pub mod user;
pub mod wire;

pub use challenge::{Challenge, ChallengeParticipation, ChallengeVerification};
pub use diet::{DietRecord, MindCategory, MindResult};
pub use lifestyle::{SleepRecord, WaterRecord};
pub use points::{PointHistoryEntry, PointKind, RefundRequest, Reward};
pub use recipe::{Keyword, Recipe, RecipePost, SearchHistoryEntry};
pub use user::User;
