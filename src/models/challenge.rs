// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Step-count challenges, participation and daily certification.
//!
//! The rules here are pure; the database layer loads documents, applies a rule
//! in memory and writes the results in one transaction.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::models::wire::{lenient_i64, lenient_string};
use crate::models::User;

#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Distinct certified days needed before the entry fee is paid back.
pub const REWARD_REQUIRED_DAYS: usize = 28;
/// Step goal used when a challenge does not specify one.
pub const DEFAULT_GOAL_STEPS: u64 = 8000;

fn default_goal_steps() -> u64 {
    DEFAULT_GOAL_STEPS
}

fn default_status() -> String {
    "active".to_string()
}

/// A challenge users can join by paying an entry fee in points.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct Challenge {
    #[serde(rename = "_id")]
    pub id: String,
    pub title: String,
    pub description: String,
    pub image_url: String,
    /// Entry fee, refunded as a reward on completion
    pub points_reward: i64,
    /// Zero means unlimited
    pub max_participants: u32,
    /// `YYYY-MM-DD`
    pub start_date: String,
    /// `YYYY-MM-DD`
    pub end_date: String,
    #[serde(default = "default_goal_steps")]
    pub goal_steps: u64,
    #[serde(default)]
    pub participants: u32,
    #[serde(default)]
    pub joined_users: Vec<String>,
    #[serde(default = "default_status")]
    pub status: String,
    #[serde(default)]
    pub created_at: String,
}

/// Why a join was refused.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum JoinRejection {
    #[error("Already joined this challenge")]
    AlreadyJoined,
    #[error("Challenge is full")]
    Full,
    #[error("Not enough points: balance {balance}, entry fee {fee}")]
    InsufficientPoints { balance: i64, fee: i64 },
}

impl Challenge {
    pub fn has_joined(&self, nickname: &str) -> bool {
        self.joined_users.iter().any(|n| n == nickname)
    }

    pub fn is_full(&self) -> bool {
        self.max_participants > 0 && self.participants >= self.max_participants
    }

    /// Admit `user`, updating both documents in memory.
    ///
    /// Returns the entry fee charged. Nothing is modified on rejection.
    pub fn admit(&mut self, user: &mut User) -> Result<i64, JoinRejection> {
        if self.has_joined(&user.nickname) || user.joined_challenges.contains(&self.id) {
            return Err(JoinRejection::AlreadyJoined);
        }
        if self.is_full() {
            return Err(JoinRejection::Full);
        }

        let fee = self.points_reward.max(0);
        user.debit(fee)
            .map_err(|e| JoinRejection::InsufficientPoints {
                balance: e.balance,
                fee: e.required,
            })?;

        self.joined_users.push(user.nickname.clone());
        self.participants += 1;
        user.joined_challenges.push(self.id.clone());
        Ok(fee)
    }
}

/// Proof that a user joined a challenge.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChallengeParticipation {
    pub nickname: String,
    pub challenge_id: String,
    pub entry_fee: i64,
    /// `YYYY-MM-DD`
    pub joined_at: String,
}

/// Days on which a user met the step goal.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChallengeVerification {
    pub nickname: String,
    pub challenge_id: String,
    #[serde(default)]
    pub certified_days: Vec<String>,
}

impl ChallengeVerification {
    pub fn new(nickname: &str, challenge_id: &str) -> Self {
        Self {
            nickname: nickname.to_string(),
            challenge_id: challenge_id.to_string(),
            certified_days: Vec::new(),
        }
    }

    /// Record a certified day. Returns `false` if it was already recorded.
    pub fn certify(&mut self, day: &str) -> bool {
        if self.certified_days.iter().any(|d| d == day) {
            return false;
        }
        self.certified_days.push(day.to_string());
        true
    }

    pub fn distinct_days(&self) -> usize {
        self.certified_days.iter().collect::<BTreeSet<_>>().len()
    }
}

/// Why a reward was refused.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RewardRejection {
    #[error("At least {required} certified days are required ({certified} so far)")]
    NotEnoughDays { certified: usize, required: usize },
    #[error("Reward already granted for this challenge")]
    AlreadyRewarded,
}

/// Decide whether a reward may be paid for a (user, challenge) pair.
pub fn check_reward_eligibility(
    verification: Option<&ChallengeVerification>,
    already_rewarded: bool,
) -> Result<(), RewardRejection> {
    let certified = verification.map_or(0, ChallengeVerification::distinct_days);
    if certified < REWARD_REQUIRED_DAYS {
        return Err(RewardRejection::NotEnoughDays {
            certified,
            required: REWARD_REQUIRED_DAYS,
        });
    }
    if already_rewarded {
        return Err(RewardRejection::AlreadyRewarded);
    }
    Ok(())
}

/// A day identifier as sent by clients: either a day number or a date string.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum DayKey {
    Number(u64),
    Text(String),
}

impl DayKey {
    /// Canonical string form stored in `certified_days`.
    pub fn into_key(self) -> Option<String> {
        match self {
            DayKey::Number(n) => Some(n.to_string()),
            DayKey::Text(s) => {
                let s = s.trim();
                (!s.is_empty()).then(|| s.to_string())
            }
        }
    }
}

/// Body of a challenge creation request.
#[derive(Debug, Default, Deserialize)]
pub struct NewChallenge {
    #[serde(default, deserialize_with = "lenient_string")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub image_url: Option<String>,
    #[serde(default, deserialize_with = "lenient_i64")]
    pub points_reward: Option<i64>,
    #[serde(default, deserialize_with = "lenient_i64")]
    pub max_participants: Option<i64>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub start_date: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub end_date: Option<String>,
    #[serde(default, deserialize_with = "lenient_i64")]
    pub goal_steps: Option<i64>,
}

/// Why a challenge could not be created.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NewChallengeError {
    #[error("'{0}' is required")]
    Missing(&'static str),
    #[error("'{0}' must be a non-negative integer")]
    Negative(&'static str),
    #[error("'{0}' must be a date in YYYY-MM-DD format")]
    BadDate(&'static str),
    #[error("'end_date' must not be before 'start_date'")]
    EndBeforeStart,
}

impl NewChallenge {
    /// Validate the request and build the stored challenge.
    pub fn into_challenge(self, id: String, now: &str) -> Result<Challenge, NewChallengeError> {
        use NewChallengeError::*;

        let text = |v: Option<String>, name| {
            v.map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .ok_or(Missing(name))
        };
        let title = text(self.title, "title")?;
        let description = text(self.description, "description")?;
        let image_url = text(self.image_url, "image_url")?;
        let points_reward = self.points_reward.ok_or(Missing("points_reward"))?;
        let max_participants = self.max_participants.ok_or(Missing("max_participants"))?;
        let start_date = text(self.start_date, "start_date")?;
        let end_date = text(self.end_date, "end_date")?;

        if points_reward < 0 {
            return Err(Negative("points_reward"));
        }
        let max_participants =
            u32::try_from(max_participants).map_err(|_| Negative("max_participants"))?;
        let goal_steps = match self.goal_steps {
            Some(g) => u64::try_from(g).map_err(|_| Negative("goal_steps"))?,
            None => DEFAULT_GOAL_STEPS,
        };

        let start = parse_day(&start_date).ok_or(BadDate("start_date"))?;
        let end = parse_day(&end_date).ok_or(BadDate("end_date"))?;
        if end < start {
            return Err(EndBeforeStart);
        }

        Ok(Challenge {
            id,
            title,
            description,
            image_url,
            points_reward,
            max_participants,
            start_date,
            end_date,
            goal_steps,
            participants: 0,
            joined_users: Vec::new(),
            status: default_status(),
            created_at: now.to_string(),
        })
    }
}

fn parse_day(raw: &str) -> Option<chrono::NaiveDate> {
    chrono::NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()
}
