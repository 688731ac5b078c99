// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! User model for storage and API.

use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;
use validator::Validate;

use crate::models::wire::{lenient_f64, lenient_string};

/// Prefixes produced by bcrypt implementations.
const BCRYPT_PREFIXES: [&str; 3] = ["$2a$", "$2b$", "$2y$"];

/// User profile stored in Firestore.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Generated user ID (also used as document ID)
    pub id: String,
    /// Normalized email address (unique)
    pub email: String,
    /// bcrypt hash; legacy accounts may still hold a plaintext value
    pub password: String,
    /// Display name (unique), used as identity by most routes
    pub nickname: String,
    pub birthdate: String,
    pub gender: String,
    #[serde(rename = "heightCm")]
    pub height_cm: f64,
    #[serde(rename = "weightKg")]
    pub weight_kg: f64,
    #[serde(rename = "activityLevel")]
    pub activity_level: String,
    #[serde(rename = "sleepHours")]
    pub sleep_hours: f64,
    pub caffeine: String,
    pub alcohol: String,
    /// Point balance
    #[serde(default)]
    pub point: i64,
    /// IDs of challenges this user has joined
    #[serde(default)]
    pub joined_challenges: Vec<String>,
    /// When the account was created (ISO 8601)
    #[serde(default)]
    pub created_at: String,
}

impl User {
    /// Build a new account from a validated registration.
    ///
    /// Returns `None` if any required field is missing; callers run
    /// [`RegisterRequest::first_missing_field`] first.
    pub fn from_registration(
        request: RegisterRequest,
        id: String,
        password_hash: String,
        created_at: String,
    ) -> Option<Self> {
        Some(Self {
            id,
            email: normalize_email(request.email.as_deref()?),
            password: password_hash,
            nickname: request.nickname?.trim().to_string(),
            birthdate: request.birthdate?,
            gender: request.gender?,
            height_cm: request.height_cm?,
            weight_kg: request.weight_kg?,
            activity_level: request.activity_level?,
            sleep_hours: request.sleep_hours?,
            caffeine: request.caffeine?,
            alcohol: request.alcohol?,
            point: 0,
            joined_challenges: Vec::new(),
            created_at,
        })
    }

    /// Deduct points, refusing to go below zero.
    pub fn debit(&mut self, amount: i64) -> Result<(), InsufficientPoints> {
        if amount > self.point {
            return Err(InsufficientPoints {
                balance: self.point,
                required: amount,
            });
        }
        self.point -= amount;
        Ok(())
    }

    pub fn credit(&mut self, amount: i64) {
        self.point += amount;
    }
}

/// A debit larger than the current balance.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Not enough points: balance {balance}, required {required}")]
pub struct InsufficientPoints {
    pub balance: i64,
    pub required: i64,
}

/// Registration payload.
///
/// Every field is optional at the wire level so that a missing field can be
/// reported by name instead of as a generic decode failure.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct RegisterRequest {
    #[serde(default, deserialize_with = "lenient_string")]
    #[validate(email(message = "must be a valid email address"))]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub password: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub nickname: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub birthdate: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub gender: Option<String>,
    #[serde(default, rename = "heightCm", deserialize_with = "lenient_f64")]
    pub height_cm: Option<f64>,
    #[serde(default, rename = "weightKg", deserialize_with = "lenient_f64")]
    pub weight_kg: Option<f64>,
    #[serde(default, rename = "activityLevel", deserialize_with = "lenient_string")]
    pub activity_level: Option<String>,
    #[serde(default, rename = "sleepHours", deserialize_with = "lenient_f64")]
    pub sleep_hours: Option<f64>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub caffeine: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub alcohol: Option<String>,
}

impl RegisterRequest {
    /// First required field that is absent or blank, in wire order.
    pub fn first_missing_field(&self) -> Option<&'static str> {
        let text = |v: &Option<String>| v.as_deref().is_none_or(|s| s.trim().is_empty());
        let number = |v: &Option<f64>| v.is_none();

        [
            ("email", text(&self.email)),
            ("password", text(&self.password)),
            ("nickname", text(&self.nickname)),
            ("birthdate", text(&self.birthdate)),
            ("gender", text(&self.gender)),
            ("heightCm", number(&self.height_cm)),
            ("weightKg", number(&self.weight_kg)),
            ("activityLevel", text(&self.activity_level)),
            ("sleepHours", number(&self.sleep_hours)),
            ("caffeine", text(&self.caffeine)),
            ("alcohol", text(&self.alcohol)),
        ]
        .into_iter()
        .find_map(|(name, missing)| missing.then_some(name))
    }
}

/// Trim and lower-case an email address.
pub fn normalize_email(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// Whether a stored password value is a bcrypt hash.
pub fn is_bcrypt_hash(stored: &str) -> bool {
    BCRYPT_PREFIXES.iter().any(|p| stored.starts_with(p))
}

/// Check a login attempt against the stored password value.
///
/// bcrypt hashes are verified normally. Anything else is a legacy plaintext
/// value and is compared bytewise in constant time. A malformed hash is
/// treated as a mismatch.
pub fn verify_password(candidate: &str, stored: &str) -> bool {
    if is_bcrypt_hash(stored) {
        return match bcrypt::verify(candidate, stored) {
            Ok(valid) => valid,
            Err(e) => {
                tracing::warn!(error = %e, "Stored bcrypt hash could not be checked");
                false
            }
        };
    }

    tracing::debug!("Comparing against legacy plaintext password");
    candidate.as_bytes().ct_eq(stored.as_bytes()).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_request() -> RegisterRequest {
        serde_json::from_value(serde_json::json!({
            "email": "  Mina@Example.COM ",
            "password": "pw1234",
            "nickname": "mina",
            "birthdate": "1990-04-01",
            "gender": "F",
            "heightCm": 162,
            "weightKg": "54.5",
            "activityLevel": "moderate",
            "sleepHours": 7,
            "caffeine": 2,
            "alcohol": "none"
        }))
        .unwrap()
    }

    #[test]
    fn test_first_missing_field_reports_in_order() {
        let mut request = full_request();
        assert_eq!(request.first_missing_field(), None);

        request.gender = Some("   ".to_string());
        request.height_cm = None;
        assert_eq!(request.first_missing_field(), Some("gender"));

        let empty = RegisterRequest::default();
        assert_eq!(empty.first_missing_field(), Some("email"));
    }

    #[test]
    fn test_from_registration_normalizes() {
        let user = User::from_registration(
            full_request(),
            "id-1".to_string(),
            "hash".to_string(),
            "2025-08-01T00:00:00Z".to_string(),
        )
        .unwrap();

        assert_eq!(user.email, "mina@example.com");
        assert_eq!(user.weight_kg, 54.5);
        assert_eq!(user.caffeine, "2");
        assert_eq!(user.point, 0);
        assert!(user.joined_challenges.is_empty());
    }

    #[test]
    fn test_invalid_email_fails_validation() {
        let mut request = full_request();
        request.email = Some("not-an-email".to_string());
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_verify_bcrypt_password() {
        let hash = bcrypt::hash("correct horse", 4).unwrap();
        assert!(is_bcrypt_hash(&hash));
        assert!(verify_password("correct horse", &hash));
        assert!(!verify_password("wrong horse", &hash));
    }

    #[test]
    fn test_verify_legacy_plaintext_password() {
        assert!(!is_bcrypt_hash("hunter2"));
        assert!(verify_password("hunter2", "hunter2"));
        assert!(!verify_password("hunter3", "hunter2"));
        assert!(!verify_password("Hunter2", "hunter2"));
        assert!(!verify_password("hunter2 ", "hunter2"));
    }

    #[test]
    fn test_malformed_bcrypt_hash_rejects() {
        assert!(!verify_password("anything", "$2b$garbage"));
    }

    #[test]
    fn test_debit_and_credit() {
        let mut user = User::from_registration(
            full_request(),
            "id-1".to_string(),
            "hash".to_string(),
            String::new(),
        )
        .unwrap();
        user.credit(100);

        assert_eq!(
            user.debit(150),
            Err(InsufficientPoints {
                balance: 100,
                required: 150
            })
        );
        assert_eq!(user.point, 100);
        assert!(user.debit(100).is_ok());
        assert_eq!(user.point, 0);
    }
}
