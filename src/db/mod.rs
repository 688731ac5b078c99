//! Database layer (Firestore).

pub mod firestore;

pub use firestore::{FirestoreDb, LedgerClock};

/// Collection names as constants.
pub mod collections {
    pub const USERS: &str = "users";
    pub const DIET_RECORDS: &str = "diet_records";
    pub const WATER_RECORDS: &str = "water_records";
    pub const SLEEP_RECORDS: &str = "sleep_records";
    pub const CHALLENGES: &str = "challenges";
    /// Keyed by [`super::pair_document_id`]
    pub const CHALLENGE_PARTICIPATION: &str = "challenge_participation";
    /// Keyed by [`super::pair_document_id`]
    pub const CHALLENGE_VERIFICATION: &str = "challenge_verification";
    pub const POINT_HISTORY: &str = "point_history";
    /// Keyed by [`super::pair_document_id`]; presence means already rewarded
    pub const REWARDS: &str = "rewards";
    pub const REFUND_REQUESTS: &str = "refund_requests";
    /// Seeded externally
    pub const RECIPES: &str = "recipes";
    pub const POSTS: &str = "posts";
    /// Keyed by the encoded keyword
    pub const SEARCH_HISTORY: &str = "search_history";
    /// Seeded externally
    pub const KEYWORDS: &str = "keywords";
}

/// Document ID for per-(user, challenge) records.
pub fn pair_document_id(nickname: &str, challenge_id: &str) -> String {
    format!("{}_{}", urlencoding::encode(nickname), challenge_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pair_document_id_encodes_nickname() {
        assert_eq!(pair_document_id("mina", "c1"), "mina_c1");
        assert_eq!(pair_document_id("김/민아", "c1"), "%EA%B9%80%2F%EB%AF%BC%EC%95%84_c1");
    }
}
