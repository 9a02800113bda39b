//! Utility functions for the matchmaking service

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Generate a new unique game ID
pub fn generate_game_id() -> Uuid {
    Uuid::new_v4()
}

/// Get the current UTC timestamp
pub fn current_timestamp() -> DateTime<Utc> {
    Utc::now()
}

/// Calculate the absolute difference between two ratings
pub fn rating_difference(rating1: i32, rating2: i32) -> i32 {
    (rating1 - rating2).abs()
}

/// Check if two ratings are within the given tolerance
pub fn ratings_within_tolerance(rating1: i32, rating2: i32, tolerance: i32) -> bool {
    rating_difference(rating1, rating2) <= tolerance
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_unique_ids() {
        let id1 = generate_game_id();
        let id2 = generate_game_id();
        assert_ne!(id1, id2);
    }

    #[test]
    fn test_rating_difference() {
        assert_eq!(rating_difference(1500, 1400), 100);
        assert_eq!(rating_difference(1400, 1500), 100);
        assert_eq!(rating_difference(1500, 1500), 0);
    }

    #[test]
    fn test_ratings_within_tolerance() {
        assert!(ratings_within_tolerance(1500, 1450, 100));
        assert!(!ratings_within_tolerance(1500, 1350, 100));
        assert!(ratings_within_tolerance(1500, 1500, 0));
    }
}
