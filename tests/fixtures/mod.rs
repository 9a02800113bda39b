//! Test fixtures and helpers for integration testing

use skittles_room::auth::TrustedProxyAuthenticator;
use skittles_room::game::store::InMemoryGameStore;
use skittles_room::matchmaker::Matchmaker;
use skittles_room::queue::store::InMemoryQueueStore;
use skittles_room::rating::storage::{InMemoryRatingStorage, RatingEntry, RatingStorage};
use skittles_room::types::PairingRequest;
use std::sync::Arc;

/// A complete in-process matchmaking system for integration tests
pub struct TestSystem {
    pub engine: Matchmaker,
    pub queue: Arc<InMemoryQueueStore>,
    pub games: Arc<InMemoryGameStore>,
    pub ratings: Arc<InMemoryRatingStorage>,
}

/// Create a complete test system with in-memory stores
pub fn create_test_system() -> TestSystem {
    let queue = Arc::new(InMemoryQueueStore::new());
    let games = Arc::new(InMemoryGameStore::new());
    let ratings = Arc::new(InMemoryRatingStorage::new());

    let engine = Matchmaker::new(
        queue.clone(),
        games.clone(),
        ratings.clone(),
        Arc::new(TrustedProxyAuthenticator::new()),
    );

    TestSystem {
        engine,
        queue,
        games,
        ratings,
    }
}

impl TestSystem {
    /// Store a rating for a player before the test begins
    pub async fn preset_rating(&self, player_id: &str, rating: i32) {
        self.ratings
            .store_rating(RatingEntry::new(player_id.to_string(), rating))
            .await
            .expect("preset rating should store");
    }
}

/// Build a pairing request for tests
pub fn pairing_request(player_id: &str, mode: &str) -> PairingRequest {
    PairingRequest {
        player_id: player_id.to_string(),
        game_mode: mode.to_string(),
        timestamp: skittles_room::utils::current_timestamp(),
        auth_token: None,
    }
}
