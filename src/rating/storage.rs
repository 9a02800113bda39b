//! Rating storage interface and implementations
//!
//! This module defines the interface for persisting and retrieving player ratings,
//! with both in-memory and database-ready implementations. The profile store is
//! an external collaborator; players without a stored rating default to
//! [`crate::rating::elo::DEFAULT_RATING`] at the call site.

use crate::types::PlayerId;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;

/// Storage entry for a player's rating with metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RatingEntry {
    pub player_id: PlayerId,
    pub rating: i32,
    pub games_played: u64,
    pub last_updated: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl RatingEntry {
    /// Create a new rating entry for a new player
    pub fn new(player_id: PlayerId, initial_rating: i32) -> Self {
        let now = Utc::now();
        Self {
            player_id,
            rating: initial_rating,
            games_played: 0,
            last_updated: now,
            created_at: now,
        }
    }

    /// Update the rating and increment games played
    pub fn update_rating(&mut self, new_rating: i32) {
        self.rating = new_rating;
        self.games_played += 1;
        self.last_updated = Utc::now();
    }
}

/// Trait for rating storage operations
#[async_trait]
pub trait RatingStorage: Send + Sync {
    /// Get a player's rating entry
    async fn get_rating(&self, player_id: &str) -> crate::error::Result<Option<RatingEntry>>;

    /// Store or update a player's rating
    async fn store_rating(&self, entry: RatingEntry) -> crate::error::Result<()>;

    /// Store multiple rating updates atomically
    ///
    /// Used after settlement so both participants' new ratings land together.
    async fn store_ratings(&self, entries: Vec<RatingEntry>) -> crate::error::Result<()>;

    /// Remove a player's rating
    async fn remove_rating(&self, player_id: &str) -> crate::error::Result<bool>;

    /// Get total number of rated players
    async fn player_count(&self) -> crate::error::Result<usize>;
}

/// In-memory rating storage implementation
#[derive(Debug, Default)]
pub struct InMemoryRatingStorage {
    ratings: RwLock<HashMap<PlayerId, RatingEntry>>,
}

impl InMemoryRatingStorage {
    /// Create a new in-memory rating storage
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RatingStorage for InMemoryRatingStorage {
    async fn get_rating(&self, player_id: &str) -> crate::error::Result<Option<RatingEntry>> {
        let ratings = self.ratings.read().await;
        Ok(ratings.get(player_id).cloned())
    }

    async fn store_rating(&self, entry: RatingEntry) -> crate::error::Result<()> {
        let mut ratings = self.ratings.write().await;
        ratings.insert(entry.player_id.clone(), entry);
        Ok(())
    }

    async fn store_ratings(&self, entries: Vec<RatingEntry>) -> crate::error::Result<()> {
        // Single write-lock acquisition so both updates land together
        let mut ratings = self.ratings.write().await;
        for entry in entries {
            ratings.insert(entry.player_id.clone(), entry);
        }
        Ok(())
    }

    async fn remove_rating(&self, player_id: &str) -> crate::error::Result<bool> {
        let mut ratings = self.ratings.write().await;
        Ok(ratings.remove(player_id).is_some())
    }

    async fn player_count(&self) -> crate::error::Result<usize> {
        let ratings = self.ratings.read().await;
        Ok(ratings.len())
    }
}

/// Mock rating storage for testing
#[derive(Debug, Default)]
pub struct MockRatingStorage {
    ratings: RwLock<HashMap<PlayerId, RatingEntry>>,
    store_calls: RwLock<Vec<RatingEntry>>,
    fail_writes: AtomicBool,
}

impl MockRatingStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get all store calls made (for testing)
    pub async fn get_store_calls(&self) -> Vec<RatingEntry> {
        self.store_calls.read().await.clone()
    }

    /// Preset ratings for testing
    pub async fn preset_ratings(&self, ratings: HashMap<PlayerId, RatingEntry>) {
        let mut storage = self.ratings.write().await;
        *storage = ratings;
    }

    /// Make subsequent writes fail with a storage error (for testing)
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl RatingStorage for MockRatingStorage {
    async fn get_rating(&self, player_id: &str) -> crate::error::Result<Option<RatingEntry>> {
        let ratings = self.ratings.read().await;
        Ok(ratings.get(player_id).cloned())
    }

    async fn store_rating(&self, entry: RatingEntry) -> crate::error::Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(crate::error::MatchmakingError::StorageFailure {
                message: "Simulated rating store failure".to_string(),
            }
            .into());
        }

        self.store_calls.write().await.push(entry.clone());

        let mut ratings = self.ratings.write().await;
        ratings.insert(entry.player_id.clone(), entry);
        Ok(())
    }

    async fn store_ratings(&self, entries: Vec<RatingEntry>) -> crate::error::Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(crate::error::MatchmakingError::StorageFailure {
                message: "Simulated rating store failure".to_string(),
            }
            .into());
        }

        self.store_calls.write().await.extend(entries.clone());

        let mut ratings = self.ratings.write().await;
        for entry in entries {
            ratings.insert(entry.player_id.clone(), entry);
        }
        Ok(())
    }

    async fn remove_rating(&self, player_id: &str) -> crate::error::Result<bool> {
        let mut ratings = self.ratings.write().await;
        Ok(ratings.remove(player_id).is_some())
    }

    async fn player_count(&self) -> crate::error::Result<usize> {
        let ratings = self.ratings.read().await;
        Ok(ratings.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_rating_entry(player_id: &str, rating: i32) -> RatingEntry {
        RatingEntry::new(player_id.to_string(), rating)
    }

    #[test]
    fn test_rating_entry_creation() {
        let entry = create_test_rating_entry("player1", 1200);
        assert_eq!(entry.player_id, "player1");
        assert_eq!(entry.rating, 1200);
        assert_eq!(entry.games_played, 0);
    }

    #[test]
    fn test_rating_entry_update() {
        let mut entry = create_test_rating_entry("player1", 1200);
        entry.update_rating(1212);

        assert_eq!(entry.rating, 1212);
        assert_eq!(entry.games_played, 1);
    }

    #[tokio::test]
    async fn test_in_memory_storage_basic_operations() {
        let storage = InMemoryRatingStorage::new();
        let entry = create_test_rating_entry("player1", 1200);

        // Initially no rating
        assert!(storage.get_rating("player1").await.unwrap().is_none());

        storage.store_rating(entry).await.unwrap();

        let retrieved = storage.get_rating("player1").await.unwrap().unwrap();
        assert_eq!(retrieved.player_id, "player1");
        assert_eq!(retrieved.rating, 1200);
    }

    #[tokio::test]
    async fn test_bulk_store() {
        let storage = InMemoryRatingStorage::new();

        let entries = vec![
            create_test_rating_entry("player1", 1512),
            create_test_rating_entry("player2", 1488),
        ];

        storage.store_ratings(entries).await.unwrap();

        assert_eq!(storage.player_count().await.unwrap(), 2);
        assert_eq!(
            storage.get_rating("player1").await.unwrap().unwrap().rating,
            1512
        );
        assert_eq!(
            storage.get_rating("player2").await.unwrap().unwrap().rating,
            1488
        );
    }

    #[tokio::test]
    async fn test_player_removal() {
        let storage = InMemoryRatingStorage::new();
        storage
            .store_rating(create_test_rating_entry("player1", 1200))
            .await
            .unwrap();

        assert!(storage.remove_rating("player1").await.unwrap());
        assert!(storage.get_rating("player1").await.unwrap().is_none());

        // Removing non-existent player should return false
        assert!(!storage.remove_rating("nonexistent").await.unwrap());
    }

    #[tokio::test]
    async fn test_mock_storage_records_calls() {
        let storage = MockRatingStorage::new();
        storage
            .store_rating(create_test_rating_entry("player1", 1200))
            .await
            .unwrap();

        let calls = storage.get_store_calls().await;
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].player_id, "player1");
    }

    #[tokio::test]
    async fn test_mock_storage_simulated_failure() {
        let storage = MockRatingStorage::new();
        storage.set_fail_writes(true);

        let result = storage
            .store_rating(create_test_rating_entry("player1", 1200))
            .await;
        assert!(result.is_err());

        storage.set_fail_writes(false);
        assert!(storage
            .store_rating(create_test_rating_entry("player1", 1200))
            .await
            .is_ok());
    }
}
