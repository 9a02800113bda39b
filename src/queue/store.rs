//! Queue storage interface and implementations
//!
//! The queue table is a shared, multi-writer resource: many pairing
//! requests operate on it concurrently. Removal of a candidate therefore
//! goes through [`QueueStore::claim`], a conditional compare-and-delete,
//! so a row already taken by another pairing cannot be taken twice.

use crate::types::{GameMode, PlayerId, QueueEntry};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use tokio::sync::Mutex;

/// Trait for queue storage operations
#[async_trait]
pub trait QueueStore: Send + Sync {
    /// Insert or overwrite the entry for a player
    ///
    /// At most one entry exists per player; a re-queue replaces any stale
    /// prior entry.
    async fn upsert(&self, entry: QueueEntry) -> crate::error::Result<()>;

    /// Conditionally remove a specific observed entry
    ///
    /// Returns `true` only if the row was still present with the same
    /// `enqueued_at` as when it was observed. A `false` return means
    /// another pairing claimed the row (or the player re-queued) in the
    /// meantime and the caller must move on.
    async fn claim(
        &self,
        player_id: &str,
        enqueued_at: DateTime<Utc>,
    ) -> crate::error::Result<bool>;

    /// Remove a player's entry unconditionally
    ///
    /// Idempotent: absence of a row is not an error. Returns whether a
    /// row was actually removed.
    async fn remove(&self, player_id: &str) -> crate::error::Result<bool>;

    /// Get a player's current entry, if any
    async fn get(&self, player_id: &str) -> crate::error::Result<Option<QueueEntry>>;

    /// All entries waiting for the given mode, in no particular order
    async fn entries_for_mode(&self, mode: GameMode) -> crate::error::Result<Vec<QueueEntry>>;

    /// Number of waiting entries across all modes
    async fn len(&self) -> crate::error::Result<usize>;

    /// Remove entries older than the given age; returns how many were pruned
    async fn prune_older_than(&self, max_age: Duration) -> crate::error::Result<usize>;
}

/// In-memory queue store
///
/// All operations take the single map lock, so each trait method is
/// atomic with respect to the others. The find/claim race between two
/// pairings is resolved by `claim`, not by the lock.
#[derive(Debug, Default)]
pub struct InMemoryQueueStore {
    entries: Mutex<HashMap<PlayerId, QueueEntry>>,
}

impl InMemoryQueueStore {
    /// Create a new empty queue store
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl QueueStore for InMemoryQueueStore {
    async fn upsert(&self, entry: QueueEntry) -> crate::error::Result<()> {
        let mut entries = self.entries.lock().await;
        entries.insert(entry.player_id.clone(), entry);
        Ok(())
    }

    async fn claim(
        &self,
        player_id: &str,
        enqueued_at: DateTime<Utc>,
    ) -> crate::error::Result<bool> {
        let mut entries = self.entries.lock().await;
        let observed_row_present = entries
            .get(player_id)
            .is_some_and(|existing| existing.enqueued_at == enqueued_at);

        if observed_row_present {
            entries.remove(player_id);
        }
        Ok(observed_row_present)
    }

    async fn remove(&self, player_id: &str) -> crate::error::Result<bool> {
        let mut entries = self.entries.lock().await;
        Ok(entries.remove(player_id).is_some())
    }

    async fn get(&self, player_id: &str) -> crate::error::Result<Option<QueueEntry>> {
        let entries = self.entries.lock().await;
        Ok(entries.get(player_id).cloned())
    }

    async fn entries_for_mode(&self, mode: GameMode) -> crate::error::Result<Vec<QueueEntry>> {
        let entries = self.entries.lock().await;
        Ok(entries
            .values()
            .filter(|entry| entry.mode == mode)
            .cloned()
            .collect())
    }

    async fn len(&self) -> crate::error::Result<usize> {
        let entries = self.entries.lock().await;
        Ok(entries.len())
    }

    async fn prune_older_than(&self, max_age: Duration) -> crate::error::Result<usize> {
        let cutoff = crate::utils::current_timestamp() - max_age;
        let mut entries = self.entries.lock().await;
        let before = entries.len();
        entries.retain(|_, entry| entry.enqueued_at >= cutoff);
        Ok(before - entries.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::GameMode;

    fn entry(player_id: &str, rating: i32) -> QueueEntry {
        QueueEntry::new(player_id.to_string(), GameMode::Blitz, rating)
    }

    #[tokio::test]
    async fn test_upsert_replaces_prior_entry() {
        let store = InMemoryQueueStore::new();

        store.upsert(entry("player1", 1200)).await.unwrap();
        store.upsert(entry("player1", 1250)).await.unwrap();

        assert_eq!(store.len().await.unwrap(), 1);
        assert_eq!(store.get("player1").await.unwrap().unwrap().rating, 1250);
    }

    #[tokio::test]
    async fn test_claim_succeeds_once() {
        let store = InMemoryQueueStore::new();
        let waiting = entry("player1", 1200);
        store.upsert(waiting.clone()).await.unwrap();

        assert!(store.claim("player1", waiting.enqueued_at).await.unwrap());
        // Second claim sees no row
        assert!(!store.claim("player1", waiting.enqueued_at).await.unwrap());
    }

    #[tokio::test]
    async fn test_claim_rejects_stale_observation() {
        let store = InMemoryQueueStore::new();
        let first = entry("player1", 1200);
        store.upsert(first.clone()).await.unwrap();

        // Player re-queues; the observed row no longer exists as seen
        let second = entry("player1", 1300);
        store.upsert(second.clone()).await.unwrap();

        assert!(!store.claim("player1", first.enqueued_at).await.unwrap());
        assert!(store.claim("player1", second.enqueued_at).await.unwrap());
    }

    #[tokio::test]
    async fn test_remove_is_idempotent() {
        let store = InMemoryQueueStore::new();
        store.upsert(entry("player1", 1200)).await.unwrap();

        assert!(store.remove("player1").await.unwrap());
        // Second removal is a no-op, not an error
        assert!(!store.remove("player1").await.unwrap());
    }

    #[tokio::test]
    async fn test_entries_for_mode_filters() {
        let store = InMemoryQueueStore::new();
        store.upsert(entry("blitz1", 1200)).await.unwrap();
        store
            .upsert(QueueEntry::new("rapid1".to_string(), GameMode::Rapid, 1200))
            .await
            .unwrap();

        let blitz = store.entries_for_mode(GameMode::Blitz).await.unwrap();
        assert_eq!(blitz.len(), 1);
        assert_eq!(blitz[0].player_id, "blitz1");
    }

    #[tokio::test]
    async fn test_prune_older_than() {
        let store = InMemoryQueueStore::new();
        let mut old = entry("old", 1200);
        old.enqueued_at = crate::utils::current_timestamp() - Duration::seconds(600);
        store.upsert(old).await.unwrap();
        store.upsert(entry("fresh", 1200)).await.unwrap();

        let pruned = store
            .prune_older_than(Duration::seconds(300))
            .await
            .unwrap();
        assert_eq!(pruned, 1);
        assert!(store.get("old").await.unwrap().is_none());
        assert!(store.get("fresh").await.unwrap().is_some());
    }
}
