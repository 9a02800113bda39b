//! Game storage interface and implementations
//!
//! Match rows are keyed by game id and created exactly once per pairing.
//! Terminal states are immutable: a completed record can never transition
//! again.

use crate::error::MatchmakingError;
use crate::types::{GameId, GameState, MatchRecord};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;

/// Trait for game storage operations
#[async_trait]
pub trait GameStore: Send + Sync {
    /// Persist a newly created match record
    async fn create(&self, record: MatchRecord) -> crate::error::Result<()>;

    /// Get a match record by id
    async fn get(&self, game_id: GameId) -> crate::error::Result<Option<MatchRecord>>;

    /// Find the in-progress match involving the given player, if any
    ///
    /// This is the poll target for clients waiting to learn they were
    /// paired by someone else's request.
    async fn find_active_for_player(
        &self,
        player_id: &str,
    ) -> crate::error::Result<Option<MatchRecord>>;

    /// Transition a match to its terminal state
    ///
    /// Fails with `GameNotFound` for unknown ids and `GameAlreadySettled`
    /// when the record is already terminal.
    async fn complete(&self, game_id: GameId) -> crate::error::Result<MatchRecord>;

    /// Number of stored match records
    async fn len(&self) -> crate::error::Result<usize>;
}

/// In-memory game store
#[derive(Debug, Default)]
pub struct InMemoryGameStore {
    games: RwLock<HashMap<GameId, MatchRecord>>,
}

impl InMemoryGameStore {
    /// Create a new empty game store
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl GameStore for InMemoryGameStore {
    async fn create(&self, record: MatchRecord) -> crate::error::Result<()> {
        let mut games = self.games.write().await;
        if games.contains_key(&record.id) {
            return Err(MatchmakingError::StorageFailure {
                message: format!("Match {} already exists", record.id),
            }
            .into());
        }
        games.insert(record.id, record);
        Ok(())
    }

    async fn get(&self, game_id: GameId) -> crate::error::Result<Option<MatchRecord>> {
        let games = self.games.read().await;
        Ok(games.get(&game_id).cloned())
    }

    async fn find_active_for_player(
        &self,
        player_id: &str,
    ) -> crate::error::Result<Option<MatchRecord>> {
        let games = self.games.read().await;
        Ok(games
            .values()
            .filter(|record| record.state == GameState::InProgress && record.involves(player_id))
            .max_by_key(|record| record.created_at)
            .cloned())
    }

    async fn complete(&self, game_id: GameId) -> crate::error::Result<MatchRecord> {
        let mut games = self.games.write().await;
        let record = games
            .get_mut(&game_id)
            .ok_or_else(|| MatchmakingError::GameNotFound {
                game_id: game_id.to_string(),
            })?;

        if record.state != GameState::InProgress {
            return Err(MatchmakingError::GameAlreadySettled {
                game_id: game_id.to_string(),
            }
            .into());
        }

        record.state = GameState::Completed;
        Ok(record.clone())
    }

    async fn len(&self) -> crate::error::Result<usize> {
        let games = self.games.read().await;
        Ok(games.len())
    }
}

/// Mock game store for testing
///
/// Behaves like the in-memory store but can simulate creation failures to
/// exercise the matchmaker's compensation path.
#[derive(Debug, Default)]
pub struct MockGameStore {
    inner: InMemoryGameStore,
    fail_creates: AtomicBool,
}

impl MockGameStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent create calls fail with a storage error (for testing)
    pub fn set_fail_creates(&self, fail: bool) {
        self.fail_creates.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl GameStore for MockGameStore {
    async fn create(&self, record: MatchRecord) -> crate::error::Result<()> {
        if self.fail_creates.load(Ordering::SeqCst) {
            return Err(MatchmakingError::StorageFailure {
                message: "Simulated match creation failure".to_string(),
            }
            .into());
        }
        self.inner.create(record).await
    }

    async fn get(&self, game_id: GameId) -> crate::error::Result<Option<MatchRecord>> {
        self.inner.get(game_id).await
    }

    async fn find_active_for_player(
        &self,
        player_id: &str,
    ) -> crate::error::Result<Option<MatchRecord>> {
        self.inner.find_active_for_player(player_id).await
    }

    async fn complete(&self, game_id: GameId) -> crate::error::Result<MatchRecord> {
        self.inner.complete(game_id).await
    }

    async fn len(&self) -> crate::error::Result<usize> {
        self.inner.len().await
    }
}
