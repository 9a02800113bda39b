//! Match search controller and polling state machine
//!
//! The controller issues a single pairing call for its player. When the
//! player ends up enqueued it polls the match store on a fixed interval
//! until a match naming the player appears. A realtime notification
//! source could replace the polling loop without changing the state
//! machine; both are a cancellable wait-for-condition.
//!
//! States: `Idle -> Searching -> {Matched | Error}`, and
//! `Searching -> Idle` on cancellation. `Queued` is not an error: it is
//! the normal outcome of a search that has not found an opponent yet.

use crate::error::Result;
use crate::game::store::GameStore;
use crate::matchmaker::Matchmaker;
use crate::types::{GameId, PairingOutcome, PairingRequest, PlayerId};
use std::sync::Mutex;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Observable state of a match search
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchState {
    /// No outstanding search
    Idle,
    /// A search was issued and the player is waiting to be paired
    Searching,
    /// Terminal success: a match involving this player exists
    Matched { game_id: GameId },
    /// Terminal failure; recoverable only by starting a new search
    Error { message: String },
}

impl SearchState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, SearchState::Matched { .. } | SearchState::Error { .. })
    }
}

/// Configuration for search polling behavior
#[derive(Debug, Clone)]
pub struct SearchConfig {
    /// How often to re-check the match store while queued
    pub poll_interval: Duration,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(2),
        }
    }
}

/// Drives repeated matchmaking polls on behalf of one local player
pub struct MatchSearchController {
    player_id: PlayerId,
    engine: Matchmaker,
    config: SearchConfig,
    state_tx: watch::Sender<SearchState>,
    poll_task: Mutex<Option<JoinHandle<()>>>,
}

impl MatchSearchController {
    /// Create a controller for one player
    pub fn new(player_id: PlayerId, engine: Matchmaker, config: SearchConfig) -> Self {
        let (state_tx, _state_rx) = watch::channel(SearchState::Idle);
        Self {
            player_id,
            engine,
            config,
            state_tx,
            poll_task: Mutex::new(None),
        }
    }

    /// Current search state
    pub fn state(&self) -> SearchState {
        self.state_tx.borrow().clone()
    }

    /// Subscribe to state transitions
    pub fn subscribe(&self) -> watch::Receiver<SearchState> {
        self.state_tx.subscribe()
    }

    /// Start searching for a match
    ///
    /// Legal from `Idle` and from the terminal states (which a new search
    /// resets). Returns the state reached by the initial pairing call;
    /// engine failures land in `Error` rather than bubbling out.
    pub async fn start_search(
        &self,
        game_mode: &str,
        auth_token: Option<String>,
    ) -> Result<SearchState> {
        if self.state() == SearchState::Searching {
            return Err(crate::error::MatchmakingError::InvalidRequest {
                reason: "A search is already in progress".to_string(),
            }
            .into());
        }

        self.stop_polling();
        self.state_tx.send_replace(SearchState::Searching);

        let request = PairingRequest {
            player_id: self.player_id.clone(),
            game_mode: game_mode.to_string(),
            timestamp: crate::utils::current_timestamp(),
            auth_token,
        };

        match self.engine.handle_pairing_request(request).await {
            Ok(PairingOutcome::Matched { game }) => {
                info!(
                    "Player '{}' matched immediately into game {}",
                    self.player_id, game.id
                );
                self.state_tx
                    .send_replace(SearchState::Matched { game_id: game.id });
            }
            Ok(PairingOutcome::Queued) => {
                debug!(
                    "Player '{}' queued; polling every {:?}",
                    self.player_id, self.config.poll_interval
                );
                self.spawn_poll_task();
            }
            Err(e) => {
                warn!("Search failed for player '{}': {}", self.player_id, e);
                self.state_tx.send_replace(SearchState::Error {
                    message: e.to_string(),
                });
            }
        }

        Ok(self.state())
    }

    /// Cancel an in-progress search
    ///
    /// Stops the polling timer and removes the player's queue entry.
    /// A no-op from any state other than `Searching`.
    pub async fn cancel(&self) -> Result<()> {
        if self.state() != SearchState::Searching {
            debug!(
                "Cancel for player '{}' ignored in state {:?}",
                self.player_id,
                self.state()
            );
            return Ok(());
        }

        self.stop_polling();
        self.engine.cancel_search(&self.player_id).await?;
        self.state_tx.send_replace(SearchState::Idle);

        info!("Player '{}' cancelled their search", self.player_id);
        Ok(())
    }

    /// Wait until the search reaches a terminal state
    pub async fn wait_for_outcome(&self) -> SearchState {
        let mut rx = self.subscribe();
        loop {
            let state = rx.borrow_and_update().clone();
            if state.is_terminal() {
                return state;
            }
            if rx.changed().await.is_err() {
                return self.state();
            }
        }
    }

    fn spawn_poll_task(&self) {
        let games = self.engine.games();
        let player_id = self.player_id.clone();
        let state_tx = self.state_tx.clone();
        let poll_interval = self.config.poll_interval;

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(poll_interval);
            // The first tick fires immediately; skip it so polling starts
            // one interval after enqueueing.
            ticker.tick().await;

            loop {
                ticker.tick().await;

                match games.find_active_for_player(&player_id).await {
                    Ok(Some(game)) => {
                        info!("Player '{}' paired into game {}", player_id, game.id);
                        state_tx.send_replace(SearchState::Matched { game_id: game.id });
                        break;
                    }
                    Ok(None) => {
                        debug!("No match yet for player '{}'", player_id);
                    }
                    Err(e) => {
                        warn!("Match poll failed for player '{}': {}", player_id, e);
                        state_tx.send_replace(SearchState::Error {
                            message: e.to_string(),
                        });
                        break;
                    }
                }
            }
        });

        let mut poll_task = self.poll_task.lock().unwrap_or_else(|e| e.into_inner());
        *poll_task = Some(handle);
    }

    fn stop_polling(&self) {
        let mut poll_task = self.poll_task.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(handle) = poll_task.take() {
            handle.abort();
        }
    }
}

impl Drop for MatchSearchController {
    // Polling must never outlive the interested caller
    fn drop(&mut self) {
        self.stop_polling();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::TrustedProxyAuthenticator;
    use crate::game::store::InMemoryGameStore;
    use crate::queue::store::{InMemoryQueueStore, QueueStore};
    use crate::rating::storage::InMemoryRatingStorage;
    use std::sync::Arc;

    fn create_engine() -> (Matchmaker, Arc<InMemoryQueueStore>) {
        let queue = Arc::new(InMemoryQueueStore::new());
        let games = Arc::new(InMemoryGameStore::new());
        let ratings = Arc::new(InMemoryRatingStorage::new());
        let engine = Matchmaker::new(
            queue.clone(),
            games,
            ratings,
            Arc::new(TrustedProxyAuthenticator::new()),
        );
        (engine, queue)
    }

    fn fast_poll() -> SearchConfig {
        SearchConfig {
            poll_interval: Duration::from_millis(10),
        }
    }

    fn request(player_id: &str) -> PairingRequest {
        PairingRequest {
            player_id: player_id.to_string(),
            game_mode: "blitz".to_string(),
            timestamp: crate::utils::current_timestamp(),
            auth_token: None,
        }
    }

    #[tokio::test]
    async fn test_immediate_match() {
        let (engine, _) = create_engine();

        // An opponent is already waiting
        engine
            .handle_pairing_request(request("opponent"))
            .await
            .unwrap();

        let controller =
            MatchSearchController::new("player1".to_string(), engine, fast_poll());
        let state = controller.start_search("blitz", None).await.unwrap();

        assert!(matches!(state, SearchState::Matched { .. }));
    }

    #[tokio::test]
    async fn test_queued_then_matched_by_poll() {
        let (engine, _) = create_engine();

        let controller =
            MatchSearchController::new("player1".to_string(), engine.clone(), fast_poll());
        let state = controller.start_search("blitz", None).await.unwrap();
        assert_eq!(state, SearchState::Searching);

        // Another player's request pairs with our queued entry
        let outcome = engine
            .handle_pairing_request(request("opponent"))
            .await
            .unwrap();
        assert!(outcome.is_matched());

        let outcome_state = tokio::time::timeout(
            Duration::from_secs(1),
            controller.wait_for_outcome(),
        )
        .await
        .expect("poll should detect the match");
        assert!(matches!(outcome_state, SearchState::Matched { .. }));
    }

    #[tokio::test]
    async fn test_cancel_returns_to_idle_and_clears_queue() {
        let (engine, queue) = create_engine();

        let controller =
            MatchSearchController::new("player1".to_string(), engine, fast_poll());
        controller.start_search("blitz", None).await.unwrap();
        assert_eq!(queue.len().await.unwrap(), 1);

        controller.cancel().await.unwrap();
        assert_eq!(controller.state(), SearchState::Idle);
        assert_eq!(queue.len().await.unwrap(), 0);

        // Cancelling again is a no-op
        controller.cancel().await.unwrap();
        assert_eq!(controller.state(), SearchState::Idle);
    }

    #[tokio::test]
    async fn test_invalid_mode_surfaces_as_error_state() {
        let (engine, _) = create_engine();

        let controller =
            MatchSearchController::new("player1".to_string(), engine, fast_poll());
        let state = controller.start_search("bullet", None).await.unwrap();

        assert!(matches!(state, SearchState::Error { .. }));
    }

    #[tokio::test]
    async fn test_error_state_recoverable_by_new_search() {
        let (engine, _) = create_engine();

        let controller =
            MatchSearchController::new("player1".to_string(), engine, fast_poll());
        controller.start_search("bullet", None).await.unwrap();
        assert!(matches!(controller.state(), SearchState::Error { .. }));

        let state = controller.start_search("blitz", None).await.unwrap();
        assert_eq!(state, SearchState::Searching);
    }

    #[tokio::test]
    async fn test_double_search_rejected_while_searching() {
        let (engine, _) = create_engine();

        let controller =
            MatchSearchController::new("player1".to_string(), engine, fast_poll());
        controller.start_search("blitz", None).await.unwrap();

        assert!(controller.start_search("blitz", None).await.is_err());
    }
}
