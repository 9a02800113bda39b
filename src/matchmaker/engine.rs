//! Core pairing and settlement engine
//!
//! Each pairing invocation is independent and stateless: all shared state
//! lives in the queue and game stores, which many callers hit
//! concurrently. Candidate removal goes through the store's conditional
//! claim so that two concurrent requests can never both pair with the
//! same waiting player.

use crate::auth::RequestAuthenticator;
use crate::error::{MatchmakingError, Result};
use crate::game::store::GameStore;
use crate::metrics::MetricsCollector;
use crate::queue::matching::{CandidateMatcher, MatchingConfig, RatingWindowMatcher};
use crate::queue::store::QueueStore;
use crate::rating::elo::{EloCalculator, EloSettings};
use crate::rating::storage::{RatingEntry, RatingStorage};
use crate::types::{
    Color, GameMode, GameResult, GameState, MatchRecord, Outcome, PairingOutcome, PairingRequest,
    QueueEntry, RatingChange, SearchContext,
};
use std::sync::{Arc, RwLock};
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Statistics about matchmaker operations
#[derive(Debug, Clone, Default)]
pub struct MatchmakerStats {
    /// Total pairing requests processed
    pub pairing_requests: u64,
    /// Total matches created
    pub matches_created: u64,
    /// Total requests that ended up enqueued
    pub players_enqueued: u64,
    /// Total cancellations
    pub cancellations: u64,
    /// Total games settled with rating updates
    pub games_settled: u64,
    /// Current number of players waiting
    pub players_waiting: usize,
}

/// The core matchmaking engine
#[derive(Clone)]
pub struct Matchmaker {
    /// Shared queue of waiting players
    queue: Arc<dyn QueueStore>,
    /// Match record storage
    games: Arc<dyn GameStore>,
    /// External profile store for ratings
    ratings: Arc<dyn RatingStorage>,
    /// Caller identity verification
    authenticator: Arc<dyn RequestAuthenticator>,
    /// Candidate selection policy
    matcher: Arc<dyn CandidateMatcher>,
    /// Matching configuration
    matching_config: MatchingConfig,
    /// Rating calculator for settlement
    calculator: EloCalculator,
    /// Engine statistics
    stats: Arc<RwLock<MatchmakerStats>>,
    /// Metrics collector for recording performance data
    metrics_collector: Arc<MetricsCollector>,
}

impl Matchmaker {
    /// Create a new matchmaker with default policy and metrics
    pub fn new(
        queue: Arc<dyn QueueStore>,
        games: Arc<dyn GameStore>,
        ratings: Arc<dyn RatingStorage>,
        authenticator: Arc<dyn RequestAuthenticator>,
    ) -> Self {
        let metrics_collector = Arc::new(MetricsCollector::new().unwrap_or_else(|_| {
            warn!("Failed to create metrics collector, using default");
            MetricsCollector::default()
        }));

        Self::with_metrics(queue, games, ratings, authenticator, metrics_collector)
    }

    /// Create a new matchmaker with a metrics collector
    pub fn with_metrics(
        queue: Arc<dyn QueueStore>,
        games: Arc<dyn GameStore>,
        ratings: Arc<dyn RatingStorage>,
        authenticator: Arc<dyn RequestAuthenticator>,
        metrics_collector: Arc<MetricsCollector>,
    ) -> Self {
        Self {
            queue,
            games,
            ratings,
            authenticator,
            matcher: Arc::new(RatingWindowMatcher::new()),
            matching_config: MatchingConfig::default(),
            calculator: EloCalculator::default(),
            stats: Arc::new(RwLock::new(MatchmakerStats::default())),
            metrics_collector,
        }
    }

    /// Create with custom matcher, matching configuration and Elo settings
    pub fn with_config(
        queue: Arc<dyn QueueStore>,
        games: Arc<dyn GameStore>,
        ratings: Arc<dyn RatingStorage>,
        authenticator: Arc<dyn RequestAuthenticator>,
        matcher: Arc<dyn CandidateMatcher>,
        matching_config: MatchingConfig,
        elo_settings: EloSettings,
    ) -> Result<Self> {
        let metrics_collector = Arc::new(MetricsCollector::new().unwrap_or_else(|_| {
            warn!("Failed to create metrics collector, using default");
            MetricsCollector::default()
        }));

        Self::with_config_and_metrics(
            queue,
            games,
            ratings,
            authenticator,
            matcher,
            matching_config,
            elo_settings,
            metrics_collector,
        )
    }

    /// Create with custom configuration and a shared metrics collector
    #[allow(clippy::too_many_arguments)]
    pub fn with_config_and_metrics(
        queue: Arc<dyn QueueStore>,
        games: Arc<dyn GameStore>,
        ratings: Arc<dyn RatingStorage>,
        authenticator: Arc<dyn RequestAuthenticator>,
        matcher: Arc<dyn CandidateMatcher>,
        matching_config: MatchingConfig,
        elo_settings: EloSettings,
        metrics_collector: Arc<MetricsCollector>,
    ) -> Result<Self> {
        Ok(Self {
            queue,
            games,
            ratings,
            authenticator,
            matcher,
            matching_config,
            calculator: EloCalculator::new(elo_settings)?,
            stats: Arc::new(RwLock::new(MatchmakerStats::default())),
            metrics_collector,
        })
    }

    /// Handle a pairing request from a player
    ///
    /// Pairs the requester with the oldest compatible waiting player, or
    /// enqueues the requester when nobody compatible is waiting.
    pub async fn handle_pairing_request(&self, request: PairingRequest) -> Result<PairingOutcome> {
        let start_time = Instant::now();

        // Reject before touching any shared state
        self.authenticator
            .authenticate(&request.player_id, request.auth_token.as_deref())
            .await?;

        let mode: GameMode = request.game_mode.parse()?;

        let rating = self
            .ratings
            .get_rating(&request.player_id)
            .await?
            .map(|entry| entry.rating)
            .unwrap_or_else(|| self.calculator.initial_rating());

        info!(
            "Processing pairing request - player_id: '{}', mode: {}, rating: {}",
            request.player_id, mode, rating
        );

        let ctx = SearchContext {
            player_id: request.player_id.clone(),
            mode,
            rating,
        };

        let outcome = self.pair_or_enqueue(&ctx).await?;

        let duration = start_time.elapsed();
        self.metrics_collector
            .record_pairing_request(mode, outcome.is_matched(), duration);
        self.update_waiting_gauge().await;

        debug!(
            "Pairing request completed - player_id: '{}', matched: {}, duration: {:.2}ms",
            request.player_id,
            outcome.is_matched(),
            duration.as_secs_f64() * 1000.0
        );

        Ok(outcome)
    }

    /// Try to claim a compatible candidate; enqueue the requester otherwise
    async fn pair_or_enqueue(&self, ctx: &SearchContext) -> Result<PairingOutcome> {
        {
            let mut stats = self.stats.write().map_err(|_| MatchmakingError::InternalError {
                message: "Failed to acquire stats lock".to_string(),
            })?;
            stats.pairing_requests += 1;
        }

        let now = crate::utils::current_timestamp();
        let waiting = self.queue.entries_for_mode(ctx.mode).await?;
        let candidates = self
            .matcher
            .rank_candidates(ctx, waiting, now, &self.matching_config);

        debug!(
            "Found {} eligible candidates for player '{}'",
            candidates.len(),
            ctx.player_id
        );

        for candidate in candidates {
            // Conditional claim: loses cleanly if another request got here first
            if !self
                .queue
                .claim(&candidate.player_id, candidate.enqueued_at)
                .await?
            {
                debug!(
                    "Candidate '{}' already claimed by a concurrent pairing",
                    candidate.player_id
                );
                continue;
            }

            return self.create_match_for_pair(ctx, candidate).await;
        }

        // Nobody compatible is waiting: enqueue the requester. The upsert
        // overwrites any stale entry, keeping at most one per player.
        self.queue
            .upsert(QueueEntry::new(ctx.player_id.clone(), ctx.mode, ctx.rating))
            .await?;

        {
            let mut stats = self.stats.write().map_err(|_| MatchmakingError::InternalError {
                message: "Failed to acquire stats lock".to_string(),
            })?;
            stats.players_enqueued += 1;
        }

        info!("Player '{}' enqueued for {}", ctx.player_id, ctx.mode);
        Ok(PairingOutcome::Queued)
    }

    /// Create the match record for a claimed pairing
    async fn create_match_for_pair(
        &self,
        ctx: &SearchContext,
        candidate: QueueEntry,
    ) -> Result<PairingOutcome> {
        // Colors are assigned uniformly at random
        let requester_color = if rand::random::<bool>() {
            Color::White
        } else {
            Color::Black
        };
        let (white_id, black_id) = match requester_color {
            Color::White => (ctx.player_id.clone(), candidate.player_id.clone()),
            Color::Black => (candidate.player_id.clone(), ctx.player_id.clone()),
        };

        let record = MatchRecord::new(white_id, black_id, ctx.mode);

        if let Err(e) = self.games.create(record.clone()).await {
            // Undo the claim so the candidate is not lost to a failed pairing
            warn!(
                "Match creation failed for '{}' vs '{}', restoring queue entry: {}",
                ctx.player_id, candidate.player_id, e
            );
            self.queue.upsert(candidate).await?;

            return Err(MatchmakingError::StorageFailure {
                message: format!("Failed to create match: {}", e),
            }
            .into());
        }

        // The requester may have had a stale entry from an earlier search
        self.queue.remove(&ctx.player_id).await?;

        {
            let mut stats = self.stats.write().map_err(|_| MatchmakingError::InternalError {
                message: "Failed to acquire stats lock".to_string(),
            })?;
            stats.matches_created += 1;
        }

        info!(
            "Match {} created - white: '{}', black: '{}', mode: {}",
            record.id, record.white_player_id, record.black_player_id, record.mode
        );

        Ok(PairingOutcome::Matched { game: record })
    }

    /// Cancel a player's pending search
    ///
    /// Idempotent: cancelling when no entry exists is a successful no-op.
    pub async fn cancel_search(&self, player_id: &str) -> Result<bool> {
        let removed = self.queue.remove(player_id).await?;

        {
            let mut stats = self.stats.write().map_err(|_| MatchmakingError::InternalError {
                message: "Failed to acquire stats lock".to_string(),
            })?;
            stats.cancellations += 1;
        }

        self.metrics_collector.record_cancellation();
        self.update_waiting_gauge().await;

        if removed {
            info!("Player '{}' left the queue", player_id);
        } else {
            debug!("Cancel for '{}' found no queue entry", player_id);
        }

        Ok(removed)
    }

    /// Settle a concluded game: update both players' ratings
    ///
    /// `winner` of `None` is a draw. The terminal transition acts as the
    /// settlement claim, so a game can only ever be settled once.
    pub async fn report_result(&self, result: GameResult) -> Result<(RatingChange, RatingChange)> {
        let start_time = Instant::now();

        let record = self
            .games
            .get(result.game_id)
            .await?
            .ok_or_else(|| MatchmakingError::GameNotFound {
                game_id: result.game_id.to_string(),
            })?;

        if record.state != GameState::InProgress {
            return Err(MatchmakingError::GameAlreadySettled {
                game_id: result.game_id.to_string(),
            }
            .into());
        }

        let white_outcome = match &result.winner {
            None => Outcome::Draw,
            Some(winner) if *winner == record.white_player_id => Outcome::Win,
            Some(winner) if *winner == record.black_player_id => Outcome::Loss,
            Some(winner) => {
                return Err(MatchmakingError::InvalidRequest {
                    reason: format!("Player {} is not a participant of this game", winner),
                }
                .into())
            }
        };

        // Terminal transition first: it is the claim that makes double
        // settlement impossible even under concurrent reports.
        self.games.complete(result.game_id).await?;

        let white_entry = self.rating_entry_for(&record.white_player_id).await?;
        let black_entry = self.rating_entry_for(&record.black_player_id).await?;

        let (white_change, black_change) = self.calculator.settle(
            (&record.white_player_id, white_entry.rating),
            (&record.black_player_id, black_entry.rating),
            white_outcome,
        );

        let mut updated_white = white_entry;
        updated_white.update_rating(white_change.new_rating);
        let mut updated_black = black_entry;
        updated_black.update_rating(black_change.new_rating);

        self.ratings
            .store_ratings(vec![updated_white, updated_black])
            .await?;

        {
            let mut stats = self.stats.write().map_err(|_| MatchmakingError::InternalError {
                message: "Failed to acquire stats lock".to_string(),
            })?;
            stats.games_settled += 1;
        }

        self.metrics_collector.record_settlement(start_time.elapsed());

        info!(
            "Game {} settled - '{}': {} -> {}, '{}': {} -> {}",
            result.game_id,
            white_change.player_id,
            white_change.old_rating,
            white_change.new_rating,
            black_change.player_id,
            black_change.old_rating,
            black_change.new_rating
        );

        Ok((white_change, black_change))
    }

    /// Remove queue entries older than the configured staleness bound
    pub async fn prune_stale_entries(&self) -> Result<usize> {
        let Some(max_age_seconds) = self.matching_config.max_entry_age_seconds else {
            return Ok(0);
        };

        let pruned = self
            .queue
            .prune_older_than(chrono::Duration::seconds(max_age_seconds as i64))
            .await?;

        if pruned > 0 {
            info!("Pruned {} stale queue entries", pruned);
            self.metrics_collector.record_pruned_entries(pruned);
            self.update_waiting_gauge().await;
        }

        Ok(pruned)
    }

    /// Current engine statistics
    pub async fn stats(&self) -> Result<MatchmakerStats> {
        let mut snapshot = {
            let stats = self.stats.read().map_err(|_| MatchmakingError::InternalError {
                message: "Failed to acquire stats lock".to_string(),
            })?;
            stats.clone()
        };
        snapshot.players_waiting = self.queue.len().await?;
        Ok(snapshot)
    }

    /// The rating calculator used for settlement
    pub fn calculator(&self) -> &EloCalculator {
        &self.calculator
    }

    /// The game store backing this engine
    pub fn games(&self) -> Arc<dyn GameStore> {
        self.games.clone()
    }

    async fn rating_entry_for(&self, player_id: &str) -> Result<RatingEntry> {
        Ok(self
            .ratings
            .get_rating(player_id)
            .await?
            .unwrap_or_else(|| {
                RatingEntry::new(player_id.to_string(), self.calculator.initial_rating())
            }))
    }

    async fn update_waiting_gauge(&self) {
        if let Ok(waiting) = self.queue.len().await {
            self.metrics_collector.set_players_waiting(waiting);
            if let Ok(mut stats) = self.stats.write() {
                stats.players_waiting = waiting;
            }
        }
    }
}
