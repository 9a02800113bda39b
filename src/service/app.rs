//! Main application state and service coordination
//!
//! This module contains the production AppState that wires together the
//! stores, the matchmaking engine, the rate limiter and the background
//! maintenance task.

use crate::auth::{RequestAuthenticator, TrustedProxyAuthenticator};
use crate::config::AppConfig;
use crate::game::store::{GameStore, InMemoryGameStore};
use crate::matchmaker::Matchmaker;
use crate::metrics::MetricsCollector;
use crate::queue::matching::{MatchingConfig, RatingWindowMatcher};
use crate::queue::store::{InMemoryQueueStore, QueueStore};
use crate::ratelimit::RateLimiter;
use crate::rating::storage::{InMemoryRatingStorage, RatingStorage};
use crate::rating::tiers::TierTable;
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{info, warn};

/// Errors from service lifecycle operations
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("Service initialization failed: {message}")]
    InitializationFailed { message: String },

    #[error("Service is already running")]
    AlreadyRunning,

    #[error("Service shutdown failed: {message}")]
    ShutdownFailed { message: String },
}

/// Production application state
pub struct AppState {
    config: AppConfig,
    engine: Matchmaker,
    queue: Arc<dyn QueueStore>,
    games: Arc<dyn GameStore>,
    ratings: Arc<dyn RatingStorage>,
    rate_limiter: Arc<RateLimiter>,
    tier_table: TierTable,
    metrics_collector: Arc<MetricsCollector>,
    running: Arc<RwLock<bool>>,
    started_at: Instant,
    prune_task: RwLock<Option<JoinHandle<()>>>,
}

impl AppState {
    /// Initialize all service components from configuration
    pub async fn new(config: AppConfig) -> Result<Self, ServiceError> {
        info!("Initializing application state...");

        let queue: Arc<dyn QueueStore> = Arc::new(InMemoryQueueStore::new());
        let games: Arc<dyn GameStore> = Arc::new(InMemoryGameStore::new());
        let ratings: Arc<dyn RatingStorage> = Arc::new(InMemoryRatingStorage::new());

        // Authentication is terminated upstream of this service; the
        // engine still rejects requests without a caller identity.
        let authenticator: Arc<dyn RequestAuthenticator> =
            Arc::new(TrustedProxyAuthenticator::new());

        let metrics_collector = Arc::new(MetricsCollector::new().map_err(|e| {
            ServiceError::InitializationFailed {
                message: format!("Failed to create metrics collector: {}", e),
            }
        })?);

        let matching_config = MatchingConfig {
            max_rating_difference: config.matchmaking.max_rating_difference,
            max_entry_age_seconds: config.queue_entry_max_age(),
        };

        let engine = Matchmaker::with_config_and_metrics(
            queue.clone(),
            games.clone(),
            ratings.clone(),
            authenticator,
            Arc::new(RatingWindowMatcher::new()),
            matching_config,
            config.rating.elo_settings(),
            metrics_collector.clone(),
        )
        .map_err(|e| ServiceError::InitializationFailed {
            message: format!("Failed to create matchmaker: {}", e),
        })?;

        let tier_table =
            config
                .rating
                .resolve_tier_table()
                .map_err(|e| ServiceError::InitializationFailed {
                    message: format!("Failed to resolve tier table: {}", e),
                })?;

        let rate_limiter = Arc::new(RateLimiter::new(
            config.matchmaking.rate_limit_max_requests,
            config.rate_limit_window(),
        ));

        Ok(Self {
            config,
            engine,
            queue,
            games,
            ratings,
            rate_limiter,
            tier_table,
            metrics_collector,
            running: Arc::new(RwLock::new(false)),
            started_at: Instant::now(),
            prune_task: RwLock::new(None),
        })
    }

    /// Start background tasks
    pub async fn start(&self) -> Result<(), ServiceError> {
        {
            let mut running = self.running.write().await;
            if *running {
                return Err(ServiceError::AlreadyRunning);
            }
            *running = true;
        }

        if self.config.queue_entry_max_age().is_some() {
            let engine = self.engine.clone();
            let interval = self.config.prune_interval();
            let running = self.running.clone();

            let handle = tokio::spawn(async move {
                let mut ticker = tokio::time::interval(interval);
                ticker.tick().await;

                loop {
                    ticker.tick().await;
                    if !*running.read().await {
                        break;
                    }
                    if let Err(e) = engine.prune_stale_entries().await {
                        warn!("Stale-entry sweep failed: {}", e);
                    }
                }
            });

            let mut prune_task = self.prune_task.write().await;
            *prune_task = Some(handle);
            info!(
                "Stale-entry sweep running every {:?}",
                self.config.prune_interval()
            );
        }

        info!("Service components started");
        Ok(())
    }

    /// Stop background tasks
    pub async fn shutdown(&self) -> Result<(), ServiceError> {
        {
            let mut running = self.running.write().await;
            *running = false;
        }

        let mut prune_task = self.prune_task.write().await;
        if let Some(handle) = prune_task.take() {
            handle.abort();
        }

        info!("Service components stopped");
        Ok(())
    }

    /// Get the service configuration
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Whether the service is running
    pub async fn is_running(&self) -> bool {
        *self.running.read().await
    }

    /// Get the matchmaking engine
    pub fn engine(&self) -> &Matchmaker {
        &self.engine
    }

    /// Get the per-player request rate limiter
    pub fn rate_limiter(&self) -> &RateLimiter {
        &self.rate_limiter
    }

    /// Get the configured tier table
    pub fn tier_table(&self) -> &TierTable {
        &self.tier_table
    }

    /// Get the rating storage
    pub fn ratings(&self) -> Arc<dyn RatingStorage> {
        self.ratings.clone()
    }

    /// Get the metrics collector
    pub fn metrics_collector(&self) -> Arc<MetricsCollector> {
        self.metrics_collector.clone()
    }

    /// Human-readable uptime
    pub fn uptime_info(&self) -> String {
        let uptime = self.started_at.elapsed();
        let seconds = uptime.as_secs();
        format!(
            "{}h {}m {}s",
            seconds / 3600,
            (seconds % 3600) / 60,
            seconds % 60
        )
    }

    /// Probe the queue store
    pub async fn queue_reachable(&self) -> crate::error::Result<()> {
        self.queue.len().await.map(|_| ())
    }

    /// Probe the game store
    pub async fn games_reachable(&self) -> crate::error::Result<()> {
        self.games.len().await.map(|_| ())
    }

    /// Probe the rating store
    pub async fn ratings_reachable(&self) -> crate::error::Result<()> {
        self.ratings.player_count().await.map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_app_state_lifecycle() {
        let state = AppState::new(AppConfig::default()).await.unwrap();
        assert!(!state.is_running().await);

        state.start().await.unwrap();
        assert!(state.is_running().await);

        // Starting twice is rejected
        assert!(state.start().await.is_err());

        state.shutdown().await.unwrap();
        assert!(!state.is_running().await);
    }

    #[tokio::test]
    async fn test_stores_reachable() {
        let state = AppState::new(AppConfig::default()).await.unwrap();
        assert!(state.queue_reachable().await.is_ok());
        assert!(state.games_reachable().await.is_ok());
        assert!(state.ratings_reachable().await.is_ok());
    }
}
