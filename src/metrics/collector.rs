//! Metrics collection using Prometheus
//!
//! This module provides metrics collection for the matchmaking service
//! using Prometheus metrics.

use crate::matchmaker::engine::MatchmakerStats;
use crate::types::GameMode;
use anyhow::Result;
use prometheus::{
    Histogram, HistogramOpts, IntCounter, IntCounterVec, IntGauge, Opts, Registry,
};
use std::sync::Arc;
use std::time::Duration;

/// Main metrics collector for the matchmaking service
#[derive(Clone)]
pub struct MetricsCollector {
    /// Prometheus registry
    registry: Arc<Registry>,

    /// Service-level metrics
    service_metrics: ServiceMetrics,

    /// Queue-related metrics
    queue_metrics: QueueMetrics,

    /// Match-related metrics
    match_metrics: MatchMetrics,

    /// Performance metrics
    performance_metrics: PerformanceMetrics,
}

/// Service-level metrics
#[derive(Clone)]
pub struct ServiceMetrics {
    /// Service uptime in seconds
    pub uptime_seconds: IntGauge,

    /// Health check status (0=unhealthy, 1=degraded, 2=healthy)
    pub health_status: IntGauge,

    /// Requests rejected by the rate limiter
    pub rate_limited_total: IntCounter,

    /// Requests rejected as unauthenticated
    pub auth_failures_total: IntCounter,
}

/// Queue-related metrics
#[derive(Clone)]
pub struct QueueMetrics {
    /// Total pairing requests by mode and result
    pub pairing_requests_total: IntCounterVec,

    /// Players currently waiting in the queue
    pub players_waiting: IntGauge,

    /// Total cancellations
    pub cancellations_total: IntCounter,

    /// Stale queue entries pruned by the background sweep
    pub entries_pruned_total: IntCounter,
}

/// Match-related metrics
#[derive(Clone)]
pub struct MatchMetrics {
    /// Total matches created by mode
    pub matches_created_total: IntCounterVec,

    /// Total games settled
    pub games_settled_total: IntCounter,

    /// Total rating updates applied
    pub rating_updates_total: IntCounter,
}

/// Performance metrics
#[derive(Clone)]
pub struct PerformanceMetrics {
    /// Pairing request processing time
    pub pairing_duration: Histogram,

    /// Settlement processing time
    pub settlement_duration: Histogram,
}

impl ServiceMetrics {
    fn new(registry: &Registry) -> Result<Self> {
        let uptime_seconds = IntGauge::with_opts(Opts::new(
            "service_uptime_seconds",
            "Service uptime in seconds",
        ))?;
        let health_status = IntGauge::with_opts(Opts::new(
            "service_health_status",
            "Health status (0=unhealthy, 1=degraded, 2=healthy)",
        ))?;
        let rate_limited_total = IntCounter::with_opts(Opts::new(
            "service_rate_limited_total",
            "Requests rejected by the rate limiter",
        ))?;
        let auth_failures_total = IntCounter::with_opts(Opts::new(
            "service_auth_failures_total",
            "Requests rejected as unauthenticated",
        ))?;

        registry.register(Box::new(uptime_seconds.clone()))?;
        registry.register(Box::new(health_status.clone()))?;
        registry.register(Box::new(rate_limited_total.clone()))?;
        registry.register(Box::new(auth_failures_total.clone()))?;

        Ok(Self {
            uptime_seconds,
            health_status,
            rate_limited_total,
            auth_failures_total,
        })
    }
}

impl QueueMetrics {
    fn new(registry: &Registry) -> Result<Self> {
        let pairing_requests_total = IntCounterVec::new(
            Opts::new("queue_pairing_requests_total", "Pairing requests processed"),
            &["mode", "result"],
        )?;
        let players_waiting = IntGauge::with_opts(Opts::new(
            "queue_players_waiting",
            "Players currently waiting in the queue",
        ))?;
        let cancellations_total = IntCounter::with_opts(Opts::new(
            "queue_cancellations_total",
            "Queue cancellations processed",
        ))?;
        let entries_pruned_total = IntCounter::with_opts(Opts::new(
            "queue_entries_pruned_total",
            "Stale queue entries pruned",
        ))?;

        registry.register(Box::new(pairing_requests_total.clone()))?;
        registry.register(Box::new(players_waiting.clone()))?;
        registry.register(Box::new(cancellations_total.clone()))?;
        registry.register(Box::new(entries_pruned_total.clone()))?;

        Ok(Self {
            pairing_requests_total,
            players_waiting,
            cancellations_total,
            entries_pruned_total,
        })
    }
}

impl MatchMetrics {
    fn new(registry: &Registry) -> Result<Self> {
        let matches_created_total = IntCounterVec::new(
            Opts::new("match_created_total", "Matches created by mode"),
            &["mode"],
        )?;
        let games_settled_total = IntCounter::with_opts(Opts::new(
            "match_games_settled_total",
            "Games settled with rating updates",
        ))?;
        let rating_updates_total = IntCounter::with_opts(Opts::new(
            "match_rating_updates_total",
            "Individual player rating updates applied",
        ))?;

        registry.register(Box::new(matches_created_total.clone()))?;
        registry.register(Box::new(games_settled_total.clone()))?;
        registry.register(Box::new(rating_updates_total.clone()))?;

        Ok(Self {
            matches_created_total,
            games_settled_total,
            rating_updates_total,
        })
    }
}

impl PerformanceMetrics {
    fn new(registry: &Registry) -> Result<Self> {
        let pairing_duration = Histogram::with_opts(HistogramOpts::new(
            "perf_pairing_duration_seconds",
            "Pairing request processing time",
        ))?;
        let settlement_duration = Histogram::with_opts(HistogramOpts::new(
            "perf_settlement_duration_seconds",
            "Settlement processing time",
        ))?;

        registry.register(Box::new(pairing_duration.clone()))?;
        registry.register(Box::new(settlement_duration.clone()))?;

        Ok(Self {
            pairing_duration,
            settlement_duration,
        })
    }
}

impl MetricsCollector {
    /// Create a new metrics collector with default registry
    pub fn new() -> Result<Self> {
        let registry = Arc::new(Registry::new());
        Self::with_registry(registry)
    }

    /// Create a new metrics collector with custom registry
    pub fn with_registry(registry: Arc<Registry>) -> Result<Self> {
        let service_metrics = ServiceMetrics::new(&registry)?;
        let queue_metrics = QueueMetrics::new(&registry)?;
        let match_metrics = MatchMetrics::new(&registry)?;
        let performance_metrics = PerformanceMetrics::new(&registry)?;

        Ok(Self {
            registry,
            service_metrics,
            queue_metrics,
            match_metrics,
            performance_metrics,
        })
    }

    /// Get the Prometheus registry
    pub fn registry(&self) -> Arc<Registry> {
        self.registry.clone()
    }

    /// Get service metrics
    pub fn service(&self) -> &ServiceMetrics {
        &self.service_metrics
    }

    /// Get queue metrics
    pub fn queue(&self) -> &QueueMetrics {
        &self.queue_metrics
    }

    /// Get match metrics
    pub fn matches(&self) -> &MatchMetrics {
        &self.match_metrics
    }

    /// Get performance metrics
    pub fn performance(&self) -> &PerformanceMetrics {
        &self.performance_metrics
    }

    /// Record a processed pairing request
    pub fn record_pairing_request(&self, mode: GameMode, matched: bool, duration: Duration) {
        let result = if matched { "matched" } else { "queued" };

        self.queue_metrics
            .pairing_requests_total
            .with_label_values(&[mode.as_str(), result])
            .inc();

        self.performance_metrics
            .pairing_duration
            .observe(duration.as_secs_f64());

        if matched {
            self.match_metrics
                .matches_created_total
                .with_label_values(&[mode.as_str()])
                .inc();
        }
    }

    /// Record a queue cancellation
    pub fn record_cancellation(&self) {
        self.queue_metrics.cancellations_total.inc();
    }

    /// Record a settled game with both rating updates
    pub fn record_settlement(&self, duration: Duration) {
        self.match_metrics.games_settled_total.inc();
        self.match_metrics.rating_updates_total.inc_by(2);
        self.performance_metrics
            .settlement_duration
            .observe(duration.as_secs_f64());
    }

    /// Update the waiting-players gauge
    pub fn set_players_waiting(&self, waiting: usize) {
        self.queue_metrics.players_waiting.set(waiting as i64);
    }

    /// Record pruned stale queue entries
    pub fn record_pruned_entries(&self, count: usize) {
        self.queue_metrics.entries_pruned_total.inc_by(count as u64);
    }

    /// Update metrics from matchmaker stats
    pub fn update_from_matchmaker_stats(&self, stats: &MatchmakerStats) {
        self.queue_metrics
            .players_waiting
            .set(stats.players_waiting as i64);
    }
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new().expect("Failed to create default metrics collector")
    }
}
