//! Health check logic and monitoring
//!
//! This module provides health check functionality for the skittles-room
//! matchmaking service, including readiness and liveness probes.

use crate::service::app::AppState;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, error};

/// Health check status
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

impl std::fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HealthStatus::Healthy => write!(f, "healthy"),
            HealthStatus::Degraded => write!(f, "degraded"),
            HealthStatus::Unhealthy => write!(f, "unhealthy"),
        }
    }
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthCheck {
    /// Overall service status
    pub status: HealthStatus,
    /// Service name
    pub service: String,
    /// Service version
    pub version: String,
    /// Current timestamp
    pub timestamp: chrono::DateTime<chrono::Utc>,
    /// Detailed component checks
    pub checks: Vec<ComponentCheck>,
    /// Service statistics
    pub stats: ServiceStats,
}

/// Individual component health check
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentCheck {
    /// Component name
    pub name: String,
    /// Component status
    pub status: HealthStatus,
    /// Optional error message if unhealthy
    pub message: Option<String>,
}

/// Service statistics included in health output
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceStats {
    /// Players currently waiting in the queue
    pub players_waiting: usize,
    /// Total pairing requests processed
    pub pairing_requests: u64,
    /// Total matches created
    pub matches_created: u64,
    /// Total games settled
    pub games_settled: u64,
    /// Human-readable uptime
    pub uptime_info: String,
}

impl HealthCheck {
    /// Run a full health check against the application state
    pub async fn check(app_state: Arc<AppState>) -> Result<Self> {
        debug!("Running full health check");

        let mut checks = Vec::new();

        checks.push(Self::check_component("queue_store", app_state.queue_reachable().await).await);
        checks.push(Self::check_component("game_store", app_state.games_reachable().await).await);
        checks.push(
            Self::check_component("rating_store", app_state.ratings_reachable().await).await,
        );

        let status = if checks.iter().all(|c| c.status == HealthStatus::Healthy) {
            if app_state.is_running().await {
                HealthStatus::Healthy
            } else {
                HealthStatus::Degraded
            }
        } else {
            HealthStatus::Unhealthy
        };

        let engine_stats = app_state.engine().stats().await.unwrap_or_default();

        Ok(Self {
            status,
            service: app_state.config().service.name.clone(),
            version: crate::VERSION.to_string(),
            timestamp: crate::utils::current_timestamp(),
            checks,
            stats: ServiceStats {
                players_waiting: engine_stats.players_waiting,
                pairing_requests: engine_stats.pairing_requests,
                matches_created: engine_stats.matches_created,
                games_settled: engine_stats.games_settled,
                uptime_info: app_state.uptime_info(),
            },
        })
    }

    /// Lightweight liveness probe: the process is responsive
    pub async fn liveness_check(app_state: Arc<AppState>) -> Result<HealthStatus> {
        if app_state.is_running().await {
            Ok(HealthStatus::Healthy)
        } else {
            Ok(HealthStatus::Degraded)
        }
    }

    /// Readiness probe: the stores answer
    pub async fn readiness_check(app_state: Arc<AppState>) -> Result<HealthStatus> {
        let queue_ok = app_state.queue_reachable().await.is_ok();
        let games_ok = app_state.games_reachable().await.is_ok();
        let ratings_ok = app_state.ratings_reachable().await.is_ok();

        if queue_ok && games_ok && ratings_ok {
            Ok(HealthStatus::Healthy)
        } else {
            error!(
                "Readiness check failed - queue: {}, games: {}, ratings: {}",
                queue_ok, games_ok, ratings_ok
            );
            Ok(HealthStatus::Unhealthy)
        }
    }

    async fn check_component(name: &str, result: Result<()>) -> ComponentCheck {
        match result {
            Ok(()) => ComponentCheck {
                name: name.to_string(),
                status: HealthStatus::Healthy,
                message: None,
            },
            Err(e) => ComponentCheck {
                name: name.to_string(),
                status: HealthStatus::Unhealthy,
                message: Some(e.to_string()),
            },
        }
    }

    /// Serialize to a JSON string
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_health_status_display() {
        assert_eq!(HealthStatus::Healthy.to_string(), "healthy");
        assert_eq!(HealthStatus::Degraded.to_string(), "degraded");
        assert_eq!(HealthStatus::Unhealthy.to_string(), "unhealthy");
    }

    #[tokio::test]
    async fn test_component_check_reports_errors() {
        let failing = HealthCheck::check_component(
            "probe",
            Err(anyhow::anyhow!("store unreachable")),
        )
        .await;
        assert_eq!(failing.status, HealthStatus::Unhealthy);
        assert!(failing.message.unwrap().contains("unreachable"));

        let passing = HealthCheck::check_component("probe", Ok(())).await;
        assert_eq!(passing.status, HealthStatus::Healthy);
        assert!(passing.message.is_none());
    }
}
