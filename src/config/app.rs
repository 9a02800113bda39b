//! Main application configuration
//!
//! This module defines the primary configuration structures for the
//! skittles-room matchmaking service, including environment variable
//! loading, TOML file loading, and validation.

use crate::config::rating::RatingSettingsConfig;
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub service: ServiceSettings,
    pub matchmaking: MatchmakingSettings,
    pub rating: RatingSettingsConfig,
}

/// Service-level settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceSettings {
    /// Service name for logging and metrics
    pub name: String,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Port for the HTTP API and health endpoints
    pub http_port: u16,
    /// Graceful shutdown timeout in seconds
    pub shutdown_timeout_seconds: u64,
}

/// Matchmaking-specific settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchmakingSettings {
    /// Maximum rating difference for pairing
    pub max_rating_difference: i32,
    /// Client poll interval while queued, in milliseconds
    pub poll_interval_ms: u64,
    /// Queue entries older than this are skipped and pruned; 0 disables
    pub queue_entry_max_age_seconds: u64,
    /// How often the background sweep prunes stale entries
    pub prune_interval_seconds: u64,
    /// Pairing requests admitted per player per rate-limit window
    pub rate_limit_max_requests: usize,
    /// Rate-limit window in seconds
    pub rate_limit_window_seconds: u64,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            name: "skittles-room".to_string(),
            log_level: "info".to_string(),
            http_port: 8080,
            shutdown_timeout_seconds: 30,
        }
    }
}

impl Default for MatchmakingSettings {
    fn default() -> Self {
        Self {
            max_rating_difference: 200,
            poll_interval_ms: 2000,
            queue_entry_max_age_seconds: 0,
            prune_interval_seconds: 60,
            rate_limit_max_requests: 10,
            rate_limit_window_seconds: 60,
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables with fallback to defaults
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        // Service settings
        if let Ok(name) = env::var("SERVICE_NAME") {
            config.service.name = name;
        }
        if let Ok(log_level) = env::var("LOG_LEVEL") {
            config.service.log_level = log_level;
        }
        if let Ok(port) = env::var("HTTP_PORT") {
            config.service.http_port = port
                .parse()
                .map_err(|_| anyhow!("Invalid HTTP_PORT value: {}", port))?;
        }
        if let Ok(timeout) = env::var("SHUTDOWN_TIMEOUT_SECONDS") {
            config.service.shutdown_timeout_seconds = timeout
                .parse()
                .map_err(|_| anyhow!("Invalid SHUTDOWN_TIMEOUT_SECONDS value: {}", timeout))?;
        }

        // Matchmaking settings
        if let Ok(rating_diff) = env::var("MAX_RATING_DIFFERENCE") {
            config.matchmaking.max_rating_difference = rating_diff
                .parse()
                .map_err(|_| anyhow!("Invalid MAX_RATING_DIFFERENCE value: {}", rating_diff))?;
        }
        if let Ok(poll) = env::var("POLL_INTERVAL_MS") {
            config.matchmaking.poll_interval_ms = poll
                .parse()
                .map_err(|_| anyhow!("Invalid POLL_INTERVAL_MS value: {}", poll))?;
        }
        if let Ok(max_age) = env::var("QUEUE_ENTRY_MAX_AGE_SECONDS") {
            config.matchmaking.queue_entry_max_age_seconds = max_age.parse().map_err(|_| {
                anyhow!("Invalid QUEUE_ENTRY_MAX_AGE_SECONDS value: {}", max_age)
            })?;
        }
        if let Ok(interval) = env::var("PRUNE_INTERVAL_SECONDS") {
            config.matchmaking.prune_interval_seconds = interval
                .parse()
                .map_err(|_| anyhow!("Invalid PRUNE_INTERVAL_SECONDS value: {}", interval))?;
        }
        if let Ok(max_requests) = env::var("RATE_LIMIT_MAX_REQUESTS") {
            config.matchmaking.rate_limit_max_requests = max_requests
                .parse()
                .map_err(|_| anyhow!("Invalid RATE_LIMIT_MAX_REQUESTS value: {}", max_requests))?;
        }
        if let Ok(window) = env::var("RATE_LIMIT_WINDOW_SECONDS") {
            config.matchmaking.rate_limit_window_seconds = window
                .parse()
                .map_err(|_| anyhow!("Invalid RATE_LIMIT_WINDOW_SECONDS value: {}", window))?;
        }

        // Rating settings
        if let Ok(k_factor) = env::var("ELO_K_FACTOR") {
            config.rating.k_factor = k_factor
                .parse()
                .map_err(|_| anyhow!("Invalid ELO_K_FACTOR value: {}", k_factor))?;
        }
        if let Ok(initial) = env::var("INITIAL_RATING") {
            config.rating.initial_rating = initial
                .parse()
                .map_err(|_| anyhow!("Invalid INITIAL_RATING value: {}", initial))?;
        }
        if let Ok(table) = env::var("TIER_TABLE") {
            config.rating.tier_table = table;
        }

        validate_config(&config)?;
        Ok(config)
    }

    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).with_context(|| {
            format!("Failed to read config file: {}", path.as_ref().display())
        })?;
        let config: Self = toml::from_str(&content).with_context(|| {
            format!("Failed to parse config file: {}", path.as_ref().display())
        })?;

        validate_config(&config)?;
        Ok(config)
    }

    /// Get shutdown timeout as Duration
    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.service.shutdown_timeout_seconds)
    }

    /// Get client poll interval as Duration
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.matchmaking.poll_interval_ms)
    }

    /// Get stale-entry prune interval as Duration
    pub fn prune_interval(&self) -> Duration {
        Duration::from_secs(self.matchmaking.prune_interval_seconds)
    }

    /// Get rate-limit window as Duration
    pub fn rate_limit_window(&self) -> Duration {
        Duration::from_secs(self.matchmaking.rate_limit_window_seconds)
    }

    /// Maximum queue entry age, if staleness expiry is enabled
    pub fn queue_entry_max_age(&self) -> Option<u64> {
        match self.matchmaking.queue_entry_max_age_seconds {
            0 => None,
            seconds => Some(seconds),
        }
    }
}

/// Validate configuration values
pub fn validate_config(config: &AppConfig) -> Result<()> {
    // Validate log level
    match config.service.log_level.to_lowercase().as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => {}
        _ => return Err(anyhow!("Invalid log level: {}", config.service.log_level)),
    }

    // Validate ports
    if config.service.http_port == 0 {
        return Err(anyhow!("HTTP port cannot be 0"));
    }

    // Validate timeouts
    if config.service.shutdown_timeout_seconds == 0 {
        return Err(anyhow!("Shutdown timeout must be greater than 0"));
    }

    // Validate matchmaking settings
    if config.matchmaking.max_rating_difference <= 0 {
        return Err(anyhow!("Max rating difference must be positive"));
    }
    if config.matchmaking.poll_interval_ms == 0 {
        return Err(anyhow!("Poll interval must be greater than 0"));
    }
    if config.matchmaking.prune_interval_seconds == 0 {
        return Err(anyhow!("Prune interval must be greater than 0"));
    }
    if config.matchmaking.rate_limit_max_requests == 0 {
        return Err(anyhow!("Rate limit must admit at least one request"));
    }
    if config.matchmaking.rate_limit_window_seconds == 0 {
        return Err(anyhow!("Rate limit window must be greater than 0"));
    }

    // Validate rating settings
    config.rating.validate()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = AppConfig::default();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_invalid_log_level_rejected() {
        let mut config = AppConfig::default();
        config.service.log_level = "verbose".to_string();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_invalid_rating_window_rejected() {
        let mut config = AppConfig::default();
        config.matchmaking.max_rating_difference = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_zero_max_age_disables_expiry() {
        let config = AppConfig::default();
        assert!(config.queue_entry_max_age().is_none());

        let mut with_expiry = AppConfig::default();
        with_expiry.matchmaking.queue_entry_max_age_seconds = 120;
        assert_eq!(with_expiry.queue_entry_max_age(), Some(120));
    }

    #[test]
    fn test_toml_round_trip() {
        let config = AppConfig::default();
        let serialized = toml::to_string(&config).unwrap();
        let parsed: AppConfig = toml::from_str(&serialized).unwrap();
        assert_eq!(parsed.service.http_port, config.service.http_port);
        assert_eq!(
            parsed.matchmaking.max_rating_difference,
            config.matchmaking.max_rating_difference
        );
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let parsed: AppConfig = toml::from_str("[service]\nhttp_port = 9000\n").unwrap();
        assert_eq!(parsed.service.http_port, 9000);
        assert_eq!(parsed.matchmaking.max_rating_difference, 200);
    }
}
