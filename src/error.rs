//! Error types for the matchmaking service
//!
//! This module defines all error types using anyhow for consistent error handling
//! throughout the application.

/// Result type alias for convenience
pub type Result<T> = anyhow::Result<T>;

/// Custom error types for specific matchmaking scenarios
#[derive(Debug, thiserror::Error)]
pub enum MatchmakingError {
    #[error("Caller identity missing or invalid: {reason}")]
    Unauthenticated { reason: String },

    #[error("Invalid matchmaking request: {reason}")]
    InvalidRequest { reason: String },

    #[error("Storage operation failed: {message}")]
    StorageFailure { message: String },

    #[error("Game not found: {game_id}")]
    GameNotFound { game_id: String },

    #[error("Game already settled: {game_id}")]
    GameAlreadySettled { game_id: String },

    #[error("Rate limit exceeded for: {key}")]
    RateLimited { key: String },

    #[error("Rating calculation failed: {reason}")]
    RatingCalculationFailed { reason: String },

    #[error("Configuration error: {message}")]
    ConfigurationError { message: String },

    #[error("Internal service error: {message}")]
    InternalError { message: String },
}
