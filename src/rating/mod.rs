//! Rating system integration using the Elo algorithm
//!
//! This module provides Elo rating calculations, tier classification,
//! storage interfaces, and integration with the skillratings crate.

pub mod elo;
pub mod storage;
pub mod tiers;

// Re-export commonly used types
pub use elo::{EloCalculator, EloSettings, DEFAULT_RATING};
pub use storage::{InMemoryRatingStorage, RatingEntry, RatingStorage};
pub use tiers::{TierBand, TierTable};
