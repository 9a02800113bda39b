//! Rating tier classification
//!
//! This module maps numeric ratings onto coarse, human-readable tier
//! labels. The thresholds are a configurable table rather than a fixed
//! enum so deployments can choose their own ladder.

use serde::{Deserialize, Serialize};

/// One tier of a ladder: a label and the lowest rating that earns it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierBand {
    pub name: String,
    pub floor: i32,
}

impl TierBand {
    pub fn new(name: &str, floor: i32) -> Self {
        Self {
            name: name.to_string(),
            floor,
        }
    }
}

/// An ordered table of rating tiers
///
/// Bands are kept in ascending floor order. Classification picks the
/// highest band whose floor is at or below the rating; ratings below the
/// first floor still classify into the first band, so the mapping is
/// total over all integers and monotonic by construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierTable {
    bands: Vec<TierBand>,
}

impl TierTable {
    /// Create a tier table from bands ordered by ascending floor
    pub fn new(bands: Vec<TierBand>) -> crate::error::Result<Self> {
        if bands.is_empty() {
            return Err(crate::error::MatchmakingError::ConfigurationError {
                message: "Tier table must contain at least one band".to_string(),
            }
            .into());
        }

        for window in bands.windows(2) {
            if window[1].floor <= window[0].floor {
                return Err(crate::error::MatchmakingError::ConfigurationError {
                    message: format!(
                        "Tier floors must be strictly ascending: '{}' ({}) then '{}' ({})",
                        window[0].name, window[0].floor, window[1].name, window[1].floor
                    ),
                }
                .into());
            }
        }

        Ok(Self { bands })
    }

    /// The five-tier ladder used for the main player-facing rank badge
    pub fn standard() -> Self {
        Self {
            bands: vec![
                TierBand::new("Bronze", 0),
                TierBand::new("Silver", 1400),
                TierBand::new("Gold", 1600),
                TierBand::new("Platinum", 1900),
                TierBand::new("Diamond", 2200),
            ],
        }
    }

    /// The six-tier ladder used for club leaderboards
    pub fn club_ladder() -> Self {
        Self {
            bands: vec![
                TierBand::new("Bronze", 0),
                TierBand::new("Silver", 1300),
                TierBand::new("Gold", 1550),
                TierBand::new("Platinum", 1800),
                TierBand::new("Diamond", 2050),
                TierBand::new("Crown Master", 2300),
            ],
        }
    }

    /// Look up a built-in table by name
    pub fn by_name(name: &str) -> crate::error::Result<Self> {
        match name {
            "standard" => Ok(Self::standard()),
            "club_ladder" => Ok(Self::club_ladder()),
            other => Err(crate::error::MatchmakingError::ConfigurationError {
                message: format!("Unknown tier table: {}", other),
            }
            .into()),
        }
    }

    /// Tier label for a rating
    pub fn tier_for(&self, rating: i32) -> &str {
        &self.bands[self.tier_index(rating)].name
    }

    /// Ordinal of the band a rating falls into (0 = lowest tier)
    pub fn tier_index(&self, rating: i32) -> usize {
        self.bands
            .iter()
            .rposition(|band| band.floor <= rating)
            .unwrap_or(0)
    }

    /// All bands in ascending floor order
    pub fn bands(&self) -> &[TierBand] {
        &self.bands
    }
}

impl Default for TierTable {
    fn default() -> Self {
        Self::standard()
    }
}
