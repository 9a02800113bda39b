//! Rating system configuration

use crate::rating::elo::EloSettings;
use crate::rating::tiers::TierTable;
use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Rating configuration as loaded from env/file
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RatingSettingsConfig {
    /// Maximum rating swing per game
    pub k_factor: f64,
    /// Rating assigned to players without history
    pub initial_rating: i32,
    /// Which built-in tier table to use ("standard" or "club_ladder")
    pub tier_table: String,
}

impl Default for RatingSettingsConfig {
    fn default() -> Self {
        Self {
            k_factor: 24.0,
            initial_rating: 1200,
            tier_table: "standard".to_string(),
        }
    }
}

impl RatingSettingsConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        self.elo_settings().validate()?;
        TierTable::by_name(&self.tier_table)?;
        Ok(())
    }

    /// Elo settings described by this configuration
    pub fn elo_settings(&self) -> EloSettings {
        EloSettings {
            k_factor: self.k_factor,
            initial_rating: self.initial_rating,
        }
    }

    /// Resolve the configured tier table
    pub fn resolve_tier_table(&self) -> Result<TierTable> {
        TierTable::by_name(&self.tier_table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(RatingSettingsConfig::default().validate().is_ok());
    }

    #[test]
    fn test_unknown_tier_table_rejected() {
        let config = RatingSettingsConfig {
            tier_table: "legacy".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_non_positive_k_rejected() {
        let config = RatingSettingsConfig {
            k_factor: -1.0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
