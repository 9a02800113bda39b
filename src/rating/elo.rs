//! Elo rating system implementation
//!
//! This module provides a concrete implementation of post-game rating
//! updates using the Elo algorithm from the skillratings crate.

use crate::types::{Outcome, PlayerId, RatingChange};
use serde::{Deserialize, Serialize};
use skillratings::elo::{elo, expected_score, EloConfig, EloRating};
use skillratings::Outcomes;

/// Starting rating for players without a stored profile rating
pub const DEFAULT_RATING: i32 = 1200;

/// Configuration for the Elo rating system
///
/// This wraps the skillratings EloConfig with the service's own defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EloSettings {
    /// Maximum rating swing per game
    pub k_factor: f64,
    /// Initial rating for new players
    pub initial_rating: i32,
}

impl Default for EloSettings {
    fn default() -> Self {
        Self {
            k_factor: 24.0,
            initial_rating: DEFAULT_RATING,
        }
    }
}

impl EloSettings {
    /// Create conservative settings (slower rating changes)
    pub fn conservative() -> Self {
        Self {
            k_factor: 16.0,
            initial_rating: DEFAULT_RATING,
        }
    }

    /// Create aggressive settings (faster rating changes)
    pub fn aggressive() -> Self {
        Self {
            k_factor: 32.0,
            initial_rating: DEFAULT_RATING,
        }
    }

    /// Validate configuration parameters
    pub fn validate(&self) -> crate::error::Result<()> {
        if !self.k_factor.is_finite() || self.k_factor <= 0.0 {
            return Err(crate::error::MatchmakingError::ConfigurationError {
                message: "K-factor must be a positive finite number".to_string(),
            }
            .into());
        }

        if self.initial_rating < 0 {
            return Err(crate::error::MatchmakingError::ConfigurationError {
                message: "Initial rating must be non-negative".to_string(),
            }
            .into());
        }

        Ok(())
    }
}

/// Elo rating calculator
///
/// All operations are pure: ratings in, ratings out, no I/O. Results are
/// rounded half-away-from-zero to integers. Ratings are not clamped and
/// can in principle drift unbounded over repeated extreme results.
#[derive(Debug, Clone)]
pub struct EloCalculator {
    settings: EloSettings,
}

impl EloCalculator {
    /// Create a new Elo calculator
    pub fn new(settings: EloSettings) -> crate::error::Result<Self> {
        settings.validate()?;

        Ok(Self { settings })
    }

    /// Get the rating assigned to players without history
    pub fn initial_rating(&self) -> i32 {
        self.settings.initial_rating
    }

    /// Get the configured K-factor
    pub fn k_factor(&self) -> f64 {
        self.settings.k_factor
    }

    /// Expected score of `self_rating` against `opponent_rating`
    ///
    /// `1 / (1 + 10^((opponent - self) / 400))`, in `(0, 1)`.
    pub fn expected_score(&self, self_rating: i32, opponent_rating: i32) -> f64 {
        let (expected, _) = expected_score(
            &EloRating {
                rating: self_rating as f64,
            },
            &EloRating {
                rating: opponent_rating as f64,
            },
        );
        expected
    }

    /// New rating for one player after a game
    pub fn update(&self, self_rating: i32, opponent_rating: i32, outcome: Outcome) -> i32 {
        self.update_pair(self_rating, opponent_rating, outcome).0
    }

    /// New ratings for both players after a game
    ///
    /// `outcome` is from the first player's perspective.
    pub fn update_pair(
        &self,
        self_rating: i32,
        opponent_rating: i32,
        outcome: Outcome,
    ) -> (i32, i32) {
        let outcomes = match outcome {
            Outcome::Win => Outcomes::WIN,
            Outcome::Loss => Outcomes::LOSS,
            Outcome::Draw => Outcomes::DRAW,
        };

        let (new_self, new_opponent) = elo(
            &EloRating {
                rating: self_rating as f64,
            },
            &EloRating {
                rating: opponent_rating as f64,
            },
            &outcomes,
            &EloConfig {
                k: self.settings.k_factor,
            },
        );

        (
            new_self.rating.round() as i32,
            new_opponent.rating.round() as i32,
        )
    }

    /// Rating changes for both participants of a concluded game
    pub fn settle(
        &self,
        (self_id, self_rating): (&PlayerId, i32),
        (opponent_id, opponent_rating): (&PlayerId, i32),
        outcome: Outcome,
    ) -> (RatingChange, RatingChange) {
        let (new_self, new_opponent) = self.update_pair(self_rating, opponent_rating, outcome);

        (
            RatingChange {
                player_id: self_id.clone(),
                old_rating: self_rating,
                new_rating: new_self,
                outcome,
            },
            RatingChange {
                player_id: opponent_id.clone(),
                old_rating: opponent_rating,
                new_rating: new_opponent,
                outcome: outcome.reversed(),
            },
        )
    }
}

impl Default for EloCalculator {
    fn default() -> Self {
        Self {
            settings: EloSettings::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_equal_ratings_win() {
        let calculator = EloCalculator::default();
        // expected = 0.5, delta = 24 * 0.5 = 12
        assert_eq!(calculator.update(1500, 1500, Outcome::Win), 1512);
    }

    #[test]
    fn test_equal_ratings_loss() {
        let calculator = EloCalculator::default();
        assert_eq!(calculator.update(1500, 1500, Outcome::Loss), 1488);
    }

    #[test]
    fn test_equal_ratings_draw_is_noop() {
        let calculator = EloCalculator::default();
        for rating in [0, 800, 1200, 1500, 2600] {
            assert_eq!(calculator.update(rating, rating, Outcome::Draw), rating);
        }
    }

    #[test]
    fn test_win_increases_loss_decreases() {
        let calculator = EloCalculator::default();
        for rating in [400, 1200, 1500, 2200] {
            assert!(calculator.update(rating, rating, Outcome::Win) > rating);
            assert!(calculator.update(rating, rating, Outcome::Loss) < rating);
        }
    }

    #[test]
    fn test_underdog_gains_more() {
        let calculator = EloCalculator::default();
        let underdog_gain = calculator.update(1000, 1400, Outcome::Win) - 1000;
        let favorite_gain = calculator.update(1400, 1000, Outcome::Win) - 1400;
        assert!(underdog_gain > favorite_gain);
    }

    #[test]
    fn test_update_pair_is_zero_sum_at_equal_ratings() {
        let calculator = EloCalculator::default();
        let (a, b) = calculator.update_pair(1500, 1500, Outcome::Win);
        assert_eq!(a - 1500, -(b - 1500));
    }

    #[test]
    fn test_expected_score_symmetry() {
        let calculator = EloCalculator::default();
        assert_eq!(calculator.expected_score(1500, 1500), 0.5);

        let favored = calculator.expected_score(1600, 1400);
        let unfavored = calculator.expected_score(1400, 1600);
        assert!(favored > 0.5);
        assert!(unfavored < 0.5);
        assert!((favored + unfavored - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_settle_produces_mirrored_changes() {
        let calculator = EloCalculator::default();
        let winner = "winner".to_string();
        let loser = "loser".to_string();

        let (winner_change, loser_change) =
            calculator.settle((&winner, 1500), (&loser, 1500), Outcome::Win);

        assert_eq!(winner_change.new_rating, 1512);
        assert_eq!(loser_change.new_rating, 1488);
        assert_eq!(winner_change.outcome, Outcome::Win);
        assert_eq!(loser_change.outcome, Outcome::Loss);
    }

    #[test]
    fn test_invalid_settings_rejected() {
        assert!(EloCalculator::new(EloSettings {
            k_factor: 0.0,
            initial_rating: 1200,
        })
        .is_err());
        assert!(EloCalculator::new(EloSettings {
            k_factor: f64::NAN,
            initial_rating: 1200,
        })
        .is_err());
        assert!(EloCalculator::new(EloSettings {
            k_factor: 24.0,
            initial_rating: -1,
        })
        .is_err());
    }
}
