//! Candidate selection policy for pairing waiting players
//!
//! This module handles the logic for deciding which waiting entries are
//! compatible with a requester and in what order they should be tried.

use crate::types::{QueueEntry, SearchContext};
use chrono::{DateTime, Utc};

/// Configuration for candidate matching behavior
#[derive(Debug, Clone)]
pub struct MatchingConfig {
    /// Maximum rating difference allowed for pairing
    pub max_rating_difference: i32,
    /// Entries older than this are skipped (and eventually pruned); None disables
    pub max_entry_age_seconds: Option<u64>,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            max_rating_difference: 200,
            max_entry_age_seconds: None,
        }
    }
}

/// Trait for candidate matching algorithms
pub trait CandidateMatcher: Send + Sync {
    /// Check if a single waiting entry is compatible with the requester
    fn is_eligible(
        &self,
        ctx: &SearchContext,
        candidate: &QueueEntry,
        now: DateTime<Utc>,
        config: &MatchingConfig,
    ) -> bool;

    /// Order eligible entries by pairing preference
    ///
    /// The returned list is eligible candidates only, oldest enqueued
    /// first, so long-waiting players are never starved by newer arrivals.
    fn rank_candidates(
        &self,
        ctx: &SearchContext,
        entries: Vec<QueueEntry>,
        now: DateTime<Utc>,
        config: &MatchingConfig,
    ) -> Vec<QueueEntry>;
}

/// Rating-window matcher implementation
///
/// Pairing requires the same game mode, a different player, and a rating
/// gap inside the configured window. Among eligible candidates the oldest
/// entry wins (FIFO tie-break).
#[derive(Debug, Default)]
pub struct RatingWindowMatcher;

impl RatingWindowMatcher {
    pub fn new() -> Self {
        Self
    }
}

impl CandidateMatcher for RatingWindowMatcher {
    fn is_eligible(
        &self,
        ctx: &SearchContext,
        candidate: &QueueEntry,
        now: DateTime<Utc>,
        config: &MatchingConfig,
    ) -> bool {
        if candidate.player_id == ctx.player_id {
            return false;
        }

        if candidate.mode != ctx.mode {
            return false;
        }

        if !crate::utils::ratings_within_tolerance(
            candidate.rating,
            ctx.rating,
            config.max_rating_difference,
        ) {
            return false;
        }

        if let Some(max_age) = config.max_entry_age_seconds {
            let age = now.signed_duration_since(candidate.enqueued_at);
            if age.num_seconds() > max_age as i64 {
                return false;
            }
        }

        true
    }

    fn rank_candidates(
        &self,
        ctx: &SearchContext,
        entries: Vec<QueueEntry>,
        now: DateTime<Utc>,
        config: &MatchingConfig,
    ) -> Vec<QueueEntry> {
        let mut eligible: Vec<QueueEntry> = entries
            .into_iter()
            .filter(|candidate| self.is_eligible(ctx, candidate, now, config))
            .collect();

        eligible.sort_by_key(|candidate| candidate.enqueued_at);
        eligible
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{GameMode, QueueEntry};
    use chrono::Duration;

    fn ctx(player_id: &str, rating: i32) -> SearchContext {
        SearchContext {
            player_id: player_id.to_string(),
            mode: GameMode::Blitz,
            rating,
        }
    }

    fn waiting(player_id: &str, rating: i32, enqueued_seconds_ago: i64) -> QueueEntry {
        let mut entry = QueueEntry::new(player_id.to_string(), GameMode::Blitz, rating);
        entry.enqueued_at = crate::utils::current_timestamp() - Duration::seconds(enqueued_seconds_ago);
        entry
    }

    #[test]
    fn test_rating_window() {
        let matcher = RatingWindowMatcher::new();
        let config = MatchingConfig::default();
        let now = crate::utils::current_timestamp();
        let requester = ctx("requester", 1220);

        assert!(matcher.is_eligible(&requester, &waiting("near", 1200, 5), now, &config));
        assert!(matcher.is_eligible(&requester, &waiting("edge", 1420, 5), now, &config));
        assert!(!matcher.is_eligible(&requester, &waiting("far", 1800, 5), now, &config));
    }

    #[test]
    fn test_never_matches_self_or_other_mode() {
        let matcher = RatingWindowMatcher::new();
        let config = MatchingConfig::default();
        let now = crate::utils::current_timestamp();
        let requester = ctx("requester", 1220);

        assert!(!matcher.is_eligible(&requester, &waiting("requester", 1220, 5), now, &config));

        let mut rapid = waiting("other", 1220, 5);
        rapid.mode = GameMode::Rapid;
        assert!(!matcher.is_eligible(&requester, &rapid, now, &config));
    }

    #[test]
    fn test_fifo_preference_among_eligible() {
        let matcher = RatingWindowMatcher::new();
        let config = MatchingConfig::default();
        let now = crate::utils::current_timestamp();
        let requester = ctx("requester", 1220);

        // 1200 enqueued before 1250; 1800 outside the window
        let entries = vec![
            waiting("newer", 1250, 10),
            waiting("older", 1200, 60),
            waiting("strong", 1800, 120),
        ];

        let ranked = matcher.rank_candidates(&requester, entries, now, &config);
        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].player_id, "older");
        assert_eq!(ranked[1].player_id, "newer");
    }

    #[test]
    fn test_stale_entries_skipped_when_configured() {
        let matcher = RatingWindowMatcher::new();
        let config = MatchingConfig {
            max_rating_difference: 200,
            max_entry_age_seconds: Some(30),
        };
        let now = crate::utils::current_timestamp();
        let requester = ctx("requester", 1220);

        assert!(matcher.is_eligible(&requester, &waiting("fresh", 1200, 5), now, &config));
        assert!(!matcher.is_eligible(&requester, &waiting("stale", 1200, 120), now, &config));
    }
}
