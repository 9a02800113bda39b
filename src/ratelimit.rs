//! Sliding-window request rate limiting
//!
//! The limiter is an explicitly constructed object owned by the
//! application state, created once per process. It keeps a per-key list
//! of recent hit timestamps and admits a request only while the key has
//! seen fewer than the configured maximum inside the window.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tracing::debug;

/// Per-process sliding-window rate limiter keyed by caller
#[derive(Debug)]
pub struct RateLimiter {
    max_requests: usize,
    window: Duration,
    hits: Mutex<HashMap<String, VecDeque<Instant>>>,
}

impl RateLimiter {
    /// Create a limiter admitting `max_requests` per `window` per key
    pub fn new(max_requests: usize, window: Duration) -> Self {
        Self {
            max_requests,
            window,
            hits: Mutex::new(HashMap::new()),
        }
    }

    /// Record a hit for `key` and decide whether it is admitted
    pub fn check(&self, key: &str) -> bool {
        self.check_at(key, Instant::now())
    }

    fn check_at(&self, key: &str, now: Instant) -> bool {
        let mut hits = self.hits.lock().unwrap_or_else(|e| e.into_inner());
        let window_start = now.checked_sub(self.window);

        let timestamps = hits.entry(key.to_string()).or_default();
        if let Some(start) = window_start {
            while timestamps.front().is_some_and(|t| *t < start) {
                timestamps.pop_front();
            }
        }

        if timestamps.len() >= self.max_requests {
            debug!("Rate limit hit for key: {}", key);
            return false;
        }

        timestamps.push_back(now);
        true
    }

    /// Requests still admissible for `key` in the current window
    pub fn remaining(&self, key: &str) -> usize {
        let mut hits = self.hits.lock().unwrap_or_else(|e| e.into_inner());
        let window_start = Instant::now().checked_sub(self.window);

        match hits.get_mut(key) {
            Some(timestamps) => {
                if let Some(start) = window_start {
                    while timestamps.front().is_some_and(|t| *t < start) {
                        timestamps.pop_front();
                    }
                }
                self.max_requests.saturating_sub(timestamps.len())
            }
            None => self.max_requests,
        }
    }

    /// Drop all recorded hits, for all keys
    pub fn reset(&self) {
        let mut hits = self.hits.lock().unwrap_or_else(|e| e.into_inner());
        hits.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_admits_up_to_limit() {
        let limiter = RateLimiter::new(3, Duration::from_secs(60));

        assert!(limiter.check("player1"));
        assert!(limiter.check("player1"));
        assert!(limiter.check("player1"));
        assert!(!limiter.check("player1"));
    }

    #[test]
    fn test_keys_are_independent() {
        let limiter = RateLimiter::new(1, Duration::from_secs(60));

        assert!(limiter.check("player1"));
        assert!(limiter.check("player2"));
        assert!(!limiter.check("player1"));
    }

    #[test]
    fn test_window_expiry_readmits() {
        let limiter = RateLimiter::new(1, Duration::from_millis(10));

        assert!(limiter.check("player1"));
        assert!(!limiter.check("player1"));

        std::thread::sleep(Duration::from_millis(20));
        assert!(limiter.check("player1"));
    }

    #[test]
    fn test_remaining() {
        let limiter = RateLimiter::new(2, Duration::from_secs(60));

        assert_eq!(limiter.remaining("player1"), 2);
        limiter.check("player1");
        assert_eq!(limiter.remaining("player1"), 1);
        limiter.check("player1");
        assert_eq!(limiter.remaining("player1"), 0);
    }

    #[test]
    fn test_reset_clears_all_keys() {
        let limiter = RateLimiter::new(1, Duration::from_secs(60));
        limiter.check("player1");
        limiter.check("player2");

        limiter.reset();
        assert!(limiter.check("player1"));
        assert!(limiter.check("player2"));
    }
}
