//! Client-side match search
//!
//! This module contains the controller that drives a match search on
//! behalf of one local player and exposes its progress as a small state
//! machine.

pub mod controller;

// Re-export commonly used types
pub use controller::{MatchSearchController, SearchConfig, SearchState};
