//! Skittles Room - Matchmaking and rating microservice for online chess
//!
//! This crate provides queue-based opponent pairing with Elo ratings,
//! tier classification, and a client-side match search controller.

pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod game;
pub mod matchmaker;
pub mod metrics;
pub mod queue;
pub mod ratelimit;
pub mod rating;
pub mod service;
pub mod types;
pub mod utils;

// Re-export commonly used types and traits
pub use error::{MatchmakingError, Result};
pub use types::*;

// Re-export key components
pub use client::MatchSearchController;
pub use matchmaker::Matchmaker;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
