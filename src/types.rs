//! Common types used throughout the matchmaking service

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::MatchmakingError;

/// Unique identifier for players
pub type PlayerId = String;

/// Unique identifier for games
pub type GameId = Uuid;

/// Standard chess starting position in FEN notation
pub const STARTING_POSITION_FEN: &str =
    "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

/// Game mode a player wants to queue for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameMode {
    Blitz,
    Rapid,
    Classical,
}

impl GameMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            GameMode::Blitz => "blitz",
            GameMode::Rapid => "rapid",
            GameMode::Classical => "classical",
        }
    }
}

impl std::fmt::Display for GameMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for GameMode {
    type Err = MatchmakingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "blitz" => Ok(GameMode::Blitz),
            "rapid" => Ok(GameMode::Rapid),
            "classical" => Ok(GameMode::Classical),
            other => Err(MatchmakingError::InvalidRequest {
                reason: format!("Unknown game mode: {}", other),
            }),
        }
    }
}

/// Board color assigned to a paired player
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Color {
    White,
    Black,
}

impl Color {
    pub fn opposite(&self) -> Color {
        match self {
            Color::White => Color::Black,
            Color::Black => Color::White,
        }
    }
}

/// Match outcome from one player's perspective
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Win,
    Loss,
    Draw,
}

impl Outcome {
    /// Score value used by the Elo update formula
    pub fn score(&self) -> f64 {
        match self {
            Outcome::Win => 1.0,
            Outcome::Loss => 0.0,
            Outcome::Draw => 0.5,
        }
    }

    /// The same result seen from the opponent's side
    pub fn reversed(&self) -> Outcome {
        match self {
            Outcome::Win => Outcome::Loss,
            Outcome::Loss => Outcome::Win,
            Outcome::Draw => Outcome::Draw,
        }
    }
}

/// A pending matchmaking request for one player
///
/// At most one live entry exists per player; re-queueing overwrites the
/// previous entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueEntry {
    pub player_id: PlayerId,
    pub mode: GameMode,
    pub rating: i32,
    pub region: Option<String>,
    pub enqueued_at: DateTime<Utc>,
}

impl QueueEntry {
    pub fn new(player_id: PlayerId, mode: GameMode, rating: i32) -> Self {
        Self {
            player_id,
            mode,
            rating,
            region: None,
            enqueued_at: crate::utils::current_timestamp(),
        }
    }
}

/// Lifecycle state of a match record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameState {
    /// Game is being played; the record is mutable
    InProgress,
    /// Terminal state; the record is immutable once here
    Completed,
}

/// A match created by a successful pairing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchRecord {
    pub id: GameId,
    pub white_player_id: PlayerId,
    pub black_player_id: PlayerId,
    pub mode: GameMode,
    pub state: GameState,
    pub board_fen: String,
    pub moves: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl MatchRecord {
    /// Create a fresh in-progress match at the standard starting position
    pub fn new(white_player_id: PlayerId, black_player_id: PlayerId, mode: GameMode) -> Self {
        Self {
            id: crate::utils::generate_game_id(),
            white_player_id,
            black_player_id,
            mode,
            state: GameState::InProgress,
            board_fen: STARTING_POSITION_FEN.to_string(),
            moves: Vec::new(),
            created_at: crate::utils::current_timestamp(),
        }
    }

    /// Check whether the given player is one of the two participants
    pub fn involves(&self, player_id: &str) -> bool {
        self.white_player_id == player_id || self.black_player_id == player_id
    }

    /// The opponent of the given participant, if the player is in this match
    pub fn opponent_of(&self, player_id: &str) -> Option<&PlayerId> {
        if self.white_player_id == player_id {
            Some(&self.black_player_id)
        } else if self.black_player_id == player_id {
            Some(&self.white_player_id)
        } else {
            None
        }
    }
}

/// Resolved identity, mode and rating of a player searching for a match
///
/// Built by the matchmaker once authentication and rating lookup have
/// succeeded; the candidate matcher only ever sees this resolved form.
#[derive(Debug, Clone)]
pub struct SearchContext {
    pub player_id: PlayerId,
    pub mode: GameMode,
    pub rating: i32,
}

/// Request to find a match for an authenticated player
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PairingRequest {
    pub player_id: PlayerId,
    pub game_mode: String,
    pub timestamp: DateTime<Utc>,
    /// Authentication token establishing the caller identity
    pub auth_token: Option<String>,
}

/// Result of a single pairing attempt
#[derive(Debug, Clone)]
pub enum PairingOutcome {
    /// An opponent was found and a match record was created
    Matched { game: MatchRecord },
    /// No compatible opponent is waiting; the requester was enqueued
    Queued,
}

impl PairingOutcome {
    pub fn is_matched(&self) -> bool {
        matches!(self, PairingOutcome::Matched { .. })
    }
}

/// Reported result of a concluded game
///
/// `winner` is `None` for a draw.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameResult {
    pub game_id: GameId,
    pub winner: Option<PlayerId>,
}

/// Rating change applied to one player after settlement
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RatingChange {
    pub player_id: PlayerId,
    pub old_rating: i32,
    pub new_rating: i32,
    pub outcome: Outcome,
}
