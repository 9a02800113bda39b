//! Request authentication
//!
//! This module handles establishing the caller identity for pairing
//! requests. A request whose identity cannot be established is rejected
//! before any queue or match state is touched.

use crate::error::{MatchmakingError, Result};
use crate::types::PlayerId;
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::{debug, warn};

/// Trait for request authentication services
#[async_trait]
pub trait RequestAuthenticator: Send + Sync {
    /// Verify that the request was made by the player it claims to be from
    ///
    /// Returns `Unauthenticated` when the identity cannot be established.
    async fn authenticate(&self, player_id: &str, auth_token: Option<&str>) -> Result<()>;
}

/// Token-based authenticator backed by a registered token table
#[derive(Debug, Default)]
pub struct TokenAuthenticator {
    tokens: RwLock<HashMap<PlayerId, String>>,
}

impl TokenAuthenticator {
    /// Create a new authenticator with no registered players
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or rotate) a player's token
    pub async fn register(&self, player_id: &str, token: &str) {
        let mut tokens = self.tokens.write().await;
        tokens.insert(player_id.to_string(), token.to_string());
    }

    /// Remove a player's token
    pub async fn revoke(&self, player_id: &str) -> bool {
        let mut tokens = self.tokens.write().await;
        tokens.remove(player_id).is_some()
    }
}

#[async_trait]
impl RequestAuthenticator for TokenAuthenticator {
    async fn authenticate(&self, player_id: &str, auth_token: Option<&str>) -> Result<()> {
        if player_id.is_empty() {
            return Err(MatchmakingError::Unauthenticated {
                reason: "Empty player id".to_string(),
            }
            .into());
        }

        let token = auth_token.ok_or_else(|| MatchmakingError::Unauthenticated {
            reason: format!("Missing auth token for player {}", player_id),
        })?;

        let tokens = self.tokens.read().await;
        match tokens.get(player_id) {
            Some(expected) if expected == token => {
                debug!("Player {} authenticated successfully", player_id);
                Ok(())
            }
            Some(_) => {
                warn!("Player {} authentication failed: token mismatch", player_id);
                Err(MatchmakingError::Unauthenticated {
                    reason: format!("Invalid token for player {}", player_id),
                }
                .into())
            }
            None => {
                warn!("Player {} authentication failed: unknown player", player_id);
                Err(MatchmakingError::Unauthenticated {
                    reason: format!("Unknown player {}", player_id),
                }
                .into())
            }
        }
    }
}

/// Authenticator that accepts any non-empty identity
///
/// Used by the queue tester and by deployments that terminate
/// authentication upstream of this service.
#[derive(Debug, Default)]
pub struct TrustedProxyAuthenticator;

impl TrustedProxyAuthenticator {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl RequestAuthenticator for TrustedProxyAuthenticator {
    async fn authenticate(&self, player_id: &str, _auth_token: Option<&str>) -> Result<()> {
        if player_id.is_empty() {
            return Err(MatchmakingError::Unauthenticated {
                reason: "Empty player id".to_string(),
            }
            .into());
        }
        Ok(())
    }
}
