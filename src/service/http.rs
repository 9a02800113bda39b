//! HTTP API, health endpoints and Prometheus metrics server
//!
//! This module provides the Axum server exposing the matchmaking API
//! (queue, cancel, result reporting, rating lookup) together with health
//! checks and Prometheus metrics.

use crate::error::MatchmakingError;
use crate::rating::storage::RatingStorage;
use crate::service::app::AppState;
use crate::service::health::{HealthCheck, HealthStatus};
use crate::types::{GameResult, PairingOutcome, PairingRequest, PlayerId};
use anyhow::{Context, Result};
use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use prometheus::{Encoder, TextEncoder};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// HTTP server configuration
#[derive(Debug, Clone)]
pub struct HttpServerConfig {
    /// Port to bind to
    pub port: u16,
    /// Host to bind to (typically "0.0.0.0" for all interfaces)
    pub host: String,
}

impl Default for HttpServerConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            host: "0.0.0.0".to_string(),
        }
    }
}

/// Shared state for the HTTP server
#[derive(Clone)]
pub struct HttpServerState {
    pub app_state: Arc<AppState>,
}

/// HTTP server exposing the matchmaking API and monitoring endpoints
pub struct HttpServer {
    config: HttpServerConfig,
    state: HttpServerState,
    shutdown_tx: broadcast::Sender<()>,
}

impl HttpServer {
    /// Create a new HTTP server
    pub fn new(config: HttpServerConfig, app_state: Arc<AppState>) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);

        Self {
            config,
            state: HttpServerState { app_state },
            shutdown_tx,
        }
    }

    /// Start the server
    pub async fn start(&self) -> Result<()> {
        let addr: SocketAddr = format!("{}:{}", self.config.host, self.config.port)
            .parse()
            .context("Invalid HTTP server address")?;

        let app = self.create_router();
        let listener = TcpListener::bind(addr).await?;

        info!("HTTP server listening on http://{}", addr);

        let mut shutdown_rx = self.shutdown_tx.subscribe();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown_rx.recv().await;
                info!("HTTP server shutdown signal received");
            })
            .await?;

        info!("HTTP server stopped");
        Ok(())
    }

    /// Create the Axum router with all endpoints
    pub fn create_router(&self) -> Router {
        Router::new()
            .route("/", get(root_handler))
            .route("/matchmaking/queue", post(queue_handler))
            .route("/matchmaking/cancel", post(cancel_handler))
            .route("/games/{game_id}/result", post(result_handler))
            .route("/ratings/{player_id}", get(rating_handler))
            .route("/health", get(health_handler))
            .route("/ready", get(ready_handler))
            .route("/alive", get(alive_handler))
            .route("/metrics", get(metrics_handler))
            .route("/stats", get(stats_handler))
            .with_state(self.state.clone())
    }

    /// Stop the server
    pub async fn stop(&self) -> Result<()> {
        info!("Stopping HTTP server...");

        if let Err(e) = self.shutdown_tx.send(()) {
            warn!("Failed to send shutdown signal to HTTP server: {}", e);
        }

        Ok(())
    }
}

/// Body of a queue request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueApiRequest {
    pub player_id: PlayerId,
    pub game_mode: String,
}

/// Body of a cancel request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CancelApiRequest {
    pub player_id: PlayerId,
}

/// Body of a result report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultApiRequest {
    /// Winning player id; absent for a draw
    pub winner: Option<PlayerId>,
}

/// Map a matchmaking failure to an HTTP response
fn error_response(e: anyhow::Error) -> Response {
    let status = match e.downcast_ref::<MatchmakingError>() {
        Some(MatchmakingError::Unauthenticated { .. }) => StatusCode::UNAUTHORIZED,
        Some(MatchmakingError::InvalidRequest { .. }) => StatusCode::BAD_REQUEST,
        Some(MatchmakingError::RateLimited { .. }) => StatusCode::TOO_MANY_REQUESTS,
        Some(MatchmakingError::GameNotFound { .. }) => StatusCode::NOT_FOUND,
        Some(MatchmakingError::GameAlreadySettled { .. }) => StatusCode::CONFLICT,
        Some(MatchmakingError::StorageFailure { .. }) => StatusCode::SERVICE_UNAVAILABLE,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };

    (status, Json(json!({ "error": e.to_string() }))).into_response()
}

/// Root endpoint handler - shows service information
async fn root_handler() -> impl IntoResponse {
    let info = json!({
        "service": "skittles-room",
        "version": crate::VERSION,
        "endpoints": [
            "/matchmaking/queue",
            "/matchmaking/cancel",
            "/games/{game_id}/result",
            "/ratings/{player_id}",
            "/health",
            "/ready",
            "/alive",
            "/metrics",
            "/stats"
        ]
    });

    Json(info)
}

/// Pairing request endpoint handler
async fn queue_handler(
    State(state): State<HttpServerState>,
    headers: HeaderMap,
    Json(body): Json<QueueApiRequest>,
) -> Response {
    let app_state = &state.app_state;

    if !app_state.rate_limiter().check(&body.player_id) {
        app_state.metrics_collector().service().rate_limited_total.inc();
        return error_response(
            MatchmakingError::RateLimited {
                key: body.player_id.clone(),
            }
            .into(),
        );
    }

    let auth_token = headers
        .get("x-auth-token")
        .and_then(|value| value.to_str().ok())
        .map(String::from);

    let request = PairingRequest {
        player_id: body.player_id,
        game_mode: body.game_mode,
        timestamp: crate::utils::current_timestamp(),
        auth_token,
    };

    match app_state.engine().handle_pairing_request(request).await {
        Ok(PairingOutcome::Matched { game }) => (
            StatusCode::OK,
            Json(json!({ "matched": true, "game": game })),
        )
            .into_response(),
        Ok(PairingOutcome::Queued) => (
            StatusCode::OK,
            Json(json!({ "matched": false, "queued": true })),
        )
            .into_response(),
        Err(e) => {
            if matches!(
                e.downcast_ref::<MatchmakingError>(),
                Some(MatchmakingError::Unauthenticated { .. })
            ) {
                app_state.metrics_collector().service().auth_failures_total.inc();
            }
            error_response(e)
        }
    }
}

/// Cancel endpoint handler
async fn cancel_handler(
    State(state): State<HttpServerState>,
    Json(body): Json<CancelApiRequest>,
) -> Response {
    match state.app_state.engine().cancel_search(&body.player_id).await {
        Ok(cancelled) => (StatusCode::OK, Json(json!({ "cancelled": cancelled }))).into_response(),
        Err(e) => error_response(e),
    }
}

/// Result reporting endpoint handler
async fn result_handler(
    State(state): State<HttpServerState>,
    Path(game_id): Path<Uuid>,
    Json(body): Json<ResultApiRequest>,
) -> Response {
    let result = GameResult {
        game_id,
        winner: body.winner,
    };

    match state.app_state.engine().report_result(result).await {
        Ok((white_change, black_change)) => (
            StatusCode::OK,
            Json(json!({
                "white": white_change,
                "black": black_change,
            })),
        )
            .into_response(),
        Err(e) => error_response(e),
    }
}

/// Rating lookup endpoint handler
async fn rating_handler(
    State(state): State<HttpServerState>,
    Path(player_id): Path<String>,
) -> Response {
    let app_state = &state.app_state;

    let entry = match app_state.ratings().get_rating(&player_id).await {
        Ok(entry) => entry,
        Err(e) => return error_response(e),
    };

    let (rating, games_played) = entry
        .map(|e| (e.rating, e.games_played))
        .unwrap_or((app_state.engine().calculator().initial_rating(), 0));

    let tier = app_state.tier_table().tier_for(rating).to_string();

    (
        StatusCode::OK,
        Json(json!({
            "player_id": player_id,
            "rating": rating,
            "games_played": games_played,
            "tier": tier,
        })),
    )
        .into_response()
}

/// Lightweight health check endpoint handler
async fn health_handler(State(state): State<HttpServerState>) -> impl IntoResponse {
    debug!("Health check requested");

    match HealthCheck::liveness_check(state.app_state.clone()).await {
        Ok(HealthStatus::Healthy) | Ok(HealthStatus::Degraded) => (
            StatusCode::OK,
            Json(json!({
                "status": "healthy",
                "service": "skittles-room",
                "version": crate::VERSION
            })),
        ),
        Ok(HealthStatus::Unhealthy) | Err(_) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({
                "status": "unhealthy",
                "service": "skittles-room",
                "version": crate::VERSION
            })),
        ),
    }
}

/// Readiness check endpoint handler
async fn ready_handler(State(state): State<HttpServerState>) -> impl IntoResponse {
    debug!("Readiness check requested");

    match HealthCheck::readiness_check(state.app_state.clone()).await {
        Ok(HealthStatus::Healthy) => (StatusCode::OK, "Ready"),
        Ok(HealthStatus::Degraded) => (StatusCode::OK, "Degraded but ready"),
        Ok(HealthStatus::Unhealthy) => (StatusCode::SERVICE_UNAVAILABLE, "Not ready"),
        Err(e) => {
            error!("Readiness check failed: {}", e);
            (StatusCode::SERVICE_UNAVAILABLE, "Not ready")
        }
    }
}

/// Liveness check endpoint handler
async fn alive_handler(State(state): State<HttpServerState>) -> impl IntoResponse {
    debug!("Liveness check requested");

    match HealthCheck::liveness_check(state.app_state.clone()).await {
        Ok(HealthStatus::Healthy) => (StatusCode::OK, "Alive"),
        _ => (StatusCode::SERVICE_UNAVAILABLE, "Not alive"),
    }
}

/// Prometheus metrics endpoint handler
async fn metrics_handler(State(state): State<HttpServerState>) -> impl IntoResponse {
    debug!("Metrics endpoint requested");

    let registry = state.app_state.metrics_collector().registry();
    let metric_families = registry.gather();
    let encoder = TextEncoder::new();

    match encoder.encode_to_string(&metric_families) {
        Ok(metrics_output) => Response::builder()
            .status(StatusCode::OK)
            .header("content-type", encoder.format_type())
            .body(metrics_output)
            .unwrap()
            .into_response(),
        Err(e) => {
            error!("Failed to encode metrics: {}", e);
            Response::builder()
                .status(StatusCode::INTERNAL_SERVER_ERROR)
                .body("Failed to encode metrics".to_string())
                .unwrap()
                .into_response()
        }
    }
}

/// Detailed service statistics endpoint handler
async fn stats_handler(State(state): State<HttpServerState>) -> Response {
    debug!("Stats endpoint requested");

    match HealthCheck::check(state.app_state.clone()).await {
        Ok(health) => (StatusCode::OK, Json(health)).into_response(),
        Err(e) => {
            error!("Stats check failed: {}", e);
            error_response(e)
        }
    }
}
