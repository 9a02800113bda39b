//! Metrics and monitoring for the matchmaking service
//!
//! This module provides Prometheus metrics collection for the
//! matchmaking service. The HTTP endpoints that expose these metrics
//! live in the service layer.

pub mod collector;

pub use collector::{
    MatchMetrics, MetricsCollector, PerformanceMetrics, QueueMetrics, ServiceMetrics,
};
