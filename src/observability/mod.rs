//! Observability subsystem.
//!
//! # Design Decisions
//! - Structured logging via tracing; subscriber owned by the host app
//! - Metrics are cheap (atomic increments behind the metrics facade)
//! - The Prometheus exporter is opt-in

pub mod logging;
pub mod metrics;
