//! Resilient data-access layer for a content-serving application.
//!
//! # Architecture Overview
//!
//! ```text
//!                ┌────────────────────────────────────────────────┐
//!                │                CONTENT GATEWAY                  │
//!                │                                                 │
//!  fetch(key)    │  ┌──────────┐     ┌───────────┐    ┌─────────┐ │
//!  ──────────────┼─▶│ dispatch │────▶│ resilience│───▶│ loader  │─┼──▶ Content
//!                │  │ (single- │     │ (backoff, │    │ (caller │ │    Service
//!                │  │  flight) │     │  retries) │    │  HTTP)  │ │
//!                │  └────┬─────┘     └───────────┘    └─────────┘ │
//!                │       │ fallback / fill                        │
//!                │       ▼                                        │
//!                │  ┌──────────┐     ┌───────────┐                │
//!  status/banner │  │  cache   │     │  health   │◀─ liveness ────┼──▶ /health
//!  ◀─────────────┼──│ (TTL +   │     │ (hysteres-│    probes      │
//!                │  │  sweep)  │     │  is, poll)│                │
//!                │  └──────────┘     └─────┬─────┘                │
//!                │                         ▼                      │
//!                │                   ┌───────────┐                │
//!                │                   │  status   │ pull + push    │
//!                │                   │ publisher │                │
//!                │                   └───────────┘                │
//!                └────────────────────────────────────────────────┘
//! ```

// Core subsystems
pub mod cache;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod health;
pub mod resilience;
pub mod status;

// Cross-cutting concerns
pub mod gateway;
pub mod lifecycle;
pub mod observability;

pub use config::GatewayConfig;
pub use dispatch::FetchOutcome;
pub use error::FetchError;
pub use gateway::ContentGateway;
pub use health::ApiStatus;
pub use lifecycle::Shutdown;
pub use status::StatusSubscription;
