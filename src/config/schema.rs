//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the
//! gateway. All types derive Serde traits for deserialization from config
//! files, and every section defaults so a minimal config works.

use serde::{Deserialize, Serialize};

/// Root configuration for the content gateway.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GatewayConfig {
    /// Upstream content service (base URL, liveness path).
    pub upstream: UpstreamConfig,

    /// Health check settings (poll cadence, hysteresis thresholds).
    pub health_check: HealthCheckConfig,

    /// Retry configuration for content fetches.
    pub retries: RetryConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Cache settings.
    pub cache: CacheConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Upstream content service configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Base URL of the content service (e.g., "http://127.0.0.1:8080").
    pub base_url: String,

    /// Path probed for liveness, relative to `base_url`.
    pub liveness_path: String,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8080".to_string(),
            liveness_path: "/health".to_string(),
        }
    }
}

/// Health check configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HealthCheckConfig {
    /// Enable the background liveness poll loop.
    pub enabled: bool,

    /// Poll interval in milliseconds.
    pub poll_interval_ms: u64,

    /// Probe timeout in milliseconds.
    pub probe_timeout_ms: u64,

    /// Number of consecutive failures before marking the backend offline.
    pub failure_threshold: u32,

    /// Number of consecutive successes before marking the backend online.
    pub success_threshold: u32,
}

impl Default for HealthCheckConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            poll_interval_ms: 5_000,
            probe_timeout_ms: 2_000,
            failure_threshold: 3,
            success_threshold: 1,
        }
    }
}

/// Retry configuration for content fetches.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Maximum number of attempts per fetch (initial call included).
    pub max_attempts: u32,

    /// Base delay for exponential backoff in milliseconds.
    pub base_delay_ms: u64,

    /// Maximum delay for exponential backoff in milliseconds.
    pub max_delay_ms: u64,

    /// Jitter applied to each delay, as a fraction of the delay.
    /// e.g., 0.1 spreads the delay by plus or minus 10%.
    pub jitter_ratio: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 100,
            max_delay_ms: 2_000,
            jitter_ratio: 0.1,
        }
    }
}

/// Timeout configuration for fetch attempts.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Hard deadline for a single network attempt in milliseconds.
    pub attempt_ms: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { attempt_ms: 10_000 }
    }
}

/// Cache configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Default TTL for cached content in milliseconds.
    pub default_ttl_ms: u64,

    /// Background sweep interval in milliseconds.
    pub sweep_interval_ms: u64,

    /// Hard retention ceiling as a multiple of each entry's TTL.
    /// Entries older than `retention_factor * ttl` are evicted by the
    /// sweep; younger stale entries stay readable as fallback.
    pub retention_factor: u32,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            default_ttl_ms: 300_000,
            sweep_interval_ms: 60_000,
            retention_factor: 10,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable the Prometheus metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
