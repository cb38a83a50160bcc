//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (thresholds > 0, delays ordered, jitter in [0, 1])
//! - Check the upstream base URL actually parses
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GatewayConfig -> Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use url::Url;

use crate::config::schema::GatewayConfig;

/// A single semantic problem found in the configuration.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    InvalidBaseUrl(String),
    LivenessPathNotAbsolute(String),
    ZeroField(&'static str),
    DelayOrder { base_ms: u64, max_ms: u64 },
    JitterOutOfRange(f64),
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::InvalidBaseUrl(url) => {
                write!(f, "upstream.base_url is not a valid URL: {}", url)
            }
            ValidationError::LivenessPathNotAbsolute(path) => {
                write!(f, "upstream.liveness_path must start with '/': {}", path)
            }
            ValidationError::ZeroField(field) => write!(f, "{} must be greater than zero", field),
            ValidationError::DelayOrder { base_ms, max_ms } => write!(
                f,
                "retries.max_delay_ms ({}) must be >= retries.base_delay_ms ({})",
                max_ms, base_ms
            ),
            ValidationError::JitterOutOfRange(ratio) => {
                write!(f, "retries.jitter_ratio must be within [0, 1], got {}", ratio)
            }
        }
    }
}

/// Validate a configuration, collecting every problem found.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if Url::parse(&config.upstream.base_url).is_err() {
        errors.push(ValidationError::InvalidBaseUrl(config.upstream.base_url.clone()));
    }
    if !config.upstream.liveness_path.starts_with('/') {
        errors.push(ValidationError::LivenessPathNotAbsolute(
            config.upstream.liveness_path.clone(),
        ));
    }

    let hc = &config.health_check;
    if hc.poll_interval_ms == 0 {
        errors.push(ValidationError::ZeroField("health_check.poll_interval_ms"));
    }
    if hc.probe_timeout_ms == 0 {
        errors.push(ValidationError::ZeroField("health_check.probe_timeout_ms"));
    }
    if hc.failure_threshold == 0 {
        errors.push(ValidationError::ZeroField("health_check.failure_threshold"));
    }
    if hc.success_threshold == 0 {
        errors.push(ValidationError::ZeroField("health_check.success_threshold"));
    }

    let retries = &config.retries;
    if retries.max_attempts == 0 {
        errors.push(ValidationError::ZeroField("retries.max_attempts"));
    }
    if retries.max_delay_ms < retries.base_delay_ms {
        errors.push(ValidationError::DelayOrder {
            base_ms: retries.base_delay_ms,
            max_ms: retries.max_delay_ms,
        });
    }
    if !(0.0..=1.0).contains(&retries.jitter_ratio) {
        errors.push(ValidationError::JitterOutOfRange(retries.jitter_ratio));
    }

    if config.timeouts.attempt_ms == 0 {
        errors.push(ValidationError::ZeroField("timeouts.attempt_ms"));
    }
    if config.cache.default_ttl_ms == 0 {
        errors.push(ValidationError::ZeroField("cache.default_ttl_ms"));
    }
    if config.cache.sweep_interval_ms == 0 {
        errors.push(ValidationError::ZeroField("cache.sweep_interval_ms"));
    }
    if config.cache.retention_factor == 0 {
        errors.push(ValidationError::ZeroField("cache.retention_factor"));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
