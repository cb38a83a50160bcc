//! Structured logging initialization.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::ObservabilityConfig;

/// Initialize the tracing subscriber for a host application.
///
/// `RUST_LOG` overrides the configured level. Safe to call more than once;
/// later calls are no-ops.
pub fn init_logging(config: &ObservabilityConfig) {
    let default_filter = format!("content_gateway={}", config.log_level);
    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}
