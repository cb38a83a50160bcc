//! Service facade wiring the data-access subsystems together.
//!
//! An explicitly constructed instance replaces any module-level singleton:
//! background tasks (liveness poll loop, cache sweeper) start on
//! construction and are cancelled by `shutdown`.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tokio::sync::broadcast;
use tokio::time;

use crate::cache::CacheStore;
use crate::config::{validate_config, ConfigError, GatewayConfig};
use crate::dispatch::{FetchOutcome, RequestDispatcher};
use crate::error::FetchError;
use crate::health::{ApiHealth, ApiStatus, LivenessProbe};
use crate::lifecycle::Shutdown;
use crate::resilience::RetryPolicy;
use crate::status::{StatusPublisher, StatusSubscription};

/// Resilient access to the content service.
///
/// Content payloads are JSON documents; callers supply the loader that
/// issues the actual request and get back a tagged outcome, never an
/// unhandled failure.
pub struct ContentGateway {
    dispatcher: RequestDispatcher<Value>,
    cache: Arc<CacheStore<Value>>,
    publisher: StatusPublisher,
    shutdown: Shutdown,
}

impl ContentGateway {
    /// Validate the configuration, wire the subsystems, and start the
    /// background tasks.
    pub fn start(config: GatewayConfig) -> Result<Self, ConfigError> {
        validate_config(&config).map_err(ConfigError::Validation)?;

        let cache = Arc::new(CacheStore::new(config.cache.retention_factor));
        let probe = LivenessProbe::new(&config.upstream, &config.health_check);
        let health = Arc::new(ApiHealth::new(probe, config.health_check.clone()));
        let publisher = StatusPublisher::new(health.clone());
        let dispatcher = RequestDispatcher::new(
            cache.clone(),
            health.clone(),
            RetryPolicy::from(&config.retries),
            Duration::from_millis(config.timeouts.attempt_ms),
            Duration::from_millis(config.cache.default_ttl_ms),
        );

        let shutdown = Shutdown::new();
        tokio::spawn(health.clone().run(shutdown.subscribe()));
        spawn_sweeper(
            cache.clone(),
            Duration::from_millis(config.cache.sweep_interval_ms),
            shutdown.subscribe(),
        );

        tracing::info!(
            upstream = %config.upstream.base_url,
            poll_interval_ms = config.health_check.poll_interval_ms,
            "Content gateway started"
        );

        Ok(Self {
            dispatcher,
            cache,
            publisher,
            shutdown,
        })
    }

    /// Fetch a named resource with the default cache TTL.
    pub async fn fetch_resource<F, Fut>(&self, key: &str, loader: F) -> FetchOutcome<Value>
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value, FetchError>> + Send + 'static,
    {
        self.dispatcher.fetch(key, loader).await
    }

    /// Fetch a named resource with an explicit cache TTL.
    pub async fn fetch_resource_with_ttl<F, Fut>(
        &self,
        key: &str,
        ttl: Duration,
        loader: F,
    ) -> FetchOutcome<Value>
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value, FetchError>> + Send + 'static,
    {
        self.dispatcher.fetch_with_ttl(key, ttl, loader).await
    }

    /// Current reachability snapshot; never suspends.
    pub fn api_status(&self) -> ApiStatus {
        self.publisher.get_status()
    }

    /// Probe the backend immediately and return the updated status.
    pub async fn force_api_check(&self) -> ApiStatus {
        self.publisher.force_refresh().await
    }

    /// Invoke `callback` on every online/offline transition.
    pub fn subscribe_status<F>(&self, callback: F) -> StatusSubscription
    where
        F: FnMut(ApiStatus) + Send + 'static,
    {
        self.publisher.subscribe(callback)
    }

    /// Drop a cached resource.
    pub fn invalidate(&self, key: &str) {
        self.cache.invalidate(key);
    }

    /// Stop the background tasks. Idempotent.
    pub fn shutdown(&self) {
        tracing::info!("Content gateway shutting down");
        self.shutdown.trigger();
    }
}

fn spawn_sweeper(
    cache: Arc<CacheStore<Value>>,
    interval: Duration,
    mut shutdown: broadcast::Receiver<()>,
) {
    tokio::spawn(async move {
        let mut ticker = time::interval(interval);
        // interval fires immediately; nothing to sweep at startup
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let removed = cache.sweep_expired();
                    if removed > 0 {
                        tracing::debug!(removed, "Swept expired cache entries");
                    }
                }
                _ = shutdown.recv() => break,
            }
        }
    });
}
