//! Resilient fetch execution.

use std::future::Future;
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tokio::sync::Notify;
use tokio::time;
use tracing::Instrument;
use uuid::Uuid;

use crate::cache::{CacheStore, Freshness};
use crate::error::FetchError;
use crate::health::ApiHealth;
use crate::observability::metrics;
use crate::resilience::{calculate_backoff, RetryPolicy};

/// Tagged result of a resilient fetch.
///
/// Callers always receive one of these, never a propagated error: a live
/// value, a cached fallback, or an explicit unavailable outcome.
#[derive(Debug, Clone)]
pub enum FetchOutcome<V> {
    /// Live value from the network (or a cache hit within TTL).
    Fresh(V),
    /// Cached fallback served after the network fetch was exhausted.
    Stale(V),
    /// Fetch exhausted and no cached fallback exists.
    Unavailable(FetchError),
}

impl<V> FetchOutcome<V> {
    pub fn data(&self) -> Option<&V> {
        match self {
            FetchOutcome::Fresh(value) | FetchOutcome::Stale(value) => Some(value),
            FetchOutcome::Unavailable(_) => None,
        }
    }

    pub fn into_data(self) -> Option<V> {
        match self {
            FetchOutcome::Fresh(value) | FetchOutcome::Stale(value) => Some(value),
            FetchOutcome::Unavailable(_) => None,
        }
    }

    /// True for anything other than a fresh value; drives the UI banner.
    pub fn is_degraded(&self) -> bool {
        !matches!(self, FetchOutcome::Fresh(_))
    }
}

/// One in-flight fetch, shared by every caller of the same key.
///
/// The settled outcome lands in `result` before waiters are woken, so the
/// check-then-wait loop in `fetch_with_ttl` can never miss it.
struct Flight<V> {
    result: OnceLock<FetchOutcome<V>>,
    done: Notify,
}

impl<V> Flight<V> {
    fn new() -> Self {
        Self {
            result: OnceLock::new(),
            done: Notify::new(),
        }
    }
}

/// Turns a logical content fetch into a resilient result.
///
/// Guarantees at most one concurrent loader invocation per key, retries
/// transient failures with jittered backoff, and falls back to the cache
/// when the network is exhausted. Every completion feeds the health
/// state machine.
pub struct RequestDispatcher<V> {
    cache: Arc<CacheStore<V>>,
    health: Arc<ApiHealth>,
    policy: RetryPolicy,
    attempt_timeout: Duration,
    default_ttl: Duration,
    in_flight: Arc<DashMap<String, Arc<Flight<V>>>>,
}

impl<V> Clone for RequestDispatcher<V> {
    fn clone(&self) -> Self {
        Self {
            cache: self.cache.clone(),
            health: self.health.clone(),
            policy: self.policy.clone(),
            attempt_timeout: self.attempt_timeout,
            default_ttl: self.default_ttl,
            in_flight: self.in_flight.clone(),
        }
    }
}

impl<V> RequestDispatcher<V>
where
    V: Clone + Send + Sync + 'static,
{
    pub fn new(
        cache: Arc<CacheStore<V>>,
        health: Arc<ApiHealth>,
        policy: RetryPolicy,
        attempt_timeout: Duration,
        default_ttl: Duration,
    ) -> Self {
        Self {
            cache,
            health,
            policy,
            attempt_timeout,
            default_ttl,
            in_flight: Arc::new(DashMap::new()),
        }
    }

    /// Fetch with the dispatcher's default cache TTL.
    pub async fn fetch<F, Fut>(&self, key: &str, loader: F) -> FetchOutcome<V>
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<V, FetchError>> + Send + 'static,
    {
        self.fetch_with_ttl(key, self.default_ttl, loader).await
    }

    /// Fetch with an explicit cache TTL for this key.
    pub async fn fetch_with_ttl<F, Fut>(&self, key: &str, ttl: Duration, loader: F) -> FetchOutcome<V>
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<V, FetchError>> + Send + 'static,
    {
        // A fresh cache hit never touches the network or the health state.
        if let Some((value, Freshness::Fresh)) = self.cache.get(key) {
            metrics::record_fetch("hit");
            return FetchOutcome::Fresh(value);
        }

        let flight = match self.in_flight.entry(key.to_string()) {
            Entry::Occupied(entry) => entry.get().clone(),
            Entry::Vacant(entry) => {
                let flight = Arc::new(Flight::new());
                entry.insert(flight.clone());
                self.spawn_flight(key.to_string(), ttl, loader, flight.clone());
                flight
            }
        };

        // Dropping this future detaches only this caller; the flight task
        // keeps retrying for everyone still attached.
        loop {
            let notified = flight.done.notified();
            if let Some(outcome) = flight.result.get() {
                return outcome.clone();
            }
            notified.await;
        }
    }

    fn spawn_flight<F, Fut>(&self, key: String, ttl: Duration, loader: F, flight: Arc<Flight<V>>)
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<V, FetchError>> + Send + 'static,
    {
        let cache = self.cache.clone();
        let health = self.health.clone();
        let policy = self.policy.clone();
        let attempt_timeout = self.attempt_timeout;
        let in_flight = self.in_flight.clone();

        let span = tracing::debug_span!("fetch_flight", key = %key, flight = %Uuid::new_v4());
        tokio::spawn(
            async move {
                let outcome =
                    run_attempts(&key, ttl, &loader, &cache, &health, &policy, attempt_timeout)
                        .await;

                // Remove the entry before waking waiters so a follow-up
                // fetch starts a new flight rather than observing a
                // settled one.
                in_flight.remove(&key);
                let _ = flight.result.set(outcome);
                flight.done.notify_waiters();
            }
            .instrument(span),
        );
    }
}

/// Attempt loop: up to `max_attempts` loader calls with jittered backoff
/// between them, then cache fallback on exhaustion.
async fn run_attempts<V, F, Fut>(
    key: &str,
    ttl: Duration,
    loader: &F,
    cache: &CacheStore<V>,
    health: &ApiHealth,
    policy: &RetryPolicy,
    attempt_timeout: Duration,
) -> FetchOutcome<V>
where
    V: Clone,
    F: Fn() -> Fut,
    Fut: Future<Output = Result<V, FetchError>>,
{
    let mut last_error = FetchError::Transient("no attempts made".to_string());

    for attempt in 0..policy.max_attempts {
        let delay = calculate_backoff(policy, attempt);
        if !delay.is_zero() {
            time::sleep(delay).await;
        }

        let result = match time::timeout(attempt_timeout, loader()).await {
            Ok(outcome) => outcome,
            Err(_) => Err(FetchError::Timeout(attempt_timeout)),
        };

        match result {
            Ok(value) => {
                cache.set(key, value.clone(), ttl);
                health.record_outcome(true, None);
                metrics::record_fetch("fresh");
                return FetchOutcome::Fresh(value);
            }
            Err(e) => {
                tracing::debug!(key, attempt, error = %e, "Fetch attempt failed");
                let retryable = e.is_retryable();
                last_error = e;
                if !retryable {
                    break;
                }
            }
        }
    }

    health.record_outcome(false, Some(last_error.to_string()));

    match cache.get(key) {
        Some((value, freshness)) => {
            tracing::debug!(key, ?freshness, "Serving cached fallback after exhausted fetch");
            metrics::record_fetch("stale");
            FetchOutcome::Stale(value)
        }
        None => {
            metrics::record_fetch("unavailable");
            FetchOutcome::Unavailable(last_error)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{HealthCheckConfig, UpstreamConfig};
    use crate::health::LivenessProbe;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn test_dispatcher() -> RequestDispatcher<String> {
        let config = HealthCheckConfig::default();
        let probe = LivenessProbe::new(&UpstreamConfig::default(), &config);
        let health = Arc::new(ApiHealth::new(probe, config));
        let cache = Arc::new(CacheStore::new(10));
        let policy = RetryPolicy {
            max_attempts: 3,
            base_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(5),
            jitter_ratio: 0.0,
        };
        RequestDispatcher::new(
            cache,
            health,
            policy,
            Duration::from_secs(1),
            Duration::from_secs(60),
        )
    }

    #[tokio::test]
    async fn test_concurrent_fetches_invoke_loader_once() {
        let dispatcher = test_dispatcher();
        let calls = Arc::new(AtomicU32::new(0));

        let loader = {
            let calls = calls.clone();
            move || {
                let calls = calls.clone();
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    time::sleep(Duration::from_millis(50)).await;
                    Ok("juz-amma".to_string())
                }
            }
        };

        let (a, b, c) = tokio::join!(
            dispatcher.fetch("quran:30", loader.clone()),
            dispatcher.fetch("quran:30", loader.clone()),
            dispatcher.fetch("quran:30", loader),
        );

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        for outcome in [a, b, c] {
            assert!(matches!(outcome, FetchOutcome::Fresh(ref v) if v == "juz-amma"));
        }
    }

    #[tokio::test]
    async fn test_fresh_cache_hit_skips_loader() {
        let dispatcher = test_dispatcher();
        let calls = Arc::new(AtomicU32::new(0));

        let loader = {
            let calls = calls.clone();
            move || {
                let calls = calls.clone();
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok("bukhari".to_string())
                }
            }
        };

        dispatcher.fetch("hadith:1", loader.clone()).await;
        let second = dispatcher.fetch("hadith:1", loader).await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(!second.is_degraded());
    }

    #[tokio::test]
    async fn test_expired_ttl_reinvokes_loader() {
        let dispatcher = test_dispatcher();
        let calls = Arc::new(AtomicU32::new(0));

        let loader = {
            let calls = calls.clone();
            move || {
                let calls = calls.clone();
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok("asr".to_string())
                }
            }
        };

        dispatcher
            .fetch_with_ttl("times:today", Duration::from_millis(20), loader.clone())
            .await;
        time::sleep(Duration::from_millis(50)).await;
        dispatcher
            .fetch_with_ttl("times:today", Duration::from_millis(20), loader)
            .await;

        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_exhausted_failure_serves_stale_fallback() {
        let dispatcher = test_dispatcher();

        dispatcher
            .fetch_with_ttl("surah:2", Duration::from_millis(10), || async {
                Ok("al-baqara".to_string())
            })
            .await;
        time::sleep(Duration::from_millis(30)).await;

        let attempts = Arc::new(AtomicU32::new(0));
        let outcome = {
            let attempts = attempts.clone();
            dispatcher
                .fetch_with_ttl("surah:2", Duration::from_millis(10), move || {
                    let attempts = attempts.clone();
                    async move {
                        attempts.fetch_add(1, Ordering::SeqCst);
                        Err(FetchError::Transient("connection reset".into()))
                    }
                })
                .await
        };

        assert_eq!(attempts.load(Ordering::SeqCst), 3, "all attempts exhausted");
        assert!(outcome.is_degraded());
        assert!(matches!(outcome, FetchOutcome::Stale(ref v) if v == "al-baqara"));
    }

    #[tokio::test]
    async fn test_exhausted_failure_without_cache_is_unavailable() {
        let dispatcher = test_dispatcher();

        let outcome = dispatcher
            .fetch("missing", || async {
                Err(FetchError::Transient("connection refused".into()))
            })
            .await;

        assert!(outcome.data().is_none());
        assert!(matches!(outcome, FetchOutcome::Unavailable(_)));
    }

    #[tokio::test]
    async fn test_permanent_error_bypasses_retry() {
        let dispatcher = test_dispatcher();
        let calls = Arc::new(AtomicU32::new(0));

        let outcome = {
            let calls = calls.clone();
            dispatcher
                .fetch("bad-request", move || {
                    let calls = calls.clone();
                    async move {
                        calls.fetch_add(1, Ordering::SeqCst);
                        Err(FetchError::Permanent("malformed key".into()))
                    }
                })
                .await
        };

        assert_eq!(calls.load(Ordering::SeqCst), 1, "permanent errors are not retried");
        assert!(matches!(
            outcome,
            FetchOutcome::Unavailable(FetchError::Permanent(_))
        ));
    }

    #[tokio::test]
    async fn test_attempt_timeout_counts_as_failure() {
        let dispatcher = {
            let config = HealthCheckConfig::default();
            let probe = LivenessProbe::new(&UpstreamConfig::default(), &config);
            let health = Arc::new(ApiHealth::new(probe, config));
            RequestDispatcher::new(
                Arc::new(CacheStore::new(10)),
                health,
                RetryPolicy {
                    max_attempts: 2,
                    base_delay: Duration::from_millis(1),
                    max_delay: Duration::from_millis(2),
                    jitter_ratio: 0.0,
                },
                Duration::from_millis(20),
                Duration::from_secs(60),
            )
        };

        let outcome = dispatcher
            .fetch("slow", || async {
                time::sleep(Duration::from_secs(5)).await;
                Ok("never".to_string())
            })
            .await;

        assert!(matches!(
            outcome,
            FetchOutcome::Unavailable(FetchError::Timeout(_))
        ));
    }

    #[tokio::test]
    async fn test_exhausted_fetches_drive_health_offline() {
        let dispatcher = test_dispatcher();

        // failure_threshold defaults to 3; each exhausted fetch records one
        // failure outcome
        for i in 0..3 {
            let key = format!("doomed:{}", i);
            dispatcher
                .fetch(&key, || async { Err(FetchError::Transient("down".into())) })
                .await;
        }

        assert!(!dispatcher.health.snapshot().is_online);
    }

    #[tokio::test]
    async fn test_in_flight_entry_removed_after_settle() {
        let dispatcher = test_dispatcher();

        dispatcher
            .fetch("k", || async { Err(FetchError::Transient("down".into())) })
            .await;

        assert!(dispatcher.in_flight.is_empty());
    }
}
