//! Backend reachability state machine and poll loop.

use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use arc_swap::ArcSwap;
use serde::Serialize;
use tokio::sync::broadcast;
use tokio::time;

use crate::config::HealthCheckConfig;
use crate::health::probe::LivenessProbe;
use crate::observability::metrics;

/// Snapshot of backend reachability as seen by consumers.
///
/// `is_online` only flips after the configured hysteresis threshold of
/// consecutive same-direction outcomes, never on a single sample.
#[derive(Debug, Clone, Serialize)]
pub struct ApiStatus {
    pub is_online: bool,
    pub consecutive_failures: u32,
    pub consecutive_successes: u32,
    /// Epoch milliseconds of the most recent recorded outcome.
    pub last_checked_at: Option<u64>,
    /// Detail of the current failure streak; cleared on success.
    pub last_error: Option<String>,
}

impl Default for ApiStatus {
    fn default() -> Self {
        // Optimistic start: the backend is assumed reachable until the
        // failure threshold says otherwise.
        Self {
            is_online: true,
            consecutive_failures: 0,
            consecutive_successes: 0,
            last_checked_at: None,
            last_error: None,
        }
    }
}

/// Owns the reachability state machine.
///
/// Writers (fetch outcomes, probe outcomes) serialize through a mutex;
/// readers get lock-free snapshots. Transitions are pushed on a broadcast
/// channel that fires only when `is_online` actually flips.
pub struct ApiHealth {
    status: Mutex<ApiStatus>,
    snapshot: ArcSwap<ApiStatus>,
    transitions: broadcast::Sender<ApiStatus>,
    /// In-flight forced check, if any. Concurrent force_check callers
    /// subscribe here instead of issuing duplicate probes.
    forced: Mutex<Option<broadcast::Sender<ApiStatus>>>,
    probe: LivenessProbe,
    config: HealthCheckConfig,
}

impl ApiHealth {
    pub fn new(probe: LivenessProbe, config: HealthCheckConfig) -> Self {
        let initial = ApiStatus::default();
        let (transitions, _) = broadcast::channel(16);

        Self {
            status: Mutex::new(initial.clone()),
            snapshot: ArcSwap::from_pointee(initial),
            transitions,
            forced: Mutex::new(None),
            probe,
            config,
        }
    }

    /// Non-blocking read of the current status.
    pub fn snapshot(&self) -> ApiStatus {
        self.snapshot.load_full().as_ref().clone()
    }

    /// Receiver that yields a status snapshot on every online/offline flip.
    pub fn subscribe_transitions(&self) -> broadcast::Receiver<ApiStatus> {
        self.transitions.subscribe()
    }

    /// Whether a forced check is currently probing.
    pub fn is_checking(&self) -> bool {
        self.forced.lock().expect("forced-check mutex poisoned").is_some()
    }

    /// Feed one success/failure sample into the state machine.
    ///
    /// Increments the matching counter, zeroes the opposite one, and flips
    /// `is_online` only once the configured threshold is crossed.
    pub fn record_outcome(&self, success: bool, error_detail: Option<String>) {
        let (current, flipped) = {
            let mut status = self.status.lock().expect("status mutex poisoned");
            if success {
                status.consecutive_failures = 0;
                status.consecutive_successes = status.consecutive_successes.saturating_add(1);
                status.last_error = None;
            } else {
                status.consecutive_successes = 0;
                status.consecutive_failures = status.consecutive_failures.saturating_add(1);
                status.last_error = error_detail;
            }
            status.last_checked_at = Some(epoch_ms());

            let flipped = if status.is_online
                && !success
                && status.consecutive_failures >= self.config.failure_threshold
            {
                status.is_online = false;
                true
            } else if !status.is_online
                && success
                && status.consecutive_successes >= self.config.success_threshold
            {
                status.is_online = true;
                true
            } else {
                false
            };

            (status.clone(), flipped)
        };

        self.snapshot.store(Arc::new(current.clone()));
        metrics::record_backend_online(current.is_online);

        if flipped {
            if current.is_online {
                tracing::info!(
                    successes = current.consecutive_successes,
                    "Content service recovered, status ONLINE"
                );
            } else {
                tracing::warn!(
                    failures = current.consecutive_failures,
                    error = ?current.last_error,
                    "Content service unreachable, status OFFLINE"
                );
            }
            metrics::record_status_transition(current.is_online);
            let _ = self.transitions.send(current);
        }
    }

    /// Probe immediately, outside the normal poll cadence.
    ///
    /// Single-flighted: while one forced check is probing, concurrent
    /// callers await its result instead of piling up redundant probes.
    /// The probe runs in its own task, so a caller abandoning its await
    /// never leaves the check stuck in flight.
    pub async fn force_check(self: Arc<Self>) -> ApiStatus {
        let mut rx = {
            let mut forced = self.forced.lock().expect("forced-check mutex poisoned");
            match forced.as_ref().map(|tx| tx.subscribe()) {
                Some(rx) => rx,
                None => {
                    let (tx, rx) = broadcast::channel(1);
                    *forced = Some(tx);

                    let health = self.clone();
                    tokio::spawn(async move {
                        let status = health.probe_once().await;
                        let tx = health
                            .forced
                            .lock()
                            .expect("forced-check mutex poisoned")
                            .take();
                        if let Some(tx) = tx {
                            let _ = tx.send(status);
                        }
                    });
                    rx
                }
            }
        };

        match rx.recv().await {
            Ok(status) => status,
            // The probe task died before sending; the state machine still
            // holds whatever was recorded last.
            Err(_) => self.snapshot(),
        }
    }

    /// Issue one probe and feed its outcome into the state machine.
    async fn probe_once(&self) -> ApiStatus {
        match self.probe.check().await {
            Ok(()) => {
                metrics::record_probe(true);
                self.record_outcome(true, None);
            }
            Err(e) => {
                tracing::warn!(error = %e, "Liveness probe failed");
                metrics::record_probe(false);
                self.record_outcome(false, Some(e.to_string()));
            }
        }
        self.snapshot()
    }

    /// Background poll loop; runs until shutdown.
    ///
    /// Ticks are skipped while a forced check is in flight so the backend
    /// is never double-probed. Probe errors are recorded, never propagated.
    pub async fn run(self: Arc<Self>, mut shutdown: broadcast::Receiver<()>) {
        if !self.config.enabled {
            tracing::info!("Background liveness polling disabled");
            return;
        }

        tracing::info!(
            interval_ms = self.config.poll_interval_ms,
            failure_threshold = self.config.failure_threshold,
            success_threshold = self.config.success_threshold,
            "Health monitor starting"
        );

        let mut ticker = time::interval(Duration::from_millis(self.config.poll_interval_ms));

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if self.is_checking() {
                        continue;
                    }
                    self.probe_once().await;
                }
                _ = shutdown.recv() => {
                    tracing::info!("Health monitor received shutdown signal, exiting loop");
                    break;
                }
            }
        }
    }
}

fn epoch_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
