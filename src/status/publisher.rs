//! Status publication for UI consumers.

use std::sync::Arc;

use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;

use crate::health::{ApiHealth, ApiStatus};

/// Bridges health monitor state to consumers (e.g., a degraded-service
/// banner): pull via snapshot, push via transition-only callbacks.
#[derive(Clone)]
pub struct StatusPublisher {
    health: Arc<ApiHealth>,
}

impl StatusPublisher {
    pub fn new(health: Arc<ApiHealth>) -> Self {
        Self { health }
    }

    /// Synchronous snapshot of the current status.
    pub fn get_status(&self) -> ApiStatus {
        self.health.snapshot()
    }

    /// Probe immediately and return the updated status.
    pub async fn force_refresh(&self) -> ApiStatus {
        self.health.clone().force_check().await
    }

    /// Invoke `callback` whenever `is_online` flips.
    ///
    /// Callbacks fire on transitions only, never on individual poll ticks,
    /// so a flapping-free backend produces no notification traffic. The
    /// returned handle unsubscribes on drop.
    pub fn subscribe<F>(&self, mut callback: F) -> StatusSubscription
    where
        F: FnMut(ApiStatus) + Send + 'static,
    {
        let mut rx = self.health.subscribe_transitions();
        let task = tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(status) => callback(status),
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::debug!(skipped, "Status subscriber lagged, resuming with latest");
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        });

        StatusSubscription { task }
    }
}

/// Keeps a status subscription alive; dropping it unsubscribes.
pub struct StatusSubscription {
    task: JoinHandle<()>,
}

impl StatusSubscription {
    pub fn unsubscribe(self) {
        self.task.abort();
    }
}

impl Drop for StatusSubscription {
    fn drop(&mut self) {
        self.task.abort();
    }
}
