//! Error taxonomy for the data-access layer.
//!
//! # Design Decisions
//! - Transient and timeout failures are retried; permanent client errors
//!   are surfaced immediately as unavailable
//! - A cache miss is not an error, it is the `Unavailable` arm of
//!   `FetchOutcome`
//! - Errors are `Clone` so a single flight's result can be shared with
//!   every attached waiter

use std::time::Duration;
use thiserror::Error;

/// Failure of a content fetch attempt or liveness probe.
#[derive(Debug, Clone, Error)]
pub enum FetchError {
    /// Connection-level failure or server error worth retrying.
    #[error("transient network error: {0}")]
    Transient(String),

    /// The attempt exceeded its deadline.
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    /// Malformed request or other client error; retrying cannot help.
    #[error("permanent client error: {0}")]
    Permanent(String),
}

impl FetchError {
    /// Whether the retry loop should attempt again after this error.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, FetchError::Permanent(_))
    }
}
