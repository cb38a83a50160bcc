//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Fetch attempt fails:
//!     → dispatcher consults the retry policy
//!     → backoff.rs computes the jittered delay before the next attempt
//! ```
//!
//! # Design Decisions
//! - Every network attempt has a hard deadline; timeouts feed the same
//!   retry loop as connection errors
//! - Jittered backoff prevents thundering herd
//! - Permanent client errors are never retried

pub mod backoff;

pub use backoff::{calculate_backoff, RetryPolicy};
