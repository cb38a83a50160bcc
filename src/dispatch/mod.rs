//! Request dispatch subsystem.
//!
//! # Data Flow
//! ```text
//! Caller issues a named fetch:
//!     → fresh cache hit? return it, no network
//!     → in-flight fetch for the key? attach to it (single-flight)
//!     → otherwise spawn a flight: loader attempts with jittered backoff
//!         → success: cache write, health success, all waiters get Fresh
//!         → exhausted: health failure, cache fallback → Stale,
//!           or Unavailable when nothing is cached
//! ```
//!
//! # Design Decisions
//! - At most one concurrent loader invocation per key
//! - The flight runs in its own task: a caller abandoning its await
//!   detaches only that caller
//! - Callers always receive a tagged outcome, never a propagated error

pub mod dispatcher;

pub use dispatcher::{FetchOutcome, RequestDispatcher};
