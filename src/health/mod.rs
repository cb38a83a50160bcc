//! Health checking subsystem.
//!
//! # Data Flow
//! ```text
//! Poll loop (monitor.rs):
//!     Periodic timer
//!     → probe.rs liveness request
//!     → record_outcome on the state machine
//!
//! Fetch outcomes (dispatch):
//!     Success / exhausted failure observed
//!     → record_outcome on the same state machine
//!
//! State machine:
//!     Online ←→ Offline
//!     With thresholds to prevent flapping
//! ```
//!
//! # Design Decisions
//! - Active probes and passive fetch outcomes feed one state machine
//! - State transitions require consecutive successes/failures
//! - Counters reset on each opposite-direction sample

pub mod monitor;
pub mod probe;

pub use monitor::{ApiHealth, ApiStatus};
pub use probe::LivenessProbe;
