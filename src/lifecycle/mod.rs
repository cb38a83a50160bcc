//! Lifecycle management subsystem.
//!
//! # Design Decisions
//! - Background tasks start on gateway construction and stop on shutdown
//! - Each long-running task subscribes to one broadcast signal; no task
//!   is detached without a cancellation path

pub mod shutdown;

pub use shutdown::Shutdown;
