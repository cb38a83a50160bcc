//! Status publication subsystem.

pub mod publisher;

pub use publisher::{StatusPublisher, StatusSubscription};
