//! Caching subsystem.
//!
//! # Design Decisions
//! - Stale reads are allowed and flagged, never refused
//! - Entries are written only by successful dispatch completions
//! - A background sweep bounds memory via a hard retention ceiling;
//!   no LRU pressure needed at this scale

pub mod store;

pub use store::{CacheEntry, CacheStore, Freshness};
