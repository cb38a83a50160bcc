//! TTL-aware in-memory cache.

use std::time::{Duration, Instant};

use dashmap::DashMap;

use crate::observability::metrics;

/// Whether a cached value is still within its TTL window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Freshness {
    Fresh,
    Stale,
}

/// A single cached value with its expiry bookkeeping.
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    pub value: V,
    pub stored_at: Instant,
    pub ttl: Duration,
}

impl<V> CacheEntry<V> {
    pub fn freshness(&self) -> Freshness {
        if self.stored_at.elapsed() < self.ttl {
            Freshness::Fresh
        } else {
            Freshness::Stale
        }
    }
}

/// A thread-safe key-value store with per-entry expiry.
///
/// Staleness is a caller decision, not an error: `get` hands back stale
/// entries flagged as such so the dispatcher can serve them as degraded
/// fallback. Entries only leave the store via `invalidate` or the sweep.
pub struct CacheStore<V> {
    entries: DashMap<String, CacheEntry<V>>,
    /// Hard retention ceiling as a multiple of each entry's TTL.
    retention_factor: u32,
}

impl<V: Clone> CacheStore<V> {
    pub fn new(retention_factor: u32) -> Self {
        Self {
            entries: DashMap::new(),
            retention_factor,
        }
    }

    /// Read a value along with its freshness flag.
    pub fn get(&self, key: &str) -> Option<(V, Freshness)> {
        self.entries
            .get(key)
            .map(|entry| (entry.value.clone(), entry.freshness()))
    }

    /// Store a value, overwriting any previous entry for the key.
    pub fn set(&self, key: &str, value: V, ttl: Duration) {
        self.entries.insert(
            key.to_string(),
            CacheEntry {
                value,
                stored_at: Instant::now(),
                ttl,
            },
        );
        metrics::record_cache_size(self.entries.len());
    }

    /// Drop a single entry.
    pub fn invalidate(&self, key: &str) {
        self.entries.remove(key);
        metrics::record_cache_size(self.entries.len());
    }

    /// Remove entries older than the retention ceiling, returning how many
    /// were evicted. Stale entries inside the ceiling are kept as fallback.
    pub fn sweep_expired(&self) -> usize {
        let before = self.entries.len();
        let factor = self.retention_factor;
        self.entries
            .retain(|_, entry| entry.stored_at.elapsed() < entry.ttl * factor);
        let removed = before - self.entries.len();
        if removed > 0 {
            metrics::record_cache_size(self.entries.len());
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread::sleep;

    #[test]
    fn test_get_set_invalidate() {
        let cache: CacheStore<String> = CacheStore::new(10);

        assert!(cache.get("surah:1").is_none());

        cache.set("surah:1", "al-fatiha".into(), Duration::from_secs(60));
        let (value, freshness) = cache.get("surah:1").unwrap();
        assert_eq!(value, "al-fatiha");
        assert_eq!(freshness, Freshness::Fresh);

        cache.invalidate("surah:1");
        assert!(cache.get("surah:1").is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_entry_goes_stale_but_stays_readable() {
        let cache: CacheStore<u32> = CacheStore::new(10);
        cache.set("prayer-times", 5, Duration::from_millis(20));

        sleep(Duration::from_millis(40));

        let (value, freshness) = cache.get("prayer-times").unwrap();
        assert_eq!(value, 5);
        assert_eq!(freshness, Freshness::Stale);
    }

    #[test]
    fn test_sweep_respects_retention_ceiling() {
        let cache: CacheStore<u32> = CacheStore::new(3);
        cache.set("old", 1, Duration::from_millis(10));
        cache.set("young", 2, Duration::from_secs(60));

        // "old" passes 3x its TTL; "young" is nowhere near
        sleep(Duration::from_millis(50));

        assert_eq!(cache.sweep_expired(), 1);
        assert!(cache.get("old").is_none());
        assert!(cache.get("young").is_some());
    }

    #[test]
    fn test_sweep_keeps_stale_entries_inside_ceiling() {
        let cache: CacheStore<u32> = CacheStore::new(100);
        cache.set("k", 7, Duration::from_millis(10));

        sleep(Duration::from_millis(30));

        // stale, but well inside 100x ttl
        assert_eq!(cache.sweep_expired(), 0);
        let (_, freshness) = cache.get("k").unwrap();
        assert_eq!(freshness, Freshness::Stale);
    }
}
