// SPDX-FileCopyrightText: 2026 Pixdrop Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Keyed cache with a fixed time-to-live and lazy expiry.
//!
//! Entries are fresh while `now - stored_at < ttl`. Stale entries are reported
//! as absent but stay in the map until the key is written again; there is no
//! background sweeper and no capacity bound, so memory grows with the number
//! of distinct keys ever written.
//!
//! Time is read from [`tokio::time::Instant`], which lets tests pause and
//! advance the clock.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use dashmap::DashMap;
use tokio::time::Instant;
use tracing::trace;

struct CacheEntry<V> {
    value: V,
    stored_at: Instant,
}

impl<V> CacheEntry<V> {
    fn is_fresh(&self, ttl: Duration, now: Instant) -> bool {
        now.saturating_duration_since(self.stored_at) < ttl
    }
}

/// A thread-safe string-keyed cache whose entries expire after a fixed TTL.
///
/// Values are cloned out on read, so large values should be wrapped in `Arc`.
pub struct TtlCache<V> {
    entries: DashMap<String, CacheEntry<V>>,
    ttl: Duration,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl<V: Clone> TtlCache<V> {
    /// Creates an empty cache with the given time-to-live.
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Returns the value for `key` if it was stored less than `ttl` ago.
    pub fn get(&self, key: &str) -> Option<V> {
        let now = Instant::now();
        let found = self
            .entries
            .get(key)
            .filter(|entry| entry.is_fresh(self.ttl, now))
            .map(|entry| entry.value.clone());

        if found.is_some() {
            self.hits.fetch_add(1, Ordering::Relaxed);
            trace!(key, "cache hit");
        } else {
            self.misses.fetch_add(1, Ordering::Relaxed);
            trace!(key, "cache miss");
        }
        found
    }

    /// Stores `value` under `key`, replacing any previous entry and restarting its TTL.
    pub fn set(&self, key: impl Into<String>, value: V) {
        self.entries.insert(
            key.into(),
            CacheEntry {
                value,
                stored_at: Instant::now(),
            },
        );
    }

    /// Number of stored entries, stale ones included.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Hit and miss counters since creation.
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entries: self.len(),
        }
    }
}

/// Statistics about cache usage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    /// Stored entries, stale ones included.
    pub entries: usize,
}

impl fmt::Display for CacheStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} entries ({} hits, {} misses)",
            self.entries, self.hits, self.misses
        )
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    #[tokio::test(start_paused = true)]
    async fn entry_is_fresh_until_ttl_elapses() {
        let cache = TtlCache::new(Duration::from_secs(300));
        cache.set("k", 1u32);

        tokio::time::advance(Duration::from_secs(299)).await;
        assert_eq!(cache.get("k"), Some(1));

        tokio::time::advance(Duration::from_secs(2)).await;
        assert_eq!(cache.get("k"), None);
    }

    #[tokio::test(start_paused = true)]
    async fn entry_expires_exactly_at_ttl() {
        let cache = TtlCache::new(Duration::from_secs(10));
        cache.set("k", "v".to_string());

        tokio::time::advance(Duration::from_secs(10)).await;
        assert_eq!(cache.get("k"), None);
    }

    #[tokio::test(start_paused = true)]
    async fn stale_entries_stay_until_overwritten() {
        let cache = TtlCache::new(Duration::from_secs(1));
        cache.set("k", 1u32);
        tokio::time::advance(Duration::from_secs(5)).await;

        assert_eq!(cache.get("k"), None);
        assert_eq!(cache.len(), 1);

        cache.set("k", 2);
        assert_eq!(cache.get("k"), Some(2));
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn set_restarts_ttl() {
        let cache = TtlCache::new(Duration::from_secs(10));
        cache.set("k", 1u32);
        tokio::time::advance(Duration::from_secs(8)).await;
        cache.set("k", 2);
        tokio::time::advance(Duration::from_secs(8)).await;

        assert_eq!(cache.get("k"), Some(2));
    }

    #[tokio::test]
    async fn missing_key_is_absent() {
        let cache: TtlCache<u32> = TtlCache::new(Duration::from_secs(10));
        assert_eq!(cache.get("nope"), None);
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn shared_values_are_not_copied() {
        let cache = TtlCache::new(Duration::from_secs(10));
        let value = Arc::new(vec![1u8; 1024]);
        cache.set("blob", Arc::clone(&value));

        let fetched = cache.get("blob").unwrap();
        assert!(Arc::ptr_eq(&fetched, &value));
    }

    #[tokio::test]
    async fn stats_count_hits_and_misses() {
        let cache = TtlCache::new(Duration::from_secs(10));
        cache.set("a", 1u32);
        cache.get("a");
        cache.get("a");
        cache.get("b");

        let stats = cache.stats();
        assert_eq!(stats.hits, 2);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.entries, 1);
        assert_eq!(stats.to_string(), "1 entries (2 hits, 1 misses)");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_writers_and_readers() {
        let cache = Arc::new(TtlCache::new(Duration::from_secs(60)));
        let mut handles = Vec::new();
        for i in 0..16u32 {
            let cache = Arc::clone(&cache);
            handles.push(tokio::spawn(async move {
                cache.set(format!("key_{}", i % 4), i);
                cache.get(&format!("key_{}", i % 4))
            }));
        }
        for handle in handles {
            assert!(handle.await.unwrap().is_some());
        }
        assert_eq!(cache.len(), 4);
    }
}
