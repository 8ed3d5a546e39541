//! Bounded key-value cache with per-entry TTL and LRU eviction.
//!
//! [`CacheStore`] is the short-circuit layer in front of the strategy
//! chain: a hit returns immediately without touching the session tracker
//! or the rate limiter. It is generic over the record type and shared
//! across concurrent callers behind `Arc`.
//!
//! # Architecture
//!
//! - `HashMap` for entries plus a `VecDeque` of keys in access order
//!   (front = least recently used), both behind one `std::sync::Mutex`.
//!   The lock is never held across an await point.
//! - Expiry is lazy: an expired entry is treated as absent and removed
//!   by the same `get`/`has` call that observes it. [`CacheStore::cleanup`]
//!   performs the eager sweep.
//! - Eviction is strict LRU, evaluated at insertion time: while the store
//!   is at capacity, the front of the access-order queue is evicted before
//!   the new entry goes in.
//!
//! All operations are total over the key space; a miss is a valid,
//! non-error outcome. Invalid configuration is rejected at construction.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

use serde::Serialize;
use tokio::time::Instant;

use crate::telemetry;
use crate::{MuninnError, Result};

/// Configuration for a [`CacheStore`].
///
/// ```rust
/// # use muninn::CacheConfig;
/// # use std::time::Duration;
/// let config = CacheConfig::new()
///     .max_entries(500)
///     .default_ttl(Duration::from_secs(1800));
/// ```
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Maximum number of live entries. Default: 1,000.
    pub max_entries: usize,
    /// TTL applied by [`CacheStore::set`] when no explicit TTL is given.
    /// Default: 1 hour.
    pub default_ttl: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_entries: 1_000,
            default_ttl: Duration::from_secs(3600),
        }
    }
}

impl CacheConfig {
    /// Create a config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the maximum number of live entries.
    pub fn max_entries(mut self, n: usize) -> Self {
        self.max_entries = n;
        self
    }

    /// Set the default time-to-live.
    pub fn default_ttl(mut self, ttl: Duration) -> Self {
        self.default_ttl = ttl;
        self
    }

    fn validate(&self) -> Result<()> {
        if self.max_entries == 0 {
            return Err(MuninnError::Configuration(
                "cache max_entries must be positive".into(),
            ));
        }
        if self.default_ttl.is_zero() {
            return Err(MuninnError::Configuration(
                "cache default_ttl must be positive".into(),
            ));
        }
        Ok(())
    }
}

/// A single cached record. Owned exclusively by the store.
struct CacheEntry<T> {
    data: T,
    stored_at: Instant,
    ttl: Duration,
    hit_count: u64,
}

impl<T> CacheEntry<T> {
    fn is_expired(&self, now: Instant) -> bool {
        now.duration_since(self.stored_at) > self.ttl
    }
}

struct Inner<T> {
    entries: HashMap<String, CacheEntry<T>>,
    /// Keys in access order, front = least recently used.
    access_order: VecDeque<String>,
    hits: u64,
    inserts: u64,
}

impl<T> Inner<T> {
    /// Move `key` to the most-recently-used position.
    fn touch(&mut self, key: &str) {
        if let Some(pos) = self.access_order.iter().position(|k| k == key) {
            let k = self.access_order.remove(pos).expect("position just found");
            self.access_order.push_back(k);
        }
    }

    fn remove(&mut self, key: &str) -> Option<CacheEntry<T>> {
        let entry = self.entries.remove(key)?;
        if let Some(pos) = self.access_order.iter().position(|k| k == key) {
            self.access_order.remove(pos);
        }
        Some(entry)
    }
}

/// Read-only snapshot of cache state and accounting.
#[derive(Debug, Clone, Serialize)]
pub struct CacheStats {
    /// Live entries (expired-but-unswept entries included).
    pub size: usize,
    /// Configured capacity.
    pub max_entries: usize,
    /// Successful `get` calls since construction.
    pub hits: u64,
    /// New-key insertions since construction.
    pub inserts: u64,
    /// `hits / (hits + inserts)`, 0.0 before any activity.
    pub hit_rate: f64,
    /// Least-recently-used key, if any.
    pub lru_key: Option<String>,
    /// Most-recently-used key, if any.
    pub mru_key: Option<String>,
}

/// Bounded TTL + LRU cache, shared across callers.
///
/// Values must be `Clone`; `get` hands out clones so the store retains
/// exclusive ownership of its entries.
pub struct CacheStore<T> {
    max_entries: usize,
    default_ttl: Duration,
    inner: Mutex<Inner<T>>,
}

impl<T: Clone> CacheStore<T> {
    /// Create a store from the given configuration.
    ///
    /// Rejects non-positive capacity or TTL eagerly.
    pub fn new(config: CacheConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            max_entries: config.max_entries,
            default_ttl: config.default_ttl,
            inner: Mutex::new(Inner {
                entries: HashMap::new(),
                access_order: VecDeque::new(),
                hits: 0,
                inserts: 0,
            }),
        })
    }

    /// Insert or replace an entry under the default TTL.
    pub fn set(&self, key: &str, value: T) {
        self.set_with_ttl(key, value, self.default_ttl);
    }

    /// Insert or replace an entry with an explicit TTL.
    ///
    /// Replacement resets `stored_at` and the entry's hit count and moves
    /// the key to the most-recently-used position. A new key evicts from
    /// the LRU end until capacity allows the insertion.
    pub fn set_with_ttl(&self, key: &str, value: T, ttl: Duration) {
        let now = Instant::now();
        let mut inner = self.inner.lock().expect("cache lock poisoned");

        if inner.entries.contains_key(key) {
            inner.entries.insert(
                key.to_string(),
                CacheEntry {
                    data: value,
                    stored_at: now,
                    ttl,
                    hit_count: 0,
                },
            );
            inner.touch(key);
            return;
        }

        while inner.entries.len() >= self.max_entries {
            let Some(lru) = inner.access_order.pop_front() else {
                break;
            };
            inner.entries.remove(&lru);
            metrics::counter!(telemetry::CACHE_EVICTIONS_TOTAL).increment(1);
        }

        inner.entries.insert(
            key.to_string(),
            CacheEntry {
                data: value,
                stored_at: now,
                ttl,
                hit_count: 0,
            },
        );
        inner.access_order.push_back(key.to_string());
        inner.inserts += 1;
    }

    /// Look up a fresh entry.
    ///
    /// Counts as an access: bumps the entry's hit count, the store's hit
    /// accounting, and the key's position in the access order. An expired
    /// entry is removed and reported as a miss.
    pub fn get(&self, key: &str) -> Option<T> {
        let now = Instant::now();
        let mut inner = self.inner.lock().expect("cache lock poisoned");

        let fresh = match inner.entries.get(key) {
            None => {
                metrics::counter!(telemetry::CACHE_MISSES_TOTAL).increment(1);
                return None;
            }
            Some(entry) => !entry.is_expired(now),
        };
        if !fresh {
            inner.remove(key);
            metrics::counter!(telemetry::CACHE_MISSES_TOTAL).increment(1);
            return None;
        }

        let entry = inner.entries.get_mut(key).expect("entry just observed");
        entry.hit_count += 1;
        let data = entry.data.clone();
        inner.hits += 1;
        inner.touch(key);
        metrics::counter!(telemetry::CACHE_HITS_TOTAL).increment(1);
        Some(data)
    }

    /// Freshness check without access accounting.
    ///
    /// An expired entry is removed in the same call, as with `get`.
    pub fn has(&self, key: &str) -> bool {
        let now = Instant::now();
        let mut inner = self.inner.lock().expect("cache lock poisoned");
        let expired = match inner.entries.get(key) {
            None => return false,
            Some(entry) => entry.is_expired(now),
        };
        if expired {
            inner.remove(key);
            return false;
        }
        true
    }

    /// Remove an entry unconditionally. Returns whether one existed.
    pub fn delete(&self, key: &str) -> bool {
        let mut inner = self.inner.lock().expect("cache lock poisoned");
        inner.remove(key).is_some()
    }

    /// Eagerly sweep all expired entries, returning the removed count.
    pub fn cleanup(&self) -> usize {
        let now = Instant::now();
        let mut inner = self.inner.lock().expect("cache lock poisoned");
        let expired: Vec<String> = inner
            .entries
            .iter()
            .filter(|(_, e)| e.is_expired(now))
            .map(|(k, _)| k.clone())
            .collect();
        for key in &expired {
            inner.remove(key);
        }
        expired.len()
    }

    /// Fetch a fresh entry or compute, cache, and return one.
    ///
    /// The factory runs outside the store lock and only on a miss. No
    /// de-duplication across concurrent callers: two simultaneous misses
    /// may both invoke the factory, last write wins.
    pub fn get_or_set(&self, key: &str, ttl: Duration, factory: impl FnOnce() -> T) -> T {
        if let Some(value) = self.get(key) {
            return value;
        }
        let value = factory();
        self.set_with_ttl(key, value.clone(), ttl);
        value
    }

    /// Number of live entries (expired-but-unswept entries included).
    pub fn len(&self) -> usize {
        self.inner.lock().expect("cache lock poisoned").entries.len()
    }

    /// Whether the store holds no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot current size and accounting.
    pub fn stats(&self) -> CacheStats {
        let inner = self.inner.lock().expect("cache lock poisoned");
        let denominator = inner.hits + inner.inserts;
        CacheStats {
            size: inner.entries.len(),
            max_entries: self.max_entries,
            hits: inner.hits,
            inserts: inner.inserts,
            hit_rate: if denominator == 0 {
                0.0
            } else {
                inner.hits as f64 / denominator as f64
            },
            lru_key: inner.access_order.front().cloned(),
            mru_key: inner.access_order.back().cloned(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_cache(max: usize) -> CacheStore<u32> {
        CacheStore::new(CacheConfig::new().max_entries(max)).unwrap()
    }

    #[test]
    fn rejects_zero_capacity() {
        let result = CacheStore::<u32>::new(CacheConfig::new().max_entries(0));
        assert!(matches!(result, Err(MuninnError::Configuration(_))));
    }

    #[test]
    fn rejects_zero_ttl() {
        let result = CacheStore::<u32>::new(CacheConfig::new().default_ttl(Duration::ZERO));
        assert!(matches!(result, Err(MuninnError::Configuration(_))));
    }

    #[test]
    fn set_get_round_trip() {
        let cache = small_cache(10);
        cache.set("a", 1);
        assert_eq!(cache.get("a"), Some(1));
        assert_eq!(cache.get("b"), None);
    }

    #[test]
    fn replacement_resets_hit_count_and_keeps_size() {
        let cache = small_cache(10);
        cache.set("a", 1);
        cache.get("a");
        cache.set("a", 2);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get("a"), Some(2));
    }

    #[test]
    fn delete_reports_presence() {
        let cache = small_cache(10);
        cache.set("a", 1);
        assert!(cache.delete("a"));
        assert!(!cache.delete("a"));
        assert!(cache.is_empty());
    }

    #[test]
    fn has_does_not_affect_eviction_order() {
        let cache = small_cache(2);
        cache.set("a", 1);
        cache.set("b", 2);
        // `has` must not promote "a"; the next insert evicts it.
        assert!(cache.has("a"));
        cache.set("c", 3);
        assert_eq!(cache.get("a"), None);
        assert_eq!(cache.get("b"), Some(2));
        assert_eq!(cache.get("c"), Some(3));
    }

    #[test]
    fn get_or_set_computes_only_on_miss() {
        let cache = small_cache(10);
        let mut calls = 0;
        let v = cache.get_or_set("k", Duration::from_secs(60), || {
            calls += 1;
            7
        });
        assert_eq!(v, 7);
        let v = cache.get_or_set("k", Duration::from_secs(60), || {
            calls += 1;
            8
        });
        assert_eq!(v, 7);
        assert_eq!(calls, 1);
    }

    #[test]
    fn stats_track_order_and_hit_rate() {
        let cache = small_cache(10);
        cache.set("a", 1);
        cache.set("b", 2);
        cache.get("a");
        let stats = cache.stats();
        assert_eq!(stats.size, 2);
        assert_eq!(stats.max_entries, 10);
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.inserts, 2);
        assert!((stats.hit_rate - 1.0 / 3.0).abs() < f64::EPSILON);
        assert_eq!(stats.lru_key.as_deref(), Some("b"));
        assert_eq!(stats.mru_key.as_deref(), Some("a"));
    }

    #[test]
    fn empty_stats_have_zero_hit_rate() {
        let cache = small_cache(10);
        let stats = cache.stats();
        assert_eq!(stats.hit_rate, 0.0);
        assert!(stats.lru_key.is_none());
        assert!(stats.mru_key.is_none());
    }
}
