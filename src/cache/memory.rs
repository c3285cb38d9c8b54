//! In-process cache tier: bounded LRU with per-entry TTL.
//!
//! The map and its recency order live behind one mutex; every operation
//! is a single critical section, so there is no check-then-act window
//! across threads. `get` on a live entry promotes it to most recently
//! used; `get` on an expired entry deletes it and reports a miss. A
//! `set` at capacity evicts the least recently used entry first.
//!
//! TTL expiry on read keeps correctness; a low-frequency sweep
//! ([`MemoryCache::spawn_sweeper`], every 5 minutes by default) bounds
//! memory for entries that are never read again.

use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use lru::LruCache;
use tracing::debug;

use super::{CacheStats, CacheStatsSnapshot, CacheStore};
use crate::types::{HealthStatus, SummaryResponse};
use crate::{Result, telemetry};

/// Configuration for the in-process cache tier.
#[derive(Debug, Clone)]
pub struct MemoryCacheConfig {
    /// Maximum number of live entries. Default: 1,000.
    pub max_entries: usize,
    /// TTL applied when the caller does not supply one. Default: 1 hour.
    pub default_ttl: Duration,
    /// Interval between expiry sweeps. Default: 5 minutes.
    pub sweep_interval: Duration,
}

impl Default for MemoryCacheConfig {
    fn default() -> Self {
        Self {
            max_entries: 1_000,
            default_ttl: Duration::from_secs(3600),
            sweep_interval: Duration::from_secs(300),
        }
    }
}

impl MemoryCacheConfig {
    /// Create a new config with sensible defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the maximum number of entries.
    pub fn max_entries(mut self, n: usize) -> Self {
        self.max_entries = n;
        self
    }

    /// Set the default TTL.
    pub fn default_ttl(mut self, ttl: Duration) -> Self {
        self.default_ttl = ttl;
        self
    }

    /// Set the expiry sweep interval.
    pub fn sweep_interval(mut self, interval: Duration) -> Self {
        self.sweep_interval = interval;
        self
    }
}

struct Entry {
    value: SummaryResponse,
    created_at: Instant,
    expires_at: Instant,
    access_count: u64,
    last_accessed: Instant,
}

impl Entry {
    fn new(value: SummaryResponse, ttl: Duration) -> Self {
        let now = Instant::now();
        Self {
            value,
            created_at: now,
            expires_at: now + ttl,
            access_count: 0,
            last_accessed: now,
        }
    }

    fn is_expired(&self) -> bool {
        Instant::now() > self.expires_at
    }

    fn remaining_ttl(&self) -> Duration {
        self.expires_at.saturating_duration_since(Instant::now())
    }
}

/// Point-in-time view of one entry's bookkeeping, for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntryInfo {
    /// Time since the entry was written.
    pub age: Duration,
    /// Remaining time-to-live.
    pub remaining_ttl: Duration,
    /// How many reads have hit this entry.
    pub access_count: u64,
    /// Time since the last read (or the write, if never read).
    pub idle: Duration,
}

struct Inner {
    entries: LruCache<String, Entry>,
    stats: CacheStatsSnapshot,
}

/// Bounded in-process LRU + TTL cache.
pub struct MemoryCache {
    inner: Mutex<Inner>,
    config: MemoryCacheConfig,
}

impl MemoryCache {
    /// Create an empty cache.
    ///
    /// # Panics
    ///
    /// Panics if `config.max_entries` is zero.
    pub fn new(config: MemoryCacheConfig) -> Self {
        let capacity =
            NonZeroUsize::new(config.max_entries).expect("cache capacity must be > 0");
        Self {
            inner: Mutex::new(Inner {
                entries: LruCache::new(capacity),
                stats: CacheStatsSnapshot::default(),
            }),
            config,
        }
    }

    /// The configured default TTL.
    pub fn default_ttl(&self) -> Duration {
        self.config.default_ttl
    }

    /// Number of live-or-expired entries currently held.
    pub fn len(&self) -> usize {
        self.inner.lock().expect("cache lock poisoned").entries.len()
    }

    /// Whether the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Inspect a live entry's bookkeeping without promoting it.
    ///
    /// Returns `None` for absent or expired entries.
    pub fn entry_info(&self, key: &str) -> Option<EntryInfo> {
        let inner = self.inner.lock().expect("cache lock poisoned");
        let entry = inner.entries.peek(key)?;
        if entry.is_expired() {
            return None;
        }
        Some(EntryInfo {
            age: entry.created_at.elapsed(),
            remaining_ttl: entry.remaining_ttl(),
            access_count: entry.access_count,
            idle: entry.last_accessed.elapsed(),
        })
    }

    /// Remove every entry, returning how many were dropped.
    pub fn clear(&self) -> usize {
        let mut inner = self.inner.lock().expect("cache lock poisoned");
        let count = inner.entries.len();
        inner.entries.clear();
        count
    }

    /// Remove all expired entries in one pass.
    ///
    /// Returns the number removed. Called periodically by the sweeper;
    /// also usable directly in tests.
    pub fn sweep_expired(&self) -> usize {
        let mut inner = self.inner.lock().expect("cache lock poisoned");
        let expired: Vec<String> = inner
            .entries
            .iter()
            .filter(|(_, entry)| entry.is_expired())
            .map(|(key, _)| key.clone())
            .collect();
        for key in &expired {
            inner.entries.pop(key);
        }
        let removed = expired.len();
        inner.stats.expired += removed as u64;
        if removed > 0 {
            metrics::counter!(telemetry::CACHE_EXPIRED_TOTAL).increment(removed as u64);
            debug!(removed, "expiry sweep removed entries");
        }
        removed
    }

    /// Spawn the background expiry sweep for this cache.
    ///
    /// Runs every `config.sweep_interval` on its own task; never blocks
    /// request-serving operations beyond the per-pass lock. The task
    /// ends when the returned handle is aborted or the runtime shuts
    /// down.
    pub fn spawn_sweeper(self: &Arc<Self>) -> tokio::task::JoinHandle<()> {
        let cache = Arc::clone(self);
        let every = cache.config.sweep_interval;
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            // The first tick fires immediately; skip it.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                cache.sweep_expired();
            }
        })
    }
}

impl Default for MemoryCache {
    fn default() -> Self {
        Self::new(MemoryCacheConfig::default())
    }
}

#[async_trait]
impl CacheStore for MemoryCache {
    async fn get(&self, key: &str) -> Result<Option<SummaryResponse>> {
        let mut inner = self.inner.lock().expect("cache lock poisoned");
        // Peek first: an expired entry must not be promoted.
        let expired = matches!(inner.entries.peek(key), Some(entry) if entry.is_expired());
        if expired {
            inner.entries.pop(key);
            inner.stats.misses += 1;
            inner.stats.expired += 1;
            metrics::counter!(telemetry::CACHE_EXPIRED_TOTAL).increment(1);
            metrics::counter!(telemetry::CACHE_MISSES_TOTAL, "tier" => "local").increment(1);
            return Ok(None);
        }
        // get_mut promotes the entry to most recently used.
        match inner.entries.get_mut(key) {
            Some(entry) => {
                entry.access_count += 1;
                entry.last_accessed = Instant::now();
                let value = entry.value.clone();
                inner.stats.hits += 1;
                metrics::counter!(telemetry::CACHE_HITS_TOTAL, "tier" => "local").increment(1);
                Ok(Some(value))
            }
            None => {
                inner.stats.misses += 1;
                metrics::counter!(telemetry::CACHE_MISSES_TOTAL, "tier" => "local")
                    .increment(1);
                Ok(None)
            }
        }
    }

    async fn set(&self, key: &str, value: &SummaryResponse, ttl: Duration) -> Result<()> {
        let mut inner = self.inner.lock().expect("cache lock poisoned");
        let entry = Entry::new(value.clone(), ttl);
        // push evicts the LRU entry when at capacity and the key is new.
        if let Some((evicted_key, _)) = inner.entries.push(key.to_string(), entry) {
            if evicted_key != key {
                inner.stats.evictions += 1;
                metrics::counter!(telemetry::CACHE_EVICTIONS_TOTAL).increment(1);
                debug!(key = %evicted_key, "evicted least recently used entry");
            }
        }
        inner.stats.sets += 1;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        let mut inner = self.inner.lock().expect("cache lock poisoned");
        let removed = inner.entries.pop(key).is_some();
        if removed {
            inner.stats.deletes += 1;
        }
        Ok(removed)
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        let mut inner = self.inner.lock().expect("cache lock poisoned");
        match inner.entries.peek(key) {
            Some(entry) if !entry.is_expired() => Ok(true),
            Some(_) => {
                inner.entries.pop(key);
                inner.stats.expired += 1;
                Ok(false)
            }
            None => Ok(false),
        }
    }

    async fn ttl(&self, key: &str) -> Result<Option<Duration>> {
        let inner = self.inner.lock().expect("cache lock poisoned");
        match inner.entries.peek(key) {
            Some(entry) if !entry.is_expired() => Ok(Some(entry.remaining_ttl())),
            _ => Ok(None),
        }
    }

    async fn health(&self) -> HealthStatus {
        // The local tier has no external dependency to fail.
        HealthStatus::Healthy
    }
}

impl CacheStats for MemoryCache {
    fn stats(&self) -> CacheStatsSnapshot {
        self.inner.lock().expect("cache lock poisoned").stats
    }

    fn reset_stats(&self) {
        self.inner.lock().expect("cache lock poisoned").stats = CacheStatsSnapshot::default();
    }
}
