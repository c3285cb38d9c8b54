//! Caching subsystem.
//!
//! Two tiers behind one composition:
//!
//! - [`MemoryCache`] — bounded in-process LRU + TTL store. Always
//!   available; the tier of last resort.
//!
//! - [`RedisCache`] — optional distributed store shared across service
//!   instances. May be down; every error it produces maps to the
//!   non-fatal cache-unavailable class.
//!
//! - [`HybridCache`] — composes the two into one [`CacheStore`]: reads
//!   probe the distributed tier first (when reachable) and promote hits
//!   into the local tier; writes always land locally and best-effort
//!   remotely. Distributed failures degrade to local-only and never
//!   reach the caller.
//!
//! Capabilities are split into small traits ([`CacheStore`],
//! [`CacheStats`]) combined per-implementation rather than one wide
//! interface; consumers depend only on what they call.

pub mod hybrid;
pub mod memory;
pub mod redis;

pub use hybrid::{HybridCache, HybridCacheConfig, HybridHealth};
pub use memory::{EntryInfo, MemoryCache, MemoryCacheConfig};
pub use self::redis::RedisCache;

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;

use crate::Result;
use crate::types::{HealthStatus, SummaryResponse};

/// Core cache capability: keyed summary storage with per-entry TTL.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Look up a cached response. `Ok(None)` is a miss; expired entries
    /// are misses.
    async fn get(&self, key: &str) -> Result<Option<SummaryResponse>>;

    /// Store a response under `key` for `ttl`. Replaces any existing
    /// entry wholesale; entries are never mutated in place.
    async fn set(&self, key: &str, value: &SummaryResponse, ttl: Duration) -> Result<()>;

    /// Remove an entry. Returns whether something was removed.
    async fn delete(&self, key: &str) -> Result<bool>;

    /// Whether a live (non-expired) entry exists for `key`.
    async fn exists(&self, key: &str) -> Result<bool>;

    /// Remaining time-to-live for a live entry, `None` when absent.
    async fn ttl(&self, key: &str) -> Result<Option<Duration>>;

    /// Current health of this store.
    async fn health(&self) -> HealthStatus;
}

/// Operation counters for a cache tier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStatsSnapshot {
    pub hits: u64,
    pub misses: u64,
    pub sets: u64,
    pub deletes: u64,
    pub evictions: u64,
    pub expired: u64,
}

impl CacheStatsSnapshot {
    /// Hit rate over all lookups, 0.0 when no lookups happened.
    pub fn hit_rate(&self) -> f64 {
        let lookups = self.hits + self.misses;
        if lookups == 0 {
            0.0
        } else {
            self.hits as f64 / lookups as f64
        }
    }
}

/// Statistics capability, implemented by tiers that track counters.
pub trait CacheStats {
    /// Snapshot of the operation counters.
    fn stats(&self) -> CacheStatsSnapshot;

    /// Reset all counters to zero.
    fn reset_stats(&self);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hit_rate_of_empty_stats_is_zero() {
        assert_eq!(CacheStatsSnapshot::default().hit_rate(), 0.0);
    }

    #[test]
    fn hit_rate_counts_only_lookups() {
        let stats = CacheStatsSnapshot {
            hits: 3,
            misses: 1,
            sets: 100,
            ..Default::default()
        };
        assert_eq!(stats.hit_rate(), 0.75);
    }
}
