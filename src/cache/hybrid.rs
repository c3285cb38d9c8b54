//! Hybrid cache layer: distributed tier first, local tier always.
//!
//! # Read path
//!
//! `get` probes the distributed tier when it was reachable within the
//! last probe interval. A distributed hit is opportunistically promoted
//! into the local tier with a capped TTL before returning, so repeat
//! reads stay in-process. A distributed miss or failure falls back to
//! the local tier.
//!
//! # Write path
//!
//! `set` always writes the local tier (TTL capped at the local cap) and
//! writes the distributed tier with the full TTL only when currently
//! reachable. A distributed write failure demotes reachability and is
//! otherwise ignored: `set` succeeds as long as the local write does.
//!
//! # Availability probing
//!
//! Reachability is a flag refreshed by `PING` at most once per
//! cool-down interval (default 30s), so a down backend is not hammered
//! on every request. Any failed distributed read or write demotes the
//! flag immediately; the next successful probe promotes it.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde::Serialize;
use tracing::{debug, info, warn};

use super::{CacheStore, MemoryCache};
use crate::types::{HealthStatus, SummaryResponse};
use crate::{Result, telemetry};

/// Configuration for the hybrid cache composition.
#[derive(Debug, Clone)]
pub struct HybridCacheConfig {
    /// Minimum time between reachability probes. Default: 30s.
    pub probe_interval: Duration,
    /// Upper bound on TTLs used for the local tier, both on writes and
    /// on promotion of distributed hits. Default: 30 minutes.
    pub local_ttl_cap: Duration,
    /// TTL used when promoting a distributed hit whose remaining TTL
    /// cannot be determined. Default: 5 minutes.
    pub promotion_ttl: Duration,
}

impl Default for HybridCacheConfig {
    fn default() -> Self {
        Self {
            probe_interval: Duration::from_secs(30),
            local_ttl_cap: Duration::from_secs(1800),
            promotion_ttl: Duration::from_secs(300),
        }
    }
}

impl HybridCacheConfig {
    /// Create a new config with sensible defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the reachability probe cool-down.
    pub fn probe_interval(mut self, interval: Duration) -> Self {
        self.probe_interval = interval;
        self
    }

    /// Set the local-tier TTL cap.
    pub fn local_ttl_cap(mut self, cap: Duration) -> Self {
        self.local_ttl_cap = cap;
        self
    }

    /// Set the promotion TTL used when the remote TTL is unknown.
    pub fn promotion_ttl(mut self, ttl: Duration) -> Self {
        self.promotion_ttl = ttl;
        self
    }
}

/// Health of the composed cache, per tier.
#[derive(Debug, Clone, Serialize)]
pub struct HybridHealth {
    /// Overall status: degraded when only one tier is usable.
    pub status: HealthStatus,
    /// Local tier status.
    pub local: HealthStatus,
    /// Distributed tier status, absent when not configured.
    pub distributed: Option<HealthStatus>,
    /// Whether the distributed tier is currently considered reachable.
    pub distributed_reachable: bool,
}

struct ProbeState {
    reachable: bool,
    last_check: Option<Instant>,
}

/// Two cache tiers composed into one [`CacheStore`].
pub struct HybridCache {
    local: MemoryCache,
    remote: Option<Arc<dyn CacheStore>>,
    probe: Mutex<ProbeState>,
    config: HybridCacheConfig,
}

impl HybridCache {
    /// Compose a local tier with an optional distributed tier.
    ///
    /// With `remote` absent the hybrid degenerates to the local tier
    /// alone; every operation still works.
    pub fn new(
        local: MemoryCache,
        remote: Option<Arc<dyn CacheStore>>,
        config: HybridCacheConfig,
    ) -> Self {
        let has_remote = remote.is_some();
        Self {
            local,
            remote,
            probe: Mutex::new(ProbeState {
                // Optimistic until the first probe says otherwise.
                reachable: has_remote,
                last_check: None,
            }),
            config,
        }
    }

    /// Local-tier-only hybrid, for deployments without a shared store.
    pub fn local_only(local: MemoryCache) -> Self {
        Self::new(local, None, HybridCacheConfig::default())
    }

    /// Access the local tier, e.g. for stats or to spawn its sweeper.
    pub fn local(&self) -> &MemoryCache {
        &self.local
    }

    /// Whether the distributed tier may be used right now.
    ///
    /// Re-probes with a `PING`-equivalent health check at most once per
    /// probe interval; between probes the cached flag is authoritative.
    async fn remote_reachable(&self) -> bool {
        let Some(remote) = &self.remote else {
            return false;
        };

        let due = {
            let probe = self.probe.lock().expect("probe lock poisoned");
            match probe.last_check {
                Some(at) => at.elapsed() >= self.config.probe_interval,
                None => true,
            }
        };
        if !due {
            return self.probe.lock().expect("probe lock poisoned").reachable;
        }

        let healthy = remote.health().await == HealthStatus::Healthy;
        let mut probe = self.probe.lock().expect("probe lock poisoned");
        probe.last_check = Some(Instant::now());
        if healthy && !probe.reachable {
            info!("distributed cache tier is reachable again");
        } else if !healthy && probe.reachable {
            warn!("distributed cache tier became unreachable");
        }
        probe.reachable = healthy;
        healthy
    }

    /// Mark the distributed tier unreachable after a failed operation.
    ///
    /// The probe timestamp is refreshed too, so the flag holds until
    /// the next full probe interval passes.
    fn demote_remote(&self, context: &str, error: &crate::SkaldError) {
        warn!(error = %error, "distributed cache {context} failed, degrading to local tier");
        let mut probe = self.probe.lock().expect("probe lock poisoned");
        probe.reachable = false;
        probe.last_check = Some(Instant::now());
    }

    /// Promote a distributed hit into the local tier with a capped TTL.
    async fn promote(&self, key: &str, value: &SummaryResponse) {
        let remote = self.remote.as_ref().expect("promote requires a remote tier");
        let ttl = match remote.ttl(key).await {
            Ok(Some(remaining)) => remaining.min(self.config.local_ttl_cap),
            Ok(None) => self.config.promotion_ttl,
            Err(_) => self.config.promotion_ttl,
        };
        // Local writes cannot fail; ignore the Ok for symmetry.
        let _ = self.local.set(key, value, ttl).await;
        debug!(key, ttl_secs = ttl.as_secs(), "promoted distributed hit into local tier");
    }
}

#[async_trait]
impl CacheStore for HybridCache {
    async fn get(&self, key: &str) -> Result<Option<SummaryResponse>> {
        if self.remote_reachable().await {
            let remote = self.remote.as_ref().expect("reachable implies present");
            match remote.get(key).await {
                Ok(Some(value)) => {
                    metrics::counter!(telemetry::CACHE_HITS_TOTAL, "tier" => "distributed")
                        .increment(1);
                    self.promote(key, &value).await;
                    return Ok(Some(value));
                }
                Ok(None) => {
                    metrics::counter!(telemetry::CACHE_MISSES_TOTAL, "tier" => "distributed")
                        .increment(1);
                }
                Err(e) => self.demote_remote("get", &e),
            }
        }
        self.local.get(key).await
    }

    async fn set(&self, key: &str, value: &SummaryResponse, ttl: Duration) -> Result<()> {
        // The local tier always gets the value; it is the availability
        // floor of the whole layer.
        let local_ttl = ttl.min(self.config.local_ttl_cap);
        self.local.set(key, value, local_ttl).await?;

        if self.remote_reachable().await {
            let remote = self.remote.as_ref().expect("reachable implies present");
            if let Err(e) = remote.set(key, value, ttl).await {
                self.demote_remote("set", &e);
            }
        }
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        let mut removed = false;
        if self.remote_reachable().await {
            let remote = self.remote.as_ref().expect("reachable implies present");
            match remote.delete(key).await {
                Ok(r) => removed |= r,
                Err(e) => self.demote_remote("delete", &e),
            }
        }
        removed |= self.local.delete(key).await?;
        Ok(removed)
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        if self.remote_reachable().await {
            let remote = self.remote.as_ref().expect("reachable implies present");
            match remote.exists(key).await {
                Ok(true) => return Ok(true),
                Ok(false) => {}
                Err(e) => self.demote_remote("exists", &e),
            }
        }
        self.local.exists(key).await
    }

    async fn ttl(&self, key: &str) -> Result<Option<Duration>> {
        if self.remote_reachable().await {
            let remote = self.remote.as_ref().expect("reachable implies present");
            match remote.ttl(key).await {
                Ok(Some(remaining)) => return Ok(Some(remaining)),
                Ok(None) => {}
                Err(e) => self.demote_remote("ttl", &e),
            }
        }
        self.local.ttl(key).await
    }

    async fn health(&self) -> HealthStatus {
        self.full_health().await.status
    }
}

impl HybridCache {
    /// Per-tier health report.
    pub async fn full_health(&self) -> HybridHealth {
        let local = self.local.health().await;
        let distributed = match &self.remote {
            Some(remote) => Some(remote.health().await),
            None => None,
        };
        let reachable = self.probe.lock().expect("probe lock poisoned").reachable;

        let status = match (local, distributed) {
            (HealthStatus::Healthy, Some(HealthStatus::Healthy)) => HealthStatus::Healthy,
            (HealthStatus::Healthy, None) => HealthStatus::Healthy,
            (HealthStatus::Healthy, Some(_)) => HealthStatus::Degraded,
            (_, Some(HealthStatus::Healthy)) => HealthStatus::Degraded,
            _ => HealthStatus::Unhealthy,
        };
        HybridHealth {
            status,
            local,
            distributed,
            distributed_reachable: reachable,
        }
    }
}
