//! Distributed cache tier backed by Redis.
//!
//! Values are JSON-serialized [`SummaryResponse`] payloads stored with
//! `SET EX`, so multiple service instances sharing one Redis see each
//! other's entries and Redis itself enforces expiry. Every error this
//! tier produces maps to [`SkaldError::CacheUnavailable`]; the hybrid
//! layer absorbs it and degrades to local-only.

use std::time::Duration;

use async_trait::async_trait;
use redis::AsyncCommands;
use tracing::{debug, warn};

use super::CacheStore;
use crate::types::{HealthStatus, SummaryResponse};
use crate::{Result, SkaldError};

/// Redis-backed cache tier, shared by all clones.
///
/// `ConnectionManager` multiplexes one connection and reconnects
/// automatically, so clones are cheap handles onto the same link.
#[derive(Clone)]
pub struct RedisCache {
    manager: redis::aio::ConnectionManager,
}

impl RedisCache {
    /// Connect to Redis at `url` (e.g. `redis://127.0.0.1:6379`).
    ///
    /// Fails with `CacheUnavailable` when the server cannot be reached;
    /// callers composing a hybrid cache typically keep going without
    /// the distributed tier in that case.
    pub async fn connect(url: &str) -> Result<Self> {
        let client = redis::Client::open(url)
            .map_err(|e| SkaldError::Configuration(format!("invalid redis url: {e}")))?;
        let manager = client
            .get_connection_manager()
            .await
            .map_err(store_err)?;
        debug!("redis cache connected");
        Ok(Self { manager })
    }

    /// Build directly from an existing connection manager.
    pub fn from_manager(manager: redis::aio::ConnectionManager) -> Self {
        Self { manager }
    }

    /// Round-trip a `PING` to check connectivity.
    pub async fn ping(&self) -> Result<()> {
        let mut conn = self.manager.clone();
        redis::cmd("PING")
            .query_async::<()>(&mut conn)
            .await
            .map_err(store_err)
    }
}

#[async_trait]
impl CacheStore for RedisCache {
    async fn get(&self, key: &str) -> Result<Option<SummaryResponse>> {
        let mut conn = self.manager.clone();
        let payload: Option<String> = conn.get(key).await.map_err(store_err)?;
        match payload {
            Some(json) => match serde_json::from_str(&json) {
                Ok(response) => Ok(Some(response)),
                Err(e) => {
                    // A corrupt payload is as good as absent; report it
                    // as unavailable so the caller falls back.
                    warn!(key, error = %e, "discarding undecodable cache payload");
                    Err(SkaldError::CacheUnavailable(format!(
                        "corrupt payload for {key}: {e}"
                    )))
                }
            },
            None => Ok(None),
        }
    }

    async fn set(&self, key: &str, value: &SummaryResponse, ttl: Duration) -> Result<()> {
        let payload = serde_json::to_string(value)?;
        let mut conn = self.manager.clone();
        let ttl_secs = ttl.as_secs().max(1);
        conn.set_ex::<_, _, ()>(key, payload, ttl_secs)
            .await
            .map_err(store_err)
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        let mut conn = self.manager.clone();
        let removed: i64 = conn.del(key).await.map_err(store_err)?;
        Ok(removed > 0)
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        let mut conn = self.manager.clone();
        conn.exists(key).await.map_err(store_err)
    }

    async fn ttl(&self, key: &str) -> Result<Option<Duration>> {
        let mut conn = self.manager.clone();
        // TTL returns -2 for a missing key, -1 for a key with no expiry.
        let secs: i64 = conn.ttl(key).await.map_err(store_err)?;
        if secs > 0 {
            Ok(Some(Duration::from_secs(secs as u64)))
        } else {
            Ok(None)
        }
    }

    async fn health(&self) -> HealthStatus {
        match self.ping().await {
            Ok(()) => HealthStatus::Healthy,
            Err(_) => HealthStatus::Unhealthy,
        }
    }
}

fn store_err(e: redis::RedisError) -> SkaldError {
    SkaldError::CacheUnavailable(e.to_string())
}
