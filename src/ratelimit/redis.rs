//! Distributed sliding-window backend on Redis sorted sets.
//!
//! Each (identifier, window) key is a sorted set whose members score
//! their admission time in integer milliseconds. The whole
//! prune/count/add/expire sequence runs as one server-side script, so
//! concurrent service instances sharing the backend cannot interleave
//! between the count and the add. The key expires one window after the
//! last admission, bounding memory for idle callers on the Redis side.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use super::{RateDecision, RateLimitBackend, window_key};
use crate::{Result, SkaldError};

/// Prune expired members, count, and admit if under the limit.
///
/// KEYS[1] = window key
/// ARGV[1] = cutoff score (ms), ARGV[2] = limit, ARGV[3] = now score (ms),
/// ARGV[4] = unique member, ARGV[5] = key expiry (s)
///
/// Returns {allowed (0|1), count before add, oldest retained score (ms)}.
const CHECK_SCRIPT: &str = r#"
redis.call('ZREMRANGEBYSCORE', KEYS[1], 0, ARGV[1])
local count = redis.call('ZCARD', KEYS[1])
local allowed = 0
if count < tonumber(ARGV[2]) then
    redis.call('ZADD', KEYS[1], ARGV[3], ARGV[4])
    redis.call('EXPIRE', KEYS[1], ARGV[5])
    allowed = 1
end
local oldest = redis.call('ZRANGE', KEYS[1], 0, 0, 'WITHSCORES')
local oldest_score = tonumber(ARGV[3])
if oldest[2] then
    oldest_score = tonumber(oldest[2])
end
return {allowed, count, oldest_score}
"#;

/// Redis-backed sliding-window counter shared across instances.
pub struct RedisRateLimiter {
    manager: redis::aio::ConnectionManager,
    script: redis::Script,
    /// Disambiguates members admitted within the same millisecond.
    sequence: AtomicU64,
}

impl RedisRateLimiter {
    /// Connect to Redis at `url`.
    pub async fn connect(url: &str) -> Result<Self> {
        let client = redis::Client::open(url)
            .map_err(|e| SkaldError::Configuration(format!("invalid redis url: {e}")))?;
        let manager = client
            .get_connection_manager()
            .await
            .map_err(backend_err)?;
        Ok(Self::from_manager(manager))
    }

    /// Build directly from an existing connection manager.
    pub fn from_manager(manager: redis::aio::ConnectionManager) -> Self {
        Self {
            manager,
            script: redis::Script::new(CHECK_SCRIPT),
            sequence: AtomicU64::new(0),
        }
    }
}

#[async_trait]
impl RateLimitBackend for RedisRateLimiter {
    async fn check(
        &self,
        identifier: &str,
        limit: u32,
        window: Duration,
    ) -> Result<RateDecision> {
        let key = window_key(identifier, window);
        let now_ms = super::epoch_seconds_f64() * 1000.0;
        let now_ms = now_ms as i64;
        let window_ms = window.as_millis() as i64;
        let cutoff_ms = now_ms - window_ms;
        let member = format!(
            "{now_ms}-{}",
            self.sequence.fetch_add(1, Ordering::Relaxed)
        );

        let mut conn = self.manager.clone();
        let (allowed, count, oldest_ms): (i64, i64, i64) = self
            .script
            .key(&key)
            .arg(cutoff_ms)
            .arg(limit)
            .arg(now_ms)
            .arg(member)
            .arg(window.as_secs().max(1))
            .invoke_async(&mut conn)
            .await
            .map_err(backend_err)?;

        let allowed = allowed == 1;
        let count = count as u32;
        let retry_after = if allowed {
            None
        } else {
            let wait_ms = window_ms - (now_ms - oldest_ms);
            Some(Duration::from_millis(wait_ms.max(1000) as u64))
        };

        Ok(RateDecision {
            allowed,
            limit,
            remaining: limit.saturating_sub(count + u32::from(allowed)),
            reset_at: ((now_ms + window_ms) / 1000) as u64,
            retry_after,
            window,
        })
    }
}

fn backend_err(e: redis::RedisError) -> SkaldError {
    SkaldError::CacheUnavailable(e.to_string())
}
