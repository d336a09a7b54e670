//! Redis-backed tiered store for analyzer state (baselines, adaptive
//! weights, deployment events, Granger results). Two-tier caching:
//! `LocalCache` (L1) in front of Redis (L2), exactly as the teacher's
//! `RedisCache` does for profiles — generalized here to arbitrary
//! JSON-serializable payloads keyed by an opaque string.
//!
//! Redis failures do not propagate: every operation degrades to the L1
//! cache (or `None`/no-op) and logs a warning. A retry cooldown avoids
//! hammering a down Redis on every call — once a connection attempt fails,
//! further attempts are skipped until the cooldown elapses.

use crate::local::LocalCache;
use causeway_core::config::StoreConfig;
use redis::AsyncCommands;
use serde::{de::DeserializeOwned, Serialize};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, warn};

fn now_secs() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

/// Generic tiered key-value store over `serde_json`-encoded payloads.
pub struct TieredStore<V> {
    client: Option<redis::Client>,
    local: Arc<LocalCache<V>>,
    ttl_secs: u64,
    retry_cooldown_secs: i64,
    last_failure_at: AtomicI64,
}

impl<V> TieredStore<V>
where
    V: Clone + Serialize + DeserializeOwned + Send + Sync + 'static,
{
    pub fn new(config: &StoreConfig, fallback_max_items: usize) -> Self {
        let client = config
            .redis_urls
            .first()
            .and_then(|url| redis::Client::open(url.as_str()).ok());
        if client.is_none() {
            warn!("no redis url configured, store operating local-only");
        }
        Self {
            client,
            local: Arc::new(LocalCache::new(config.ttl_secs, fallback_max_items)),
            ttl_secs: config.ttl_secs,
            retry_cooldown_secs: config.redis_retry_cooldown_seconds as i64,
            last_failure_at: AtomicI64::new(0),
        }
    }

    fn redis_available(&self) -> bool {
        if self.client.is_none() {
            return false;
        }
        let last_failure = self.last_failure_at.load(Ordering::Relaxed);
        last_failure == 0 || now_secs() - last_failure >= self.retry_cooldown_secs
    }

    fn note_failure(&self) {
        self.last_failure_at.store(now_secs(), Ordering::Relaxed);
    }

    fn note_success(&self) {
        self.last_failure_at.store(0, Ordering::Relaxed);
    }

    pub async fn get(&self, key: &str) -> Option<V> {
        if let Some(value) = self.local.get(key) {
            return Some((*value).clone());
        }
        if !self.redis_available() {
            return None;
        }
        let Some(client) = &self.client else {
            return None;
        };
        match client.get_multiplexed_async_connection().await {
            Ok(mut conn) => {
                let raw: Result<Option<String>, _> = conn.get(key).await;
                match raw {
                    Ok(Some(json)) => match serde_json::from_str::<V>(&json) {
                        Ok(value) => {
                            self.note_success();
                            self.local.put(key.to_string(), value.clone());
                            Some(value)
                        }
                        Err(e) => {
                            warn!(error = %e, key, "failed to decode stored value");
                            None
                        }
                    },
                    Ok(None) => {
                        self.note_success();
                        None
                    }
                    Err(e) => {
                        debug!(error = %e, key, "redis get failed");
                        self.note_failure();
                        None
                    }
                }
            }
            Err(e) => {
                debug!(error = %e, "redis connection failed");
                self.note_failure();
                None
            }
        }
    }

    pub async fn set(&self, key: &str, value: &V) {
        self.local.put(key.to_string(), value.clone());
        if !self.redis_available() {
            return;
        }
        let Some(client) = &self.client else {
            return;
        };
        let json = match serde_json::to_string(value) {
            Ok(j) => j,
            Err(e) => {
                warn!(error = %e, key, "failed to encode value for store");
                return;
            }
        };
        match client.get_multiplexed_async_connection().await {
            Ok(mut conn) => {
                let result: Result<(), _> = conn.set_ex(key, json, self.ttl_secs).await;
                match result {
                    Ok(()) => self.note_success(),
                    Err(e) => {
                        debug!(error = %e, key, "redis set failed");
                        self.note_failure();
                    }
                }
            }
            Err(e) => {
                debug!(error = %e, "redis connection failed");
                self.note_failure();
            }
        }
    }

    pub async fn delete(&self, key: &str) {
        self.local.remove(key);
        if !self.redis_available() {
            return;
        }
        let Some(client) = &self.client else {
            return;
        };
        if let Ok(mut conn) = client.get_multiplexed_async_connection().await {
            let _: Result<(), _> = conn.del(key).await;
        }
    }

    pub async fn maintenance(&self) {
        let evicted = self.local.evict_expired();
        if evicted > 0 {
            debug!(evicted, "local cache eviction complete");
        }
    }

    pub fn local_len(&self) -> usize {
        self.local.len()
    }
}
