//! Cache-aside read guard
//!
//! Wraps a single read: look the key up first, call the wrapped fetch only on
//! a miss, then store the fetched snapshot with the configured TTL. Cache
//! failures degrade to an uncached read; they are never returned to callers.

use std::future::Future;
use std::sync::Arc;

use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, instrument, warn};

use super::CacheStore;
use crate::routes::metrics::record_cache_operation;

/// Cache-aside guard shared by all cacheable read handlers
#[derive(Clone)]
pub struct ReadGuard {
    cache: Option<Arc<dyn CacheStore>>,
    ttl_seconds: u64,
}

impl ReadGuard {
    /// Create a guard over `cache` that stores snapshots for `ttl_seconds`
    pub fn new(cache: Arc<dyn CacheStore>, ttl_seconds: u64) -> Self {
        Self {
            cache: Some(cache),
            ttl_seconds,
        }
    }

    /// A guard with no backing cache; every read goes to the store
    pub fn disabled() -> Self {
        Self {
            cache: None,
            ttl_seconds: 0,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.cache.is_some()
    }

    /// The backing cache, if any
    pub fn cache(&self) -> Option<&Arc<dyn CacheStore>> {
        self.cache.as_ref()
    }

    /// Serve `key` from cache, or run `fetch` and cache its result.
    ///
    /// A failed fetch is returned as-is and nothing is written.
    #[instrument(skip_all, fields(key = %key))]
    pub async fn guard<T, E, F, Fut>(&self, key: &str, fetch: F) -> Result<T, E>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let Some(cache) = &self.cache else {
            return fetch().await;
        };

        let mut populate = true;
        match cache.get(key).await {
            Ok(Some(raw)) => match serde_json::from_str::<T>(&raw) {
                Ok(value) => {
                    debug!("Cache hit");
                    record_cache_operation("get", "hit");
                    return Ok(value);
                }
                Err(e) => {
                    // Overwritten below by the fresh snapshot
                    warn!(error = %e, "Discarding undecodable cache entry");
                    record_cache_operation("get", "corrupt");
                }
            },
            Ok(None) => {
                debug!("Cache miss");
                record_cache_operation("get", "miss");
            }
            Err(e) => {
                warn!(error = %e, "Cache unavailable, reading through to store");
                record_cache_operation("get", "error");
                populate = false;
            }
        }

        let value = fetch().await?;

        if populate {
            self.store(cache.as_ref(), key, &value).await;
        }

        Ok(value)
    }

    /// Evict `keys`, logging failures
    #[instrument(skip(self))]
    pub async fn invalidate(&self, keys: &[String]) {
        let Some(cache) = &self.cache else {
            return;
        };

        for key in keys {
            match cache.delete(key).await {
                Ok(()) => record_cache_operation("delete", "ok"),
                Err(e) => {
                    warn!(key = %key, error = %e, "Failed to evict cache entry");
                    record_cache_operation("delete", "error");
                }
            }
        }
    }

    async fn store<T: Serialize>(&self, cache: &dyn CacheStore, key: &str, value: &T) {
        let serialized = match serde_json::to_string(value) {
            Ok(s) => s,
            Err(e) => {
                warn!(error = %e, "Failed to serialize value for cache");
                return;
            }
        };

        match cache.set(key, &serialized, self.ttl_seconds).await {
            Ok(()) => record_cache_operation("set", "ok"),
            Err(e) => {
                warn!(error = %e, "Failed to populate cache");
                record_cache_operation("set", "error");
            }
        }
    }
}
