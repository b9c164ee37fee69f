//! In-memory cache implementation
//!
//! Stands in for Redis in tests and single-process deployments. It can be
//! switched offline to exercise the read guard's degraded path.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{CacheError, CacheStore};

/// Entry in the in-memory cache with expiration
struct CacheEntry {
    value: String,
    expires_at: Option<Instant>,
}

impl CacheEntry {
    fn is_expired(&self) -> bool {
        self.expires_at.map(|exp| Instant::now() >= exp).unwrap_or(false)
    }
}

/// In-memory cache
///
/// A TTL of zero stores the entry without expiry.
pub struct InMemoryCache {
    data: RwLock<HashMap<String, CacheEntry>>,
    offline: AtomicBool,
}

impl Default for InMemoryCache {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryCache {
    pub fn new() -> Self {
        Self {
            data: RwLock::new(HashMap::new()),
            offline: AtomicBool::new(false),
        }
    }

    /// Make every subsequent operation fail with `CacheError::Unavailable`
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Check if a live entry exists, bypassing the offline switch
    pub async fn contains_key(&self, key: &str) -> bool {
        let data = self.data.read().await;
        data.get(key).map(|e| !e.is_expired()).unwrap_or(false)
    }

    /// Clear all entries (useful for test isolation)
    pub async fn clear(&self) {
        self.data.write().await.clear();
    }

    fn check_online(&self) -> Result<(), CacheError> {
        if self.offline.load(Ordering::SeqCst) {
            Err(CacheError::Unavailable("in-memory cache is offline".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl CacheStore for InMemoryCache {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        self.check_online()?;
        {
            let data = self.data.read().await;
            match data.get(key) {
                Some(entry) if !entry.is_expired() => return Ok(Some(entry.value.clone())),
                None => return Ok(None),
                Some(_) => {}
            }
        }

        // Expired: drop it, unless a writer refreshed it in between
        let mut data = self.data.write().await;
        if data.get(key).is_some_and(CacheEntry::is_expired) {
            data.remove(key);
        }
        Ok(None)
    }

    async fn set(&self, key: &str, value: &str, ttl_seconds: u64) -> Result<(), CacheError> {
        self.check_online()?;
        let expires_at = if ttl_seconds > 0 {
            Some(Instant::now() + Duration::from_secs(ttl_seconds))
        } else {
            None
        };

        let mut data = self.data.write().await;
        data.retain(|_, entry| !entry.is_expired());
        data.insert(
            key.to_string(),
            CacheEntry {
                value: value.to_string(),
                expires_at,
            },
        );
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        self.check_online()?;
        self.data.write().await.remove(key);
        Ok(())
    }

    async fn ping(&self) -> Result<(), CacheError> {
        self.check_online()
    }
}
