//! Cache module
//!
//! Key-value cache backends and the cache-aside read guard that sits in
//! front of pharmacy reads.

pub mod guard;
pub mod in_memory;
pub mod redis;

use async_trait::async_trait;
use thiserror::Error;

pub use self::guard::ReadGuard;
pub use self::in_memory::InMemoryCache;
pub use self::redis::RedisCache;

/// Cache operation errors
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Redis error: {0}")]
    Redis(#[from] ::redis::RedisError),

    #[error("Cache unavailable: {0}")]
    Unavailable(String),
}

/// A string key-value store with per-entry expiry
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Get the raw value stored under `key`
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    /// Store `value` under `key`, expiring after `ttl_seconds`. Zero means
    /// no expiry.
    async fn set(&self, key: &str, value: &str, ttl_seconds: u64) -> Result<(), CacheError>;

    /// Remove `key`
    async fn delete(&self, key: &str) -> Result<(), CacheError>;

    /// Round-trip check used by health probes
    async fn ping(&self) -> Result<(), CacheError>;
}

/// Cache key derivation
///
/// Keys depend only on the resource kind and its identifying parameter.
/// Each lookup kind has its own prefix, so no id can spell a name key.
pub mod keys {
    /// Key for the full pharmacy listing
    pub fn all_pharmacies() -> String {
        "pharmacies".to_string()
    }

    /// Key for a single pharmacy looked up by id
    pub fn pharmacy(id: &str) -> String {
        format!("pharmacy:id:{}", id)
    }

    /// Key for a single pharmacy looked up by name
    pub fn pharmacy_by_name(name: &str) -> String {
        format!("pharmacy:name:{}", name)
    }
}
