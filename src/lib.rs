//! Medlr - Pharmacy and medicine directory API
//!
//! This library provides the core functionality for the Medlr server:
//! CRUD endpoints for pharmacies, medicines and users, credential-based
//! authentication for writes, and cache-aside reads for pharmacies.

pub mod auth;
pub mod cache;
pub mod config;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod store;

use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use tracing::info;

pub use crate::auth::TokenService;
pub use crate::cache::{CacheStore, InMemoryCache, ReadGuard, RedisCache};
pub use crate::config::Config;
pub use crate::store::{DocumentStore, InMemoryStore, PostgresStore};

/// Application state shared across all request handlers
pub struct AppState {
    pub config: Config,
    /// Source of truth for every entity
    pub store: Arc<dyn DocumentStore>,
    /// Cache-aside guard for pharmacy reads
    pub read_guard: ReadGuard,
    /// Issues and verifies credentials
    pub tokens: Arc<TokenService>,
    pub start_time: Instant,
}

impl AppState {
    /// Create application state, connecting to the configured backends
    pub async fn new(config: Config) -> Result<Self> {
        let store: Arc<dyn DocumentStore> = match &config.database_url {
            Some(url) => {
                info!("Using PostgreSQL document store");
                Arc::new(PostgresStore::connect(url, config.database_pool_size).await?)
            }
            None => {
                info!("DATABASE_URL not set, using in-memory document store");
                Arc::new(InMemoryStore::new())
            }
        };

        let cache: Option<Arc<dyn CacheStore>> = match &config.redis_url {
            Some(url) => {
                info!("Using Redis cache");
                Some(Arc::new(RedisCache::connect(url).await?))
            }
            None => {
                info!("REDIS_URL not set, response caching disabled");
                None
            }
        };

        Self::from_parts(config, store, cache)
    }

    /// Assemble state from already-constructed backends
    ///
    /// Fails only when the signing secret is unusable.
    pub fn from_parts(
        config: Config,
        store: Arc<dyn DocumentStore>,
        cache: Option<Arc<dyn CacheStore>>,
    ) -> Result<Self> {
        let tokens = Arc::new(TokenService::new(
            &config.jwt_secret,
            config.jwt_expiry_seconds,
        )?);

        let read_guard = match cache {
            Some(cache) => ReadGuard::new(cache, config.cache_ttl_seconds),
            None => ReadGuard::disabled(),
        };

        Ok(Self {
            config,
            store,
            read_guard,
            tokens,
            start_time: Instant::now(),
        })
    }
}
