//! Configuration management for Medlr
//!
//! Configuration is loaded from environment variables.

use anyhow::{bail, Context, Result};
use std::env;

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Host to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,

    /// Secret used to sign and verify credentials
    pub jwt_secret: String,
    /// Lifetime of issued credentials (in seconds)
    pub jwt_expiry_seconds: u64,

    /// Redis connection URL. Caching is disabled when unset.
    pub redis_url: Option<String>,
    /// TTL for cached read snapshots (in seconds)
    pub cache_ttl_seconds: u64,

    /// Postgres connection URL. The in-memory store is used when unset.
    pub database_url: Option<String>,
    /// Maximum connections in the document store pool
    pub database_pool_size: u32,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let jwt_secret = env::var("JWT_SECRET").context("JWT_SECRET must be set")?;
        if jwt_secret.trim().is_empty() {
            bail!("JWT_SECRET must not be empty");
        }

        let cache_ttl_seconds: u64 = env::var("CACHE_TTL_SECONDS")
            .unwrap_or_else(|_| "3600".to_string())
            .parse()
            .context("Invalid CACHE_TTL_SECONDS")?;
        if cache_ttl_seconds == 0 {
            bail!("CACHE_TTL_SECONDS must be greater than zero");
        }

        Ok(Self {
            host: env::var("MEDLR_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("MEDLR_PORT")
                .unwrap_or_else(|_| "5000".to_string())
                .parse()
                .context("Invalid MEDLR_PORT")?,

            jwt_secret,
            jwt_expiry_seconds: env::var("JWT_EXPIRY_SECONDS")
                .unwrap_or_else(|_| "3600".to_string())
                .parse()
                .context("Invalid JWT_EXPIRY_SECONDS")?,

            redis_url: non_empty_var("REDIS_URL"),
            cache_ttl_seconds,

            database_url: non_empty_var("DATABASE_URL"),
            database_pool_size: env::var("DATABASE_POOL_SIZE")
                .unwrap_or_else(|_| "10".to_string())
                .parse()
                .context("Invalid DATABASE_POOL_SIZE")?,
        })
    }

    /// Configuration suitable for tests: in-memory backends, short-lived tokens.
    pub fn for_testing(jwt_secret: &str) -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 0,
            jwt_secret: jwt_secret.to_string(),
            jwt_expiry_seconds: 3600,
            redis_url: None,
            cache_ttl_seconds: 3600,
            database_url: None,
            database_pool_size: 1,
        }
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}
