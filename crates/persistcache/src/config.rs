use std::{env, sync::Arc, time::Duration};

use persistcache_core::cache::{GetSet, Result};

use crate::authorization::{CacheMode, VerifiedRunner};
use crate::backend::MemoryGetSet;
use crate::cache::Cache;
use crate::invalidation::InvalidatorManager;

/// Cache configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Redis connection URL (default: "redis://localhost:6379")
    pub redis_url: String,
    /// Namespace prefix of memoized calls (default: "persistcache")
    pub cache_prefix: String,
    /// Namespace version of memoized calls (default: 1)
    pub cache_version: u32,
    /// TTL of memoized calls in seconds, 0 never expires (default: 0)
    pub cache_ttl_seconds: u64,
    /// Maximum number of in-memory cache entries (default: 10,000)
    pub cache_max_entries: usize,
    /// How authorization lookups use the cache (default: cached-with-verification)
    pub authorization_cache_mode: CacheMode,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `PERSISTENT_CACHE_REDIS_URL` - Redis connection URL (default: "redis://localhost:6379")
    /// - `CACHE_PREFIX` - Memoized call prefix (default: "persistcache")
    /// - `CACHE_VERSION` - Memoized call version (default: 1)
    /// - `CACHE_TTL_SECONDS` - Memoized call TTL, 0 for none (default: 0)
    /// - `CACHE_MAX_ENTRIES` - Maximum in-memory entries (default: 10,000)
    /// - `AUTHORIZATION_CACHE_MODE` - One of `cached`, `cached-with-verification`,
    ///   `uncached-with-verification`, `uncached` (default: `cached-with-verification`)
    ///
    /// Unparsable values fall back to their default.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self {
            redis_url: lookup("PERSISTENT_CACHE_REDIS_URL")
                .unwrap_or_else(|| "redis://localhost:6379".to_string()),
            cache_prefix: lookup("CACHE_PREFIX").unwrap_or_else(|| "persistcache".to_string()),
            cache_version: lookup("CACHE_VERSION")
                .and_then(|v| v.parse().ok())
                .unwrap_or(1),
            cache_ttl_seconds: lookup("CACHE_TTL_SECONDS")
                .and_then(|v| v.parse().ok())
                .unwrap_or(0),
            cache_max_entries: lookup("CACHE_MAX_ENTRIES")
                .and_then(|v| v.parse().ok())
                .unwrap_or(10_000),
            authorization_cache_mode: lookup("AUTHORIZATION_CACHE_MODE")
                .and_then(|v| v.parse().ok())
                .unwrap_or_default(),
        }
    }

    /// Get the memoized call TTL, `None` when entries never expire.
    pub fn cache_ttl(&self) -> Option<Duration> {
        (self.cache_ttl_seconds > 0).then(|| Duration::from_secs(self.cache_ttl_seconds))
    }

    /// In-process `GetSet` bounded by `cache_max_entries`.
    pub fn memory_backend(&self) -> Result<MemoryGetSet> {
        MemoryGetSet::new(self.cache_max_entries)
    }

    /// Memoization cache over `backend` with the configured namespace and TTL.
    pub fn cache(&self, backend: Arc<dyn GetSet>) -> Result<Cache> {
        Cache::builder()
            .backend(backend)
            .prefix(self.cache_prefix.clone())
            .version(self.cache_version)
            .ttl_seconds(self.cache_ttl_seconds)
            .build()
    }

    /// Runner for authorization lookups in the configured mode.
    pub fn verified_runner(&self, invalidator: InvalidatorManager) -> Result<VerifiedRunner> {
        VerifiedRunner::new(self.authorization_cache_mode, invalidator)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}
