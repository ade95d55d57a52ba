//! In-process `GetSet` with LRU eviction and lazy expiry.
//!
//! Expired entries stay in the LRU until evicted or overwritten, but read as
//! absent. The Redis backend relies on server-side expiry instead.

use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use lru::LruCache;
use tokio::sync::RwLock;

use persistcache_core::cache::{CacheError, GetSet, Result};

/// A single cache entry with optional expiration.
#[derive(Debug, Clone)]
struct CacheEntry {
    value: String,
    expires_at: Option<Instant>,
}

impl CacheEntry {
    fn new(value: String) -> Self {
        Self {
            value,
            expires_at: None,
        }
    }

    /// Returns true if this entry has expired.
    fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|exp| Instant::now() > exp)
    }
}

/// In-memory `GetSet` implementation.
///
/// Thread-safe through `Arc<RwLock<LruCache>>`; clones share the same map.
#[derive(Debug, Clone)]
pub struct MemoryGetSet {
    store: Arc<RwLock<LruCache<String, CacheEntry>>>,
}

impl MemoryGetSet {
    /// Creates a new in-memory get/set with room for `max_entries` keys.
    ///
    /// # Errors
    ///
    /// Returns `CacheError::Configuration` if `max_entries` is 0.
    pub fn new(max_entries: usize) -> Result<Self> {
        let capacity = NonZeroUsize::new(max_entries).ok_or_else(|| {
            CacheError::Configuration("max_entries must be > 0".to_string())
        })?;
        Ok(Self {
            store: Arc::new(RwLock::new(LruCache::new(capacity))),
        })
    }
}

#[async_trait]
impl GetSet for MemoryGetSet {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let mut store = self.store.write().await;

        match store.get(key) {
            Some(entry) if entry.is_expired() => Ok(None),
            Some(entry) => Ok(Some(entry.value.clone())),
            None => Ok(None),
        }
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut store = self.store.write().await;
        store.put(key.to_string(), CacheEntry::new(value.to_string()));
        Ok(())
    }

    async fn ttl(&self, key: &str, seconds: u64) -> Result<()> {
        let mut store = self.store.write().await;
        if let Some(entry) = store.get_mut(key) {
            entry.expires_at = match seconds {
                0 => None,
                s => Some(Instant::now() + Duration::from_secs(s)),
            };
        }
        Ok(())
    }

    async fn flush(&self, key: &str) -> Result<()> {
        let mut store = self.store.write().await;
        store.pop(key);
        Ok(())
    }
}
