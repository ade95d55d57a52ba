//! Namespaced cache over a `GetSet` backend.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use persistcache_core::cache::{namespaced_key, CacheError, GetSet, Result};

/// Hit/miss counters of a [`Cache`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
}

/// A `GetSet` namespaced by prefix and version, with a per-key TTL.
///
/// Keys are stored as `{prefix}-{version}-{key}`. Bumping the version
/// orphans every entry written under the previous one.
pub struct Cache {
    backend: Arc<dyn GetSet>,
    prefix: String,
    version: u32,
    ttl_seconds: u64,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl fmt::Debug for Cache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cache")
            .field("prefix", &self.prefix)
            .field("version", &self.version)
            .field("ttl_seconds", &self.ttl_seconds)
            .field("stats", &self.stats())
            .finish()
    }
}

impl Cache {
    pub fn builder() -> CacheBuilder {
        CacheBuilder::default()
    }

    /// Returns the backend key for a logical key.
    pub fn build_key(&self, key: &str) -> String {
        namespaced_key(&self.prefix, self.version, key)
    }

    /// Gets a value, counting exactly one hit or one miss.
    pub async fn get(&self, key: &str) -> Result<Option<String>> {
        let full_key = self.build_key(key);
        let value = self.backend.get(&full_key).await?;
        if value.is_some() {
            self.hits.fetch_add(1, Ordering::Relaxed);
            tracing::trace!(key = %full_key, "Cache hit");
        } else {
            self.misses.fetch_add(1, Ordering::Relaxed);
            tracing::trace!(key = %full_key, "Cache miss");
        }
        Ok(value)
    }

    /// Stores a value and applies the configured TTL, if any.
    pub async fn set(&self, key: &str, value: &str) -> Result<()> {
        let full_key = self.build_key(key);
        self.backend.set(&full_key, value).await?;
        if self.ttl_seconds > 0 {
            self.backend.ttl(&full_key, self.ttl_seconds).await?;
        }
        Ok(())
    }

    /// Removes a value. Absent keys are fine.
    pub async fn flush(&self, key: &str) -> Result<()> {
        self.backend.flush(&self.build_key(key)).await
    }

    pub fn cache_hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    pub fn cache_misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.cache_hits(),
            misses: self.cache_misses(),
        }
    }
}

/// Builder for [`Cache`].
#[derive(Default)]
pub struct CacheBuilder {
    backend: Option<Arc<dyn GetSet>>,
    prefix: String,
    version: u32,
    ttl_seconds: u64,
}

impl CacheBuilder {
    pub fn backend(mut self, backend: Arc<dyn GetSet>) -> Self {
        self.backend = Some(backend);
        self
    }

    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    pub fn version(mut self, version: u32) -> Self {
        self.version = version;
        self
    }

    /// TTL applied on every `set`. `0` (the default) means entries never expire.
    pub fn ttl_seconds(mut self, ttl_seconds: u64) -> Self {
        self.ttl_seconds = ttl_seconds;
        self
    }

    /// Builds the cache.
    ///
    /// # Errors
    ///
    /// Returns `CacheError::Configuration` when no backend was supplied.
    pub fn build(self) -> Result<Cache> {
        let backend = self.backend.ok_or_else(|| {
            CacheError::Configuration("missing get-set backend".to_string())
        })?;
        Ok(Cache {
            backend,
            prefix: self.prefix,
            version: self.version,
            ttl_seconds: self.ttl_seconds,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MemoryGetSet;
    use async_trait::async_trait;
    use std::sync::Mutex;

    fn memory() -> Arc<MemoryGetSet> {
        Arc::new(MemoryGetSet::new(100).unwrap())
    }

    fn cache_on(backend: Arc<dyn GetSet>, prefix: &str, version: u32) -> Cache {
        Cache::builder()
            .backend(backend)
            .prefix(prefix)
            .version(version)
            .build()
            .unwrap()
    }

    /// Records `ttl` calls so tests can assert on them.
    #[derive(Default)]
    struct RecordingGetSet {
        ttl_calls: Mutex<Vec<(String, u64)>>,
    }

    #[async_trait]
    impl GetSet for RecordingGetSet {
        async fn get(&self, _key: &str) -> Result<Option<String>> {
            Ok(None)
        }

        async fn set(&self, _key: &str, _value: &str) -> Result<()> {
            Ok(())
        }

        async fn ttl(&self, key: &str, seconds: u64) -> Result<()> {
            self.ttl_calls
                .lock()
                .unwrap()
                .push((key.to_string(), seconds));
            Ok(())
        }

        async fn flush(&self, _key: &str) -> Result<()> {
            Ok(())
        }
    }

    struct FailingGetSet;

    #[async_trait]
    impl GetSet for FailingGetSet {
        async fn get(&self, _key: &str) -> Result<Option<String>> {
            Err(CacheError::ConnectionFailed("down".to_string()))
        }

        async fn set(&self, _key: &str, _value: &str) -> Result<()> {
            Err(CacheError::ConnectionFailed("down".to_string()))
        }

        async fn ttl(&self, _key: &str, _seconds: u64) -> Result<()> {
            Err(CacheError::ConnectionFailed("down".to_string()))
        }

        async fn flush(&self, _key: &str) -> Result<()> {
            Err(CacheError::ConnectionFailed("down".to_string()))
        }
    }

    #[test]
    fn test_build_without_backend_fails() {
        let result = Cache::builder().prefix("p").version(1).build();
        assert!(matches!(result, Err(CacheError::Configuration(_))));
    }

    #[test]
    fn test_build_key() {
        let cache = cache_on(memory(), "p", 1);
        assert_eq!(cache.build_key("k"), "p-1-k");
    }

    #[tokio::test]
    async fn test_get_counts_hits_and_misses() {
        let cache = cache_on(memory(), "p", 1);

        assert_eq!(cache.get("k").await.unwrap(), None);
        cache.set("k", "v").await.unwrap();
        assert_eq!(cache.get("k").await.unwrap(), Some("v".to_string()));

        assert_eq!(cache.stats(), CacheStats { hits: 1, misses: 1 });
    }

    #[tokio::test]
    async fn test_namespacing_isolation_on_shared_backend() {
        let backend = memory();
        let cache_a = cache_on(backend.clone(), "a", 1);
        let cache_b = cache_on(backend.clone(), "b", 1);
        let cache_a2 = cache_on(backend, "a", 2);

        cache_a.set("k", "from-a").await.unwrap();

        assert_eq!(cache_b.get("k").await.unwrap(), None);
        assert_eq!(cache_a2.get("k").await.unwrap(), None);
        assert_eq!(cache_a.get("k").await.unwrap(), Some("from-a".to_string()));
    }

    #[tokio::test]
    async fn test_zero_ttl_skips_ttl_call() {
        let backend = Arc::new(RecordingGetSet::default());
        let cache = cache_on(backend.clone(), "p", 1);

        cache.set("k", "v").await.unwrap();

        assert!(backend.ttl_calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_positive_ttl_is_applied_to_full_key() {
        let backend = Arc::new(RecordingGetSet::default());
        let cache = Cache::builder()
            .backend(backend.clone())
            .prefix("p")
            .version(3)
            .ttl_seconds(30)
            .build()
            .unwrap();

        cache.set("k", "v").await.unwrap();

        assert_eq!(
            *backend.ttl_calls.lock().unwrap(),
            vec![("p-3-k".to_string(), 30)]
        );
    }

    #[tokio::test]
    async fn test_flush_removes_value() {
        let cache = cache_on(memory(), "p", 1);
        cache.set("k", "v").await.unwrap();
        cache.flush("k").await.unwrap();
        cache.flush("k").await.unwrap();
        assert_eq!(cache.get("k").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_backend_failure_propagates_without_counting() {
        let cache = cache_on(Arc::new(FailingGetSet), "p", 1);

        let result = cache.get("k").await;

        assert!(matches!(result, Err(CacheError::ConnectionFailed(_))));
        assert_eq!(cache.stats(), CacheStats::default());
    }
}
