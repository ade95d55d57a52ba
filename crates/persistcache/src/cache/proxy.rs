//! Memoizing and flushing wrappers around arbitrary services.
//!
//! A service opts in by implementing its own trait for
//! `CachingProxy<Service>`, routing each method through [`CachingProxy::call`]
//! with the method name and its arguments. The flushing counterpart computes
//! the same key and drops it instead of calling anything.
//!
//! ```ignore
//! #[async_trait]
//! impl<S: Accounts> Accounts for CachingProxy<S> {
//!     async fn find(&self, id: &str) -> Result<Option<Account>, AccountsError> {
//!         self.call("find", &[json!(id)], |inner| inner.find(id)).await
//!     }
//! }
//! ```

use std::future::Future;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use persistcache_core::cache::{
    deserialize_memoized, proxy_key, serialize_memoized, CacheError, Result,
};

use super::Cache;

/// Wraps a service so that each routed call is memoized in a [`Cache`].
#[derive(Debug)]
pub struct CachingProxy<S> {
    inner: S,
    cache: Arc<Cache>,
}

impl<S> CachingProxy<S> {
    pub fn new(inner: S, cache: Arc<Cache>) -> Self {
        Self { inner, cache }
    }

    /// The wrapped service, for anything that should bypass the cache.
    pub fn inner(&self) -> &S {
        &self.inner
    }

    pub fn cache(&self) -> &Cache {
        &self.cache
    }

    /// Returns the memoized result of `method(args)`, invoking `f` on a miss.
    ///
    /// Errors from `f` propagate and nothing is cached for them.
    pub async fn call<'a, T, E, F, Fut>(
        &'a self,
        method: &str,
        args: &[Value],
        f: F,
    ) -> std::result::Result<T, E>
    where
        T: Serialize + DeserializeOwned,
        E: From<CacheError>,
        F: FnOnce(&'a S) -> Fut,
        Fut: Future<Output = std::result::Result<T, E>> + 'a,
    {
        let key = proxy_key(method, args)?;
        if let Some(raw) = self.cache.get(&key).await? {
            return Ok(deserialize_memoized(&raw)?);
        }

        let value = f(&self.inner).await?;
        let raw = serialize_memoized(&value)?;
        self.cache.set(&key, &raw).await?;
        Ok(value)
    }
}

/// Wraps a service so that each routed call invalidates the matching
/// [`CachingProxy`] entry. The wrapped service is never invoked.
#[derive(Debug)]
pub struct FlushingProxy<S> {
    inner: S,
    cache: Arc<Cache>,
}

impl<S> FlushingProxy<S> {
    pub fn new(inner: S, cache: Arc<Cache>) -> Self {
        Self { inner, cache }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    /// Flushes the entry memoized for `method(args)`.
    pub async fn call(&self, method: &str, args: &[Value]) -> Result<()> {
        let key = proxy_key(method, args)?;
        tracing::trace!(key = %key, "Flushing memoized call");
        self.cache.flush(&key).await
    }
}

/// Wraps any value in a caching or flushing proxy.
pub trait Cacheable: Sized {
    fn caching(self, cache: Arc<Cache>) -> CachingProxy<Self> {
        CachingProxy::new(self, cache)
    }

    fn flushing(self, cache: Arc<Cache>) -> FlushingProxy<Self> {
        FlushingProxy::new(self, cache)
    }
}

impl<S> Cacheable for S {}
