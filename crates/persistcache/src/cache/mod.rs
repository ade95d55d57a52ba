//! Cache primitives built on the backend traits.
//!
//! - [`Cache`]: prefix/version namespacing, TTL and hit/miss accounting over a `GetSet`
//! - [`CachingProxy`] / [`FlushingProxy`]: per-call memoization and invalidation
//! - [`SimpleKvCache`]: typed JSON values over a `KeyValueStore`

mod base;
mod kv;
mod proxy;

pub use base::{Cache, CacheBuilder, CacheStats};
pub use kv::{KeyValue, SimpleKvCache};
pub use proxy::{Cacheable, CachingProxy, FlushingProxy};
