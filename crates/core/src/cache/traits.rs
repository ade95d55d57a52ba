use async_trait::async_trait;

use super::Result;

/// Minimal key/value primitive backing a namespaced cache.
///
/// Missing keys are reported as `None`, never as an error.
#[async_trait]
pub trait GetSet: Send + Sync {
    /// Gets a value by key.
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Overwrites the value stored under `key`.
    async fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Sets or refreshes the expiry of `key`. `0` means "never expire".
    async fn ttl(&self, key: &str, seconds: u64) -> Result<()>;

    /// Deletes `key`. Flushing an absent key is not an error.
    async fn flush(&self, key: &str) -> Result<()>;
}

/// Key/value and set primitives of the backing store shared by the
/// persistent cache stores.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Gets a string value by key.
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Sets a string value.
    async fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Gets several values at once. The result has one slot per key, in key order.
    async fn mget(&self, keys: &[String]) -> Result<Vec<Option<String>>>;

    /// Sets several values in a single write.
    async fn mset(&self, items: &[(String, String)]) -> Result<()>;

    /// Deletes keys of any type.
    async fn del(&self, keys: &[String]) -> Result<()>;

    /// Returns true if the key exists.
    async fn exists(&self, key: &str) -> Result<bool>;

    /// Adds members to the set stored at `key`.
    async fn sadd(&self, key: &str, members: &[String]) -> Result<()>;

    /// Removes members from the set stored at `key`.
    async fn srem(&self, key: &str, members: &[String]) -> Result<()>;

    /// Returns all members of the set stored at `key`.
    async fn smembers(&self, key: &str) -> Result<Vec<String>>;

    /// Returns the subset of `members` that belong to the set stored at
    /// `key`, in the order they were given.
    async fn smembers_present(&self, key: &str, members: &[String]) -> Result<Vec<String>>;
}
