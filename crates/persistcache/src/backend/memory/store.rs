//! In-process `KeyValueStore` with string and set values.
//!
//! Mirrors the Redis semantics the stores depend on: `SET` overwrites a key
//! of any type, `DEL`/`EXISTS` see both types, set commands against a string
//! key fail, and a set left empty by `SREM` disappears.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use persistcache_core::cache::{CacheError, KeyValueStore, Result};

#[derive(Debug, Default)]
struct Inner {
    strings: HashMap<String, String>,
    sets: HashMap<String, HashSet<String>>,
}

impl Inner {
    fn ensure_not_string(&self, key: &str) -> Result<()> {
        if self.strings.contains_key(key) {
            return Err(CacheError::OperationFailed(format!(
                "WRONGTYPE key {key} holds a string value"
            )));
        }
        Ok(())
    }

    fn ensure_not_set(&self, key: &str) -> Result<()> {
        if self.sets.contains_key(key) {
            return Err(CacheError::OperationFailed(format!(
                "WRONGTYPE key {key} holds a set value"
            )));
        }
        Ok(())
    }
}

/// In-memory backing store shared by clones.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<Inner>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let inner = self.inner.read().await;
        inner.ensure_not_set(key)?;
        Ok(inner.strings.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut inner = self.inner.write().await;
        inner.sets.remove(key);
        inner.strings.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn mget(&self, keys: &[String]) -> Result<Vec<Option<String>>> {
        let inner = self.inner.read().await;
        // MGET reports keys of another type as missing.
        Ok(keys.iter().map(|key| inner.strings.get(key).cloned()).collect())
    }

    async fn mset(&self, items: &[(String, String)]) -> Result<()> {
        let mut inner = self.inner.write().await;
        for (key, value) in items {
            inner.sets.remove(key);
            inner.strings.insert(key.clone(), value.clone());
        }
        Ok(())
    }

    async fn del(&self, keys: &[String]) -> Result<()> {
        let mut inner = self.inner.write().await;
        for key in keys {
            inner.strings.remove(key);
            inner.sets.remove(key);
        }
        Ok(())
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        let inner = self.inner.read().await;
        Ok(inner.strings.contains_key(key) || inner.sets.contains_key(key))
    }

    async fn sadd(&self, key: &str, members: &[String]) -> Result<()> {
        if members.is_empty() {
            return Ok(());
        }
        let mut inner = self.inner.write().await;
        inner.ensure_not_string(key)?;
        inner
            .sets
            .entry(key.to_string())
            .or_default()
            .extend(members.iter().cloned());
        Ok(())
    }

    async fn srem(&self, key: &str, members: &[String]) -> Result<()> {
        let mut inner = self.inner.write().await;
        inner.ensure_not_string(key)?;
        if let Some(set) = inner.sets.get_mut(key) {
            for member in members {
                set.remove(member);
            }
            if set.is_empty() {
                inner.sets.remove(key);
            }
        }
        Ok(())
    }

    async fn smembers(&self, key: &str) -> Result<Vec<String>> {
        let inner = self.inner.read().await;
        inner.ensure_not_string(key)?;
        let mut members: Vec<String> = inner
            .sets
            .get(key)
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default();
        members.sort();
        Ok(members)
    }

    async fn smembers_present(&self, key: &str, members: &[String]) -> Result<Vec<String>> {
        let inner = self.inner.read().await;
        inner.ensure_not_string(key)?;
        let Some(set) = inner.sets.get(key) else {
            return Ok(Vec::new());
        };
        Ok(members
            .iter()
            .filter(|member| set.contains(*member))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[tokio::test]
    async fn test_get_and_set() {
        let store = MemoryStore::new();
        store.set("k", "v").await.unwrap();
        assert_eq!(store.get("k").await.unwrap(), Some("v".to_string()));
        assert_eq!(store.get("missing").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_mget_preserves_order() {
        let store = MemoryStore::new();
        store
            .mset(&[("b".to_string(), "2".to_string())])
            .await
            .unwrap();

        let values = store.mget(&strings(&["a", "b", "c"])).await.unwrap();

        assert_eq!(values, vec![None, Some("2".to_string()), None]);
    }

    #[tokio::test]
    async fn test_del_removes_both_types() {
        let store = MemoryStore::new();
        store.set("s", "v").await.unwrap();
        store.sadd("set", &strings(&["m"])).await.unwrap();

        store.del(&strings(&["s", "set", "absent"])).await.unwrap();

        assert!(!store.exists("s").await.unwrap());
        assert!(!store.exists("set").await.unwrap());
    }

    #[tokio::test]
    async fn test_set_operations() {
        let store = MemoryStore::new();
        store.sadd("set", &strings(&["x", "y", "z"])).await.unwrap();
        store.srem("set", &strings(&["y"])).await.unwrap();

        assert!(store.exists("set").await.unwrap());
        assert_eq!(store.smembers("set").await.unwrap(), strings(&["x", "z"]));
    }

    #[tokio::test]
    async fn test_srem_last_member_removes_key() {
        let store = MemoryStore::new();
        store.sadd("set", &strings(&["x"])).await.unwrap();
        store.srem("set", &strings(&["x"])).await.unwrap();
        assert!(!store.exists("set").await.unwrap());
    }

    #[tokio::test]
    async fn test_sadd_empty_does_not_create_key() {
        let store = MemoryStore::new();
        store.sadd("set", &[]).await.unwrap();
        assert!(!store.exists("set").await.unwrap());
    }

    #[tokio::test]
    async fn test_smembers_present_keeps_input_order() {
        let store = MemoryStore::new();
        store.sadd("set", &strings(&["a", "c"])).await.unwrap();

        let present = store
            .smembers_present("set", &strings(&["c", "b", "a"]))
            .await
            .unwrap();

        assert_eq!(present, strings(&["c", "a"]));
    }

    #[tokio::test]
    async fn test_smembers_present_missing_set() {
        let store = MemoryStore::new();
        let present = store
            .smembers_present("nope", &strings(&["a"]))
            .await
            .unwrap();
        assert!(present.is_empty());
    }

    #[tokio::test]
    async fn test_wrong_type_is_an_error() {
        let store = MemoryStore::new();
        store.set("k", "v").await.unwrap();
        let result = store.sadd("k", &strings(&["m"])).await;
        assert!(matches!(result, Err(CacheError::OperationFailed(_))));
    }

    #[tokio::test]
    async fn test_set_overwrites_a_set() {
        let store = MemoryStore::new();
        store.sadd("k", &strings(&["m"])).await.unwrap();
        store.set("k", "v").await.unwrap();
        assert_eq!(store.get("k").await.unwrap(), Some("v".to_string()));
    }
}
