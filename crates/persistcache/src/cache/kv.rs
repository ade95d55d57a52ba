//! Typed, versioned key/value cache without TTL.

use std::marker::PhantomData;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;

use persistcache_core::cache::{
    deserialize_value, kv_key, serialize_value, KeyValueStore, Result,
};

/// One slot of a [`SimpleKvCache::get_many`] result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyValue<T> {
    pub key: String,
    pub value: Option<T>,
}

/// JSON values of type `T` stored under `{identifier}/{version}/{key}`.
pub struct SimpleKvCache<T> {
    store: Arc<dyn KeyValueStore>,
    identifier: String,
    version: u32,
    _value: PhantomData<fn() -> T>,
}

impl<T> SimpleKvCache<T>
where
    T: Serialize + DeserializeOwned,
{
    pub fn new(store: Arc<dyn KeyValueStore>, identifier: impl Into<String>, version: u32) -> Self {
        Self {
            store,
            identifier: identifier.into(),
            version,
            _value: PhantomData,
        }
    }

    fn key(&self, key: &str) -> String {
        kv_key(&self.identifier, self.version, key)
    }

    pub async fn set(&self, key: &str, value: &T) -> Result<()> {
        let raw = serialize_value(value)?;
        self.store.set(&self.key(key), &raw).await
    }

    /// Writes every pair in one multi-key write.
    pub async fn set_many<'a, I>(&self, items: I) -> Result<()>
    where
        I: IntoIterator<Item = (&'a str, &'a T)>,
        T: 'a,
    {
        let pairs = items
            .into_iter()
            .map(|(key, value)| -> Result<(String, String)> {
                Ok((self.key(key), serialize_value(value)?))
            })
            .collect::<Result<Vec<_>>>()?;
        if pairs.is_empty() {
            return Ok(());
        }
        self.store.mset(&pairs).await
    }

    pub async fn get(&self, key: &str) -> Result<Option<T>> {
        match self.store.get(&self.key(key)).await? {
            Some(raw) => Ok(Some(deserialize_value(&raw)?)),
            None => Ok(None),
        }
    }

    /// Fetches several keys at once. Results follow the order of `keys`.
    pub async fn get_many(&self, keys: &[String]) -> Result<Vec<KeyValue<T>>> {
        if keys.is_empty() {
            return Ok(Vec::new());
        }
        let full_keys: Vec<String> = keys.iter().map(|key| self.key(key)).collect();
        let raws = self.store.mget(&full_keys).await?;
        keys.iter()
            .zip(raws)
            .map(|(key, raw)| -> Result<KeyValue<T>> {
                let value = raw.map(|raw| deserialize_value(&raw)).transpose()?;
                Ok(KeyValue {
                    key: key.clone(),
                    value,
                })
            })
            .collect()
    }

    pub async fn remove(&self, keys: &[String]) -> Result<()> {
        if keys.is_empty() {
            return Ok(());
        }
        let full_keys: Vec<String> = keys.iter().map(|key| self.key(key)).collect();
        self.store.del(&full_keys).await
    }

    pub async fn has(&self, key: &str) -> Result<bool> {
        self.store.exists(&self.key(key)).await
    }
}
