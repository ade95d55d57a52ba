//! Redis store implementation.
//!
//! Expiry is left to Redis itself: `GetSet::ttl` maps to `EXPIRE`/`PERSIST`
//! and reads never check timestamps.
//!
//! Compound operations issued by the stores (e.g. `DEL` then `SADD`) are not
//! wrapped in transactions. Concurrent writers race and the last one wins.

use async_trait::async_trait;
use redis::AsyncCommands;

use persistcache_core::cache::{GetSet, KeyValueStore, Result};

use super::error::map_redis_error;

/// Redis backend using a connection manager for reconnects.
///
/// Cloning is cheap; all clones share the same connection.
#[derive(Clone)]
pub struct RedisStore {
    conn: redis::aio::ConnectionManager,
}

impl RedisStore {
    /// Opens a Redis connection.
    ///
    /// # Arguments
    ///
    /// * `url` - Redis connection URL (e.g., "redis://localhost:6379")
    ///
    /// # Errors
    ///
    /// Returns `CacheError::ConnectionFailed` if the connection cannot be established.
    pub async fn connect(url: &str) -> Result<Self> {
        let client = redis::Client::open(url).map_err(map_redis_error)?;
        let conn = redis::aio::ConnectionManager::new(client)
            .await
            .map_err(map_redis_error)?;
        tracing::debug!(url = %url, "Connected to Redis");
        Ok(Self { conn })
    }
}

#[async_trait]
impl GetSet for RedisStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let mut conn = self.conn.clone();
        let result: Option<String> = conn.get(key).await.map_err(map_redis_error)?;
        Ok(result)
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut conn = self.conn.clone();
        conn.set::<_, _, ()>(key, value)
            .await
            .map_err(map_redis_error)
    }

    async fn ttl(&self, key: &str, seconds: u64) -> Result<()> {
        let mut conn = self.conn.clone();
        let mut cmd = if seconds == 0 {
            redis::cmd("PERSIST")
        } else {
            redis::cmd("EXPIRE")
        };
        cmd.arg(key);
        if seconds > 0 {
            cmd.arg(seconds);
        }
        let _: () = cmd.query_async(&mut conn).await.map_err(map_redis_error)?;
        Ok(())
    }

    async fn flush(&self, key: &str) -> Result<()> {
        let mut conn = self.conn.clone();
        conn.del::<_, ()>(key).await.map_err(map_redis_error)
    }
}

#[async_trait]
impl KeyValueStore for RedisStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        GetSet::get(self, key).await
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        GetSet::set(self, key, value).await
    }

    async fn mget(&self, keys: &[String]) -> Result<Vec<Option<String>>> {
        if keys.is_empty() {
            return Ok(Vec::new());
        }
        let mut conn = self.conn.clone();
        let values: Vec<Option<String>> = redis::cmd("MGET")
            .arg(keys)
            .query_async(&mut conn)
            .await
            .map_err(map_redis_error)?;
        Ok(values)
    }

    async fn mset(&self, items: &[(String, String)]) -> Result<()> {
        if items.is_empty() {
            return Ok(());
        }
        let mut conn = self.conn.clone();
        let _: () = redis::cmd("MSET")
            .arg(items)
            .query_async(&mut conn)
            .await
            .map_err(map_redis_error)?;
        Ok(())
    }

    async fn del(&self, keys: &[String]) -> Result<()> {
        if keys.is_empty() {
            return Ok(());
        }
        let mut conn = self.conn.clone();
        conn.del::<_, ()>(keys).await.map_err(map_redis_error)
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        let mut conn = self.conn.clone();
        let exists: bool = conn.exists(key).await.map_err(map_redis_error)?;
        Ok(exists)
    }

    async fn sadd(&self, key: &str, members: &[String]) -> Result<()> {
        if members.is_empty() {
            return Ok(());
        }
        let mut conn = self.conn.clone();
        conn.sadd::<_, _, ()>(key, members)
            .await
            .map_err(map_redis_error)
    }

    async fn srem(&self, key: &str, members: &[String]) -> Result<()> {
        if members.is_empty() {
            return Ok(());
        }
        let mut conn = self.conn.clone();
        conn.srem::<_, _, ()>(key, members)
            .await
            .map_err(map_redis_error)
    }

    async fn smembers(&self, key: &str) -> Result<Vec<String>> {
        let mut conn = self.conn.clone();
        let mut members: Vec<String> = conn.smembers(key).await.map_err(map_redis_error)?;
        members.sort();
        Ok(members)
    }

    async fn smembers_present(&self, key: &str, members: &[String]) -> Result<Vec<String>> {
        if members.is_empty() {
            return Ok(Vec::new());
        }
        let mut conn = self.conn.clone();
        let flags: Vec<i64> = redis::cmd("SMISMEMBER")
            .arg(key)
            .arg(members)
            .query_async(&mut conn)
            .await
            .map_err(map_redis_error)?;
        Ok(members
            .iter()
            .zip(flags)
            .filter(|(_, flag)| *flag == 1)
            .map(|(member, _)| member.clone())
            .collect())
    }
}
