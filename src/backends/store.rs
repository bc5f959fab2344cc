//! JSON-encoded key/value and list operations on the cache.
//!
//! These helpers are not part of supervision; a failing call does not
//! affect the cache monitor's state.

use std::collections::HashMap;
use std::time::Duration;

use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CacheStoreError {
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Codec error: {0}")]
    Codec(#[from] serde_json::Error),
}

pub type CacheStoreResult<T> = Result<T, CacheStoreError>;

/// Cache client storing every value as JSON text.
#[derive(Clone)]
pub struct CacheStore {
    conn: MultiplexedConnection,
}

impl CacheStore {
    pub fn new(conn: MultiplexedConnection) -> Self {
        Self { conn }
    }

    /// Open a dedicated connection from a Redis URL.
    pub async fn connect(url: &str) -> CacheStoreResult<Self> {
        let client = redis::Client::open(url)?;
        let conn = client.get_multiplexed_async_connection().await?;
        Ok(Self::new(conn))
    }

    /// Store a value; `None` means no expiry.
    pub async fn set<T: Serialize>(
        &self,
        key: &str,
        value: &T,
        expiration: Option<Duration>,
    ) -> CacheStoreResult<()> {
        let encoded = serde_json::to_string(value)?;
        let mut conn = self.conn.clone();

        match expiration {
            Some(ttl) => {
                let millis = u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX).max(1);
                let _: () = conn.pset_ex(key, encoded, millis).await?;
            }
            None => {
                let _: () = conn.set(key, encoded).await?;
            }
        }

        tracing::trace!(key, "Cache SET");
        Ok(())
    }

    /// Fetch a value; a missing key is `Ok(None)`.
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> CacheStoreResult<Option<T>> {
        let mut conn = self.conn.clone();
        let raw: Option<String> = conn.get(key).await?;
        raw.map(|s| decode(&s)).transpose()
    }

    /// Prepend a value to a list.
    pub async fn push_list<T: Serialize>(&self, key: &str, value: &T) -> CacheStoreResult<()> {
        let encoded = serde_json::to_string(value)?;
        let mut conn = self.conn.clone();
        let _: () = conn.lpush(key, encoded).await?;
        Ok(())
    }

    /// Keep only the elements between `start` and `stop` (inclusive).
    pub async fn trim_list(&self, key: &str, start: isize, stop: isize) -> CacheStoreResult<()> {
        let mut conn = self.conn.clone();
        let _: () = conn.ltrim(key, start, stop).await?;
        Ok(())
    }

    pub async fn get_list<T: DeserializeOwned>(
        &self,
        key: &str,
        start: isize,
        stop: isize,
    ) -> CacheStoreResult<Vec<T>> {
        let mut conn = self.conn.clone();
        let raw: Vec<String> = conn.lrange(key, start, stop).await?;
        raw.iter().map(|s| decode(s)).collect()
    }

    pub async fn delete(&self, key: &str) -> CacheStoreResult<()> {
        let mut conn = self.conn.clone();
        let _: () = conn.del(key).await?;
        Ok(())
    }

    /// Every key starting with `prefix`, decoded.
    pub async fn get_all<T: DeserializeOwned>(
        &self,
        prefix: &str,
    ) -> CacheStoreResult<HashMap<String, T>> {
        let mut conn = self.conn.clone();
        let keys: Vec<String> = conn.keys(format!("{}*", prefix)).await?;

        let mut results = HashMap::with_capacity(keys.len());
        for key in keys {
            // Keys can expire between KEYS and GET.
            let raw: Option<String> = conn.get(&key).await?;
            if let Some(raw) = raw {
                let value = decode(&raw)?;
                results.insert(key, value);
            }
        }
        Ok(results)
    }
}

impl std::fmt::Debug for CacheStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheStore").finish_non_exhaustive()
    }
}

fn decode<T: DeserializeOwned>(raw: &str) -> CacheStoreResult<T> {
    Ok(serde_json::from_str(raw)?)
}
