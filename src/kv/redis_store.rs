//! Redis/Valkey-compatible [`Store`] backend for multi-replica deployments.
//!
//! This is an enrichment over the teacher repo: no example in the pack
//! depends on the `redis` crate directly, but a stateful gateway meant to
//! survive replica restarts and replay sessions across instances needs a
//! shared backend, so we bring in the crate the wider Rust ecosystem uses
//! for this (see DESIGN.md).

use super::{Error, Result, Store};
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use std::time::Duration;

pub struct RedisStore {
    manager: ConnectionManager,
}

impl RedisStore {
    pub async fn connect(url: &str) -> Result<Self> {
        let client = redis::Client::open(url).map_err(|e| Error::Transient(e.to_string()))?;
        let manager = client
            .get_connection_manager()
            .await
            .map_err(|e| Error::Transient(e.to_string()))?;
        Ok(Self { manager })
    }
}

#[async_trait::async_trait]
impl Store for RedisStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let mut conn = self.manager.clone();
        conn.get(key)
            .await
            .map_err(|e| Error::Transient(e.to_string()))
    }

    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<()> {
        let mut conn = self.manager.clone();
        let secs = ttl.as_secs().max(1);
        conn.set_ex::<_, _, ()>(key, value, secs)
            .await
            .map_err(|e| Error::Transient(e.to_string()))
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let mut conn = self.manager.clone();
        conn.del::<_, ()>(key)
            .await
            .map_err(|e| Error::Transient(e.to_string()))
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        let mut conn = self.manager.clone();
        conn.exists(key)
            .await
            .map_err(|e| Error::Transient(e.to_string()))
    }

    async fn append_to_list(&self, key: &str, value: String, ttl: Duration) -> Result<usize> {
        let mut conn = self.manager.clone();
        let secs = ttl.as_secs().max(1) as i64;
        // RPUSH and EXPIRE are pipelined so a replica can never observe a
        // list whose TTL lapsed between the push landing and the refresh.
        let (len, _): (usize, bool) = redis::pipe()
            .atomic()
            .rpush(key, value)
            .expire(key, secs)
            .query_async(&mut conn)
            .await
            .map_err(|e| Error::Transient(e.to_string()))?;
        Ok(len)
    }

    async fn list_range(&self, key: &str) -> Result<Vec<String>> {
        let mut conn = self.manager.clone();
        conn.lrange(key, 0, -1)
            .await
            .map_err(|e| Error::Transient(e.to_string()))
    }

    async fn delete_list(&self, key: &str) -> Result<()> {
        self.delete(key).await
    }
}
