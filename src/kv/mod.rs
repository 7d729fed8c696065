//! Pluggable key-value storage abstraction.
//!
//! Grounded on `turbomcp-transport-streamable::session::SessionStore`'s shape
//! (a small async trait with `impl Future` returns, no `dyn`-unsafe generics)
//! but widened from a session-shaped store to a generic KV store, since this
//! gateway persists sessions, OAuth records, and event-journal entries
//! through the same backend.

mod memory;
mod redis_store;

pub use memory::MemoryStore;
pub use redis_store::RedisStore;

use std::time::Duration;

/// Errors from the storage layer. Deliberately smaller than
/// [`crate::error::GatewayError`]: callers decide whether a miss means
/// "not found" or something worse.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("transient storage failure: {0}")]
    Transient(String),

    #[error("stored value could not be deserialized: {0}")]
    Serde(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Backend-agnostic key-value store with TTLs and append-only lists.
///
/// The list operations exist solely for the event journal's per-stream
/// event log: `append_to_list` must be atomic (a concurrent reader should
/// never observe a list whose TTL lapsed between the push and the refresh),
/// which is why it's a single trait method rather than `get` + `set` calls
/// composed by the caller.
#[async_trait::async_trait]
pub trait Store: Send + Sync + 'static {
    async fn get(&self, key: &str) -> Result<Option<String>>;

    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<()>;

    async fn delete(&self, key: &str) -> Result<()>;

    async fn exists(&self, key: &str) -> Result<bool>;

    /// Append `value` to the list at `key`, refreshing the list's TTL to
    /// `ttl` as part of the same atomic operation, and return the list's
    /// new length.
    async fn append_to_list(&self, key: &str, value: String, ttl: Duration) -> Result<usize>;

    /// Full contents of the list at `key`, in append order.
    async fn list_range(&self, key: &str) -> Result<Vec<String>>;

    async fn delete_list(&self, key: &str) -> Result<()>;
}

/// Convenience helpers layered over [`Store`] for JSON-shaped values.
#[async_trait::async_trait]
pub trait StoreExt: Store {
    async fn get_json<T: serde::de::DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.get(key).await? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    async fn set_json<T: serde::Serialize + Sync>(
        &self,
        key: &str,
        value: &T,
        ttl: Duration,
    ) -> Result<()> {
        let raw = serde_json::to_string(value)?;
        self.set(key, raw, ttl).await
    }
}

impl<S: Store + ?Sized> StoreExt for S {}
