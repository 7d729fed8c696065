//! In-process [`Store`] backed by `dashmap`, for single-replica deployments
//! and tests. `Epistates-turbomcp` reaches for `dashmap` wherever it needs a
//! concurrent map without a surrounding async mutex; we follow that here.

use super::{Error, Result, Store};
use dashmap::DashMap;
use rand::Rng;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

struct Entry {
    value: Value,
    expires_at: Instant,
}

enum Value {
    Scalar(String),
    List(Vec<String>),
}

/// Every `PROBE_INTERVAL`th write triggers a lazy expiry sweep over a random
/// sample of keys, matching the amortized-cleanup pattern of letting reads
/// evict stale entries rather than running a background reaper task.
const PROBE_INTERVAL: usize = 32;
const PROBE_SAMPLE: usize = 20;

pub struct MemoryStore {
    data: DashMap<String, Entry>,
    writes: AtomicUsize,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            data: DashMap::new(),
            writes: AtomicUsize::new(0),
        }
    }

    fn is_live(entry: &Entry, now: Instant) -> bool {
        entry.expires_at > now
    }

    /// Sample a handful of keys and evict whichever have expired. Called
    /// opportunistically after writes rather than on a timer, so an idle
    /// store never spends CPU on cleanup it doesn't need.
    fn maybe_sweep(&self) {
        let count = self.writes.fetch_add(1, Ordering::Relaxed);
        if count % PROBE_INTERVAL != 0 {
            return;
        }
        let now = Instant::now();
        let mut rng = rand::rng();
        let len = self.data.len();
        if len == 0 {
            return;
        }
        let sample = PROBE_SAMPLE.min(len);
        let mut expired = Vec::with_capacity(sample);
        for entry in self.data.iter().take(len) {
            if expired.len() >= sample {
                break;
            }
            // Cheap pseudo-sampling: skip a random prefix so repeated
            // sweeps don't always probe the same head of the map.
            if rng.random_bool(0.5) && !Self::is_live(entry.value(), now) {
                expired.push(entry.key().clone());
            }
        }
        for key in expired {
            self.data.remove(&key);
        }
    }

    /// Evict `key` if its TTL has lapsed, then return whether it is still
    /// present. Checking and removing are two separate map operations
    /// (rather than holding a `Ref` across the removal) since `DashMap`
    /// would deadlock removing a key whose shard a live guard still locks.
    fn evict_if_expired(&self, key: &str) {
        let now = Instant::now();
        let expired = self
            .data
            .get(key)
            .map(|entry| !Self::is_live(entry.value(), now))
            .unwrap_or(false);
        if expired {
            self.data.remove(key);
        }
    }
}

#[async_trait::async_trait]
impl Store for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        self.maybe_sweep();
        self.evict_if_expired(key);
        Ok(self.data.get(key).and_then(|entry| match &entry.value().value {
            Value::Scalar(s) => Some(s.clone()),
            Value::List(_) => None,
        }))
    }

    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<()> {
        self.maybe_sweep();
        self.data.insert(
            key.to_string(),
            Entry {
                value: Value::Scalar(value),
                expires_at: Instant::now() + ttl,
            },
        );
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.data.remove(key);
        Ok(())
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        self.maybe_sweep();
        self.evict_if_expired(key);
        Ok(self.data.contains_key(key))
    }

    async fn append_to_list(&self, key: &str, value: String, ttl: Duration) -> Result<usize> {
        self.maybe_sweep();
        let mut len = 0;
        self.data
            .entry(key.to_string())
            .and_modify(|entry| {
                if !Self::is_live(entry, Instant::now()) {
                    entry.value = Value::List(Vec::new());
                }
                if let Value::List(items) = &mut entry.value {
                    items.push(value.clone());
                    len = items.len();
                }
                entry.expires_at = Instant::now() + ttl;
            })
            .or_insert_with(|| {
                len = 1;
                Entry {
                    value: Value::List(vec![value.clone()]),
                    expires_at: Instant::now() + ttl,
                }
            });
        Ok(len)
    }

    async fn list_range(&self, key: &str) -> Result<Vec<String>> {
        self.maybe_sweep();
        self.evict_if_expired(key);
        Ok(self
            .data
            .get(key)
            .map(|entry| match &entry.value().value {
                Value::List(items) => items.clone(),
                Value::Scalar(_) => Vec::new(),
            })
            .unwrap_or_default())
    }

    async fn delete_list(&self, key: &str) -> Result<()> {
        self.data.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn set_then_get_round_trips() {
        let store = MemoryStore::new();
        store
            .set("k", "v".to_string(), Duration::from_secs(60))
            .await
            .unwrap();
        assert_eq!(store.get("k").await.unwrap(), Some("v".to_string()));
    }

    #[tokio::test]
    async fn expired_entries_read_as_missing() {
        let store = MemoryStore::new();
        store
            .set("k", "v".to_string(), Duration::from_millis(1))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(store.get("k").await.unwrap(), None);
    }

    #[tokio::test]
    async fn append_to_list_accumulates_and_refreshes_ttl() {
        let store = MemoryStore::new();
        let ttl = Duration::from_secs(60);
        assert_eq!(
            store.append_to_list("stream", "a".to_string(), ttl).await.unwrap(),
            1
        );
        assert_eq!(
            store.append_to_list("stream", "b".to_string(), ttl).await.unwrap(),
            2
        );
        assert_eq!(
            store.list_range("stream").await.unwrap(),
            vec!["a".to_string(), "b".to_string()]
        );
    }

    #[tokio::test]
    async fn delete_removes_scalar_and_list() {
        let store = MemoryStore::new();
        store
            .set("s", "v".to_string(), Duration::from_secs(60))
            .await
            .unwrap();
        store.delete("s").await.unwrap();
        assert!(!store.exists("s").await.unwrap());
    }
}
