//! Cross-instance session registry plus this-process transport handles.
//!
//! A [`Session`] is replicated state: any instance can read or write it
//! through the shared [`Store`]. A "transport" is the live, in-memory
//! handle for a connection actually terminated on *this* process — an SSE
//! stream's channel sender — and can never be looked up from another
//! instance, which is exactly the gap the session replay engine exists to
//! paper over.

use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

use crate::kv::{Store, StoreExt};
use crate::transport::session::{Session, SessionId};

fn session_key(id: &SessionId) -> String {
    format!("mcp-session:{id}")
}

/// A live SSE stream's outbound channel, held only on the instance that
/// accepted the connection.
pub type TransportHandle = mpsc::Sender<String>;

pub struct TransportRegistry {
    store: Arc<dyn Store>,
    session_ttl: Duration,
    transports: DashMap<String, TransportHandle>,
}

impl TransportRegistry {
    pub fn new(store: Arc<dyn Store>, session_ttl: Duration) -> Self {
        Self {
            store,
            session_ttl,
            transports: DashMap::new(),
        }
    }

    pub async fn has_session(&self, id: &SessionId) -> crate::kv::Result<bool> {
        self.store.exists(&session_key(id)).await
    }

    pub async fn get_session(&self, id: &SessionId) -> crate::kv::Result<Option<Session>> {
        self.store.get_json(&session_key(id)).await
    }

    pub async fn save_session(&self, session: &Session) -> crate::kv::Result<()> {
        self.store
            .set_json(&session_key(&session.id), session, self.session_ttl)
            .await
    }

    pub async fn terminate_session(&self, id: &SessionId) -> crate::kv::Result<()> {
        self.store.delete(&session_key(id)).await
    }

    /// Whether this process holds a live transport handle for `stream_id`.
    /// A `false` result on a session known to [`has_session`] is precisely
    /// the cross-instance case the replay engine handles.
    pub fn has_transport(&self, stream_id: &str) -> bool {
        self.transports.contains_key(stream_id)
    }

    pub fn get_transport(&self, stream_id: &str) -> Option<TransportHandle> {
        self.transports.get(stream_id).map(|entry| entry.value().clone())
    }

    /// Register a new local transport handle, returning the receiver half
    /// for the HTTP layer to stream out as SSE.
    pub fn create_transport(&self, stream_id: String, buffer: usize) -> mpsc::Receiver<String> {
        let (tx, rx) = mpsc::channel(buffer);
        self.transports.insert(stream_id, tx);
        rx
    }

    pub fn delete_transport(&self, stream_id: &str) {
        self.transports.remove(stream_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kv::MemoryStore;

    fn registry() -> TransportRegistry {
        TransportRegistry::new(Arc::new(MemoryStore::new()), Duration::from_secs(3600))
    }

    #[tokio::test]
    async fn session_round_trips_through_store() {
        let registry = registry();
        let session = Session::new(
            SessionId::generate(),
            "2025-06-18".to_string(),
            serde_json::json!({"method": "initialize"}),
        );
        registry.save_session(&session).await.unwrap();
        assert!(registry.has_session(&session.id).await.unwrap());
        let fetched = registry.get_session(&session.id).await.unwrap().unwrap();
        assert_eq!(fetched.id, session.id);
    }

    #[test]
    fn transport_handles_are_process_local() {
        let registry = registry();
        assert!(!registry.has_transport("stream-1"));
        let _rx = registry.create_transport("stream-1".to_string(), 16);
        assert!(registry.has_transport("stream-1"));
        registry.delete_transport("stream-1");
        assert!(!registry.has_transport("stream-1"));
    }
}
