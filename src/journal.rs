//! SSE event journal: per-stream append-only event log supporting
//! `Last-Event-ID` resumption.
//!
//! Grounded jointly on `turbomcp-transport-streamable::session::StoredEvent`
//! (id/event_type/data/timestamp shape, builder-style construction) and the
//! `EventStore` trait from the pack's `rust-mcp-transport::event_store`
//! reference file (`store_event`/`events_after`/ascending-timestamp replay
//! naming).

use crate::kv::{Store, StoreExt};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

/// A single journaled SSE event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredEvent {
    pub id: String,
    pub event_type: String,
    pub data: String,
    /// Milliseconds since the Unix epoch, used only to order replay; the
    /// journal's own append order is authoritative since stores may append
    /// within the same millisecond.
    pub timestamp: u128,
}

impl StoredEvent {
    pub fn new(event_type: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            event_type: event_type.into(),
            data: data.into(),
            timestamp: now_millis(),
        }
    }

    /// Render as an SSE wire frame: `id: ...\nevent: ...\ndata: ...\n\n`.
    pub fn to_sse_frame(&self) -> String {
        format!(
            "id: {}\nevent: {}\ndata: {}\n\n",
            self.id, self.event_type, self.data
        )
    }
}

fn now_millis() -> u128 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis()
}

fn stream_key(stream_id: &str) -> String {
    format!("mcp-stream:{stream_id}")
}

/// Appends and replays events for one or more SSE streams, keyed by an
/// opaque `stream_id` (the Streamable HTTP transport's per-connection
/// identifier, not the MCP session id — a session can open many streams
/// over its lifetime).
pub struct EventJournal {
    store: Arc<dyn Store>,
    ttl: Duration,
}

impl EventJournal {
    pub fn new(store: Arc<dyn Store>, ttl: Duration) -> Self {
        Self { store, ttl }
    }

    /// Append `event` to `stream_id`'s journal, refreshing the journal's TTL.
    pub async fn store_event(&self, stream_id: &str, event: StoredEvent) -> crate::kv::Result<()> {
        let raw = serde_json::to_string(&event)?;
        self.store
            .append_to_list(&stream_key(stream_id), raw, self.ttl)
            .await?;
        Ok(())
    }

    /// Every event journaled for `stream_id`, oldest first.
    pub async fn events_for(&self, stream_id: &str) -> crate::kv::Result<Vec<StoredEvent>> {
        let raw = self.store.list_range(&stream_key(stream_id)).await?;
        deserialize_events(raw)
    }

    /// Events in `stream_id`'s journal strictly after `last_event_id`, in
    /// ascending timestamp order, for resuming a dropped SSE connection via
    /// `Last-Event-ID`. Returns `None` if `last_event_id` isn't present in
    /// the journal (the resumption point has expired or never existed; the
    /// caller should fall back to a fresh stream rather than a partial one).
    pub async fn replay_after(
        &self,
        stream_id: &str,
        last_event_id: &str,
    ) -> crate::kv::Result<Option<Vec<StoredEvent>>> {
        let events = self.events_for(stream_id).await?;
        let Some(position) = events.iter().position(|e| e.id == last_event_id) else {
            return Ok(None);
        };
        Ok(Some(events[position + 1..].to_vec()))
    }

    pub async fn clear_stream(&self, stream_id: &str) -> crate::kv::Result<()> {
        self.store.delete_list(&stream_key(stream_id)).await
    }
}

fn deserialize_events(raw: Vec<String>) -> crate::kv::Result<Vec<StoredEvent>> {
    raw.into_iter()
        .map(|s| serde_json::from_str(&s).map_err(crate::kv::Error::from))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kv::MemoryStore;

    fn journal() -> EventJournal {
        EventJournal::new(Arc::new(MemoryStore::new()), Duration::from_secs(60))
    }

    #[tokio::test]
    async fn events_replay_in_append_order() {
        let journal = journal();
        let first = StoredEvent::new("message", "one");
        let second = StoredEvent::new("message", "two");
        journal.store_event("s1", first.clone()).await.unwrap();
        journal.store_event("s1", second.clone()).await.unwrap();

        let events = journal.events_for("s1").await.unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].id, first.id);
        assert_eq!(events[1].id, second.id);
    }

    #[tokio::test]
    async fn replay_after_returns_only_later_events() {
        let journal = journal();
        let first = StoredEvent::new("message", "one");
        let second = StoredEvent::new("message", "two");
        let third = StoredEvent::new("message", "three");
        journal.store_event("s1", first.clone()).await.unwrap();
        journal.store_event("s1", second.clone()).await.unwrap();
        journal.store_event("s1", third.clone()).await.unwrap();

        let replayed = journal.replay_after("s1", &first.id).await.unwrap().unwrap();
        assert_eq!(replayed.len(), 2);
        assert_eq!(replayed[0].id, second.id);
        assert_eq!(replayed[1].id, third.id);
    }

    #[tokio::test]
    async fn replay_after_unknown_id_returns_none() {
        let journal = journal();
        journal
            .store_event("s1", StoredEvent::new("message", "one"))
            .await
            .unwrap();
        assert!(journal.replay_after("s1", "missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn sse_frame_includes_id_event_and_data() {
        let event = StoredEvent::new("message", "payload");
        let frame = event.to_sse_frame();
        assert!(frame.starts_with(&format!("id: {}\n", event.id)));
        assert!(frame.contains("event: message\n"));
        assert!(frame.contains("data: payload\n"));
    }
}
