//! Cross-instance session replay: a session created on one `TransportRegistry`
//! + `McpCore` pair (simulating one gateway replica) must still be usable
//! from a second, independent pair that shares the same backing store
//! (simulating a second replica or a restart), by replaying its persisted
//! `initialize` request.

use std::sync::Arc;
use std::time::Duration;

use mcp_gateway::kv::{MemoryStore, Store};
use mcp_gateway::mcp_core::McpCore;
use mcp_gateway::transport::registry::TransportRegistry;
use mcp_gateway::transport::replay::ensure_replayed;
use mcp_gateway::transport::session::{Session, SessionId};

#[tokio::test]
async fn session_survives_replica_handoff() {
    let shared_store: Arc<dyn Store> = Arc::new(MemoryStore::new());

    // Replica A handles the initial handshake.
    let registry_a = TransportRegistry::new(shared_store.clone(), Duration::from_secs(3600));
    let core_a = McpCore::new();
    let session = Session::new(
        SessionId::generate(),
        "2025-06-18".to_string(),
        serde_json::json!({"jsonrpc": "2.0", "id": 1, "method": "initialize", "params": {}}),
    );
    registry_a.save_session(&session).await.unwrap();
    core_a.replay_initialize(&session.id, &session.initial_request).await.unwrap();
    assert!(core_a.has_replayed(&session.id));

    // Replica B has never seen this session: no local transport, no
    // replayed-session marker, but the same shared store.
    let registry_b = TransportRegistry::new(shared_store.clone(), Duration::from_secs(3600));
    let core_b = McpCore::new();
    assert!(!core_b.has_replayed(&session.id));

    let replayed = ensure_replayed(&registry_b, &core_b, &session.id).await.unwrap();
    assert_eq!(replayed.id, session.id);
    assert!(core_b.has_replayed(&session.id));

    // A second request on replica B no longer needs to replay again.
    ensure_replayed(&registry_b, &core_b, &session.id).await.unwrap();
}

#[tokio::test]
async fn terminated_session_cannot_be_replayed() {
    let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
    let registry = TransportRegistry::new(store, Duration::from_secs(3600));
    let core = McpCore::new();
    let mut session = Session::new(
        SessionId::generate(),
        "2025-06-18".to_string(),
        serde_json::json!({"method": "initialize"}),
    );
    session.terminate();
    registry.save_session(&session).await.unwrap();

    let result = ensure_replayed(&registry, &core, &session.id).await;
    assert!(result.is_err());
}
