//! Cross-instance session replay.
//!
//! When a request arrives for a session this process has never seen (no
//! local transport handle, but the session exists in shared storage), the
//! only way to rebuild whatever in-memory state the MCP core attaches to a
//! session is to replay the `initialize` request that created it. This
//! engine does exactly that before the real request is allowed through.

use crate::error::{GatewayError, GatewayResult};
use crate::mcp_core::McpCore;
use crate::transport::registry::TransportRegistry;
use crate::transport::session::{Session, SessionId};

/// Ensure `session_id` has live, process-local state before a request
/// against it proceeds: if this instance has already reconstructed it
/// (whether by handling the original `initialize` or by a previous replay),
/// this is a no-op; otherwise the session's persisted `initialize` request
/// is replayed through [`McpCore`] to reconstruct it.
pub async fn ensure_replayed(
    registry: &TransportRegistry,
    core: &McpCore,
    session_id: &SessionId,
) -> GatewayResult<Session> {
    let session = registry
        .get_session(session_id)
        .await
        .map_err(|e| GatewayError::StorageFailure(e.to_string()))?
        .ok_or_else(|| GatewayError::InvalidRequest(format!("unknown session: {session_id}")))?;

    if !session.can_accept_requests() {
        return Err(GatewayError::InvalidRequest(format!(
            "session {session_id} is no longer accepting requests"
        )));
    }

    if core.has_replayed(session_id) {
        return Ok(session);
    }

    tracing::info!(session_id = %session_id, "replaying initialize handshake on new instance");
    core.replay_initialize(session_id, &session.initial_request)
        .await
        .map_err(|e| GatewayError::Internal(format!("session replay failed: {e}")))?;

    Ok(session)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kv::MemoryStore;
    use std::sync::Arc;
    use std::time::Duration;

    #[tokio::test]
    async fn missing_session_is_not_found() {
        let registry = TransportRegistry::new(Arc::new(MemoryStore::new()), Duration::from_secs(60));
        let core = McpCore::new();
        let result = ensure_replayed(&registry, &core, &SessionId::generate()).await;
        assert!(matches!(result, Err(GatewayError::InvalidRequest(_))));
    }

    #[tokio::test]
    async fn already_replayed_session_skips_replay_again() {
        let registry = TransportRegistry::new(Arc::new(MemoryStore::new()), Duration::from_secs(60));
        let core = McpCore::new();
        let session = Session::new(
            SessionId::generate(),
            "2025-06-18".to_string(),
            serde_json::json!({"method": "initialize"}),
        );
        registry.save_session(&session).await.unwrap();
        core.replay_initialize(&session.id, &session.initial_request)
            .await
            .unwrap();

        let replayed = ensure_replayed(&registry, &core, &session.id).await.unwrap();
        assert_eq!(replayed.id, session.id);
    }

    #[tokio::test]
    async fn unreplayed_session_is_replayed_on_demand() {
        let registry = TransportRegistry::new(Arc::new(MemoryStore::new()), Duration::from_secs(60));
        let core = McpCore::new();
        let session = Session::new(
            SessionId::generate(),
            "2025-06-18".to_string(),
            serde_json::json!({"method": "initialize", "params": {}}),
        );
        registry.save_session(&session).await.unwrap();

        ensure_replayed(&registry, &core, &session.id).await.unwrap();
        assert!(core.has_replayed(&session.id));
    }
}
