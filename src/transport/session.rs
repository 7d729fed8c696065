//! MCP session identity and lifecycle state.
//!
//! Grounded on `turbomcp-transport-streamable::session::{SessionId,
//! SessionState, Session}`: the `mcp-{hex}` id format, the bounded length
//! check, and the active/pending/terminated/expired state machine are kept
//! as-is; `last_event_id`/`event_count` are dropped from the session record
//! itself since that bookkeeping now lives per-stream in the event journal
//! rather than per-session.

use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

pub const MAX_SESSION_ID_LEN: usize = 256;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(String);

impl SessionId {
    /// Generate a new id: `mcp-` followed by 32 hex characters (128 bits of
    /// randomness from `uuid`'s v4 generator, hyphens stripped).
    pub fn generate() -> Self {
        let hex = uuid::Uuid::new_v4().simple().to_string();
        Self(format!("mcp-{hex}"))
    }

    /// Validate an externally supplied session id (from `Mcp-Session-Id`),
    /// rejecting anything implausible before it ever reaches storage.
    pub fn try_new(raw: impl Into<String>) -> Option<Self> {
        let raw = raw.into();
        if raw.is_empty() || raw.len() > MAX_SESSION_ID_LEN {
            return None;
        }
        if !raw.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
            return None;
        }
        Some(Self(raw))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Active,
    Pending,
    Terminated,
    Expired,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub id: SessionId,
    pub state: SessionState,
    pub created_at: i64,
    pub last_activity: i64,
    pub protocol_version: String,
    pub client_info: Option<serde_json::Value>,
    /// The client's original `initialize` request, persisted so a replica
    /// that never saw it can replay the handshake when this session
    /// resurfaces on a new instance.
    pub initial_request: serde_json::Value,
}

impl Session {
    pub fn new(id: SessionId, protocol_version: String, initial_request: serde_json::Value) -> Self {
        let now = now_secs();
        Self {
            id,
            state: SessionState::Active,
            created_at: now,
            last_activity: now,
            protocol_version,
            client_info: None,
            initial_request,
        }
    }

    pub fn is_active(&self) -> bool {
        self.state == SessionState::Active
    }

    pub fn can_accept_requests(&self) -> bool {
        matches!(self.state, SessionState::Active | SessionState::Pending)
    }

    pub fn touch(&mut self) {
        self.last_activity = now_secs();
    }

    pub fn terminate(&mut self) {
        self.state = SessionState::Terminated;
    }

    pub fn is_expired(&self, ttl_secs: i64) -> bool {
        now_secs() - self.last_activity > ttl_secs
    }
}

fn now_secs() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs() as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_id_has_expected_shape() {
        let id = SessionId::generate();
        assert!(id.as_str().starts_with("mcp-"));
        assert_eq!(id.as_str().len(), "mcp-".len() + 32);
    }

    #[test]
    fn try_new_rejects_oversized_id() {
        let too_long = "a".repeat(MAX_SESSION_ID_LEN + 1);
        assert!(SessionId::try_new(too_long).is_none());
    }

    #[test]
    fn try_new_rejects_unexpected_characters() {
        assert!(SessionId::try_new("mcp-abc/def").is_none());
        assert!(SessionId::try_new("mcp-abc-def").is_some());
    }

    #[test]
    fn new_session_is_active_and_fresh() {
        let session = Session::new(
            SessionId::generate(),
            "2025-06-18".to_string(),
            serde_json::json!({"method": "initialize"}),
        );
        assert!(session.is_active());
        assert!(session.can_accept_requests());
        assert!(!session.is_expired(3600));
    }
}
