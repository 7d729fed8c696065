//! In-process counters backing `GET /oauth/stats`.
//!
//! Grounded on `turbomcp-auth::auth_metrics`'s counter surface. These are
//! per-instance approximations, not a replicated count: a multi-replica
//! deployment's `/oauth/stats` reflects whichever instance answered the
//! request, which is adequate for an informational endpoint and is not
//! used anywhere invariants depend on exact counts.

use std::sync::atomic::{AtomicUsize, Ordering};

#[derive(Default)]
pub struct AuthMetrics {
    registered_clients: AtomicUsize,
    active_authorization_sessions: AtomicUsize,
    live_tokens: AtomicUsize,
}

impl AuthMetrics {
    pub fn client_registered(&self) {
        self.registered_clients.fetch_add(1, Ordering::Relaxed);
    }

    pub fn authorization_session_started(&self) {
        self.active_authorization_sessions.fetch_add(1, Ordering::Relaxed);
    }

    pub fn authorization_session_ended(&self) {
        self.active_authorization_sessions.fetch_sub(1, Ordering::Relaxed);
    }

    pub fn token_issued(&self) {
        self.live_tokens.fetch_add(1, Ordering::Relaxed);
    }

    pub fn token_revoked(&self) {
        self.live_tokens.fetch_sub(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> AuthMetricsSnapshot {
        AuthMetricsSnapshot {
            registered_clients: self.registered_clients.load(Ordering::Relaxed),
            active_authorization_sessions: self.active_authorization_sessions.load(Ordering::Relaxed),
            live_tokens: self.live_tokens.load(Ordering::Relaxed),
        }
    }
}

pub struct AuthMetricsSnapshot {
    pub registered_clients: usize,
    pub active_authorization_sessions: usize,
    pub live_tokens: usize,
}
