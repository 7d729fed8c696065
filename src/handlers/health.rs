//! Unauthenticated liveness/readiness and informational endpoints.

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::app::AppState;
use crate::config::Environment;

#[derive(Serialize)]
pub struct Banner {
    name: &'static str,
    version: &'static str,
}

pub async fn root() -> Json<Banner> {
    Json(Banner {
        name: env!("CARGO_PKG_NAME"),
        version: env!("CARGO_PKG_VERSION"),
    })
}

pub async fn ping() -> &'static str {
    "pong"
}

#[derive(Serialize)]
pub struct Health {
    status: &'static str,
    timestamp: String,
    uptime_seconds: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    version: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    environment: Option<&'static str>,
}

/// `version`/`environment` are redacted in production so the response
/// doesn't hand an unauthenticated caller the exact build running.
pub async fn health(State(state): State<AppState>) -> Json<Health> {
    let production = state.config.server.environment == Environment::Production;
    Json(Health {
        status: "ok",
        timestamp: chrono::Utc::now().to_rfc3339(),
        uptime_seconds: state.started_at.elapsed().as_secs(),
        version: (!production).then(|| env!("CARGO_PKG_VERSION")),
        environment: (!production).then(|| match state.config.server.environment {
            Environment::Development => "development",
            Environment::Production => "production",
        }),
    })
}

/// Aggregate counters for registered clients, in-flight authorization
/// sessions, and tracked tokens. Grounded on
/// `turbomcp-auth::auth_metrics`'s counter surface; unauthenticated since
/// it exposes counts only, never the underlying records.
#[derive(Serialize)]
pub struct OAuthStats {
    pub registered_clients: usize,
    pub active_authorization_sessions: usize,
    pub live_tokens: usize,
}

pub async fn oauth_stats(State(state): State<AppState>) -> Json<OAuthStats> {
    let snapshot = state.metrics.snapshot();
    Json(OAuthStats {
        registered_clients: snapshot.registered_clients,
        active_authorization_sessions: snapshot.active_authorization_sessions,
        live_tokens: snapshot.live_tokens,
    })
}
