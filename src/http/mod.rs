//! The HTTP middleware pipeline: security headers, rate limiting, request
//! logging, protocol-version enforcement, correlation-id propagation, and
//! CORS/Origin pinning, applied in the order the ambient logging context
//! expects to see requests arrive.

pub mod client_ip;
pub mod cors;
pub mod logging;
pub mod protocol_version;
pub mod rate_limit;
pub mod security;

use axum::middleware;
use axum::Router;

use crate::app::AppState;

/// Wrap `router` in the pipeline every route gets: security headers and
/// rate limiting run outermost (cheapest rejection first), then request
/// logging installs the ambient context everything below relies on.
pub fn apply_global_pipeline(router: Router<AppState>, state: AppState) -> Router<AppState> {
    router
        .layer(middleware::from_fn(logging::request_logging))
        .layer(middleware::from_fn_with_state(state.clone(), rate_limit::rate_limit))
        .layer(middleware::from_fn(security::security_headers))
}

/// Wrap `router` in the `/mcp`-specific pipeline: protocol-version
/// enforcement and CORS/Origin pinning. The gateway only applies these to
/// the MCP transport surface, not to OAuth or discovery endpoints.
pub fn apply_mcp_pipeline(router: Router<AppState>, state: AppState) -> Router<AppState> {
    router
        .layer(middleware::from_fn_with_state(state.clone(), cors::pin_origin))
        .layer(cors::build_cors_layer(&state.config.server.http.allowed_origins))
        .layer(middleware::from_fn(protocol_version::enforce_protocol_version))
}
