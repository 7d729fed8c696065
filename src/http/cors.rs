//! CORS policy and `Origin` pinning.
//!
//! `tower-http::cors::CorsLayer` handles the preflight/response-header
//! mechanics; on top of it, `pin_origin` rejects any `/mcp` request whose
//! `Origin` header isn't in the configured allowlist outright, which a
//! browser-enforced CORS policy alone doesn't guarantee against a
//! same-origin DNS-rebinding attacker that never triggers a preflight.

use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use tower_http::cors::{AllowOrigin, CorsLayer};

use crate::app::AppState;

fn origin_allowed(allowed_origins: &[String], origin: &str) -> bool {
    allowed_origins.iter().any(|allowed| allowed == "*" || allowed == origin)
}

pub fn build_cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origins = allowed_origins.to_vec();
    CorsLayer::new()
        .allow_origin(AllowOrigin::predicate(move |origin, _| {
            origin.to_str().map(|o| origin_allowed(&origins, o)).unwrap_or(false)
        }))
        .allow_methods([
            axum::http::Method::GET,
            axum::http::Method::POST,
            axum::http::Method::DELETE,
            axum::http::Method::OPTIONS,
        ])
        .allow_headers([
            axum::http::header::CONTENT_TYPE,
            axum::http::HeaderName::from_static("mcp-session-id"),
            axum::http::HeaderName::from_static("mcp-protocol-version"),
            axum::http::HeaderName::from_static("last-event-id"),
            axum::http::header::AUTHORIZATION,
        ])
        .expose_headers([axum::http::HeaderName::from_static("mcp-session-id")])
}

pub async fn pin_origin(State(state): State<AppState>, request: Request, next: Next) -> Response {
    if request.method() == axum::http::Method::OPTIONS {
        return next.run(request).await;
    }

    let Some(origin) = request
        .headers()
        .get(axum::http::header::ORIGIN)
        .and_then(|v| v.to_str().ok())
    else {
        // Non-browser clients (server-to-server, CLIs) send no Origin at all;
        // only browser-originated cross-origin requests carry one, so a
        // missing header is not itself suspicious.
        return next.run(request).await;
    };

    if !origin_allowed(&state.config.server.http.allowed_origins, origin) {
        return (StatusCode::FORBIDDEN, "origin not allowed").into_response();
    }

    next.run(request).await
}
