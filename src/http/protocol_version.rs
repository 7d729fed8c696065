//! Enforces a supported `MCP-Protocol-Version` on every `/mcp` request.

use axum::extract::Request;
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use serde_json::json;

pub const SUPPORTED_VERSIONS: &[&str] = &["2025-06-18", "2025-03-26"];
const DEFAULT_VERSION: &str = "2025-03-26";

pub async fn enforce_protocol_version(mut request: Request, next: Next) -> Response {
    let header = request
        .headers()
        .get("mcp-protocol-version")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    let version = header.unwrap_or_else(|| DEFAULT_VERSION.to_string());

    if !SUPPORTED_VERSIONS.contains(&version.as_str()) {
        let body = json!({
            "error": "unsupported protocol version",
            "supportedVersions": SUPPORTED_VERSIONS,
            "requestedVersion": version,
        });
        return (StatusCode::BAD_REQUEST, axum::Json(body)).into_response();
    }

    request.extensions_mut().insert(ProtocolVersion(version));
    next.run(request).await
}

#[derive(Debug, Clone)]
pub struct ProtocolVersion(pub String);
