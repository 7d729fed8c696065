//! Installs the ambient per-request logging context and emits a structured
//! access log line for every request.

use std::time::Instant;

use axum::extract::Request;
use axum::middleware::Next;
use axum::response::Response;
use uuid::Uuid;

use crate::context::{self, RequestContext};
use crate::http::client_ip::extract_client_ip;

pub async fn request_logging(request: Request, next: Next) -> Response {
    let request_id = Uuid::new_v4().to_string();
    let client_ip = extract_client_ip(request.headers());
    let user_agent = request
        .headers()
        .get(axum::http::header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let mcp_session_id = request
        .headers()
        .get("mcp-session-id")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    let ctx = RequestContext::new(request_id, client_ip)
        .with_user_agent(user_agent)
        .with_mcp_session_id(mcp_session_id);
    let span = ctx.span();
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    context::scope(ctx, async move {
        let start = Instant::now();
        span.in_scope(|| tracing::info!(%method, %path, "request started"));

        let response = next.run(request).await;

        span.in_scope(|| {
            tracing::info!(
                %method,
                %path,
                status = response.status().as_u16(),
                elapsed_ms = start.elapsed().as_millis() as u64,
                "request completed"
            );
        });
        response
    })
    .await
}
