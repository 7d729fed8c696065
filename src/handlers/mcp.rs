//! `/mcp` — the Streamable HTTP transport surface.
//!
//! `POST` carries one JSON-RPC request (and may reply either with a single
//! JSON body or an SSE stream, depending on what the request needs); `GET`
//! opens a standalone SSE stream for server-initiated messages, honoring
//! `Last-Event-ID` for resumption; `DELETE` tears the session down.

use axum::body::Body;
use axum::extract::State;
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use tokio_stream::wrappers::ReceiverStream;
use tokio_stream::StreamExt;

use crate::app::AppState;
use crate::error::{GatewayError, GatewayResult};
use crate::mcp_core::types::JsonRpcRequest;
use crate::transport::replay;
use crate::transport::session::{Session, SessionId};

const SESSION_HEADER: &str = "mcp-session-id";
const LAST_EVENT_ID_HEADER: &str = "last-event-id";

fn session_id_from_headers(headers: &HeaderMap) -> Option<SessionId> {
    headers
        .get(SESSION_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(SessionId::try_new)
}

pub async fn post_mcp(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<JsonRpcRequest>,
) -> GatewayResult<Response> {
    if request.method == "initialize" {
        return initialize(state, request).await;
    }

    let session_id = session_id_from_headers(&headers)
        .ok_or_else(|| GatewayError::InvalidRequest("missing or invalid mcp-session-id header".to_string()))?;
    let session = replay::ensure_replayed(&state.registry, &state.core, &session_id).await?;
    let _ = session; // presence already validated by ensure_replayed

    let response = state.core.handle(request);
    Ok(Json(response).into_response())
}

async fn initialize(state: AppState, request: JsonRpcRequest) -> GatewayResult<Response> {
    let protocol_version = request
        .params
        .get("protocolVersion")
        .and_then(serde_json::Value::as_str)
        .unwrap_or(crate::http::protocol_version::SUPPORTED_VERSIONS[0])
        .to_string();

    let session_id = SessionId::generate();
    let initial_request = serde_json::to_value(&request).map_err(|e| GatewayError::Internal(e.to_string()))?;
    let session = Session::new(session_id.clone(), protocol_version, initial_request);

    state
        .registry
        .save_session(&session)
        .await
        .map_err(|e| GatewayError::StorageFailure(e.to_string()))?;
    state
        .core
        .replay_initialize(&session_id, &session.initial_request)
        .await
        .map_err(GatewayError::Internal)?;

    let response = state.core.handle(request);
    let mut http_response = Json(response).into_response();
    http_response.headers_mut().insert(
        SESSION_HEADER,
        HeaderValue::from_str(session_id.as_str()).expect("session id is a valid header value"),
    );
    Ok(http_response)
}

pub async fn get_mcp(State(state): State<AppState>, headers: HeaderMap) -> GatewayResult<Response> {
    let session_id = session_id_from_headers(&headers)
        .ok_or_else(|| GatewayError::InvalidRequest("missing or invalid mcp-session-id header".to_string()))?;
    replay::ensure_replayed(&state.registry, &state.core, &session_id).await?;

    let stream_id = session_id.as_str().to_string();
    let rx = state.registry.create_transport(stream_id.clone(), 64);

    if let Some(last_event_id) = headers
        .get(LAST_EVENT_ID_HEADER)
        .and_then(|v| v.to_str().ok())
    {
        if let Some(events) = state
            .journal
            .replay_after(&stream_id, last_event_id)
            .await
            .map_err(|e| GatewayError::StorageFailure(e.to_string()))?
        {
            for event in events {
                if let Some(tx) = state.registry.get_transport(&stream_id) {
                    let _ = tx.try_send(event.to_sse_frame());
                }
            }
        }
    }

    let body = Body::from_stream(ReceiverStream::new(rx).map(|frame| {
        Ok::<_, std::convert::Infallible>(bytes::Bytes::from(frame))
    }));

    Ok(Response::builder()
        .status(StatusCode::OK)
        .header(axum::http::header::CONTENT_TYPE, "text/event-stream")
        .header(axum::http::header::CACHE_CONTROL, "no-cache")
        .body(body)
        .map_err(|e| GatewayError::Internal(e.to_string()))?)
}

#[derive(Serialize)]
struct SessionNotFoundBody {
    error: &'static str,
}

/// `DELETE /mcp` is idempotent on the same session id: a session with no
/// transport bound to this process — whether it never existed, already
/// terminated, or only lives on another replica — answers `200` rather than
/// `404`, the same as a successful delete.
pub async fn delete_mcp(State(state): State<AppState>, headers: HeaderMap) -> GatewayResult<Response> {
    let session_id = match session_id_from_headers(&headers) {
        Some(session_id) => session_id,
        None => return Ok(Json(SessionNotFoundBody { error: "Session not found" }).into_response()),
    };
    if !state.registry.has_transport(session_id.as_str()) {
        return Ok(Json(SessionNotFoundBody { error: "Session not found" }).into_response());
    }
    state
        .registry
        .terminate_session(&session_id)
        .await
        .map_err(|e| GatewayError::StorageFailure(e.to_string()))?;
    state.registry.delete_transport(session_id.as_str());
    state
        .journal
        .clear_stream(session_id.as_str())
        .await
        .map_err(|e| GatewayError::StorageFailure(e.to_string()))?;
    Ok(StatusCode::NO_CONTENT.into_response())
}

