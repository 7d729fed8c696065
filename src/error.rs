//! Gateway-wide error type and its HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

/// The error kinds enumerated in the gateway's error handling design.
///
/// Every fallible path in the gateway eventually collapses into one of these
/// variants so that the HTTP layer has a single place to decide status codes.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("invalid client")]
    InvalidClient,

    #[error("invalid grant")]
    InvalidGrant,

    #[error("invalid token")]
    InvalidToken,

    #[error("session not found")]
    SessionNotFound,

    #[error("transport not found")]
    TransportNotFound,

    #[error("upstream failure: {0}")]
    UpstreamFailure(String),

    #[error("storage failure: {0}")]
    StorageFailure(String),

    #[error("corrupt record")]
    Corrupt,

    #[error("forbidden")]
    Forbidden,

    #[error("rate limited")]
    RateLimited,

    #[error("internal error: {0}")]
    Internal(String),
}

impl GatewayError {
    fn status(&self) -> StatusCode {
        match self {
            Self::InvalidRequest(_) | Self::InvalidClient | Self::InvalidGrant | Self::Corrupt => {
                StatusCode::BAD_REQUEST
            }
            Self::InvalidToken => StatusCode::UNAUTHORIZED,
            Self::SessionNotFound | Self::TransportNotFound => StatusCode::NOT_FOUND,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            Self::UpstreamFailure(_) => StatusCode::BAD_REQUEST,
            Self::StorageFailure(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// A bounded, secret-free message safe to put on the wire.
    fn public_message(&self) -> String {
        match self {
            Self::InvalidToken | Self::Forbidden => {
                // Never echo back why a token or origin was rejected.
                self.to_string()
            }
            _ => self.to_string(),
        }
    }
}

#[derive(Serialize)]
struct ErrorEnvelope {
    error: String,
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status();
        if matches!(status, StatusCode::INTERNAL_SERVER_ERROR) {
            tracing::error!(error = %self, "internal error");
        } else {
            tracing::warn!(error = %self, "request rejected");
        }
        let body = ErrorEnvelope {
            error: self.public_message(),
        };
        (status, axum::Json(body)).into_response()
    }
}

pub type GatewayResult<T> = Result<T, GatewayError>;
