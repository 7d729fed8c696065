//! `POST /oauth/revoke` — RFC 7009 token revocation.
//!
//! Per RFC 7009 §2.2, the endpoint returns 200 even for a token it does not
//! recognize, so callers can't use this endpoint to probe for valid tokens.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Form;
use serde::Deserialize;

use crate::app::AppState;
use crate::jwt::TokenType;
use crate::oauth::store;

#[derive(Debug, Deserialize)]
pub struct RevokeRequest {
    pub token: String,
    #[serde(default)]
    pub token_type_hint: Option<String>,
}

pub async fn revoke(State(state): State<AppState>, Form(req): Form<RevokeRequest>) -> StatusCode {
    let hinted_first = matches!(req.token_type_hint.as_deref(), Some("refresh_token"));
    let order = if hinted_first {
        [TokenType::Refresh, TokenType::Access]
    } else {
        [TokenType::Access, TokenType::Refresh]
    };

    for token_type in order {
        if let Ok(claims) = state.jwt.verify(&req.token, token_type) {
            if let Ok(true) = store::revoke_token_record(&state.store, &claims.jti).await {
                state.metrics.token_revoked();
            }
            break;
        }
    }

    StatusCode::OK
}
