//! `POST /oauth/register` — Dynamic Client Registration (RFC 7591).
//!
//! The request/response field names mirror
//! `turbomcp-auth::oauth2::dcr::RegistrationRequest`/`RegistrationResponse`,
//! which implements the *client* side of DCR; here we implement the
//! *server* side, accepting a registration instead of sending one.

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::app::AppState;
use crate::error::{GatewayError, GatewayResult};
use crate::oauth::store;
use crate::oauth::types::Client;

#[derive(Debug, Deserialize)]
pub struct RegistrationRequest {
    pub redirect_uris: Vec<String>,
    pub client_name: Option<String>,
    #[serde(default)]
    pub token_endpoint_auth_method: Option<String>,
    #[serde(default)]
    pub grant_types: Option<Vec<String>>,
    #[serde(default)]
    pub response_types: Option<Vec<String>>,
    pub scope: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RegistrationResponse {
    pub client_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_secret: Option<String>,
    pub redirect_uris: Vec<String>,
    pub client_name: Option<String>,
    pub token_endpoint_auth_method: String,
    pub grant_types: Vec<String>,
    pub response_types: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
    pub client_id_issued_at: i64,
    pub client_secret_expires_at: i64,
}

pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegistrationRequest>,
) -> GatewayResult<Json<RegistrationResponse>> {
    if req.redirect_uris.is_empty() {
        return Err(GatewayError::InvalidRequest(
            "redirect_uris must contain at least one URI".to_string(),
        ));
    }
    for uri in &req.redirect_uris {
        if url::Url::parse(uri).is_err() {
            return Err(GatewayError::InvalidRequest(format!(
                "redirect_uri is not a valid URI: {uri}"
            )));
        }
    }

    let auth_method = req
        .token_endpoint_auth_method
        .unwrap_or_else(|| "client_secret_basic".to_string());
    let is_confidential = auth_method != "none";

    let client_id = format!("mcp_{}", crate::oauth::random_hex(16));
    let client_secret = is_confidential.then(|| crate::oauth::random_hex(32));
    let now = chrono::Utc::now().timestamp();

    let client = Client {
        client_id: client_id.clone(),
        client_secret: client_secret.clone(),
        redirect_uris: req.redirect_uris.clone(),
        client_name: req.client_name.clone(),
        token_endpoint_auth_method: auth_method.clone(),
        grant_types: req
            .grant_types
            .unwrap_or_else(|| vec!["authorization_code".to_string(), "refresh_token".to_string()]),
        response_types: req.response_types.unwrap_or_else(|| vec!["code".to_string()]),
        scope: req.scope.clone(),
        created_at: now,
    };

    // Registered clients outlive any single session; a year is a generous
    // upper bound and re-registration is cheap if a client outlives it.
    const CLIENT_TTL: std::time::Duration = std::time::Duration::from_secs(365 * 24 * 60 * 60);
    store::save_client(&state.store, &client, CLIENT_TTL)
        .await
        .map_err(|e| GatewayError::StorageFailure(e.to_string()))?;
    state.metrics.client_registered();

    Ok(Json(RegistrationResponse {
        client_id,
        client_secret,
        redirect_uris: client.redirect_uris,
        client_name: client.client_name,
        token_endpoint_auth_method: auth_method,
        grant_types: client.grant_types,
        response_types: client.response_types,
        scope: client.scope,
        client_id_issued_at: now,
        client_secret_expires_at: 0,
    }))
}
