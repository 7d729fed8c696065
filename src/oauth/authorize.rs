//! `GET /oauth/authorize` — start of the proxied authorization code flow.
//!
//! The downstream MCP client is redirected straight through to the
//! upstream identity provider; the gateway generates its *own* PKCE pair
//! for the upstream leg (stored as an [`UpstreamSession`]) so that the
//! upstream never sees the downstream client's verifier, and mints its own
//! `state` value to correlate the callback.

use axum::extract::{Query, State};
use axum::response::Redirect;
use rand::distr::Alphanumeric;
use rand::Rng;
use serde::Deserialize;

use crate::app::AppState;
use crate::error::{GatewayError, GatewayResult};
use crate::oauth::pkce::derive_s256_challenge;
use crate::oauth::store;
use crate::oauth::types::{AuthorizationSession, Client, UpstreamSession};

#[derive(Debug, Deserialize)]
pub struct AuthorizeQuery {
    pub client_id: String,
    pub redirect_uri: String,
    pub response_type: String,
    pub code_challenge: String,
    #[serde(default = "default_challenge_method")]
    pub code_challenge_method: String,
    pub scope: Option<String>,
    pub state: Option<String>,
    pub resource: Option<String>,
}

fn default_challenge_method() -> String {
    "S256".to_string()
}

// Registered clients outlive any single session; a year is a generous upper
// bound and re-registration is cheap if a client outlives it.
const CLIENT_TTL: std::time::Duration = std::time::Duration::from_secs(365 * 24 * 60 * 60);

pub async fn authorize(
    State(state): State<AppState>,
    Query(query): Query<AuthorizeQuery>,
) -> GatewayResult<Redirect> {
    if query.response_type != "code" {
        return Err(GatewayError::InvalidRequest(
            "response_type must be \"code\"".to_string(),
        ));
    }
    if query.code_challenge_method != "S256" {
        return Err(GatewayError::InvalidRequest(
            "code_challenge_method must be \"S256\"".to_string(),
        ));
    }

    let existing = store::get_client(&state.store, &query.client_id)
        .await
        .map_err(|e| GatewayError::StorageFailure(e.to_string()))?;

    let client = match existing {
        Some(client) => {
            if !client
                .redirect_uris
                .iter()
                .any(|registered| crate::oauth::redirect::redirect_uri_matches(registered, &query.redirect_uri))
            {
                return Err(GatewayError::InvalidRequest(
                    "redirect_uri is not registered for this client".to_string(),
                ));
            }
            client
        }
        // An unknown client_id is auto-registered with this redirect_uri as
        // its only one, rather than rejected: the downstream client already
        // picked a client_id before talking to us, so there is nothing to
        // gain by forcing an explicit /oauth/register round trip first.
        None => {
            let client = Client {
                client_id: query.client_id.clone(),
                client_secret: None,
                redirect_uris: vec![query.redirect_uri.clone()],
                client_name: None,
                token_endpoint_auth_method: "none".to_string(),
                grant_types: vec!["authorization_code".to_string(), "refresh_token".to_string()],
                response_types: vec!["code".to_string()],
                scope: None,
                created_at: chrono::Utc::now().timestamp(),
            };
            store::save_client(&state.store, &client, CLIENT_TTL)
                .await
                .map_err(|e| GatewayError::StorageFailure(e.to_string()))?;
            state.metrics.client_registered();
            client
        }
    };

    let gateway_state = random_token(32);
    let upstream_verifier = random_token(64);
    let upstream_challenge = derive_s256_challenge(&upstream_verifier);

    let session = AuthorizationSession {
        state: gateway_state.clone(),
        client_id: query.client_id.clone(),
        redirect_uri: query.redirect_uri.clone(),
        downstream_state: query.state.clone(),
        code_challenge: query.code_challenge.clone(),
        code_challenge_method: query.code_challenge_method.clone(),
        scope: query.scope.clone().unwrap_or_default(),
        resource: query.resource.clone(),
        created_at: chrono::Utc::now().timestamp(),
    };
    let ttl = state.config.server.auth.session_ttl_duration();
    store::save_authorization_session(&state.store, &session, ttl)
        .await
        .map_err(|e| GatewayError::StorageFailure(e.to_string()))?;
    store::save_upstream_session(
        &state.store,
        &UpstreamSession {
            state: gateway_state.clone(),
            upstream_code_verifier: upstream_verifier,
        },
        ttl,
    )
    .await
    .map_err(|e| GatewayError::StorageFailure(e.to_string()))?;
    state.metrics.authorization_session_started();

    let callback_uri = format!("{}/oauth/auth0-callback", state.config.server.http.base_url);
    let mut upstream_url = url::Url::parse(&format!(
        "{}/authorize",
        state.config.server.auth.upstream_domain
    ))
    .map_err(|e| GatewayError::Internal(e.to_string()))?;
    upstream_url
        .query_pairs_mut()
        .append_pair("client_id", &state.config.server.auth.upstream_client_id)
        .append_pair("redirect_uri", &callback_uri)
        .append_pair("response_type", "code")
        .append_pair("state", &gateway_state)
        .append_pair("code_challenge", &upstream_challenge)
        .append_pair("code_challenge_method", "S256")
        .append_pair(
            "scope",
            query.scope.as_deref().unwrap_or("openid profile email"),
        );

    Ok(Redirect::temporary(upstream_url.as_str()))
}

fn random_token(len: usize) -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}
