//! `GET /oauth/auth0-callback` — receives the upstream identity provider's
//! redirect, exchanges its code for upstream tokens, mints the gateway's
//! own single-use authorization code, and redirects the downstream client
//! to its original `redirect_uri`.

use axum::extract::{Query, State};
use axum::response::Redirect;
use rand::distr::Alphanumeric;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::app::AppState;
use crate::error::{GatewayError, GatewayResult};
use crate::oauth::store;
use crate::oauth::types::AuthorizationCodeRecord;

#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    pub code: String,
    pub state: String,
}

#[derive(Debug, Serialize)]
struct UpstreamTokenRequest<'a> {
    grant_type: &'a str,
    code: &'a str,
    redirect_uri: &'a str,
    client_id: &'a str,
    client_secret: &'a str,
    code_verifier: &'a str,
}

#[derive(Debug, Deserialize)]
struct UpstreamTokenResponse {
    access_token: String,
    refresh_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UpstreamUserInfo {
    sub: String,
}

pub async fn callback(
    State(state): State<AppState>,
    Query(query): Query<CallbackQuery>,
) -> GatewayResult<Redirect> {
    let session = store::get_authorization_session(&state.store, &query.state)
        .await
        .map_err(|e| GatewayError::StorageFailure(e.to_string()))?
        .ok_or(GatewayError::InvalidGrant)?;
    let upstream_session = store::take_upstream_session(&state.store, &query.state)
        .await
        .map_err(|e| GatewayError::StorageFailure(e.to_string()))?
        .ok_or(GatewayError::InvalidGrant)?;

    let callback_uri = format!("{}/oauth/auth0-callback", state.config.server.http.base_url);
    let token_url = format!("{}/token", state.config.server.auth.upstream_domain);
    let request = UpstreamTokenRequest {
        grant_type: "authorization_code",
        code: &query.code,
        redirect_uri: &callback_uri,
        client_id: &state.config.server.auth.upstream_client_id,
        client_secret: &state.config.server.auth.upstream_client_secret,
        code_verifier: &upstream_session.upstream_code_verifier,
    };

    let response = state
        .http_client
        .post(&token_url)
        .form(&request)
        .send()
        .await
        .map_err(|e| GatewayError::UpstreamFailure(e.to_string()))?;

    if !response.status().is_success() {
        return Err(GatewayError::UpstreamFailure(format!(
            "upstream token endpoint returned {}",
            response.status()
        )));
    }

    let tokens: UpstreamTokenResponse = response
        .json()
        .await
        .map_err(|e| GatewayError::UpstreamFailure(e.to_string()))?;

    let userinfo_url = format!("{}/userinfo", state.config.server.auth.upstream_domain);
    let userinfo_response = state
        .http_client
        .get(&userinfo_url)
        .bearer_auth(&tokens.access_token)
        .send()
        .await
        .map_err(|e| GatewayError::UpstreamFailure(e.to_string()))?;
    if !userinfo_response.status().is_success() {
        return Err(GatewayError::UpstreamFailure(format!(
            "upstream userinfo endpoint returned {}",
            userinfo_response.status()
        )));
    }
    let user_info: UpstreamUserInfo = userinfo_response
        .json()
        .await
        .map_err(|e| GatewayError::UpstreamFailure(e.to_string()))?;

    let gateway_code = random_token(40);
    let record = AuthorizationCodeRecord {
        code: gateway_code.clone(),
        client_id: session.client_id.clone(),
        user_id: user_info.sub,
        redirect_uri: session.redirect_uri.clone(),
        code_challenge: session.code_challenge.clone(),
        code_challenge_method: session.code_challenge_method.clone(),
        scope: session.scope.clone(),
        resource: session.resource.clone(),
        upstream_access_token: tokens.access_token,
        upstream_refresh_token: tokens.refresh_token,
        created_at: chrono::Utc::now().timestamp(),
    };
    // Authorization codes are meant to be redeemed within seconds; a short,
    // fixed TTL bounds how long a leaked code stays useful.
    let code_ttl = std::time::Duration::from_secs(60);
    store::save_authorization_code(&state.store, &record, code_ttl)
        .await
        .map_err(|e| GatewayError::StorageFailure(e.to_string()))?;
    store::delete_authorization_session(&state.store, &query.state)
        .await
        .map_err(|e| GatewayError::StorageFailure(e.to_string()))?;
    state.metrics.authorization_session_ended();

    let mut redirect_url =
        url::Url::parse(&session.redirect_uri).map_err(|e| GatewayError::Internal(e.to_string()))?;
    {
        let mut pairs = redirect_url.query_pairs_mut();
        pairs.append_pair("code", &gateway_code);
        if let Some(downstream_state) = &session.downstream_state {
            pairs.append_pair("state", downstream_state);
        }
    }

    Ok(Redirect::temporary(redirect_url.as_str()))
}

fn random_token(len: usize) -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}
