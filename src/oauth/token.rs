//! `POST /oauth/token` — authorization_code and refresh_token grants.

use axum::extract::State;
use axum::Form;
use serde::{Deserialize, Serialize};

use crate::app::AppState;
use crate::error::{GatewayError, GatewayResult};
use crate::jwt::{Audience, TokenType};
use crate::oauth::store;
use crate::oauth::types::TokenRecord;

#[derive(Debug, Deserialize)]
pub struct TokenRequest {
    pub grant_type: String,
    pub code: Option<String>,
    pub redirect_uri: Option<String>,
    pub code_verifier: Option<String>,
    pub refresh_token: Option<String>,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub resource: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: &'static str,
    pub expires_in: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    pub scope: String,
}

const ACCESS_TOKEN_TTL: chrono::Duration = chrono::Duration::hours(1);
const REFRESH_TOKEN_TTL: chrono::Duration = chrono::Duration::days(30);

pub async fn token(
    State(state): State<AppState>,
    Form(req): Form<TokenRequest>,
) -> GatewayResult<axum::Json<TokenResponse>> {
    match req.grant_type.as_str() {
        "authorization_code" => authorization_code_grant(state, req).await,
        "refresh_token" => refresh_token_grant(state, req).await,
        _ => Err(GatewayError::InvalidRequest(format!(
            "unsupported grant_type: {}",
            req.grant_type
        ))),
    }
}

async fn authenticate_client(
    state: &AppState,
    client_id: Option<&str>,
    client_secret: Option<&str>,
) -> GatewayResult<crate::oauth::types::Client> {
    let client_id = client_id.ok_or(GatewayError::InvalidClient)?;
    let client = store::get_client(&state.store, client_id)
        .await
        .map_err(|e| GatewayError::StorageFailure(e.to_string()))?
        .ok_or(GatewayError::InvalidClient)?;

    if client.is_confidential() {
        let provided = client_secret.ok_or(GatewayError::InvalidClient)?;
        let expected = client.client_secret.as_deref().unwrap_or("");
        let matches: bool =
            subtle::ConstantTimeEq::ct_eq(provided.as_bytes(), expected.as_bytes()).into();
        if !matches {
            return Err(GatewayError::InvalidClient);
        }
    }
    Ok(client)
}

async fn authorization_code_grant(
    state: AppState,
    req: TokenRequest,
) -> GatewayResult<axum::Json<TokenResponse>> {
    let code = req.code.as_deref().ok_or(GatewayError::InvalidGrant)?;
    let verifier = req.code_verifier.as_deref().ok_or(GatewayError::InvalidGrant)?;

    let client = authenticate_client(&state, req.client_id.as_deref(), req.client_secret.as_deref()).await?;

    let record = store::take_authorization_code(&state.store, code)
        .await
        .map_err(|e| GatewayError::StorageFailure(e.to_string()))?
        .ok_or(GatewayError::InvalidGrant)?;

    if record.client_id != client.client_id {
        return Err(GatewayError::InvalidGrant);
    }
    if let Some(redirect_uri) = &req.redirect_uri {
        if redirect_uri != &record.redirect_uri {
            return Err(GatewayError::InvalidGrant);
        }
    }
    if !crate::oauth::pkce::verify(verifier, &record.code_challenge, &record.code_challenge_method) {
        return Err(GatewayError::InvalidGrant);
    }

    issue_tokens(
        &state,
        &client.client_id,
        &record.user_id,
        &record.scope,
        req.resource.or(record.resource),
    )
    .await
}

/// Mints only a new access token; the refresh token is returned unchanged
/// (not rotated), per the gateway's current refresh policy.
async fn refresh_token_grant(
    state: AppState,
    req: TokenRequest,
) -> GatewayResult<axum::Json<TokenResponse>> {
    let refresh_token = req.refresh_token.as_deref().ok_or(GatewayError::InvalidGrant)?;
    let claims = state
        .jwt
        .verify(refresh_token, TokenType::Refresh)
        .map_err(|_| GatewayError::InvalidGrant)?;

    let client = authenticate_client(&state, req.client_id.as_deref(), req.client_secret.as_deref()).await?;
    if claims.client_id != client.client_id {
        return Err(GatewayError::InvalidGrant);
    }

    let record = store::get_token_record(&state.store, &claims.jti)
        .await
        .map_err(|e| GatewayError::StorageFailure(e.to_string()))?
        .ok_or(GatewayError::InvalidGrant)?;

    let audience = req
        .resource
        .map(Audience::single)
        .unwrap_or_else(|| Audience::single(format!("{}/mcp", state.config.server.http.base_url)));
    let access = state.jwt.issue_access_token(
        &client.client_id,
        &claims.sub,
        audience,
        &claims.scope,
        None,
        ACCESS_TOKEN_TTL,
    )?;

    let updated = TokenRecord {
        client_id: client.client_id.clone(),
        user_id: claims.sub.clone(),
        scope: claims.scope.clone(),
        access_jti: access.jti.clone(),
        refresh_jti: record.refresh_jti.clone(),
        issued_at: chrono::Utc::now().timestamp(),
    };
    let token_ttl = std::time::Duration::from_secs(REFRESH_TOKEN_TTL.num_seconds() as u64);
    store::save_token_record(&state.store, &access.jti, &updated, token_ttl)
        .await
        .map_err(|e| GatewayError::StorageFailure(e.to_string()))?;
    store::save_token_record(&state.store, &record.refresh_jti, &updated, token_ttl)
        .await
        .map_err(|e| GatewayError::StorageFailure(e.to_string()))?;
    if record.access_jti != access.jti {
        store::delete_token_record(&state.store, &record.access_jti)
            .await
            .map_err(|e| GatewayError::StorageFailure(e.to_string()))?;
    }
    state.metrics.token_issued();

    Ok(axum::Json(TokenResponse {
        access_token: access.token,
        token_type: "Bearer",
        expires_in: access.expires_in,
        refresh_token: Some(refresh_token.to_string()),
        scope: claims.scope,
    }))
}

async fn issue_tokens(
    state: &AppState,
    client_id: &str,
    user_id: &str,
    scope: &str,
    resource: Option<String>,
) -> GatewayResult<axum::Json<TokenResponse>> {
    let audience = resource
        .map(Audience::single)
        .unwrap_or_else(|| Audience::single(format!("{}/mcp", state.config.server.http.base_url)));

    let access = state
        .jwt
        .issue_access_token(client_id, user_id, audience.clone(), scope, None, ACCESS_TOKEN_TTL)?;
    let refresh = state
        .jwt
        .issue_refresh_token(client_id, user_id, audience, scope, REFRESH_TOKEN_TTL)?;

    let now = chrono::Utc::now().timestamp();
    let record = TokenRecord {
        client_id: client_id.to_string(),
        user_id: user_id.to_string(),
        scope: scope.to_string(),
        access_jti: access.jti.clone(),
        refresh_jti: refresh.jti.clone(),
        issued_at: now,
    };
    let token_ttl = std::time::Duration::from_secs(REFRESH_TOKEN_TTL.num_seconds() as u64);
    store::save_token_record(&state.store, &access.jti, &record, token_ttl)
        .await
        .map_err(|e| GatewayError::StorageFailure(e.to_string()))?;
    store::save_token_record(&state.store, &refresh.jti, &record, token_ttl)
        .await
        .map_err(|e| GatewayError::StorageFailure(e.to_string()))?;
    state.metrics.token_issued();

    Ok(axum::Json(TokenResponse {
        access_token: access.token,
        token_type: "Bearer",
        expires_in: access.expires_in,
        refresh_token: Some(refresh.token),
        scope: scope.to_string(),
    }))
}
