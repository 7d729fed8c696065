//! Record shapes persisted by the OAuth proxy.

use serde::{Deserialize, Serialize};

/// A dynamically registered OAuth client (RFC 7591).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Client {
    pub client_id: String,
    pub client_secret: Option<String>,
    pub redirect_uris: Vec<String>,
    pub client_name: Option<String>,
    pub token_endpoint_auth_method: String,
    pub grant_types: Vec<String>,
    pub response_types: Vec<String>,
    pub scope: Option<String>,
    pub created_at: i64,
}

impl Client {
    pub fn is_confidential(&self) -> bool {
        self.token_endpoint_auth_method != "none"
    }
}

/// State for one in-flight authorization request from the downstream MCP
/// client, keyed by the `state` parameter the gateway generates for its own
/// leg of the proxied flow (the downstream client's `state` is stored
/// alongside it and echoed back verbatim on callback).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthorizationSession {
    pub state: String,
    pub client_id: String,
    pub redirect_uri: String,
    pub downstream_state: Option<String>,
    pub code_challenge: String,
    pub code_challenge_method: String,
    pub scope: String,
    pub resource: Option<String>,
    pub created_at: i64,
}

/// The upstream identity provider's own authorization artifacts, correlated
/// to an [`AuthorizationSession`] by the same `state` value, so the
/// callback handler can exchange the upstream code without re-deriving
/// anything the initial `/authorize` call already decided.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamSession {
    pub state: String,
    pub upstream_code_verifier: String,
}

/// An issued authorization code, single-use: redeeming it at `/token`
/// deletes the record, so a replay attempt finds nothing and fails as
/// `invalid_grant`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthorizationCodeRecord {
    pub code: String,
    pub client_id: String,
    pub user_id: String,
    pub redirect_uri: String,
    pub code_challenge: String,
    pub code_challenge_method: String,
    pub scope: String,
    pub resource: Option<String>,
    pub upstream_access_token: String,
    pub upstream_refresh_token: Option<String>,
    pub created_at: i64,
}

/// A minted access/refresh token pair, stored under *both* the access and
/// the refresh token's `jti` so either can find the other: revoking one
/// means looking the pair up under either key, then deleting both.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenRecord {
    pub client_id: String,
    pub user_id: String,
    pub scope: String,
    pub access_jti: String,
    pub refresh_jti: String,
    pub issued_at: i64,
}
