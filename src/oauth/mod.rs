//! OAuth 2.1 proxy: dynamic client registration, authorization code + PKCE,
//! refresh, revocation, and RFC 8414/9728/8707 metadata and audience
//! handling, fronting a single upstream OpenID Connect provider.

pub mod authorize;
pub mod callback;
pub mod dcr;
pub mod metadata;
pub mod middleware;
pub mod pkce;
pub mod redirect;
pub mod revoke;
pub mod store;
pub mod token;
pub mod types;

use axum::routing::{get, post};
use axum::Router;
use rand::RngCore;

use crate::app::AppState;

/// Router fragment for every `/oauth/*` and `/.well-known/*` endpoint. Mounted
/// unauthenticated: these endpoints either hand out credentials to a client
/// that doesn't have them yet, or are public discovery documents.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/oauth/register", post(dcr::register))
        .route("/oauth/authorize", get(authorize::authorize))
        .route("/oauth/auth0-callback", get(callback::callback))
        .route("/oauth/token", post(token::token))
        .route("/oauth/revoke", post(revoke::revoke))
        .route(
            "/.well-known/oauth-authorization-server",
            get(metadata::authorization_server_metadata),
        )
        .route(
            "/.well-known/oauth-protected-resource",
            get(metadata::protected_resource_metadata),
        )
}

/// `num_bytes` cryptographically random bytes, lowercase hex-encoded. Used
/// for client credentials, which RFC 7591 leaves format-unspecified but
/// which this gateway mints as hex rather than the alphanumeric tokens used
/// elsewhere for PKCE verifiers and session state.
pub(crate) fn random_hex(num_bytes: usize) -> String {
    let mut bytes = vec![0u8; num_bytes];
    rand::rng().fill_bytes(&mut bytes);
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}
