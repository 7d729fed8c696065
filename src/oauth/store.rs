//! Key-space and persistence helpers shared by every OAuth handler.
//!
//! Centralizing the key naming here (rather than inlining `format!` calls in
//! each handler) keeps the TTLs and prefixes consistent with the
//! configuration in [`crate::config::AuthConfig`].

use std::sync::Arc;
use std::time::Duration;

use crate::kv::{Store, StoreExt};

use super::types::{AuthorizationCodeRecord, AuthorizationSession, Client, TokenRecord, UpstreamSession};

fn client_key(client_id: &str) -> String {
    format!("client:{client_id}")
}

fn auth_session_key(state: &str) -> String {
    format!("auth-session:{state}")
}

fn upstream_session_key(state: &str) -> String {
    format!("auth0-session:{state}")
}

/// Pending authorization codes share the `token:*` namespace with minted
/// access/refresh records, keyed by the code value instead of a `jti`: the
/// code is itself a stand-in for the eventual token pair until `/token`
/// redeems it.
fn code_key(code: &str) -> String {
    format!("token:{code}")
}

fn token_key(jti: &str) -> String {
    format!("token:{jti}")
}

pub async fn save_client(
    store: &Arc<dyn Store>,
    client: &Client,
    ttl: Duration,
) -> crate::kv::Result<()> {
    store.set_json(&client_key(&client.client_id), client, ttl).await
}

pub async fn get_client(store: &Arc<dyn Store>, client_id: &str) -> crate::kv::Result<Option<Client>> {
    store.get_json(&client_key(client_id)).await
}

pub async fn save_authorization_session(
    store: &Arc<dyn Store>,
    session: &AuthorizationSession,
    ttl: Duration,
) -> crate::kv::Result<()> {
    store.set_json(&auth_session_key(&session.state), session, ttl).await
}

pub async fn get_authorization_session(
    store: &Arc<dyn Store>,
    state: &str,
) -> crate::kv::Result<Option<AuthorizationSession>> {
    store.get_json(&auth_session_key(state)).await
}

pub async fn delete_authorization_session(store: &Arc<dyn Store>, state: &str) -> crate::kv::Result<()> {
    store.delete(&auth_session_key(state)).await
}

pub async fn save_upstream_session(
    store: &Arc<dyn Store>,
    session: &UpstreamSession,
    ttl: Duration,
) -> crate::kv::Result<()> {
    store.set_json(&upstream_session_key(&session.state), session, ttl).await
}

pub async fn take_upstream_session(
    store: &Arc<dyn Store>,
    state: &str,
) -> crate::kv::Result<Option<UpstreamSession>> {
    let session = store.get_json(&upstream_session_key(state)).await?;
    store.delete(&upstream_session_key(state)).await?;
    Ok(session)
}

pub async fn save_authorization_code(
    store: &Arc<dyn Store>,
    record: &AuthorizationCodeRecord,
    ttl: Duration,
) -> crate::kv::Result<()> {
    store.set_json(&code_key(&record.code), record, ttl).await
}

/// Redeem an authorization code: fetch and delete it atomically from the
/// caller's perspective (delete immediately after the read, before any
/// `.await` yields control back to another request for the same code), so
/// a second redemption of the same code always finds nothing.
pub async fn take_authorization_code(
    store: &Arc<dyn Store>,
    code: &str,
) -> crate::kv::Result<Option<AuthorizationCodeRecord>> {
    let record = store.get_json(&code_key(code)).await?;
    store.delete(&code_key(code)).await?;
    Ok(record)
}

pub async fn save_token_record(
    store: &Arc<dyn Store>,
    jti: &str,
    record: &TokenRecord,
    ttl: Duration,
) -> crate::kv::Result<()> {
    store.set_json(&token_key(jti), record, ttl).await
}

pub async fn get_token_record(store: &Arc<dyn Store>, jti: &str) -> crate::kv::Result<Option<TokenRecord>> {
    store.get_json(&token_key(jti)).await
}

pub async fn delete_token_record(store: &Arc<dyn Store>, jti: &str) -> crate::kv::Result<()> {
    store.delete(&token_key(jti)).await
}

/// Revoke the token pair addressed by `jti` (either the access or the
/// refresh token's own `jti`): delete both `token:{access_jti}` and
/// `token:{refresh_jti}`, so the pair is gone under either key. Returns
/// `true` only if a record was actually found, so callers can avoid
/// double-counting repeat revocations of an already-gone token.
pub async fn revoke_token_record(store: &Arc<dyn Store>, jti: &str) -> crate::kv::Result<bool> {
    match get_token_record(store, jti).await? {
        Some(record) => {
            delete_token_record(store, &record.access_jti).await?;
            delete_token_record(store, &record.refresh_jti).await?;
            Ok(true)
        }
        None => Ok(false),
    }
}
