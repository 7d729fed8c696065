//! Bearer token enforcement for protected MCP endpoints.
//!
//! Grounded on `turbomcp-auth::server::BearerTokenValidator` (header
//! extraction, case-insensitive `Bearer` scheme check) and
//! `WwwAuthenticateBuilder` (the challenge header shape on rejection).

use axum::extract::{Request, State};
use axum::http::{HeaderValue, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::app::AppState;
use crate::jwt::{Claims, TokenType};
use crate::oauth::store;

/// Extracted from a `Bearer <token>` header, case-insensitive on the scheme.
fn extract_bearer(header: &str) -> Option<&str> {
    let mut parts = header.splitn(2, ' ');
    let scheme = parts.next()?;
    let token = parts.next()?;
    scheme.eq_ignore_ascii_case("Bearer").then_some(token)
}

fn www_authenticate_challenge(state: &AppState, error: &str) -> HeaderValue {
    let resource_metadata = format!(
        "{}/.well-known/oauth-protected-resource",
        state.config.server.http.base_url
    );
    let value = format!(r#"Bearer resource_metadata="{resource_metadata}", error="{error}""#);
    HeaderValue::from_str(&value).unwrap_or_else(|_| HeaderValue::from_static("Bearer"))
}

fn unauthorized(state: &AppState, error: &str) -> Response {
    let mut response = StatusCode::UNAUTHORIZED.into_response();
    response
        .headers_mut()
        .insert(axum::http::header::WWW_AUTHENTICATE, www_authenticate_challenge(state, error));
    response
}

/// Axum middleware requiring a valid, non-revoked access token whose
/// audience matches this gateway's own resource URI. On success, the
/// decoded [`Claims`] are inserted into the request extensions for
/// downstream handlers.
pub async fn require_auth(State(state): State<AppState>, mut request: Request, next: Next) -> Response {
    if !state.config.server.auth.enabled {
        return next.run(request).await;
    }

    let Some(header) = request
        .headers()
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
    else {
        return unauthorized(&state, "missing_token");
    };

    let Some(token) = extract_bearer(header) else {
        return unauthorized(&state, "invalid_request");
    };

    let claims: Claims = match state.jwt.verify(token, TokenType::Access) {
        Ok(claims) => claims,
        Err(_) => return unauthorized(&state, "invalid_token"),
    };

    let resource = format!("{}/mcp", state.config.server.http.base_url);
    let audience_ok = claims
        .aud
        .values()
        .iter()
        .any(|aud| crate::jwt::audience_matches(aud, &resource));
    if !audience_ok {
        return unauthorized(&state, "invalid_token");
    }

    match store::get_token_record(&state.store, &claims.jti).await {
        Ok(Some(_)) => {}
        // Revocation deletes the record outright, so an absent record means
        // this token was revoked (or never issued by this gateway).
        Ok(None) => return unauthorized(&state, "invalid_token"),
        Err(_) => return unauthorized(&state, "invalid_token"),
    }

    request.extensions_mut().insert(claims);
    next.run(request).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_token_case_insensitive_scheme() {
        assert_eq!(extract_bearer("bearer abc123"), Some("abc123"));
        assert_eq!(extract_bearer("Bearer abc123"), Some("abc123"));
        assert_eq!(extract_bearer("Basic abc123"), None);
        assert_eq!(extract_bearer("abc123"), None);
    }
}
