//! Self-issued HS256 access and refresh tokens.
//!
//! `turbomcp-auth::jwt::validator` validates third-party RS256/ES256/PS256
//! tokens against a JWKS endpoint; this gateway instead *mints* its own
//! tokens for clients it has already taken through the authorization code
//! flow, so the simpler symmetric HS256 case applies. We keep that file's
//! `jsonwebtoken` usage patterns (`Validation`, `EncodingKey`/`DecodingKey`,
//! `TokenData`) and drop the JWKS discovery machinery it doesn't need.

use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{GatewayError, GatewayResult};

/// Distinguishes access tokens from refresh tokens minted from the same
/// signer, so a refresh token can never be replayed as an access token and
/// vice versa.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Access,
    Refresh,
}

/// Normalized `aud` claim: the JWT spec allows either a single string or an
/// array; we always encode as whatever was given but decode into this
/// uniform shape so comparisons don't need to special-case either form.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Audience {
    Single(String),
    Many(Vec<String>),
}

impl Audience {
    pub fn single(value: impl Into<String>) -> Self {
        Self::Single(value.into())
    }

    pub fn contains(&self, candidate: &str) -> bool {
        match self {
            Self::Single(s) => s == candidate,
            Self::Many(values) => values.iter().any(|v| v == candidate),
        }
    }

    pub fn values(&self) -> Vec<&str> {
        match self {
            Self::Single(s) => vec![s.as_str()],
            Self::Many(values) => values.iter().map(String::as_str).collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// The upstream identity provider's `sub` for the end user this token
    /// was minted on behalf of, not the OAuth client.
    pub sub: String,
    pub iss: String,
    pub aud: Audience,
    pub exp: i64,
    pub iat: i64,
    pub jti: String,
    #[serde(rename = "type")]
    pub token_type: TokenType,
    pub client_id: String,
    pub scope: String,
    /// Present only on access tokens minted against a specific MCP session.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
}

/// A freshly minted token plus the metadata the caller needs to persist a
/// [`crate::oauth::types::TokenRecord`] and build a token response.
pub struct IssuedToken {
    pub token: String,
    pub jti: String,
    pub expires_in: u64,
}

pub struct JwtSigner {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    issuer: String,
}

impl JwtSigner {
    pub fn new(secret: &str, issuer: impl Into<String>) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            issuer: issuer.into(),
        }
    }

    pub fn issue_access_token(
        &self,
        client_id: &str,
        user_id: &str,
        audience: Audience,
        scope: &str,
        session_id: Option<String>,
        ttl: chrono::Duration,
    ) -> GatewayResult<IssuedToken> {
        self.issue(client_id, user_id, audience, scope, session_id, ttl, TokenType::Access)
    }

    pub fn issue_refresh_token(
        &self,
        client_id: &str,
        user_id: &str,
        audience: Audience,
        scope: &str,
        ttl: chrono::Duration,
    ) -> GatewayResult<IssuedToken> {
        self.issue(client_id, user_id, audience, scope, None, ttl, TokenType::Refresh)
    }

    fn issue(
        &self,
        client_id: &str,
        user_id: &str,
        audience: Audience,
        scope: &str,
        session_id: Option<String>,
        ttl: chrono::Duration,
        token_type: TokenType,
    ) -> GatewayResult<IssuedToken> {
        let now = Utc::now();
        let jti = Uuid::new_v4().to_string();
        let claims = Claims {
            sub: user_id.to_string(),
            iss: self.issuer.clone(),
            aud: audience,
            exp: (now + ttl).timestamp(),
            iat: now.timestamp(),
            jti: jti.clone(),
            token_type,
            client_id: client_id.to_string(),
            scope: scope.to_string(),
            session_id,
        };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| GatewayError::Internal(format!("jwt signing failed: {e}")))?;
        Ok(IssuedToken {
            token,
            jti,
            expires_in: ttl.num_seconds().max(0) as u64,
        })
    }

    /// Decode and validate a token, asserting it is of `expected_type`.
    /// Returns `GatewayError::InvalidToken` for any failure: expired,
    /// malformed, wrong issuer, or right shape but wrong `type` claim. The
    /// caller never learns which, matching the spec's "never echo back why
    /// a token was rejected" policy.
    pub fn verify(&self, token: &str, expected_type: TokenType) -> GatewayResult<Claims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[self.issuer.clone()]);
        validation.validate_aud = false;
        let data = decode::<Claims>(token, &self.decoding_key, &validation)
            .map_err(|_| GatewayError::InvalidToken)?;
        if data.claims.token_type != expected_type {
            return Err(GatewayError::InvalidToken);
        }
        Ok(data.claims)
    }
}

/// RFC 8707 audience normalization and comparison, grounded on
/// `turbomcp-auth::server::validate_audience`: lowercase scheme and host,
/// strip default ports, strip a trailing slash from the path, then compare
/// with a constant-time equality check.
pub fn audience_matches(token_aud: &str, resource: &str) -> bool {
    let (Some(a), Some(b)) = (normalize_resource(token_aud), normalize_resource(resource)) else {
        return false;
    };
    subtle::ConstantTimeEq::ct_eq(a.as_bytes(), b.as_bytes()).into()
}

fn normalize_resource(raw: &str) -> Option<String> {
    let mut url = url::Url::parse(raw).ok()?;
    url.set_fragment(None);
    url.set_query(None);

    let default_port = match url.scheme() {
        "https" => Some(443),
        "http" => Some(80),
        _ => None,
    };
    if url.port() == default_port {
        let _ = url.set_port(None);
    }

    let scheme = url.scheme().to_ascii_lowercase();
    let host = url.host_str()?.to_ascii_lowercase();
    let port = url.port().map(|p| format!(":{p}")).unwrap_or_default();
    let mut path = url.path().to_string();
    if path.len() > 1 && path.ends_with('/') {
        path.pop();
    }
    Some(format!("{scheme}://{host}{port}{path}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signer() -> JwtSigner {
        JwtSigner::new("test-secret", "https://gateway.example.com")
    }

    #[test]
    fn access_token_round_trips() {
        let signer = signer();
        let token = signer
            .issue_access_token(
                "client-1",
                "user-1",
                Audience::single("https://api.example.com"),
                "openid profile",
                Some("mcp-session-1".to_string()),
                chrono::Duration::minutes(5),
            )
            .unwrap();
        let claims = signer.verify(&token.token, TokenType::Access).unwrap();
        assert_eq!(claims.client_id, "client-1");
        assert_eq!(claims.sub, "user-1");
        assert_eq!(claims.session_id.as_deref(), Some("mcp-session-1"));
    }

    #[test]
    fn refresh_token_rejected_as_access_token() {
        let signer = signer();
        let token = signer
            .issue_refresh_token(
                "client-1",
                "user-1",
                Audience::single("https://api.example.com"),
                "openid",
                chrono::Duration::days(30),
            )
            .unwrap();
        assert!(matches!(
            signer.verify(&token.token, TokenType::Access),
            Err(GatewayError::InvalidToken)
        ));
    }

    #[test]
    fn expired_token_is_rejected() {
        let signer = signer();
        let token = signer
            .issue_access_token(
                "client-1",
                "user-1",
                Audience::single("https://api.example.com"),
                "openid",
                None,
                chrono::Duration::seconds(-1),
            )
            .unwrap();
        assert!(matches!(
            signer.verify(&token.token, TokenType::Access),
            Err(GatewayError::InvalidToken)
        ));
    }

    #[test]
    fn audience_trailing_slash_is_ignored() {
        assert!(audience_matches(
            "https://api.example.com/",
            "https://api.example.com"
        ));
    }

    #[test]
    fn audience_default_port_is_ignored() {
        assert!(audience_matches(
            "https://api.example.com:443/mcp",
            "https://api.example.com/mcp"
        ));
    }

    #[test]
    fn audience_case_insensitive_scheme_and_host() {
        assert!(audience_matches(
            "HTTPS://API.example.com/mcp",
            "https://api.example.com/mcp"
        ));
    }

    #[test]
    fn audience_path_is_significant() {
        assert!(!audience_matches(
            "https://api.example.com/mcp",
            "https://api.example.com/other"
        ));
    }

    #[test]
    fn audience_non_default_port_is_significant() {
        assert!(!audience_matches(
            "https://api.example.com:8443/mcp",
            "https://api.example.com/mcp"
        ));
    }
}
