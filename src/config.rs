//! Configuration tree and environment-variable overlay.
//!
//! Mirrors the config-struct style of `turbomcp-auth::config` (plain `serde`
//! structs with `Default` impls) but loads from environment variables using
//! the gateway's own `MCP_CONFIG_<DOTTED_PATH>` convention instead of a
//! generic config-file loader, since the gateway has no on-disk config file.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Top-level configuration tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub oauth: OAuthConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub http: HttpConfig,
    pub auth: AuthConfig,
    pub environment: Environment,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    pub port: u16,
    pub base_url: String,
    pub allowed_origins: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    pub enabled: bool,
    /// Seconds an `AuthorizationSession`/`UpstreamSession` pair lives.
    pub session_ttl: u64,
    /// Seconds a persisted `mcp-session:*` record lives.
    pub mcp_session_ttl: u64,
    /// Seconds a journaled SSE event lives.
    pub event_ttl: u64,
    pub jwt_secret: String,
    pub issuer: String,
    pub upstream_domain: String,
    pub upstream_client_id: String,
    pub upstream_client_secret: String,
    pub upstream_audience: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Development,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(rename = "type")]
    pub kind: StorageKind,
    pub valkey_url: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageKind {
    Memory,
    Valkey,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OAuthConfig {
    pub scopes_supported: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                http: HttpConfig {
                    port: 3000,
                    base_url: "http://localhost:3000".to_string(),
                    allowed_origins: vec!["http://localhost:3000".to_string()],
                },
                auth: AuthConfig {
                    enabled: true,
                    session_ttl: 600,
                    mcp_session_ttl: 86_400,
                    event_ttl: 86_400,
                    jwt_secret: "change-me-in-production".to_string(),
                    issuer: "http://localhost:3000".to_string(),
                    upstream_domain: "https://example-idp.example.com".to_string(),
                    upstream_client_id: String::new(),
                    upstream_client_secret: String::new(),
                    upstream_audience: None,
                },
                environment: Environment::Development,
            },
            storage: StorageConfig {
                kind: StorageKind::Memory,
                valkey_url: None,
            },
            oauth: OAuthConfig {
                scopes_supported: vec![
                    "openid".to_string(),
                    "profile".to_string(),
                    "email".to_string(),
                ],
            },
        }
    }
}

impl AuthConfig {
    pub fn session_ttl_duration(&self) -> Duration {
        Duration::from_secs(self.session_ttl)
    }

    pub fn mcp_session_ttl_duration(&self) -> Duration {
        Duration::from_secs(self.mcp_session_ttl)
    }

    pub fn event_ttl_duration(&self) -> Duration {
        Duration::from_secs(self.event_ttl)
    }
}

/// A single `MCP_CONFIG_*` override, parsed into its best-fit shape.
enum EnvValue {
    Bool(bool),
    Int(i64),
    Json(serde_json::Value),
    String(String),
}

impl EnvValue {
    fn parse(raw: &str) -> Self {
        if let Ok(b) = raw.parse::<bool>() {
            return Self::Bool(b);
        }
        if let Ok(i) = raw.parse::<i64>() {
            return Self::Int(i);
        }
        let trimmed = raw.trim_start();
        if trimmed.starts_with('[') || trimmed.starts_with('{') {
            if let Ok(v) = serde_json::from_str::<serde_json::Value>(raw) {
                return Self::Json(v);
            }
        }
        Self::String(raw.to_string())
    }
}

/// Dotted config paths this gateway recognizes, mapped to the
/// `MCP_CONFIG_*` env var name the spec derives for them.
///
/// Derivation rule: dotted path, camelCase split at case boundaries,
/// upper-snake-cased, prefixed with `MCP_CONFIG_`. We enumerate the
/// concrete set rather than implement a fully general path-walker: the
/// config tree is small and fixed, and an enumerated table fails loudly
/// (a warn log) on a typo instead of silently creating a new branch.
const ENV_KEYS: &[&str] = &[
    "MCP_CONFIG_SERVER_HTTP_PORT",
    "MCP_CONFIG_SERVER_HTTP_BASE_URL",
    "MCP_CONFIG_SERVER_HTTP_ALLOWED_ORIGINS",
    "MCP_CONFIG_SERVER_AUTH_ENABLED",
    "MCP_CONFIG_SERVER_AUTH_SESSION_TTL",
    "MCP_CONFIG_SERVER_AUTH_MCP_SESSION_TTL",
    "MCP_CONFIG_SERVER_AUTH_EVENT_TTL",
    "MCP_CONFIG_SERVER_AUTH_JWT_SECRET",
    "MCP_CONFIG_SERVER_AUTH_ISSUER",
    "MCP_CONFIG_SERVER_AUTH_UPSTREAM_DOMAIN",
    "MCP_CONFIG_SERVER_AUTH_UPSTREAM_CLIENT_ID",
    "MCP_CONFIG_SERVER_AUTH_UPSTREAM_CLIENT_SECRET",
    "MCP_CONFIG_SERVER_AUTH_UPSTREAM_AUDIENCE",
    "MCP_CONFIG_SERVER_ENVIRONMENT",
    "MCP_CONFIG_STORAGE_TYPE",
    "MCP_CONFIG_STORAGE_VALKEY_URL",
    "MCP_CONFIG_OAUTH_SCOPES_SUPPORTED",
];

impl Config {
    /// Build config from defaults, then apply any present `MCP_CONFIG_*`
    /// environment variables.
    pub fn from_env() -> Self {
        Self::from_env_source(|key| std::env::var(key).ok())
    }

    /// Testable variant: `lookup` stands in for `std::env::var`.
    pub fn from_env_source(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        for key in ENV_KEYS {
            let Some(raw) = lookup(key) else { continue };
            let value = EnvValue::parse(&raw);
            config.apply(key, value);
        }

        // Surface genuinely unknown MCP_CONFIG_* keys (typos, stale env) as a
        // warn rather than silently ignoring them.
        for (key, _) in std::env::vars() {
            if key.starts_with("MCP_CONFIG_") && !ENV_KEYS.contains(&key.as_str()) {
                tracing::warn!(%key, "unrecognized MCP_CONFIG_* override ignored");
            }
        }

        config
    }

    fn apply(&mut self, key: &str, value: EnvValue) {
        match (key, value) {
            ("MCP_CONFIG_SERVER_HTTP_PORT", EnvValue::Int(i)) => {
                self.server.http.port = i as u16;
            }
            ("MCP_CONFIG_SERVER_HTTP_BASE_URL", EnvValue::String(s)) => {
                self.server.http.base_url = s;
            }
            ("MCP_CONFIG_SERVER_HTTP_ALLOWED_ORIGINS", EnvValue::Json(v)) => {
                if let Some(arr) = v.as_array() {
                    self.server.http.allowed_origins = arr
                        .iter()
                        .filter_map(|x| x.as_str().map(str::to_string))
                        .collect();
                }
            }
            ("MCP_CONFIG_SERVER_AUTH_ENABLED", EnvValue::Bool(b)) => {
                self.server.auth.enabled = b;
            }
            ("MCP_CONFIG_SERVER_AUTH_SESSION_TTL", EnvValue::Int(i)) => {
                self.server.auth.session_ttl = i.max(0) as u64;
            }
            ("MCP_CONFIG_SERVER_AUTH_MCP_SESSION_TTL", EnvValue::Int(i)) => {
                self.server.auth.mcp_session_ttl = i.max(0) as u64;
            }
            ("MCP_CONFIG_SERVER_AUTH_EVENT_TTL", EnvValue::Int(i)) => {
                self.server.auth.event_ttl = i.max(0) as u64;
            }
            ("MCP_CONFIG_SERVER_AUTH_JWT_SECRET", EnvValue::String(s)) => {
                self.server.auth.jwt_secret = s;
            }
            ("MCP_CONFIG_SERVER_AUTH_ISSUER", EnvValue::String(s)) => {
                self.server.auth.issuer = s;
            }
            ("MCP_CONFIG_SERVER_AUTH_UPSTREAM_DOMAIN", EnvValue::String(s)) => {
                self.server.auth.upstream_domain = s;
            }
            ("MCP_CONFIG_SERVER_AUTH_UPSTREAM_CLIENT_ID", EnvValue::String(s)) => {
                self.server.auth.upstream_client_id = s;
            }
            ("MCP_CONFIG_SERVER_AUTH_UPSTREAM_CLIENT_SECRET", EnvValue::String(s)) => {
                self.server.auth.upstream_client_secret = s;
            }
            ("MCP_CONFIG_SERVER_AUTH_UPSTREAM_AUDIENCE", EnvValue::String(s)) => {
                self.server.auth.upstream_audience = Some(s);
            }
            ("MCP_CONFIG_SERVER_ENVIRONMENT", EnvValue::String(s)) if s == "production" => {
                self.server.environment = Environment::Production;
            }
            ("MCP_CONFIG_SERVER_ENVIRONMENT", EnvValue::String(_)) => {
                self.server.environment = Environment::Development;
            }
            ("MCP_CONFIG_STORAGE_TYPE", EnvValue::String(s)) if s == "valkey" || s == "redis" => {
                self.storage.kind = StorageKind::Valkey;
            }
            ("MCP_CONFIG_STORAGE_TYPE", EnvValue::String(_)) => {
                self.storage.kind = StorageKind::Memory;
            }
            ("MCP_CONFIG_STORAGE_VALKEY_URL", EnvValue::String(s)) => {
                self.storage.valkey_url = Some(s);
            }
            ("MCP_CONFIG_OAUTH_SCOPES_SUPPORTED", EnvValue::Json(v)) => {
                if let Some(arr) = v.as_array() {
                    self.oauth.scopes_supported = arr
                        .iter()
                        .filter_map(|x| x.as_str().map(str::to_string))
                        .collect();
                }
            }
            (key, _) => {
                tracing::warn!(%key, "MCP_CONFIG_* override present but type did not match expectation");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn defaults_are_development_memory() {
        let config = Config::default();
        assert_eq!(config.server.environment, Environment::Development);
        assert_eq!(config.storage.kind, StorageKind::Memory);
    }

    #[test]
    fn env_overlay_parses_bool_int_and_string() {
        let mut env = HashMap::new();
        env.insert(
            "MCP_CONFIG_SERVER_HTTP_PORT".to_string(),
            "8080".to_string(),
        );
        env.insert(
            "MCP_CONFIG_SERVER_AUTH_ENABLED".to_string(),
            "false".to_string(),
        );
        env.insert(
            "MCP_CONFIG_STORAGE_TYPE".to_string(),
            "valkey".to_string(),
        );

        let config = Config::from_env_source(|key| env.get(key).cloned());

        assert_eq!(config.server.http.port, 8080);
        assert!(!config.server.auth.enabled);
        assert_eq!(config.storage.kind, StorageKind::Valkey);
    }

    #[test]
    fn env_overlay_parses_json_array() {
        let mut env = HashMap::new();
        env.insert(
            "MCP_CONFIG_SERVER_HTTP_ALLOWED_ORIGINS".to_string(),
            r#"["https://a.example","https://b.example"]"#.to_string(),
        );
        let config = Config::from_env_source(|key| env.get(key).cloned());
        assert_eq!(
            config.server.http.allowed_origins,
            vec!["https://a.example", "https://b.example"]
        );
    }
}
