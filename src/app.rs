//! Application state assembly and router construction.

use std::sync::Arc;
use std::time::Duration;

use axum::routing::{delete, get, post};
use axum::Router;

use crate::config::{Config, StorageKind};
use crate::http::rate_limit::RateLimiter;
use crate::journal::EventJournal;
use crate::jwt::JwtSigner;
use crate::kv::{MemoryStore, RedisStore, Store};
use crate::mcp_core::McpCore;
use crate::metrics::AuthMetrics;
use crate::transport::registry::TransportRegistry;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub store: Arc<dyn Store>,
    pub journal: Arc<EventJournal>,
    pub registry: Arc<TransportRegistry>,
    pub core: Arc<McpCore>,
    pub jwt: Arc<JwtSigner>,
    pub http_client: reqwest::Client,
    pub metrics: Arc<AuthMetrics>,
    pub rate_limiter: Arc<RateLimiter>,
    pub started_at: std::time::Instant,
}

impl AppState {
    pub async fn build(config: Config) -> Result<Self, String> {
        let store: Arc<dyn Store> = match config.storage.kind {
            StorageKind::Memory => Arc::new(MemoryStore::new()),
            StorageKind::Valkey => {
                let url = config
                    .storage
                    .valkey_url
                    .as_deref()
                    .ok_or_else(|| "storage.type is valkey but valkeyUrl is unset".to_string())?;
                Arc::new(
                    RedisStore::connect(url)
                        .await
                        .map_err(|e| format!("failed to connect to valkey: {e}"))?,
                )
            }
        };

        let journal = Arc::new(EventJournal::new(
            store.clone(),
            config.server.auth.event_ttl_duration(),
        ));
        let registry = Arc::new(TransportRegistry::new(
            store.clone(),
            config.server.auth.mcp_session_ttl_duration(),
        ));
        let jwt = Arc::new(JwtSigner::new(&config.server.auth.jwt_secret, config.server.auth.issuer.clone()));
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| format!("failed to build http client: {e}"))?;

        Ok(Self {
            config: Arc::new(config),
            store,
            journal,
            registry,
            core: Arc::new(McpCore::new()),
            jwt,
            http_client,
            metrics: Arc::new(AuthMetrics::default()),
            rate_limiter: Arc::new(RateLimiter::for_gateway()),
            started_at: std::time::Instant::now(),
        })
    }

    pub fn router(self) -> Router {
        let state = self.clone();

        let public = Router::new()
            .route("/", get(crate::handlers::health::root))
            .route("/ping", get(crate::handlers::health::ping))
            .route("/health", get(crate::handlers::health::health))
            .route("/oauth/stats", get(crate::handlers::health::oauth_stats))
            .merge(crate::oauth::router());

        let protected = Router::new()
            .route("/mcp", post(crate::handlers::mcp::post_mcp))
            .route("/mcp", get(crate::handlers::mcp::get_mcp))
            .route("/mcp", delete(crate::handlers::mcp::delete_mcp))
            .route_layer(axum::middleware::from_fn_with_state(
                state.clone(),
                crate::oauth::middleware::require_auth,
            ));
        let protected = crate::http::apply_mcp_pipeline(protected, state.clone());

        let router = public.merge(protected);
        crate::http::apply_global_pipeline(router, state.clone()).with_state(state)
    }
}
