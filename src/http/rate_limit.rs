//! Global per-IP rate limiting.
//!
//! Grounded on `turbomcp-auth::tower::rate_limit`'s `KeyExtractor`-driven
//! design, with a fixed gateway-wide policy instead of per-route
//! configuration: 100 requests/minute per client IP, with health-check
//! probes exempted so a Kubernetes liveness/readiness probe hitting the
//! same pod hundreds of times a minute never trips it.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use dashmap::DashMap;

use crate::app::AppState;
use crate::http::client_ip::extract_client_ip;

const WINDOW: Duration = Duration::from_secs(60);
const LIMIT: usize = 100;

pub struct RateLimiter {
    hits: DashMap<String, Mutex<VecDeque<Instant>>>,
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::for_gateway()
    }
}

impl RateLimiter {
    /// Construct the limiter with this gateway's fixed policy. Named to
    /// mirror `RateLimiter::for_gateway()`-style constructors rather than a
    /// bare `new()`, since there is exactly one policy this type ever
    /// enforces.
    pub fn for_gateway() -> Self {
        Self { hits: DashMap::new() }
    }

    fn check(&self, key: &str) -> bool {
        let now = Instant::now();
        let entry = self.hits.entry(key.to_string()).or_default();
        let mut window = entry.lock().unwrap();
        while window.front().is_some_and(|t| now.duration_since(*t) > WINDOW) {
            window.pop_front();
        }
        if window.len() >= LIMIT {
            return false;
        }
        window.push_back(now);
        true
    }
}

fn is_probe(request: &Request) -> bool {
    request
        .headers()
        .get(axum::http::header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .map(|ua| ua.starts_with("kube-probe/"))
        .unwrap_or(false)
}

pub async fn rate_limit(State(state): State<AppState>, request: Request, next: Next) -> Response {
    if is_probe(&request) {
        return next.run(request).await;
    }

    let client_ip = extract_client_ip(request.headers());
    if !state.rate_limiter.check(&client_ip) {
        return (StatusCode::TOO_MANY_REQUESTS, "rate limit exceeded").into_response();
    }
    next.run(request).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allows_up_to_limit_then_rejects() {
        let limiter = RateLimiter::for_gateway();
        for _ in 0..LIMIT {
            assert!(limiter.check("1.2.3.4"));
        }
        assert!(!limiter.check("1.2.3.4"));
    }

    #[test]
    fn separate_keys_have_separate_budgets() {
        let limiter = RateLimiter::for_gateway();
        for _ in 0..LIMIT {
            assert!(limiter.check("1.1.1.1"));
        }
        assert!(limiter.check("2.2.2.2"));
    }
}
