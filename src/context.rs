//! Ambient per-request logging context.
//!
//! `turbomcp-server::context` threads an explicit `RequestContext` argument
//! through its call chain. Rust's async ecosystem gives us something the
//! spec's source material didn't have available: a task-local that survives
//! every `.await` for the lifetime of the task, so we use `tokio::task_local!`
//! instead of threading the struct by hand.

use std::future::Future;

tokio::task_local! {
    static REQUEST_CONTEXT: RequestContext;
}

/// Correlation ids seeded once per inbound request and carried across every
/// `.await` point for that request's task.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    pub request_id: String,
    pub client_ip: String,
    pub user_agent: Option<String>,
    pub mcp_session_id: Option<String>,
    pub mcp_protocol_version: Option<String>,
}

impl RequestContext {
    pub fn new(request_id: String, client_ip: String) -> Self {
        Self {
            request_id,
            client_ip,
            user_agent: None,
            mcp_session_id: None,
            mcp_protocol_version: None,
        }
    }

    pub fn with_user_agent(mut self, user_agent: Option<String>) -> Self {
        self.user_agent = user_agent;
        self
    }

    pub fn with_mcp_session_id(mut self, session_id: Option<String>) -> Self {
        self.mcp_session_id = session_id;
        self
    }

    pub fn with_mcp_protocol_version(mut self, version: Option<String>) -> Self {
        self.mcp_protocol_version = version;
        self
    }

    /// A `tracing::Span` seeded with this context's correlation ids. Attach
    /// with `.entered()` or `.in_scope()` at the point a request begins.
    pub fn span(&self) -> tracing::Span {
        tracing::info_span!(
            "request",
            request_id = %self.request_id,
            client_ip = %self.client_ip,
            user_agent = self.user_agent.as_deref().unwrap_or("-"),
            mcp_session_id = self.mcp_session_id.as_deref().unwrap_or("-"),
            mcp_protocol_version = self.mcp_protocol_version.as_deref().unwrap_or("-"),
        )
    }
}

/// Run `f` with `context` installed as the ambient task-local for its
/// duration, including everything `f` awaits transitively.
pub async fn scope<F>(context: RequestContext, f: F) -> F::Output
where
    F: Future,
{
    REQUEST_CONTEXT.scope(context, f).await
}

/// Read the ambient request context. Panics outside of `scope` — every HTTP
/// handler runs inside one, installed by the logging middleware.
pub fn current() -> RequestContext {
    REQUEST_CONTEXT.with(|ctx| ctx.clone())
}

/// Read the ambient request context if one is installed, without panicking.
pub fn try_current() -> Option<RequestContext> {
    REQUEST_CONTEXT.try_with(|ctx| ctx.clone()).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn scope_makes_context_available_across_awaits() {
        let ctx = RequestContext::new("req-1".to_string(), "127.0.0.1".to_string());
        scope(ctx, async {
            assert_eq!(current().request_id, "req-1");
            tokio::task::yield_now().await;
            assert_eq!(current().client_ip, "127.0.0.1");
        })
        .await;
    }

    #[test]
    fn try_current_is_none_outside_scope() {
        assert!(try_current().is_none());
    }
}
