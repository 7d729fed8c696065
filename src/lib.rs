//! A stateful HTTP gateway fronting the Model Context Protocol: Streamable
//! HTTP/SSE transport with cross-instance session replay and journal-backed
//! resumability, in front of an OAuth 2.1 authorization proxy.

pub mod app;
pub mod config;
pub mod context;
pub mod error;
pub mod handlers;
pub mod http;
pub mod journal;
pub mod jwt;
pub mod kv;
pub mod mcp_core;
pub mod metrics;
pub mod oauth;
pub mod transport;
