//! Security response headers.
//!
//! Field names and defaults mirror `turbomcp-server::middleware::security`'s
//! `SecurityHeaders`/`FrameOptions`/`ReferrerPolicy`, applied here as a
//! single `tower::Layer`-compatible middleware function rather than that
//! module's config-struct-plus-builder, since this gateway has exactly one
//! header policy rather than a configurable one per route.

use axum::extract::Request;
use axum::http::HeaderValue;
use axum::middleware::Next;
use axum::response::Response;

pub async fn security_headers(request: Request, next: Next) -> Response {
    let mut response = next.run(request).await;
    let headers = response.headers_mut();

    headers.insert("x-content-type-options", HeaderValue::from_static("nosniff"));
    headers.insert("x-frame-options", HeaderValue::from_static("DENY"));
    headers.insert("x-xss-protection", HeaderValue::from_static("1; mode=block"));
    headers.insert(
        "referrer-policy",
        HeaderValue::from_static("strict-origin-when-cross-origin"),
    );
    headers.insert(
        "strict-transport-security",
        HeaderValue::from_static("max-age=63072000; includeSubDomains"),
    );
    headers.insert(
        "content-security-policy",
        HeaderValue::from_static("default-src 'none'"),
    );

    response
}
