//! Client IP extraction from proxy headers.
//!
//! `turbomcp-auth::tower::rate_limit::IpKeyExtractor` checks
//! `x-forwarded-for` then `x-real-ip`. This gateway sits behind a wider
//! variety of proxies/CDNs, so the header priority list is longer; the
//! pattern (walk headers in priority order, split `x-forwarded-for` on
//! comma and take the first hop, fall back to `"unknown"`) is unchanged.

use axum::http::HeaderMap;

const HEADER_PRIORITY: &[&str] = &[
    "cf-connecting-ip",
    "x-real-ip",
    "x-forwarded-for",
    "x-client-ip",
    "x-forwarded",
    "forwarded-for",
    "forwarded",
    "x-cluster-client-ip",
    "x-original-forwarded-for",
    "true-client-ip",
];

pub fn extract_client_ip(headers: &HeaderMap) -> String {
    for header_name in HEADER_PRIORITY {
        if let Some(value) = headers.get(*header_name).and_then(|v| v.to_str().ok()) {
            let first = value.split(',').next().unwrap_or(value).trim();
            if !first.is_empty() {
                return first.to_string();
            }
        }
    }
    "unknown".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn prefers_cf_connecting_ip_over_others() {
        let mut headers = HeaderMap::new();
        headers.insert("cf-connecting-ip", HeaderValue::from_static("1.1.1.1"));
        headers.insert("x-forwarded-for", HeaderValue::from_static("2.2.2.2"));
        assert_eq!(extract_client_ip(&headers), "1.1.1.1");
    }

    #[test]
    fn takes_first_hop_of_x_forwarded_for() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_static("3.3.3.3, 4.4.4.4, 5.5.5.5"),
        );
        assert_eq!(extract_client_ip(&headers), "3.3.3.3");
    }

    #[test]
    fn falls_back_to_unknown() {
        let headers = HeaderMap::new();
        assert_eq!(extract_client_ip(&headers), "unknown");
    }
}
