//! Redirect URI matching, including the RFC 8252 §7.3 loopback carve-out.

use url::Url;

/// Native clients registered with a loopback redirect URI (`127.0.0.1`,
/// `localhost`, or `[::1]`) may bind an ephemeral port chosen at launch
/// time, so the registered URI's port is ignored when matching against a
/// request's actual redirect URI. Every other component (scheme, host,
/// path, query) must match exactly.
pub fn redirect_uri_matches(registered: &str, requested: &str) -> bool {
    let (Some(registered_url), Some(requested_url)) =
        (Url::parse(registered).ok(), Url::parse(requested).ok())
    else {
        return false;
    };

    if is_loopback(&registered_url) && is_loopback(&requested_url) {
        return registered_url.scheme() == requested_url.scheme()
            && registered_url.host_str() == requested_url.host_str()
            && registered_url.path() == requested_url.path()
            && registered_url.query() == requested_url.query();
    }

    registered == requested
}

fn is_loopback(url: &Url) -> bool {
    matches!(
        url.host_str(),
        Some("127.0.0.1") | Some("localhost") | Some("::1") | Some("[::1]")
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loopback_ignores_port() {
        assert!(redirect_uri_matches(
            "http://127.0.0.1:8080/callback",
            "http://127.0.0.1:51234/callback"
        ));
    }

    #[test]
    fn loopback_localhost_ignores_port() {
        assert!(redirect_uri_matches(
            "http://localhost:3000/cb",
            "http://localhost:9999/cb"
        ));
    }

    #[test]
    fn loopback_path_still_matters() {
        assert!(!redirect_uri_matches(
            "http://127.0.0.1:8080/callback",
            "http://127.0.0.1:51234/other"
        ));
    }

    #[test]
    fn non_loopback_requires_exact_match() {
        assert!(!redirect_uri_matches(
            "https://app.example.com:8443/cb",
            "https://app.example.com:9443/cb"
        ));
        assert!(redirect_uri_matches(
            "https://app.example.com/cb",
            "https://app.example.com/cb"
        ));
    }
}
