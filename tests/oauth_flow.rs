//! End-to-end OAuth proxy flow: register, authorize, callback, token,
//! revoke, and a replayed authorization code failing as `invalid_grant`.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use mcp_gateway::app::AppState;
use mcp_gateway::config::Config;
use serde_json::{json, Value};
use tower::ServiceExt;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn test_app(upstream_base: &str) -> axum::Router {
    let mut config = Config::default();
    config.server.auth.upstream_domain = upstream_base.to_string();
    config.server.auth.upstream_client_id = "upstream-client".to_string();
    config.server.auth.upstream_client_secret = "upstream-secret".to_string();
    config.server.http.base_url = "http://gateway.test".to_string();
    let state = AppState::build(config).await.unwrap();
    state.router()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn full_authorization_code_round_trip() {
    let upstream = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "upstream-access-token",
            "refresh_token": "upstream-refresh-token",
        })))
        .mount(&upstream)
        .await;
    Mock::given(method("GET"))
        .and(path("/userinfo"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "sub": "user-123",
        })))
        .mount(&upstream)
        .await;

    let app = test_app(&upstream.uri()).await;

    // 1. Dynamic client registration.
    let register_response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/oauth/register")
                .header("content-type", "application/json")
                .body(Body::from(
                    json!({
                        "redirect_uris": ["http://127.0.0.1:51234/callback"],
                        "token_endpoint_auth_method": "none",
                    })
                    .to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(register_response.status(), StatusCode::OK);
    let registration = body_json(register_response).await;
    let client_id = registration["client_id"].as_str().unwrap().to_string();

    // 2. /oauth/authorize redirects to the upstream IdP and stashes session state.
    let verifier = "a-sufficiently-long-pkce-code-verifier-value-1234567890";
    let challenge = {
        use base64::engine::general_purpose::URL_SAFE_NO_PAD;
        use base64::Engine;
        use sha2::{Digest, Sha256};
        URL_SAFE_NO_PAD.encode(Sha256::digest(verifier.as_bytes()))
    };

    let authorize_uri = format!(
        "/oauth/authorize?client_id={client_id}&redirect_uri=http%3A%2F%2F127.0.0.1%3A51234%2Fcallback&response_type=code&code_challenge={challenge}&code_challenge_method=S256&state=downstream-state"
    );
    let authorize_response = app
        .clone()
        .oneshot(Request::builder().uri(authorize_uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(authorize_response.status(), StatusCode::TEMPORARY_REDIRECT);
    let upstream_redirect = authorize_response
        .headers()
        .get("location")
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    let upstream_url = url::Url::parse(&upstream_redirect).unwrap();
    let gateway_state = upstream_url
        .query_pairs()
        .find(|(k, _)| k == "state")
        .unwrap()
        .1
        .to_string();

    // 3. The upstream redirects back to our /oauth/auth0-callback.
    let callback_response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri(format!(
                    "/oauth/auth0-callback?code=upstream-auth-code&state={gateway_state}"
                ))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(callback_response.status(), StatusCode::TEMPORARY_REDIRECT);
    let downstream_redirect = callback_response
        .headers()
        .get("location")
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    let downstream_url = url::Url::parse(&downstream_redirect).unwrap();
    let gateway_code = downstream_url
        .query_pairs()
        .find(|(k, _)| k == "code")
        .unwrap()
        .1
        .to_string();
    let echoed_state = downstream_url
        .query_pairs()
        .find(|(k, _)| k == "state")
        .unwrap()
        .1
        .to_string();
    assert_eq!(echoed_state, "downstream-state");

    // 4. Exchange the gateway's code for tokens.
    let token_body = format!(
        "grant_type=authorization_code&code={gateway_code}&redirect_uri=http%3A%2F%2F127.0.0.1%3A51234%2Fcallback&code_verifier={verifier}&client_id={client_id}"
    );
    let token_response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/oauth/token")
                .header("content-type", "application/x-www-form-urlencoded")
                .body(Body::from(token_body.clone()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(token_response.status(), StatusCode::OK);
    let tokens = body_json(token_response).await;
    let access_token = tokens["access_token"].as_str().unwrap().to_string();

    // 5. Redeeming the same code again fails as invalid_grant.
    let replay_response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/oauth/token")
                .header("content-type", "application/x-www-form-urlencoded")
                .body(Body::from(token_body))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(replay_response.status(), StatusCode::BAD_REQUEST);

    // 6. Revoking the access token succeeds and is idempotent.
    let revoke_response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/oauth/revoke")
                .header("content-type", "application/x-www-form-urlencoded")
                .body(Body::from(format!("token={access_token}")))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(revoke_response.status(), StatusCode::OK);

    // 7. The revoked token can no longer authenticate against /mcp.
    let mcp_response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/mcp")
                .header("authorization", format!("Bearer {access_token}"))
                .header("content-type", "application/json")
                .header("mcp-protocol-version", "2025-06-18")
                .body(Body::from(
                    json!({"jsonrpc": "2.0", "id": 1, "method": "tools/list"}).to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(mcp_response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn metadata_endpoints_are_unauthenticated() {
    let upstream = MockServer::start().await;
    let app = test_app(&upstream.uri()).await;

    let response = app
        .oneshot(
            Request::builder()
                .uri("/.well-known/oauth-authorization-server")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let metadata = body_json(response).await;
    assert_eq!(metadata["issuer"], "http://gateway.test");
}
