//! Integration tests for the reqwest-backed transport.
//!
//! Run with:
//!
//! ```bash
//! cargo test -p redotkit-lib --features http-transport --test http_transport
//! ```

#![cfg(feature = "http-transport")]

use redotkit_lib::test_utils::test_config;
use redotkit_lib::{
    HttpTransport, InMemorySessionStore, Language, RedotClient, RedotError, RequestHeaders,
    Transport,
};
use serde_json::{json, Value};
use wiremock::{
    matchers::{header, header_exists, method, path},
    Mock, MockServer, Request, Respond, ResponseTemplate,
};

/// Replies with the request ciphertext, which decrypts under the request key.
struct EchoEnvelope;

impl Respond for EchoEnvelope {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let mut body: Value = match request.body_json() {
            Ok(body) => body,
            Err(_) => return ResponseTemplate::new(400),
        };
        if let Some(obj) = body.as_object_mut() {
            obj.remove("encryptedAesKey");
        }
        ResponseTemplate::new(200).set_body_json(body)
    }
}

fn client_for(server: &MockServer) -> RedotClient<HttpTransport, InMemorySessionStore> {
    let config = test_config()
        .with_bearer_token("jwt")
        .with_language(Language::Zh);
    let config = redotkit_lib::RedotConfig {
        base_url: server.uri(),
        ..config
    };
    let transport = HttpTransport::new(&config).unwrap();
    RedotClient::new(config, transport, InMemorySessionStore::new()).unwrap()
}

// ============================================================================
// Request cycle
// ============================================================================

#[tokio::test]
async fn test_full_cycle_over_http() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/echo"))
        .and(header("Content-Type", "application/json"))
        .and(header("Accept", "application/json"))
        .and(header("Authorization", "Bearer jwt"))
        .and(header("X-SToken", "jwt"))
        .and(header("Lang", "zh"))
        .and(header_exists("X-R-Signature"))
        .and(header_exists("X-R-Ts"))
        .respond_with(EchoEnvelope)
        .expect(1)
        .mount(&server)
        .await;

    let mut client = client_for(&server);
    let reply: Value = client
        .request_api("/api/echo", &json!({"sn": "X1"}))
        .await
        .unwrap();

    assert_eq!(reply, json!({"sn": "X1"}));
}

#[tokio::test]
async fn test_signature_header_matches_session() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(EchoEnvelope)
        .mount(&server)
        .await;

    let mut client = client_for(&server);
    let _: Value = client.request_api("/x", &json!({"sn": "X1"})).await.unwrap();

    let received = server.received_requests().await.unwrap();
    let sent = received[0]
        .headers
        .get("X-R-Signature")
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert_eq!(client.session().last_signature(), Some(sent.as_str()));
}

// ============================================================================
// Error mapping
// ============================================================================

#[tokio::test]
async fn test_business_code_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "code": "PRE_ORDER_EXPIRED",
            "msg": "pre-order expired"
        })))
        .mount(&server)
        .await;

    let mut client = client_for(&server);
    let err = client
        .request_api::<_, Value>("/x", &json!({"preSn": "ABC123"}))
        .await
        .unwrap_err();

    match err {
        RedotError::Api { code, message } => {
            assert_eq!(code, "PRE_ORDER_EXPIRED");
            assert_eq!(message, "pre-order expired");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_server_error_is_retryable_transport_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503).set_body_json(json!({"message": "maintenance"})))
        .mount(&server)
        .await;

    let transport = HttpTransport::with_base_url(server.uri(), 5).unwrap();
    let err = transport
        .send("/x", json!({}), &RequestHeaders::new())
        .await
        .unwrap_err();

    assert!(matches!(err, RedotError::Transport(ref msg) if msg.contains("maintenance")));
    assert!(err.is_retryable());
}

#[tokio::test]
async fn test_gateway_timeout_status() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(504))
        .mount(&server)
        .await;

    let transport = HttpTransport::with_base_url(server.uri(), 7).unwrap();
    let err = transport
        .send("/x", json!({}), &RequestHeaders::new())
        .await
        .unwrap_err();

    assert!(matches!(err, RedotError::ConnectionTimeout { timeout_ms: 7000, .. }));
}

#[tokio::test]
async fn test_slow_reply_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({}))
                .set_delay(std::time::Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let transport = HttpTransport::with_base_url(server.uri(), 1).unwrap();
    let err = transport
        .send("/x", json!({}), &RequestHeaders::new())
        .await
        .unwrap_err();

    assert!(matches!(err, RedotError::ConnectionTimeout { .. }));
}

#[tokio::test]
async fn test_non_json_reply() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>ok</html>"))
        .mount(&server)
        .await;

    let transport = HttpTransport::with_base_url(server.uri(), 5).unwrap();
    let err = transport
        .send("/x", json!({}), &RequestHeaders::new())
        .await
        .unwrap_err();

    assert!(matches!(err, RedotError::ResponseFormat(_)));
}

#[tokio::test]
async fn test_connection_refused() {
    let transport = HttpTransport::with_base_url("http://127.0.0.1:9", 2).unwrap();
    let err = transport
        .send("/x", json!({}), &RequestHeaders::new())
        .await
        .unwrap_err();

    assert!(err.is_retryable());
}
