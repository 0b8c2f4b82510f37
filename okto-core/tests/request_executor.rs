//! Integration tests for authenticated request execution.
//!
//! These tests verify that every data call:
//! - Carries the API key, bearer token, accept and user-agent headers
//! - Renders query strings without empty fields
//! - Maps transport, HTTP, envelope and decode failures to distinct errors

use std::sync::Arc;

use okto_core::{
    ClientConfig, Environment, MemoryStore, OktoClient, OktoError, OrderQuery, SessionTokens,
    TransferTokens,
};
use serde_json::json;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{body_json, header, method, path, query_param},
};

const API_KEY: &str = "test-api-key";

async fn authenticated_client(base_url: &str) -> OktoClient {
    let store = Arc::new(MemoryStore::with_tokens(
        SessionTokens::new("A1", "R1", "D1").unwrap(),
    ));
    OktoClient::with_store(
        ClientConfig::new(API_KEY, Environment::Sandbox).with_base_url(base_url),
        store,
    )
    .await
    .unwrap()
}

fn success(data: serde_json::Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({ "status": "success", "data": data }))
}

#[tokio::test]
async fn test_get_sends_fixed_and_bearer_headers() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/wallet"))
        .and(header("x-api-key", API_KEY))
        .and(header("authorization", "Bearer A1"))
        .and(header("accept", "application/json"))
        .respond_with(success(json!({
            "wallets": [
                { "network_name": "POLYGON", "address": "0xabc", "success": true }
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = authenticated_client(&server.uri()).await;

    let wallets = client.wallets().await.unwrap();

    assert_eq!(wallets.wallets.len(), 1);
    assert_eq!(wallets.wallets[0].address, "0xabc");

    let requests = server.received_requests().await.unwrap();
    let user_agent = requests[0].headers.get("user-agent").unwrap();
    assert!(user_agent.to_str().unwrap().starts_with("okto-rs/"));
}

#[tokio::test]
async fn test_logged_out_client_sends_empty_bearer() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/user_from_token"))
        .respond_with(success(json!({
            "email": "user@example.com",
            "user_id": "u-1",
            "created_at": "2024-01-01",
            "freezed": false,
            "freeze_reason": ""
        })))
        .mount(&server)
        .await;

    let client = OktoClient::with_store(
        ClientConfig::new(API_KEY, Environment::Sandbox).with_base_url(server.uri()),
        Arc::new(MemoryStore::new()),
    )
    .await
    .unwrap();

    let user = client.user_details().await.unwrap();
    assert_eq!(user.user_id, "u-1");

    let requests = server.received_requests().await.unwrap();
    let authorization = requests[0].headers.get("authorization").unwrap();
    assert_eq!(authorization.to_str().unwrap().trim_end(), "Bearer");
}

#[tokio::test]
async fn test_query_string_omits_empty_fields() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/orders"))
        .and(query_param("limit", "10"))
        .and(query_param("order_state", "open"))
        .respond_with(success(json!({ "total": 0, "jobs": [] })))
        .expect(1)
        .mount(&server)
        .await;

    let client = authenticated_client(&server.uri()).await;

    let query = OrderQuery {
        limit: 10,
        order_state: "open".to_string(),
        ..OrderQuery::default()
    };
    let orders = client.order_history(&query).await.unwrap();
    assert_eq!(orders.total, 0);

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests[0].url.query(), Some("limit=10&order_state=open"));
}

#[tokio::test]
async fn test_post_sends_json_body() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/transfer/tokens/execute"))
        .and(header("content-type", "application/json"))
        .and(body_json(json!({
            "network_name": "POLYGON",
            "token_address": "",
            "quantity": "0.5",
            "recipient_address": "0xdef"
        })))
        .respond_with(success(json!({ "orderId": "o-1" })))
        .expect(1)
        .mount(&server)
        .await;

    let client = authenticated_client(&server.uri()).await;

    let data = client
        .transfer_tokens(&TransferTokens {
            network_name: "POLYGON".to_string(),
            token_address: String::new(),
            quantity: "0.5".to_string(),
            recipient_address: "0xdef".to_string(),
        })
        .await
        .unwrap();

    assert_eq!(data.order_id, "o-1");
}

#[tokio::test]
async fn test_http_error_status_is_reported() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/portfolio"))
        .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
        .mount(&server)
        .await;

    let client = authenticated_client(&server.uri()).await;

    match client.portfolio().await {
        Err(OktoError::HttpError { status, body }) => {
            assert_eq!(status, 503);
            assert_eq!(body, "maintenance");
        }
        other => panic!("expected HttpError, got {:?}", other),
    }
}

#[tokio::test]
async fn test_error_envelope_with_null_data() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/supported/tokens"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "status": "error", "data": null })),
        )
        .mount(&server)
        .await;

    let client = authenticated_client(&server.uri()).await;

    match client.supported_tokens().await {
        Err(OktoError::ApplicationError { raw_body }) => {
            assert!(raw_body.contains("error"));
        }
        other => panic!("expected ApplicationError, got {:?}", other),
    }
}

#[tokio::test]
async fn test_malformed_body_is_decode_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/supported/networks"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>gateway</html>"))
        .mount(&server)
        .await;

    let client = authenticated_client(&server.uri()).await;

    match client.supported_networks().await {
        Err(OktoError::Decode { body, .. }) => assert!(body.contains("gateway")),
        other => panic!("expected Decode, got {:?}", other),
    }
}

#[tokio::test]
async fn test_unreachable_server_is_network_error() {
    let server = MockServer::start().await;
    let uri = server.uri();
    drop(server);

    let client = authenticated_client(&uri).await;

    let err = client.wallets().await.unwrap_err();
    assert!(matches!(err, OktoError::NetworkError { .. }));
    assert!(err.is_retryable());
}

#[tokio::test]
async fn test_executor_never_refreshes_on_unauthorized() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/wallet"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;

    let client = authenticated_client(&server.uri()).await;

    let err = client.wallets().await.unwrap_err();

    assert_eq!(err.status(), Some(401));
    assert_eq!(client.session().current_auth_token().expose(), "A1");
    assert_eq!(server.received_requests().await.unwrap().len(), 1);
}
