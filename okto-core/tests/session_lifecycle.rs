//! Integration tests for the session lifecycle.
//!
//! These tests verify that the client correctly:
//! - Exchanges an identity token for a session and persists it
//! - Leaves the current session untouched when an exchange fails
//! - Refreshes with the refresh and device tokens, not the bearer token
//! - Runs concurrent refreshes one after the other
//! - Clears the session on logout
//! - Restores a persisted session on startup

use std::sync::Arc;
use std::time::Duration;

use okto_core::{
    ClientConfig, CredentialStore, Environment, FileStore, MemoryStore, OktoClient, OktoError,
    SessionTokens,
};
use serde_json::json;
use tempfile::TempDir;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{body_json, header, method, path},
};

const API_KEY: &str = "test-api-key";

fn config_for(server: &MockServer) -> ClientConfig {
    ClientConfig::new(API_KEY, Environment::Sandbox).with_base_url(server.uri())
}

fn auth_envelope(auth: &str, refresh: &str, device: &str) -> serde_json::Value {
    json!({
        "status": "success",
        "data": {
            "auth_token": auth,
            "refresh_auth_token": refresh,
            "device_token": device,
        }
    })
}

async fn client_with_store(
    server: &MockServer,
    store: Arc<MemoryStore>,
) -> OktoClient {
    OktoClient::with_store(config_for(server), store)
        .await
        .unwrap()
}

#[tokio::test]
async fn test_authenticate_persists_new_session() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/v2/authenticate"))
        .and(header("x-api-key", API_KEY))
        .and(body_json(json!({ "id_token": "google-id-token" })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(auth_envelope("A1", "R1", "D1")),
        )
        .expect(1)
        .mount(&server)
        .await;

    let store = Arc::new(MemoryStore::new());
    let client = client_with_store(&server, store.clone()).await;

    let tokens = client.authenticate("google-id-token").await.unwrap();

    assert_eq!(tokens.auth_token().expose(), "A1");
    assert_eq!(tokens.refresh_token().expose(), "R1");
    assert_eq!(tokens.device_token().expose(), "D1");
    assert!(client.session().is_authenticated());
    assert_eq!(store.load().await.unwrap(), Some(tokens));
    assert_eq!(store.save_count(), 1);
}

#[tokio::test]
async fn test_authenticate_error_envelope_keeps_session() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/v2/authenticate"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "status": "error", "data": null })),
        )
        .mount(&server)
        .await;

    let previous = SessionTokens::new("A0", "R0", "D0").unwrap();
    let store = Arc::new(MemoryStore::with_tokens(previous.clone()));
    let client = client_with_store(&server, store.clone()).await;

    let result = client.authenticate("bad-id-token").await;

    assert!(matches!(result, Err(OktoError::AuthenticationFailed { .. })));
    assert_eq!(client.session().snapshot(), previous);
    assert_eq!(store.save_count(), 0);
}

#[tokio::test]
async fn test_authenticate_incomplete_tokens_rejected() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/v2/authenticate"))
        .respond_with(ResponseTemplate::new(200).set_body_json(auth_envelope("A1", "", "D1")))
        .mount(&server)
        .await;

    let store = Arc::new(MemoryStore::new());
    let client = client_with_store(&server, store.clone()).await;

    let result = client.authenticate("id-token").await;

    assert!(matches!(result, Err(OktoError::AuthenticationFailed { .. })));
    assert!(client.session().snapshot().is_logged_out());
    assert_eq!(store.save_count(), 0);
}

#[tokio::test]
async fn test_authenticate_http_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/v2/authenticate"))
        .respond_with(ResponseTemplate::new(401).set_body_string("unauthorized"))
        .mount(&server)
        .await;

    let client = client_with_store(&server, Arc::new(MemoryStore::new())).await;

    let err = client.authenticate("id-token").await.unwrap_err();

    assert!(err.requires_reauthentication());
    assert!(!client.session().is_authenticated());
}

#[tokio::test]
async fn test_refresh_sends_refresh_and_device_tokens() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/refresh_token"))
        .and(header("x-api-key", API_KEY))
        .and(header("x-refresh-authorization", "Bearer R1"))
        .and(header("x-device-token", "D1"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(auth_envelope("A2", "R2", "D2")),
        )
        .expect(1)
        .mount(&server)
        .await;

    let store = Arc::new(MemoryStore::with_tokens(
        SessionTokens::new("A1", "R1", "D1").unwrap(),
    ));
    let client = client_with_store(&server, store.clone()).await;

    let tokens = client.refresh().await.unwrap();

    assert_eq!(tokens, SessionTokens::new("A2", "R2", "D2").unwrap());
    assert_eq!(client.session().current_auth_token().expose(), "A2");
    assert_eq!(store.load().await.unwrap(), Some(tokens));

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    assert!(requests[0].headers.get("authorization").is_none());
}

#[tokio::test]
async fn test_concurrent_refreshes_run_in_turn() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/refresh_token"))
        .and(header("x-refresh-authorization", "Bearer R1"))
        .and(header("x-device-token", "D1"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(auth_envelope("A2", "R2", "D2"))
                .set_delay(Duration::from_millis(200)),
        )
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/v1/refresh_token"))
        .and(header("x-refresh-authorization", "Bearer R2"))
        .and(header("x-device-token", "D2"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(auth_envelope("A3", "R3", "D3")),
        )
        .expect(1)
        .mount(&server)
        .await;

    let store = Arc::new(MemoryStore::with_tokens(
        SessionTokens::new("A1", "R1", "D1").unwrap(),
    ));
    let client = client_with_store(&server, store.clone()).await;

    // The second refresh must wait for the first and use its refresh token.
    let (first, second) = tokio::join!(client.refresh(), client.refresh());

    assert_eq!(first.unwrap().auth_token().expose(), "A2");
    assert_eq!(second.unwrap().auth_token().expose(), "A3");
    assert_eq!(client.session().current_auth_token().expose(), "A3");
    assert_eq!(
        store.load().await.unwrap(),
        Some(SessionTokens::new("A3", "R3", "D3").unwrap())
    );
    assert_eq!(store.save_count(), 2);
}

#[tokio::test]
async fn test_refresh_failure_keeps_session() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/refresh_token"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let current = SessionTokens::new("A1", "R1", "D1").unwrap();
    let store = Arc::new(MemoryStore::with_tokens(current.clone()));
    let client = client_with_store(&server, store.clone()).await;

    let result = client.refresh().await;

    assert!(matches!(result, Err(OktoError::RefreshFailed { .. })));
    assert_eq!(client.session().snapshot(), current);
    assert_eq!(store.save_count(), 0);
}

#[tokio::test]
async fn test_logout_clears_session_without_server_call() {
    let server = MockServer::start().await;

    let store = Arc::new(MemoryStore::with_tokens(
        SessionTokens::new("A1", "R1", "D1").unwrap(),
    ));
    let client = client_with_store(&server, store.clone()).await;

    client.logout().await.unwrap();

    assert!(!client.session().is_authenticated());
    assert!(client.session().current_auth_token().is_empty());
    assert_eq!(store.load().await.unwrap(), Some(SessionTokens::logged_out()));
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_session_survives_restart_with_file_store() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/v2/authenticate"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(auth_envelope("A1", "R1", "D1")),
        )
        .mount(&server)
        .await;

    let temp_dir = TempDir::new().unwrap();
    let session_path = temp_dir.path().join("session.json");

    {
        let store = Arc::new(FileStore::new(&session_path));
        let client = OktoClient::with_store(config_for(&server), store).await.unwrap();
        client.authenticate("id-token").await.unwrap();
    }

    let store = Arc::new(FileStore::new(&session_path));
    let restarted = OktoClient::with_store(config_for(&server), store).await.unwrap();

    assert!(restarted.session().is_authenticated());
    assert_eq!(
        restarted.session().snapshot(),
        SessionTokens::new("A1", "R1", "D1").unwrap()
    );
}

#[tokio::test]
async fn test_clones_share_one_session() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/v2/authenticate"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(auth_envelope("A1", "R1", "D1")),
        )
        .mount(&server)
        .await;

    let client = client_with_store(&server, Arc::new(MemoryStore::new())).await;
    let clone = client.clone();

    client.authenticate("id-token").await.unwrap();

    assert_eq!(clone.session().current_auth_token().expose(), "A1");
}
