//! Session Continuity Integration Tests
//!
//! End-to-end tests for the durable session: credentials survive restarts,
//! expired access tokens are refreshed against a mock backend, and logout
//! wipes the stored pair.

use lingo_mobile::{open_client, ClientConfig, CredentialPair, HttpRequest, KvConfig, SessionEvent};
use serde_json::json;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn kv_config(dir: &TempDir) -> KvConfig {
    KvConfig::new(dir.path().join("session.db").to_string_lossy().to_string())
}

/// Store {A1, R1}; the backend rejects A1, rotates to {A2, R2} and accepts A2
#[tokio::test]
async fn test_refresh_scenario_persists_across_restart() {
    lingo_mobile::init_tracing();
    let temp_dir = TempDir::new().unwrap();
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/resource"))
        .and(header("Authorization", "Bearer A1"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/auth/token/refresh"))
        .and(body_json(json!({"refreshToken": "R1"})))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"accessToken": "A2", "refreshToken": "R2"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/resource"))
        .and(header("Authorization", "Bearer A2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"word": "hola"})))
        .expect(1)
        .mount(&server)
        .await;

    // Phase 1: log in and make a request that needs a refresh
    {
        let client = open_client(ClientConfig::new(server.uri()), kv_config(&temp_dir)).unwrap();
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = events.clone();
        client.on_session_event(move |event| sink.lock().unwrap().push(event));

        client.login(CredentialPair::new("A1", "R1")).await.unwrap();

        let response = client.fetch(&HttpRequest::get("/api/resource")).await.unwrap();
        assert_eq!(response.status, 200);
        let body: serde_json::Value = response.json().unwrap();
        assert_eq!(body["word"], "hola");

        assert_eq!(
            *events.lock().unwrap(),
            vec![SessionEvent::Created, SessionEvent::Refreshed]
        );
    }

    // Phase 2: restart and verify the rotated pair was persisted
    {
        let client = open_client(ClientConfig::new(server.uri()), kv_config(&temp_dir)).unwrap();
        assert_eq!(client.credentials().await.unwrap(), Some(CredentialPair::new("A2", "R2")));
    }
}

#[tokio::test]
async fn test_logout_survives_restart() {
    let temp_dir = TempDir::new().unwrap();

    {
        let client = open_client(ClientConfig::default(), kv_config(&temp_dir)).unwrap();
        client.login(CredentialPair::new("A1", "R1")).await.unwrap();
        assert!(client.is_authenticated().await.unwrap());
    }

    {
        let client = open_client(ClientConfig::default(), kv_config(&temp_dir)).unwrap();
        assert!(client.is_authenticated().await.unwrap());
        client.logout().await.unwrap();
    }

    {
        let client = open_client(ClientConfig::default(), kv_config(&temp_dir)).unwrap();
        assert!(!client.is_authenticated().await.unwrap());
        assert_eq!(client.credentials().await.unwrap(), None);
    }
}

#[tokio::test]
async fn test_failed_refresh_keeps_stale_session_for_caller_to_handle() {
    let temp_dir = TempDir::new().unwrap();
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/streak"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/auth/token/refresh"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;

    let client = open_client(ClientConfig::new(server.uri()), kv_config(&temp_dir)).unwrap();
    client.login(CredentialPair::new("A1", "R1")).await.unwrap();

    let response = client.fetch(&HttpRequest::get("/api/streak")).await.unwrap();
    assert_eq!(response.status, 401);

    // The app decides to log out on a persistent 401
    assert_eq!(client.credentials().await.unwrap(), Some(CredentialPair::new("A1", "R1")));
    client.logout().await.unwrap();
    assert!(!client.is_authenticated().await.unwrap());
}
