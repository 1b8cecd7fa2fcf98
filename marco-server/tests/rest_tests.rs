mod common;

use common::{service_with_fake, spawn_test_server};
use marco_server::api::{PushResponse, SnapshotResponse};
use marco_server::ServerConfig;
use marco_types::SyncProvider;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};

fn snapshot_body(project_id: &str, updated_at: f64) -> Value {
    json!({
        "provider": "google",
        "projectId": project_id,
        "deviceId": "dev_abc12345",
        "hash": "hash-1",
        "updatedAt": updated_at,
        "payload": {
            "ciphertext": "Y2lwaGVydGV4dA",
            "iv": "aXYtaXYtaXYt",
            "salt": "c2FsdA",
            "iterations": 1000
        }
    })
}

// ── Tokens ──────────────────────────────────────────────────────

#[tokio::test]
async fn register_token_returns_204() {
    let (service, _fake) = service_with_fake().await;
    let base = spawn_test_server(service.clone(), ServerConfig::default()).await;

    let resp = reqwest::Client::new()
        .put(format!("{}/api/providers/microsoft/token", base))
        .json(&json!({"accessToken": "ms-token", "expiresAt": 1_700_000_000_000i64}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 204);

    let token = service
        .providers()
        .token(SyncProvider::Microsoft)
        .await
        .unwrap();
    assert_eq!(token.access_token, "ms-token");
    assert_eq!(token.expires_at, Some(1_700_000_000_000));
}

#[tokio::test]
async fn register_token_rejects_unknown_provider() {
    let (service, _fake) = service_with_fake().await;
    let base = spawn_test_server(service, ServerConfig::default()).await;

    let resp = reqwest::Client::new()
        .put(format!("{}/api/providers/dropbox/token", base))
        .json(&json!({"accessToken": "t"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert!(body["error"].as_str().unwrap().contains("dropbox"));
}

#[tokio::test]
async fn register_token_rejects_missing_access_token() {
    let (service, _fake) = service_with_fake().await;
    let base = spawn_test_server(service, ServerConfig::default()).await;

    let resp = reqwest::Client::new()
        .put(format!("{}/api/providers/google/token", base))
        .json(&json!({"refreshToken": "r"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
}

// ── Snapshots ───────────────────────────────────────────────────

#[tokio::test]
async fn push_then_get_round_trip() {
    let (service, fake) = service_with_fake().await;
    let base = spawn_test_server(service, ServerConfig::default()).await;
    let client = reqwest::Client::new();

    let resp = client
        .post(format!("{}/api/snapshots", base))
        .json(&snapshot_body("evt-1", 1_000.0))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 201);
    let pushed: PushResponse = resp.json().await.unwrap();
    assert_eq!(pushed.meta.project_id, "evt-1");
    assert_eq!(pushed.meta.updated_at, 1_000.0);
    assert_eq!(pushed.meta.size, 26);

    let resp = client
        .get(format!("{}/api/snapshots/google/evt-1", base))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let fetched: SnapshotResponse = resp.json().await.unwrap();
    assert_eq!(fetched.meta, pushed.meta);
    assert_eq!(fetched.payload.ciphertext, "Y2lwaGVydGV4dA");

    assert_eq!(fake.pushes(), 1);
    assert_eq!(fake.pulls(), 0);
}

#[tokio::test]
async fn push_keeps_fractional_updated_at() {
    let (service, _fake) = service_with_fake().await;
    let base = spawn_test_server(service.clone(), ServerConfig::default()).await;
    let client = reqwest::Client::new();

    let resp = client
        .post(format!("{}/api/snapshots", base))
        .json(&snapshot_body("evt-1", 1_000.5))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 201);
    let pushed: PushResponse = resp.json().await.unwrap();
    assert_eq!(pushed.meta.updated_at, 1_000.5);

    let fetched: Value = client
        .get(format!("{}/api/snapshots/google/evt-1", base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(fetched["meta"]["updatedAt"], json!(1000.5));

    // The GraphQL view of the same push carries the same value.
    let body: Value = client
        .post(format!("{}/graphql", base))
        .json(&json!({
            "query": r#"{ snapshot(provider: google, projectId: "evt-1") { meta { updatedAt } } }"#
        }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["data"]["snapshot"]["meta"]["updatedAt"], json!(1000.5));
}

#[tokio::test]
async fn get_missing_snapshot_is_404() {
    let (service, fake) = service_with_fake().await;
    let base = spawn_test_server(service, ServerConfig::default()).await;

    let resp = reqwest::get(format!("{}/api/snapshots/google/unknown", base))
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
    assert_eq!(fake.pulls(), 1);
}

#[tokio::test]
async fn get_with_bad_provider_is_400() {
    let (service, fake) = service_with_fake().await;
    let base = spawn_test_server(service, ServerConfig::default()).await;

    let resp = reqwest::get(format!("{}/api/snapshots/icloud/evt-1", base))
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    assert_eq!(fake.pulls(), 0);
}

#[tokio::test]
async fn get_without_credentials_is_401() {
    let (service, _fake) = service_with_fake().await;
    let base = spawn_test_server(service, ServerConfig::default()).await;

    let resp = reqwest::get(format!("{}/api/snapshots/microsoft/evt-1", base))
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);
}

#[tokio::test]
async fn malformed_push_is_400() {
    let (service, _fake) = service_with_fake().await;
    let base = spawn_test_server(service.clone(), ServerConfig::default()).await;
    let client = reqwest::Client::new();

    let mut unknown_provider = snapshot_body("evt-1", 1.0);
    unknown_provider["provider"] = json!("dropbox");
    let resp = client
        .post(format!("{}/api/snapshots", base))
        .json(&unknown_provider)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);

    let mut empty_hash = snapshot_body("evt-1", 1.0);
    empty_hash["hash"] = json!("");
    let resp = client
        .post(format!("{}/api/snapshots", base))
        .json(&empty_hash)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);

    let resp = client
        .post(format!("{}/api/snapshots", base))
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);

    assert!(service.store().is_empty().await);
}

#[tokio::test]
async fn oversized_body_is_413() {
    let (service, _fake) = service_with_fake().await;
    let config = ServerConfig {
        body_limit_bytes: 1_024,
        ..ServerConfig::default()
    };
    let base = spawn_test_server(service, config).await;

    let mut body = snapshot_body("evt-1", 1.0);
    body["payload"]["ciphertext"] = json!("A".repeat(4_096));
    let resp = reqwest::Client::new()
        .post(format!("{}/api/snapshots", base))
        .json(&body)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 413);
}

#[tokio::test]
async fn error_bodies_are_json() {
    let (service, _fake) = service_with_fake().await;
    let base = spawn_test_server(service, ServerConfig::default()).await;

    let resp = reqwest::get(format!("{}/api/snapshots/google/unknown", base))
        .await
        .unwrap();
    let content_type = resp.headers().get("content-type").unwrap().to_str().unwrap();
    assert!(content_type.contains("application/json"));
    let body: Value = resp.json().await.unwrap();
    assert!(body["error"].as_str().unwrap().contains("unknown"));
}

#[tokio::test]
async fn unknown_route_returns_404() {
    let (service, _fake) = service_with_fake().await;
    let base = spawn_test_server(service, ServerConfig::default()).await;

    let resp = reqwest::get(format!("{}/api/nonexistent", base))
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
}
