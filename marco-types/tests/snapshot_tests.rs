use marco_types::{
    ProviderToken, SnapshotEnvelope, SnapshotId, SnapshotInput, SnapshotMeta, SnapshotRecord,
    SyncProvider,
};
use pretty_assertions::assert_eq;
use serde_json::json;

fn envelope() -> SnapshotEnvelope {
    SnapshotEnvelope {
        ciphertext: "Y2lwaGVy".to_string(),
        iv: "aXY".to_string(),
        salt: "c2FsdA".to_string(),
        iterations: 310_000,
    }
}

// ── Envelope ────────────────────────────────────────────────────

#[test]
fn envelope_size_counts_ciphertext_and_iv() {
    assert_eq!(envelope().encoded_size(), 11);
}

#[test]
fn envelope_uses_plain_field_names() {
    let value = serde_json::to_value(envelope()).unwrap();
    assert_eq!(
        value,
        json!({ "ciphertext": "Y2lwaGVy", "iv": "aXY", "salt": "c2FsdA", "iterations": 310000 })
    );
}

// ── Input / record ──────────────────────────────────────────────

#[test]
fn input_deserializes_from_camel_case_body() {
    let body = json!({
        "provider": "google",
        "projectId": "evt-1",
        "deviceId": "dev_abc",
        "hash": "h1",
        "updatedAt": 1000,
        "payload": { "ciphertext": "c", "iv": "i", "salt": "s", "iterations": 1 }
    });
    let input: SnapshotInput = serde_json::from_value(body).unwrap();
    assert_eq!(input.provider, SyncProvider::Google);
    assert_eq!(input.project_id, "evt-1");
    assert_eq!(input.updated_at, 1000.0);
    assert_eq!(input.payload.iterations, 1);
}

#[test]
fn input_keeps_fractional_updated_at() {
    let body = json!({
        "provider": "microsoft",
        "projectId": "evt-1",
        "deviceId": "dev_abc",
        "hash": "h1",
        "updatedAt": 1_700_000_000_000.25,
        "payload": { "ciphertext": "c", "iv": "i", "salt": "s", "iterations": 1 }
    });
    let input: SnapshotInput = serde_json::from_value(body).unwrap();
    assert_eq!(input.updated_at, 1_700_000_000_000.25);
}

#[test]
fn input_rejects_unknown_provider() {
    let body = json!({
        "provider": "dropbox",
        "projectId": "evt-1",
        "deviceId": "d",
        "hash": "h",
        "updatedAt": 1,
        "payload": { "ciphertext": "c", "iv": "i", "salt": "s", "iterations": 1 }
    });
    assert!(serde_json::from_value::<SnapshotInput>(body).is_err());
}

#[test]
fn input_from_record_keeps_client_fields() {
    let record = SnapshotRecord {
        id: SnapshotId::from("file-1"),
        payload: envelope(),
        meta: SnapshotMeta {
            provider: SyncProvider::Microsoft,
            project_id: "evt-9".to_string(),
            device_id: "dev_x".to_string(),
            hash: "abc".to_string(),
            updated_at: 42.0,
            size: 11,
        },
        created_at: 1,
        updated_at: 2,
    };
    let input = SnapshotInput::from(&record);
    assert_eq!(input.provider, SyncProvider::Microsoft);
    assert_eq!(input.project_id, "evt-9");
    assert_eq!(input.device_id, "dev_x");
    assert_eq!(input.updated_at, 42.0);
    assert_eq!(input.payload, record.payload);
    assert_eq!(record.key(), (SyncProvider::Microsoft, "evt-9"));
}

#[test]
fn record_serializes_meta_in_camel_case() {
    let record = SnapshotRecord {
        id: SnapshotId::from("id-1"),
        payload: envelope(),
        meta: SnapshotMeta {
            provider: SyncProvider::Google,
            project_id: "p".to_string(),
            device_id: "d".to_string(),
            hash: "h".to_string(),
            updated_at: 5.5,
            size: 11,
        },
        created_at: 10,
        updated_at: 20,
    };
    let value = serde_json::to_value(&record).unwrap();
    assert_eq!(value["id"], "id-1");
    assert_eq!(value["meta"]["projectId"], "p");
    assert_eq!(value["meta"]["deviceId"], "d");
    assert_eq!(value["meta"]["updatedAt"], json!(5.5));
    assert_eq!(value["createdAt"], 10);
    assert_eq!(value["updatedAt"], 20);
}

// ── Ids ─────────────────────────────────────────────────────────

#[test]
fn generated_ids_are_unique() {
    let a = SnapshotId::generate();
    let b = SnapshotId::generate();
    assert_ne!(a, b);
    assert_eq!(a.as_str().len(), 36);
}

// ── Tokens ──────────────────────────────────────────────────────

#[test]
fn token_optional_fields_are_omitted() {
    let value = serde_json::to_value(ProviderToken::bearer("abc")).unwrap();
    assert_eq!(value, json!({ "accessToken": "abc" }));
}

#[test]
fn token_debug_redacts_secrets() {
    let token = ProviderToken {
        access_token: "secret-access".to_string(),
        refresh_token: Some("secret-refresh".to_string()),
        expires_at: Some(5),
    };
    let debug = format!("{token:?}");
    assert!(!debug.contains("secret-access"));
    assert!(!debug.contains("secret-refresh"));
    assert!(debug.contains("REDACTED"));
}

#[test]
fn token_expiry() {
    let token = ProviderToken {
        expires_at: Some(1_000),
        ..ProviderToken::bearer("t")
    };
    assert!(!token.is_expired_at(999));
    assert!(token.is_expired_at(1_000));
    assert!(!ProviderToken::bearer("t").is_expired_at(i64::MAX));
}
