use marco_storage::{BackupPayload, LocalStore, Record};
use pretty_assertions::assert_eq;
use serde_json::json;
use std::path::Path;
use std::process::{Command, Output};

fn record(value: serde_json::Value) -> Record {
    value.as_object().unwrap().clone()
}

fn marco_backup(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_marco-backup"))
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .unwrap()
}

fn seed(path: &Path) {
    let store = LocalStore::open(path).unwrap();
    store
        .profiles()
        .set("p1", record(json!({"name": "Ana", "updatedAt": 200})))
        .unwrap();
    store
        .settings()
        .set("theme", record(json!({"value": "dark"})))
        .unwrap();
    store.close().unwrap();
}

#[test]
fn export_then_import_into_fresh_database() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("source.db");
    let target = dir.path().join("target.db");
    let backup = dir.path().join("backup.json");
    seed(&source);

    let out = marco_backup(&[
        "export",
        "--db",
        source.to_str().unwrap(),
        "--out",
        backup.to_str().unwrap(),
    ]);
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));

    let payload = BackupPayload::from_json(&std::fs::read_to_string(&backup).unwrap()).unwrap();
    assert_eq!(payload.data.len(), 2);

    let out = marco_backup(&[
        "import",
        "--db",
        target.to_str().unwrap(),
        backup.to_str().unwrap(),
        "--merge",
        "overwrite",
    ]);
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));
    assert!(String::from_utf8_lossy(&out.stdout).contains("profiles: 1 written"));

    let store = LocalStore::open(&target).unwrap();
    let profile = store.profiles().get("p1").unwrap().unwrap();
    assert_eq!(profile["name"], json!("Ana"));
    assert!(store.settings().get("theme").unwrap().is_some());
}

#[test]
fn export_to_stdout_is_a_backup_document() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("source.db");
    seed(&source);

    let out = marco_backup(&["export", "--db", source.to_str().unwrap()]);
    assert!(out.status.success());
    let payload = BackupPayload::from_json(&String::from_utf8(out.stdout).unwrap()).unwrap();
    assert_eq!(payload.data.profiles.len(), 1);
}

#[test]
fn keep_newer_is_the_default() {
    let dir = tempfile::tempdir().unwrap();
    let target = dir.path().join("target.db");
    seed(&target);

    let backup = dir.path().join("old.json");
    std::fs::write(
        &backup,
        json!({
            "version": 1,
            "exportedAt": "2024-01-01T00:00:00Z",
            "data": { "profiles": [{"id": "p1", "name": "Old", "updatedAt": 100}] }
        })
        .to_string(),
    )
    .unwrap();

    let out = marco_backup(&[
        "import",
        "--db",
        target.to_str().unwrap(),
        backup.to_str().unwrap(),
    ]);
    assert!(out.status.success());

    let store = LocalStore::open(&target).unwrap();
    let profile = store.profiles().get("p1").unwrap().unwrap();
    assert_eq!(profile["name"], json!("Ana"));
}

#[test]
fn unreadable_backup_fails() {
    let dir = tempfile::tempdir().unwrap();
    let target = dir.path().join("target.db");
    let backup = dir.path().join("bad.json");
    std::fs::write(&backup, "not a backup").unwrap();

    let out = marco_backup(&[
        "import",
        "--db",
        target.to_str().unwrap(),
        backup.to_str().unwrap(),
    ]);
    assert!(!out.status.success());
}

#[test]
fn unknown_merge_strategy_is_rejected() {
    let out = marco_backup(&["import", "--db", "x.db", "y.json", "--merge", "newest"]);
    assert!(!out.status.success());
}
