#![allow(dead_code)]

use async_trait::async_trait;
use marco_cloud::{CloudError, CloudResult, ProviderClient, ProviderRegistry};
use marco_types::{
    ProviderToken, SnapshotEnvelope, SnapshotInput, SnapshotMeta, SnapshotRecord, SyncProvider,
};
use marco_server::{build_router, ServerConfig, SnapshotService};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// In-memory stand-in for a provider drive that counts every call.
#[derive(Default)]
pub struct FakeProvider {
    pub pushes: AtomicUsize,
    pub pulls: AtomicUsize,
    pub fail: AtomicBool,
    pub remote: Mutex<HashMap<String, SnapshotRecord>>,
}

impl FakeProvider {
    pub fn pushes(&self) -> usize {
        self.pushes.load(Ordering::SeqCst)
    }

    pub fn pulls(&self) -> usize {
        self.pulls.load(Ordering::SeqCst)
    }

    pub fn fail_calls(&self) {
        self.fail.store(true, Ordering::SeqCst);
    }

    fn failure(&self, operation: &'static str) -> CloudResult<()> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(CloudError::Api {
                provider: SyncProvider::Google,
                operation,
                status: 503,
                body: "unavailable".to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl ProviderClient for FakeProvider {
    fn provider(&self) -> SyncProvider {
        SyncProvider::Google
    }

    async fn push(&self, record: &SnapshotRecord, _token: &ProviderToken) -> CloudResult<()> {
        self.pushes.fetch_add(1, Ordering::SeqCst);
        self.failure("upload")?;
        self.remote
            .lock()
            .unwrap()
            .insert(record.meta.project_id.clone(), record.clone());
        Ok(())
    }

    async fn pull(
        &self,
        project_id: &str,
        _token: &ProviderToken,
    ) -> CloudResult<Option<SnapshotRecord>> {
        self.pulls.fetch_add(1, Ordering::SeqCst);
        self.failure("search")?;
        Ok(self.remote.lock().unwrap().get(project_id).cloned())
    }
}

/// A service wired to one fake Google adapter, with a token registered.
pub async fn service_with_fake() -> (Arc<SnapshotService>, Arc<FakeProvider>) {
    let fake = Arc::new(FakeProvider::default());
    let registry = ProviderRegistry::new().with_client(fake.clone());
    let service = Arc::new(SnapshotService::new(registry));
    service
        .register_token(SyncProvider::Google, ProviderToken::bearer("tok"))
        .await
        .unwrap();
    (service, fake)
}

pub fn envelope(tag: &str) -> SnapshotEnvelope {
    SnapshotEnvelope {
        ciphertext: format!("cipher-{tag}"),
        iv: "aXYtaXYtaXYt".to_string(),
        salt: "c2FsdA".to_string(),
        iterations: 1_000,
    }
}

pub fn input(provider: SyncProvider, project_id: &str, updated_at: i64) -> SnapshotInput {
    SnapshotInput {
        provider,
        project_id: project_id.to_string(),
        device_id: "dev_test0001".to_string(),
        hash: format!("hash-{updated_at}"),
        updated_at: updated_at as f64,
        payload: envelope(&updated_at.to_string()),
    }
}

pub fn remote_record(project_id: &str, updated_at: i64) -> SnapshotRecord {
    SnapshotRecord {
        id: "drive-file-1".into(),
        payload: envelope("remote"),
        meta: SnapshotMeta {
            provider: SyncProvider::Google,
            project_id: project_id.to_string(),
            device_id: "dev_other".to_string(),
            hash: "hash-remote".to_string(),
            updated_at: updated_at as f64,
            size: 42,
        },
        created_at: 1,
        updated_at: 1,
    }
}

/// Spin up the HTTP server on an OS-assigned port, returning the base URL.
pub async fn spawn_test_server(service: Arc<SnapshotService>, config: ServerConfig) -> String {
    let app = build_router(service, &config);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .unwrap();
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://127.0.0.1:{}", port)
}
