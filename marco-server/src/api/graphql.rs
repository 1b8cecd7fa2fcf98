//! GraphQL schema over the snapshot service.
//!
//! Timestamps are exposed as `Float` epoch millis, the shape browser
//! clients read and write with `Date.now()`.

use crate::error::ServiceError;
use crate::service::SnapshotService;
use async_graphql::http::GraphiQLSource;
use async_graphql::{
    Context, EmptySubscription, Enum, ErrorExtensions, InputObject, Object, Schema, SimpleObject, ID,
};
use axum::response::{Html, IntoResponse};
use marco_types::{SnapshotEnvelope, SnapshotInput, SnapshotRecord, SyncProvider};
use std::sync::Arc;

/// Schema type served on `/graphql`.
pub type SnapshotSchema = Schema<QueryRoot, MutationRoot, EmptySubscription>;

#[derive(Enum, Copy, Clone, Debug, Eq, PartialEq)]
#[graphql(name = "SyncProvider", rename_items = "lowercase")]
pub enum GqlSyncProvider {
    Google,
    Microsoft,
}

impl From<GqlSyncProvider> for SyncProvider {
    fn from(value: GqlSyncProvider) -> Self {
        match value {
            GqlSyncProvider::Google => SyncProvider::Google,
            GqlSyncProvider::Microsoft => SyncProvider::Microsoft,
        }
    }
}

impl From<SyncProvider> for GqlSyncProvider {
    fn from(value: SyncProvider) -> Self {
        match value {
            SyncProvider::Google => GqlSyncProvider::Google,
            SyncProvider::Microsoft => GqlSyncProvider::Microsoft,
        }
    }
}

#[derive(SimpleObject, Clone, Debug)]
#[graphql(name = "SnapshotPayload")]
pub struct GqlSnapshotPayload {
    pub ciphertext: String,
    pub iv: String,
    pub salt: String,
    pub iterations: u32,
}

impl From<SnapshotEnvelope> for GqlSnapshotPayload {
    fn from(value: SnapshotEnvelope) -> Self {
        Self {
            ciphertext: value.ciphertext,
            iv: value.iv,
            salt: value.salt,
            iterations: value.iterations,
        }
    }
}

#[derive(SimpleObject, Clone, Debug)]
#[graphql(name = "SnapshotMeta")]
pub struct GqlSnapshotMeta {
    pub provider: GqlSyncProvider,
    pub project_id: String,
    pub device_id: String,
    pub hash: String,
    pub updated_at: f64,
    pub size: u64,
}

#[derive(SimpleObject, Clone, Debug)]
#[graphql(name = "Snapshot")]
pub struct GqlSnapshot {
    pub id: ID,
    pub meta: GqlSnapshotMeta,
    pub payload: GqlSnapshotPayload,
    pub created_at: f64,
    pub updated_at: f64,
}

#[derive(SimpleObject, Clone, Debug)]
#[graphql(name = "SnapshotResult")]
pub struct GqlSnapshotResult {
    pub meta: GqlSnapshotMeta,
    pub payload: GqlSnapshotPayload,
}

impl From<SnapshotRecord> for GqlSnapshot {
    fn from(record: SnapshotRecord) -> Self {
        let meta = GqlSnapshotMeta {
            provider: record.meta.provider.into(),
            project_id: record.meta.project_id,
            device_id: record.meta.device_id,
            hash: record.meta.hash,
            updated_at: record.meta.updated_at,
            size: record.meta.size,
        };
        Self {
            id: ID(record.id.into_inner()),
            meta,
            payload: record.payload.into(),
            created_at: record.created_at as f64,
            updated_at: record.updated_at as f64,
        }
    }
}

impl From<SnapshotRecord> for GqlSnapshotResult {
    fn from(record: SnapshotRecord) -> Self {
        let snapshot = GqlSnapshot::from(record);
        Self {
            meta: snapshot.meta,
            payload: snapshot.payload,
        }
    }
}

#[derive(InputObject, Clone, Debug)]
#[graphql(name = "SnapshotPayloadInput")]
pub struct GqlSnapshotPayloadInput {
    pub ciphertext: String,
    pub iv: String,
    pub salt: String,
    pub iterations: u32,
}

#[derive(InputObject, Clone, Debug)]
#[graphql(name = "SnapshotInput")]
pub struct GqlSnapshotInput {
    pub provider: GqlSyncProvider,
    pub project_id: String,
    pub device_id: String,
    pub hash: String,
    pub updated_at: f64,
    pub payload: GqlSnapshotPayloadInput,
}

impl From<GqlSnapshotInput> for SnapshotInput {
    fn from(input: GqlSnapshotInput) -> Self {
        Self {
            provider: input.provider.into(),
            project_id: input.project_id,
            device_id: input.device_id,
            hash: input.hash,
            updated_at: input.updated_at,
            payload: SnapshotEnvelope {
                ciphertext: input.payload.ciphertext,
                iv: input.payload.iv,
                salt: input.payload.salt,
                iterations: input.payload.iterations,
            },
        }
    }
}

/// Carries the HTTP-equivalent status in the `code` extension.
fn to_gql_error(err: ServiceError) -> async_graphql::Error {
    let code = err.status_code().as_u16();
    async_graphql::Error::new(err.to_string()).extend_with(|_, ext| ext.set("code", code))
}

fn service<'a>(ctx: &Context<'a>) -> async_graphql::Result<&'a Arc<SnapshotService>> {
    ctx.data::<Arc<SnapshotService>>()
}

pub struct QueryRoot;

#[Object]
impl QueryRoot {
    /// Latest snapshot for a project, pulled from the provider on a cache miss.
    async fn snapshot(
        &self,
        ctx: &Context<'_>,
        provider: GqlSyncProvider,
        project_id: String,
    ) -> async_graphql::Result<Option<GqlSnapshotResult>> {
        let record = service(ctx)?
            .fetch(provider.into(), &project_id)
            .await
            .map_err(to_gql_error)?;
        Ok(record.map(Into::into))
    }

    /// Cached snapshots, optionally for one provider.
    async fn snapshots(
        &self,
        ctx: &Context<'_>,
        provider: Option<GqlSyncProvider>,
    ) -> async_graphql::Result<Vec<GqlSnapshot>> {
        let records = service(ctx)?.list(provider.map(Into::into)).await;
        Ok(records.into_iter().map(Into::into).collect())
    }
}

pub struct MutationRoot;

#[Object]
impl MutationRoot {
    async fn push_snapshot(
        &self,
        ctx: &Context<'_>,
        input: GqlSnapshotInput,
    ) -> async_graphql::Result<GqlSnapshot> {
        let input = SnapshotInput::from(input);
        let record = service(ctx)?.push(input).await.map_err(to_gql_error)?;
        Ok(record.into())
    }
}

pub fn build_schema(service: Arc<SnapshotService>) -> SnapshotSchema {
    Schema::build(QueryRoot, MutationRoot, EmptySubscription)
        .data(service)
        .finish()
}

pub async fn graphiql() -> impl IntoResponse {
    Html(GraphiQLSource::build().endpoint("/graphql").finish())
}
