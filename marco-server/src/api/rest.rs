//! REST routes under `/api`.

use crate::error::{ServiceError, ServiceResult};
use crate::service::SnapshotService;
use crate::validation::parse_provider;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Json;
use axum::routing::{get, post, put};
use axum::Router;
use marco_types::{ProviderToken, SnapshotEnvelope, SnapshotInput, SnapshotMeta, SnapshotRecord};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Body of a successful push.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PushResponse {
    pub meta: SnapshotMeta,
}

/// Body of a successful fetch.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SnapshotResponse {
    pub meta: SnapshotMeta,
    pub payload: SnapshotEnvelope,
}

impl From<SnapshotRecord> for SnapshotResponse {
    fn from(record: SnapshotRecord) -> Self {
        Self {
            meta: record.meta,
            payload: record.payload,
        }
    }
}

fn body<T>(payload: Result<Json<T>, JsonRejection>) -> ServiceResult<T> {
    match payload {
        Ok(Json(value)) => Ok(value),
        Err(rejection) if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE => {
            Err(ServiceError::PayloadTooLarge)
        }
        Err(rejection) => Err(ServiceError::InvalidInput(rejection.body_text())),
    }
}

async fn register_token(
    State(service): State<Arc<SnapshotService>>,
    Path(provider): Path<String>,
    payload: Result<Json<ProviderToken>, JsonRejection>,
) -> ServiceResult<StatusCode> {
    let provider = parse_provider(&provider)?;
    let token = body(payload)?;
    service.register_token(provider, token).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn push_snapshot(
    State(service): State<Arc<SnapshotService>>,
    payload: Result<Json<SnapshotInput>, JsonRejection>,
) -> ServiceResult<(StatusCode, Json<PushResponse>)> {
    let input = body(payload)?;
    let record = service.push(input).await?;
    Ok((
        StatusCode::CREATED,
        Json(PushResponse { meta: record.meta }),
    ))
}

async fn get_snapshot(
    State(service): State<Arc<SnapshotService>>,
    Path((provider, project_id)): Path<(String, String)>,
) -> ServiceResult<Json<SnapshotResponse>> {
    let provider = parse_provider(&provider)?;
    let record = service.fetch_required(provider, &project_id).await?;
    Ok(Json(record.into()))
}

/// Routes relative to the `/api` prefix.
pub fn routes() -> Router<Arc<SnapshotService>> {
    Router::new()
        .route("/providers/{provider}/token", put(register_token))
        .route("/snapshots", post(push_snapshot))
        .route("/snapshots/{provider}/{project_id}", get(get_snapshot))
}
