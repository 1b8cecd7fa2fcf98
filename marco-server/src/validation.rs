//! Request validation at the API boundary.
//!
//! Everything here runs before the store is touched; a rejected request
//! never reaches [`SnapshotStore`](crate::SnapshotStore).

use crate::error::{ServiceError, ServiceResult};
use marco_types::{ProviderToken, SnapshotInput, SyncProvider};

/// Parses a provider name as it appears in paths and bodies.
pub fn parse_provider(raw: &str) -> ServiceResult<SyncProvider> {
    raw.parse()
        .map_err(|_| ServiceError::UnknownProvider(raw.to_string()))
}

fn require(field: &str, value: &str) -> ServiceResult<()> {
    if value.trim().is_empty() {
        return Err(ServiceError::InvalidInput(format!("{field} must not be empty")));
    }
    Ok(())
}

/// Checks a pushed snapshot for missing fields and a usable `updatedAt`.
///
/// The timestamp is kept as sent, fractions included; only NaN and the
/// infinities are refused.
pub fn validate_snapshot_input(input: &SnapshotInput) -> ServiceResult<()> {
    require("projectId", &input.project_id)?;
    require("deviceId", &input.device_id)?;
    require("hash", &input.hash)?;
    require("payload.ciphertext", &input.payload.ciphertext)?;
    require("payload.iv", &input.payload.iv)?;
    require("payload.salt", &input.payload.salt)?;
    if input.payload.iterations == 0 {
        return Err(ServiceError::InvalidInput(
            "payload.iterations must be positive".to_string(),
        ));
    }
    if !input.updated_at.is_finite() {
        return Err(ServiceError::InvalidInput(
            "updatedAt must be a finite number".to_string(),
        ));
    }
    Ok(())
}

pub fn validate_token(token: &ProviderToken) -> ServiceResult<()> {
    require("accessToken", &token.access_token)
}
