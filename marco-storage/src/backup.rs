//! Export and merge-import of the whole local store.
//!
//! Import merges record by record and has no rollback. A failure in one
//! collection is recorded and the remaining collections are still merged;
//! the caller then receives [`StorageError::PartialImport`] with everything
//! that was applied.

use crate::error::{StorageError, StorageResult};
use crate::schema::Collection;
use crate::store::{LocalStore, Record};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use marco_types::{millis_to_rfc3339, now_millis};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{info, warn};

/// Version stamped into every exported payload.
pub const BACKUP_VERSION: u32 = 1;

/// Fields consulted, in order, when comparing record timestamps.
pub const TIMESTAMP_FIELDS: [&str; 3] = ["updatedAt", "ts", "timestamp"];

/// Records of every collection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BackupData {
    #[serde(default)]
    pub profiles: Vec<Record>,
    #[serde(default)]
    pub settings: Vec<Record>,
    #[serde(default)]
    pub telemetry: Vec<Record>,
}

impl BackupData {
    /// Records belonging to one collection.
    pub fn records(&self, collection: Collection) -> &[Record] {
        match collection {
            Collection::Profiles => &self.profiles,
            Collection::Settings => &self.settings,
            Collection::Telemetry => &self.telemetry,
        }
    }

    fn records_mut(&mut self, collection: Collection) -> &mut Vec<Record> {
        match collection {
            Collection::Profiles => &mut self.profiles,
            Collection::Settings => &mut self.settings,
            Collection::Telemetry => &mut self.telemetry,
        }
    }

    /// Total number of records across collections.
    pub fn len(&self) -> usize {
        self.profiles.len() + self.settings.len() + self.telemetry.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A full point-in-time export of the local store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupPayload {
    pub version: u32,
    /// RFC 3339 export time.
    pub exported_at: String,
    pub data: BackupData,
}

impl BackupPayload {
    /// Parses a backup document.
    pub fn from_json(json: &str) -> StorageResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serializes the payload as indented JSON.
    pub fn to_json_pretty(&self) -> StorageResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// How an incoming record is reconciled with an existing one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MergeStrategy {
    /// Write the incoming record only if its timestamp is not older.
    #[default]
    KeepNewer,
    /// Always write the incoming record.
    Overwrite,
}

impl MergeStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::KeepNewer => "keep-newer",
            Self::Overwrite => "overwrite",
        }
    }
}

impl fmt::Display for MergeStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MergeStrategy {
    type Err = StorageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "keep-newer" => Ok(Self::KeepNewer),
            "overwrite" => Ok(Self::Overwrite),
            other => Err(StorageError::InvalidData(format!(
                "unknown merge strategy: {other}"
            ))),
        }
    }
}

/// Per-collection import counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MergeStats {
    pub written: usize,
    pub kept_existing: usize,
    pub skipped_without_key: usize,
}

/// Outcome of an import, per collection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    pub profiles: MergeStats,
    pub settings: MergeStats,
    pub telemetry: MergeStats,
}

impl ImportSummary {
    pub fn get(&self, collection: Collection) -> &MergeStats {
        match collection {
            Collection::Profiles => &self.profiles,
            Collection::Settings => &self.settings,
            Collection::Telemetry => &self.telemetry,
        }
    }

    pub fn get_mut(&mut self, collection: Collection) -> &mut MergeStats {
        match collection {
            Collection::Profiles => &mut self.profiles,
            Collection::Settings => &mut self.settings,
            Collection::Telemetry => &mut self.telemetry,
        }
    }

    /// Records written across all collections.
    pub fn total_written(&self) -> usize {
        Collection::ALL.iter().map(|c| self.get(*c).written).sum()
    }
}

impl fmt::Display for ImportSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, collection) in Collection::ALL.iter().enumerate() {
            let stats = self.get(*collection);
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(
                f,
                "{collection}: {} written, {} kept, {} without key",
                stats.written, stats.kept_existing, stats.skipped_without_key
            )?;
        }
        Ok(())
    }
}

/// A collection whose import stopped on an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CollectionFailure {
    pub collection: Collection,
    pub message: String,
}

impl fmt::Display for CollectionFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.collection, self.message)
    }
}

/// Best-effort timestamp of a record in epoch milliseconds.
///
/// Returns the first value among [`TIMESTAMP_FIELDS`] that is a number or a
/// parseable date string; `0.0` when none is. Numbers keep their fraction.
pub fn record_timestamp(record: &Record) -> f64 {
    TIMESTAMP_FIELDS
        .iter()
        .find_map(|field| record.get(*field).and_then(parse_timestamp))
        .unwrap_or(0.0)
}

fn parse_timestamp(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64().filter(|f| f.is_finite()),
        Value::String(s) => parse_date_string(s.trim()).map(|millis| millis as f64),
        _ => None,
    }
}

fn parse_date_string(s: &str) -> Option<i64> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.timestamp_millis());
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(naive.and_utc().timestamp_millis());
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc().timestamp_millis())
}

/// Reads every collection into a payload stamped with the current time.
pub fn export_backup(store: &LocalStore) -> StorageResult<BackupPayload> {
    let mut data = BackupData::default();
    for collection in Collection::ALL {
        *data.records_mut(collection) = store
            .collection(collection)
            .list(&Default::default())?;
    }

    info!(
        "Exported backup: {} profiles, {} settings, {} telemetry events",
        data.profiles.len(),
        data.settings.len(),
        data.telemetry.len()
    );

    Ok(BackupPayload {
        version: BACKUP_VERSION,
        exported_at: millis_to_rfc3339(now_millis()),
        data,
    })
}

/// Merges a payload into the store.
///
/// Every collection is attempted. If any fails, the records merged so far
/// stay written and the error carries the summary of what was applied.
pub fn import_backup(
    store: &LocalStore,
    payload: &BackupPayload,
    strategy: MergeStrategy,
) -> StorageResult<ImportSummary> {
    if payload.version > BACKUP_VERSION {
        warn!(
            "Importing backup version {} newer than supported version {}",
            payload.version, BACKUP_VERSION
        );
    }

    let mut summary = ImportSummary::default();
    let mut failures = Vec::new();

    for collection in Collection::ALL {
        let stats = summary.get_mut(collection);
        if let Err(e) = merge_collection(
            store,
            collection,
            payload.data.records(collection),
            strategy,
            stats,
        ) {
            warn!("Import of {} failed: {}", collection, e);
            failures.push(CollectionFailure {
                collection,
                message: e.to_string(),
            });
        }
    }

    info!("Imported backup ({}): {}", strategy, summary);

    if failures.is_empty() {
        Ok(summary)
    } else {
        Err(StorageError::PartialImport { summary, failures })
    }
}

fn merge_collection(
    store: &LocalStore,
    collection: Collection,
    incoming: &[Record],
    strategy: MergeStrategy,
    stats: &mut MergeStats,
) -> StorageResult<()> {
    let kv = store.collection(collection);
    let key_field = collection.key_field();

    for record in incoming {
        let key = match record.get(key_field) {
            Some(Value::String(key)) if !key.is_empty() => key,
            _ => {
                stats.skipped_without_key += 1;
                continue;
            }
        };

        let write = match (strategy, kv.get(key)?) {
            (MergeStrategy::Overwrite, _) | (_, None) => true,
            (MergeStrategy::KeepNewer, Some(existing)) => {
                record_timestamp(record) >= record_timestamp(&existing)
            }
        };

        if write {
            kv.set(key, record.clone())?;
            stats.written += 1;
        } else {
            stats.kept_existing += 1;
        }
    }
    Ok(())
}

/// Export/import against a database file, opening and closing the store
/// around each operation.
#[derive(Debug, Clone)]
pub struct BackupEngine {
    path: PathBuf,
}

impl BackupEngine {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Exports every collection of the database.
    pub fn export(&self) -> StorageResult<BackupPayload> {
        self.with_store(export_backup)
    }

    /// Imports a payload into the database.
    pub fn import(
        &self,
        payload: &BackupPayload,
        strategy: MergeStrategy,
    ) -> StorageResult<ImportSummary> {
        self.with_store(|store| import_backup(store, payload, strategy))
    }

    // The store is closed on every path; an operation error wins over a
    // close error.
    fn with_store<T>(
        &self,
        op: impl FnOnce(&LocalStore) -> StorageResult<T>,
    ) -> StorageResult<T> {
        let store = LocalStore::open(&self.path)?;
        let result = op(&store);
        let closed = store.close();
        let value = result?;
        closed?;
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> Record {
        match value {
            Value::Object(map) => map,
            _ => panic!("not an object"),
        }
    }

    #[test]
    fn timestamp_prefers_updated_at() {
        let r = record(json!({"updatedAt": 5, "ts": 9, "timestamp": 12}));
        assert_eq!(record_timestamp(&r), 5.0);
    }

    #[test]
    fn timestamp_skips_unparseable_fields() {
        let r = record(json!({"updatedAt": "soon", "ts": 9}));
        assert_eq!(record_timestamp(&r), 9.0);
    }

    #[test]
    fn timestamp_parses_date_strings() {
        let r = record(json!({"timestamp": "1970-01-01T00:00:02Z"}));
        assert_eq!(record_timestamp(&r), 2_000.0);
        let r = record(json!({"timestamp": "1970-01-02"}));
        assert_eq!(record_timestamp(&r), 86_400_000.0);
        let r = record(json!({"timestamp": "1970-01-01T00:00:01.5"}));
        assert_eq!(record_timestamp(&r), 1_500.0);
    }

    #[test]
    fn timestamp_keeps_fractional_numbers() {
        let r = record(json!({"ts": 12.9}));
        assert_eq!(record_timestamp(&r), 12.9);
        let r = record(json!({"updatedAt": 1_700_000_000_000.25}));
        assert!(record_timestamp(&r) > 1_700_000_000_000.0);
    }

    #[test]
    fn timestamp_absent_is_zero() {
        assert_eq!(record_timestamp(&record(json!({"id": "a"}))), 0.0);
        assert_eq!(record_timestamp(&record(json!({"updatedAt": null}))), 0.0);
        assert_eq!(record_timestamp(&record(json!({"ts": true}))), 0.0);
    }

    #[test]
    fn merge_strategy_parses_kebab_case() {
        assert_eq!("keep-newer".parse::<MergeStrategy>().unwrap(), MergeStrategy::KeepNewer);
        assert_eq!("overwrite".parse::<MergeStrategy>().unwrap(), MergeStrategy::Overwrite);
        assert!("newest".parse::<MergeStrategy>().is_err());
        assert_eq!(
            serde_json::to_string(&MergeStrategy::KeepNewer).unwrap(),
            "\"keep-newer\""
        );
    }
}
