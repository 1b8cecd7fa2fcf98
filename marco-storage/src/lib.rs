//! SQLite storage layer for Marco.
//!
//! Provides the local-first half of snapshot sync:
//!
//! - [`LocalStore`]: a fixed-schema keyed store with three collections
//!   (`profiles`, `settings`, `telemetry`), each exposing get/set/delete and
//!   ordered listing over its primary key or a secondary index.
//! - [`backup`]: export of every collection into a portable
//!   [`BackupPayload`] and a record-by-record merge back into a store.
//!
//! # Architecture
//!
//! - Records are JSON objects stored as text, keyed by the collection's key
//!   field (`id` or `key`)
//! - Secondary indexes are SQLite expression indexes over the JSON field
//! - The schema version lives in `PRAGMA user_version`; one-time setup runs
//!   only when the stored version is behind
//! - A [`LocalStore`] owns its connection; dropping or [`LocalStore::close`]-ing
//!   it releases the database on every exit path

pub mod backup;
mod error;
mod schema;
mod store;

pub use backup::{
    export_backup, import_backup, record_timestamp, BackupData, BackupEngine, BackupPayload,
    CollectionFailure, ImportSummary, MergeStats, MergeStrategy, BACKUP_VERSION, TIMESTAMP_FIELDS,
};
pub use error::{StorageError, StorageResult};
pub use schema::{Collection, IndexDef, DB_FILE_NAME, DB_NAME, SCHEMA_VERSION};
pub use store::{KeyedCollection, ListOptions, LocalStore, Record};
