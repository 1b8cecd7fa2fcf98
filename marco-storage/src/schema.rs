//! Fixed schema of the local database.
//!
//! Collections and their secondary indexes are defined here and nowhere
//! else. Adding a collection or index means bumping [`SCHEMA_VERSION`] and
//! adding a step to [`upgrade`].

use crate::error::StorageResult;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, info};

/// Logical name of the local database.
pub const DB_NAME: &str = "appbase_db";

/// File name used when the database lives in a directory.
pub const DB_FILE_NAME: &str = "appbase_db.sqlite3";

/// Current schema version, stored in `PRAGMA user_version`.
pub const SCHEMA_VERSION: u32 = 1;

/// A secondary index over one top-level field of a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexDef {
    pub name: &'static str,
    pub field: &'static str,
}

const PROFILE_INDEXES: &[IndexDef] = &[IndexDef {
    name: "byUpdatedAt",
    field: "updatedAt",
}];

const TELEMETRY_INDEXES: &[IndexDef] = &[IndexDef {
    name: "byTs",
    field: "ts",
}];

/// A named collection in the local database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Collection {
    Profiles,
    Settings,
    Telemetry,
}

impl Collection {
    /// Every collection, in import/export order.
    pub const ALL: [Collection; 3] = [
        Collection::Profiles,
        Collection::Settings,
        Collection::Telemetry,
    ];

    /// Table name of the collection.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Profiles => "profiles",
            Self::Settings => "settings",
            Self::Telemetry => "telemetry",
        }
    }

    /// Record field holding the primary key.
    #[must_use]
    pub const fn key_field(&self) -> &'static str {
        match self {
            Self::Profiles | Self::Telemetry => "id",
            Self::Settings => "key",
        }
    }

    /// Secondary indexes defined on the collection.
    #[must_use]
    pub const fn indexes(&self) -> &'static [IndexDef] {
        match self {
            Self::Profiles => PROFILE_INDEXES,
            Self::Settings => &[],
            Self::Telemetry => TELEMETRY_INDEXES,
        }
    }

    /// Looks up a secondary index by name.
    #[must_use]
    pub fn index(&self, name: &str) -> Option<&'static IndexDef> {
        self.indexes().iter().find(|idx| idx.name == name)
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Brings the database up to [`SCHEMA_VERSION`].
///
/// Returns the version the database was upgraded from, or `None` when it
/// was already current and nothing ran.
pub(crate) fn upgrade(conn: &Connection) -> StorageResult<Option<u32>> {
    let current: u32 = conn.pragma_query_value(None, "user_version", |row| row.get(0))?;
    if current >= SCHEMA_VERSION {
        debug!("Local store schema at version {}", current);
        return Ok(None);
    }

    let tx = conn.unchecked_transaction()?;
    if current < 1 {
        tx.execute_batch(&v1_ddl())?;
    }
    tx.pragma_update(None, "user_version", SCHEMA_VERSION)?;
    tx.commit()?;

    info!(
        "Upgraded local store schema from version {} to {}",
        current, SCHEMA_VERSION
    );
    Ok(Some(current))
}

fn v1_ddl() -> String {
    let mut ddl = String::new();
    for collection in Collection::ALL {
        let table = collection.name();
        ddl.push_str(&format!(
            "CREATE TABLE IF NOT EXISTS {table} (\n    key TEXT PRIMARY KEY NOT NULL,\n    value TEXT NOT NULL\n);\n"
        ));
        for index in collection.indexes() {
            ddl.push_str(&format!(
                "CREATE INDEX IF NOT EXISTS {table}_{name} ON {table} (json_extract(value, '$.{field}'));\n",
                name = index.name,
                field = index.field,
            ));
        }
    }
    ddl
}
