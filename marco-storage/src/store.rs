//! Keyed collections over a single SQLite connection.

use crate::error::{StorageError, StorageResult};
use crate::schema::{self, Collection, DB_FILE_NAME};
use rusqlite::{params, Connection, OptionalExtension};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tracing::debug;

/// A stored record: a JSON object holding at least the collection's key field.
pub type Record = serde_json::Map<String, Value>;

/// Options for [`KeyedCollection::list`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListOptions {
    /// Secondary index to iterate; `None` iterates primary-key order.
    pub index: Option<String>,
    /// Maximum number of records to return.
    pub limit: Option<usize>,
    /// Iterate in descending order.
    pub reverse: bool,
}

impl ListOptions {
    /// Lists everything in primary-key order.
    pub fn new() -> Self {
        Self::default()
    }

    /// Iterates the named secondary index.
    pub fn index(mut self, name: impl Into<String>) -> Self {
        self.index = Some(name.into());
        self
    }

    /// Stops after `limit` records.
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Iterates in descending order.
    pub fn reverse(mut self) -> Self {
        self.reverse = true;
        self
    }
}

/// Handle to the local database.
///
/// The handle owns the connection. Dropping it releases the database;
/// [`LocalStore::close`] does the same but reports close errors.
pub struct LocalStore {
    conn: Mutex<Connection>,
    path: Option<PathBuf>,
    upgraded_from: Option<u32>,
}

impl LocalStore {
    /// Opens (or creates) the store at the given file path.
    pub fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        let path = path.as_ref();
        let conn = Connection::open(path)?;
        Self::from_connection(conn, Some(path.to_path_buf()))
    }

    /// Opens the store under `dir` using the fixed database file name.
    pub fn open_in_dir(dir: impl AsRef<Path>) -> StorageResult<Self> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir)?;
        Self::open(dir.join(DB_FILE_NAME))
    }

    /// Opens an in-memory store (for testing).
    pub fn open_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        Self::from_connection(conn, None)
    }

    fn from_connection(conn: Connection, path: Option<PathBuf>) -> StorageResult<Self> {
        conn.busy_timeout(Duration::from_secs(5))?;
        let upgraded_from = schema::upgrade(&conn)?;
        debug!(
            "Opened local store at {}",
            path.as_deref()
                .map_or_else(|| ":memory:".to_string(), |p| p.display().to_string())
        );
        Ok(Self {
            conn: Mutex::new(conn),
            path,
            upgraded_from,
        })
    }

    /// The schema version this open upgraded from, or `None` if the schema
    /// was already current and no setup ran.
    pub fn upgraded_from(&self) -> Option<u32> {
        self.upgraded_from
    }

    /// The database file path, if the store is file-backed.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Returns a handle to one collection.
    pub fn collection(&self, collection: Collection) -> KeyedCollection<'_> {
        KeyedCollection {
            store: self,
            collection,
        }
    }

    pub fn profiles(&self) -> KeyedCollection<'_> {
        self.collection(Collection::Profiles)
    }

    pub fn settings(&self) -> KeyedCollection<'_> {
        self.collection(Collection::Settings)
    }

    pub fn telemetry(&self) -> KeyedCollection<'_> {
        self.collection(Collection::Telemetry)
    }

    /// Closes the connection, surfacing any error SQLite reports.
    pub fn close(self) -> StorageResult<()> {
        let conn = self
            .conn
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner);
        conn.close().map_err(|(_, e)| StorageError::Database(e))
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// One collection of a [`LocalStore`].
#[derive(Clone, Copy)]
pub struct KeyedCollection<'a> {
    store: &'a LocalStore,
    collection: Collection,
}

impl KeyedCollection<'_> {
    /// The collection this handle addresses.
    pub fn collection(&self) -> Collection {
        self.collection
    }

    /// Fetches a record by key.
    pub fn get(&self, key: &str) -> StorageResult<Option<Record>> {
        let conn = self.store.conn();
        let raw: Option<String> = conn
            .query_row(
                &format!("SELECT value FROM {} WHERE key = ?1", self.collection.name()),
                params![key],
                |row| row.get(0),
            )
            .optional()?;
        raw.map(|json| parse_record(&json)).transpose()
    }

    /// Creates or overwrites the record at `key`.
    ///
    /// The collection's key field is set to `key` in the stored value,
    /// whatever the caller put there.
    pub fn set(&self, key: &str, mut value: Record) -> StorageResult<()> {
        value.insert(
            self.collection.key_field().to_string(),
            Value::String(key.to_string()),
        );
        let json = serde_json::to_string(&value)?;

        let conn = self.store.conn();
        conn.execute(
            &format!(
                "INSERT INTO {} (key, value) VALUES (?1, ?2)
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value",
                self.collection.name()
            ),
            params![key, json],
        )?;
        Ok(())
    }

    /// Deletes the record at `key`. Returns whether a record existed.
    pub fn delete(&self, key: &str) -> StorageResult<bool> {
        let conn = self.store.conn();
        let removed = conn.execute(
            &format!("DELETE FROM {} WHERE key = ?1", self.collection.name()),
            params![key],
        )?;
        Ok(removed > 0)
    }

    /// Lists records in primary-key order or in a secondary index's order.
    ///
    /// Index iteration only yields records whose indexed field holds a
    /// number or string; ties are broken by primary key in the same
    /// direction.
    pub fn list(&self, opts: &ListOptions) -> StorageResult<Vec<Record>> {
        if opts.limit == Some(0) {
            return Ok(Vec::new());
        }

        let table = self.collection.name();
        let direction = if opts.reverse { "DESC" } else { "ASC" };

        let sql = match opts.index.as_deref() {
            None => format!("SELECT value FROM {table} ORDER BY key {direction} LIMIT ?1"),
            Some(name) => {
                let index =
                    self.collection
                        .index(name)
                        .ok_or_else(|| StorageError::UnknownIndex {
                            collection: self.collection,
                            index: name.to_string(),
                        })?;
                let field = index.field;
                format!(
                    "SELECT value FROM {table}
                     WHERE json_type(value, '$.{field}') IN ('integer', 'real', 'text')
                     ORDER BY json_extract(value, '$.{field}') {direction}, key {direction}
                     LIMIT ?1"
                )
            }
        };

        // SQLite treats a negative LIMIT as "no limit".
        let limit = opts
            .limit
            .map_or(-1, |l| i64::try_from(l).unwrap_or(i64::MAX));

        let conn = self.store.conn();
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params![limit], |row| row.get::<_, String>(0))?;

        let mut records = Vec::new();
        for row in rows {
            records.push(parse_record(&row?)?);
        }
        Ok(records)
    }

    /// Number of records in the collection.
    pub fn count(&self) -> StorageResult<usize> {
        let conn = self.store.conn();
        let count: i64 = conn.query_row(
            &format!("SELECT COUNT(*) FROM {}", self.collection.name()),
            [],
            |row| row.get(0),
        )?;
        Ok(usize::try_from(count).unwrap_or_default())
    }
}

fn parse_record(json: &str) -> StorageResult<Record> {
    match serde_json::from_str::<Value>(json)? {
        Value::Object(map) => Ok(map),
        other => Err(StorageError::InvalidData(format!(
            "stored value is not an object: {other}"
        ))),
    }
}
