// crates/record-store-sqlite/src/store.rs
// ============================================================================
// Module: SQLite Key-Value Store
// Description: Durable KvStore backed by SQLite WAL.
// Purpose: Persist record values and metadata in a single table.
// Dependencies: record-store-core, rusqlite, serde, serde_json, thiserror, tokio
// ============================================================================

//! ## Overview
//! This module implements a durable [`KvStore`] using `SQLite`. Every put
//! replaces the value and metadata of a key in one statement, so a single
//! logical write is never torn. Blocking database calls run on the tokio
//! blocking pool behind a shared connection mutex.
//! Metadata is stored as JSON text; a column that fails to parse is reported
//! as corruption rather than absence.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::Mutex;
use std::time::Duration;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use async_trait::async_trait;
use record_store_core::KvEntry;
use record_store_core::KvStore;
use record_store_core::StoreError;
use rusqlite::Connection;
use rusqlite::OpenFlags;
use rusqlite::OptionalExtension;
use rusqlite::params;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Layout version written to `kv_meta`.
const SCHEMA_VERSION: i64 = 1;
/// Busy timeout applied when the config omits one.
const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;
/// Longest accepted file name or directory name in the database path.
const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Longest accepted database path.
const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Maximum value size accepted by the store.
pub const MAX_VALUE_BYTES: usize = 16 * 1024 * 1024;

// ============================================================================
// SECTION: Config
// ============================================================================

/// Journal mode of the database file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SqliteJournalMode {
    /// Write-ahead log.
    #[default]
    Wal,
    /// Rollback journal deleted after each transaction.
    Delete,
}

impl SqliteJournalMode {
    /// Value for `PRAGMA journal_mode`.
    #[must_use]
    pub const fn pragma_value(self) -> &'static str {
        match self {
            Self::Wal => "wal",
            Self::Delete => "delete",
        }
    }
}

/// Durability level of committed writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SqliteSyncMode {
    /// fsync on every commit.
    #[default]
    Full,
    /// fsync at WAL checkpoints only.
    Normal,
}

impl SqliteSyncMode {
    /// Value for `PRAGMA synchronous`.
    #[must_use]
    pub const fn pragma_value(self) -> &'static str {
        match self {
            Self::Full => "full",
            Self::Normal => "normal",
        }
    }
}

/// Settings for opening a [`SqliteKvStore`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SqliteStoreConfig {
    /// Database file; missing parent directories are created.
    pub path: PathBuf,
    /// Milliseconds to wait on a locked database.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
    /// Journal mode pragma.
    #[serde(default)]
    pub journal_mode: SqliteJournalMode,
    /// Synchronous pragma.
    #[serde(default)]
    pub sync_mode: SqliteSyncMode,
}

impl SqliteStoreConfig {
    /// Creates a configuration for `path` with default tuning.
    #[must_use]
    pub fn at_path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
            journal_mode: SqliteJournalMode::default(),
            sync_mode: SqliteSyncMode::default(),
        }
    }
}

/// Serde default for `busy_timeout_ms`.
const fn default_busy_timeout_ms() -> u64 {
    DEFAULT_BUSY_TIMEOUT_MS
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors raised by [`SqliteKvStore`].
#[derive(Debug, Error)]
pub enum SqliteStoreError {
    /// Filesystem or blocking-pool failure.
    #[error("kv store io failure: {0}")]
    Io(String),
    /// Error reported by rusqlite.
    #[error("kv store database failure: {0}")]
    Db(String),
    /// A stored metadata column is not valid JSON.
    #[error("kv store entry corrupt: {0}")]
    Corrupt(String),
    /// `kv_meta` holds a layout version this build does not read.
    #[error("kv store layout mismatch: {0}")]
    VersionMismatch(String),
    /// Rejected path or value.
    #[error("kv store rejected input: {0}")]
    Invalid(String),
    /// Value larger than [`MAX_VALUE_BYTES`].
    #[error("kv store value of {actual_bytes} bytes exceeds {max_bytes}")]
    TooLarge {
        /// Limit in bytes.
        max_bytes: usize,
        /// Offending value size.
        actual_bytes: usize,
    },
}

impl From<SqliteStoreError> for StoreError {
    fn from(error: SqliteStoreError) -> Self {
        match error {
            SqliteStoreError::Io(message) => Self::Io(message),
            SqliteStoreError::Db(message) => Self::Store(message),
            SqliteStoreError::Corrupt(message) => Self::Corrupt(message),
            SqliteStoreError::VersionMismatch(message) => Self::VersionMismatch(message),
            SqliteStoreError::Invalid(message) => Self::Invalid(message),
            too_large @ SqliteStoreError::TooLarge {
                ..
            } => Self::Invalid(too_large.to_string()),
        }
    }
}

/// Maps a `rusqlite` error into a store error.
#[allow(clippy::needless_pass_by_value, reason = "Used as a map_err adapter.")]
fn db_error(err: rusqlite::Error) -> SqliteStoreError {
    SqliteStoreError::Db(err.to_string())
}

// ============================================================================
// SECTION: Store
// ============================================================================

/// Key-value store kept in one `kv_entries` table.
#[derive(Clone)]
pub struct SqliteKvStore {
    /// Single connection; every call holds the lock for one statement.
    connection: Arc<Mutex<Connection>>,
}

impl SqliteKvStore {
    /// Opens or creates the database at `config.path`.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] for rejected paths, open failures, and
    /// unknown layout versions.
    pub fn new(config: &SqliteStoreConfig) -> Result<Self, SqliteStoreError> {
        let mut connection = open_database(config)?;
        initialize_layout(&mut connection)?;
        Ok(Self {
            connection: Arc::new(Mutex::new(connection)),
        })
    }

    /// Runs `op` against the connection on the blocking pool.
    async fn run<T, F>(&self, op: F) -> Result<T, SqliteStoreError>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> Result<T, SqliteStoreError> + Send + 'static,
    {
        let connection = Arc::clone(&self.connection);
        tokio::task::spawn_blocking(move || {
            let guard = connection
                .lock()
                .map_err(|_| SqliteStoreError::Io("connection lock poisoned".to_string()))?;
            op(&guard)
        })
        .await
        .map_err(|err| SqliteStoreError::Io(format!("blocking task failed: {err}")))?
    }
}

#[async_trait]
impl KvStore for SqliteKvStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        let key = key.to_string();
        self.run(move |conn| {
            conn.query_row("SELECT value FROM kv_entries WHERE key = ?1", params![key], |row| {
                row.get(0)
            })
            .optional()
            .map_err(db_error)
        })
        .await
        .map_err(StoreError::from)
    }

    async fn get_with_metadata(&self, key: &str) -> Result<KvEntry, StoreError> {
        let key = key.to_string();
        self.run(move |conn| {
            let row: Option<(Vec<u8>, Option<String>)> = conn
                .query_row(
                    "SELECT value, metadata FROM kv_entries WHERE key = ?1",
                    params![key],
                    |row| Ok((row.get(0)?, row.get(1)?)),
                )
                .optional()
                .map_err(db_error)?;
            let Some((value, metadata)) = row else {
                return Ok(KvEntry::default());
            };
            Ok(KvEntry {
                value: Some(value),
                metadata: decode_metadata(&key, metadata)?,
            })
        })
        .await
        .map_err(StoreError::from)
    }

    async fn get_metadata(&self, key: &str) -> Result<Option<Value>, StoreError> {
        let key = key.to_string();
        self.run(move |conn| {
            let metadata: Option<Option<String>> = conn
                .query_row("SELECT metadata FROM kv_entries WHERE key = ?1", params![key], |row| {
                    row.get(0)
                })
                .optional()
                .map_err(db_error)?;
            decode_metadata(&key, metadata.flatten())
        })
        .await
        .map_err(StoreError::from)
    }

    async fn put(
        &self,
        key: &str,
        value: Vec<u8>,
        metadata: Option<Value>,
    ) -> Result<(), StoreError> {
        if value.len() > MAX_VALUE_BYTES {
            return Err(SqliteStoreError::TooLarge {
                max_bytes: MAX_VALUE_BYTES,
                actual_bytes: value.len(),
            }
            .into());
        }
        let metadata = metadata
            .map(|value| serde_json::to_string(&value))
            .transpose()
            .map_err(|err| SqliteStoreError::Invalid(err.to_string()))?;
        let key = key.to_string();
        let updated_at = unix_millis();
        self.run(move |conn| {
            conn.execute(
                "INSERT INTO kv_entries (key, value, metadata, updated_at) VALUES (?1, ?2, ?3, \
                 ?4) ON CONFLICT(key) DO UPDATE SET value = excluded.value, metadata = \
                 excluded.metadata, updated_at = excluded.updated_at",
                params![key, value, metadata, updated_at],
            )
            .map_err(db_error)?;
            Ok(())
        })
        .await
        .map_err(StoreError::from)
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        let key = key.to_string();
        self.run(move |conn| {
            conn.execute("DELETE FROM kv_entries WHERE key = ?1", params![key]).map_err(db_error)?;
            Ok(())
        })
        .await
        .map_err(StoreError::from)
    }

    async fn list_keys(&self, prefix: &str) -> Result<Vec<String>, StoreError> {
        let prefix = prefix.to_string();
        self.run(move |conn| {
            let mut statement = conn
                .prepare(
                    "SELECT key FROM kv_entries WHERE substr(key, 1, length(?1)) = ?1 ORDER BY \
                     key",
                )
                .map_err(db_error)?;
            let rows = statement.query_map(params![prefix], |row| row.get(0)).map_err(db_error)?;
            rows.collect::<Result<Vec<String>, _>>().map_err(db_error)
        })
        .await
        .map_err(StoreError::from)
    }

    async fn readiness(&self) -> Result<(), StoreError> {
        self.run(|conn| match stored_version(conn)? {
            Some(version) => check_version(version),
            None => Err(SqliteStoreError::VersionMismatch("kv_meta has no row".to_string())),
        })
        .await
        .map_err(StoreError::from)
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Decodes a stored metadata column.
fn decode_metadata(key: &str, raw: Option<String>) -> Result<Option<Value>, SqliteStoreError> {
    raw.map(|text| serde_json::from_str(&text))
        .transpose()
        .map_err(|err| SqliteStoreError::Corrupt(format!("metadata for {key}: {err}")))
}

/// Checks path limits and creates missing parent directories.
fn prepare_db_path(path: &Path) -> Result<(), SqliteStoreError> {
    if path.as_os_str().len() > MAX_TOTAL_PATH_LENGTH {
        return Err(SqliteStoreError::Invalid(format!(
            "database path longer than {MAX_TOTAL_PATH_LENGTH} bytes"
        )));
    }
    if path.components().any(|part| part.as_os_str().len() > MAX_PATH_COMPONENT_LENGTH) {
        return Err(SqliteStoreError::Invalid(format!(
            "database path has a component longer than {MAX_PATH_COMPONENT_LENGTH} bytes"
        )));
    }
    if path.is_dir() {
        return Err(SqliteStoreError::Invalid(format!(
            "database path {} is a directory",
            path.display()
        )));
    }
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => std::fs::create_dir_all(parent)
            .map_err(|err| SqliteStoreError::Io(format!("create {}: {err}", parent.display()))),
        Some(_) => Ok(()),
        None => Err(SqliteStoreError::Invalid("database path has no file name".to_string())),
    }
}

/// Opens the database file and applies the configured pragmas.
fn open_database(config: &SqliteStoreConfig) -> Result<Connection, SqliteStoreError> {
    prepare_db_path(&config.path)?;
    let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
        | OpenFlags::SQLITE_OPEN_CREATE
        | OpenFlags::SQLITE_OPEN_NO_MUTEX;
    let connection = Connection::open_with_flags(&config.path, flags).map_err(db_error)?;
    let pragmas = format!(
        "PRAGMA journal_mode = {}; PRAGMA synchronous = {};",
        config.journal_mode.pragma_value(),
        config.sync_mode.pragma_value()
    );
    connection.execute_batch(&pragmas).map_err(db_error)?;
    connection.busy_timeout(Duration::from_millis(config.busy_timeout_ms)).map_err(db_error)?;
    Ok(connection)
}

/// Reads the layout version, if `kv_meta` has a row.
fn stored_version(connection: &Connection) -> Result<Option<i64>, SqliteStoreError> {
    connection
        .query_row("SELECT version FROM kv_meta LIMIT 1", [], |row| row.get(0))
        .optional()
        .map_err(db_error)
}

/// Rejects layouts other than [`SCHEMA_VERSION`].
fn check_version(version: i64) -> Result<(), SqliteStoreError> {
    if version == SCHEMA_VERSION {
        Ok(())
    } else {
        Err(SqliteStoreError::VersionMismatch(format!(
            "found layout {version}, expected {SCHEMA_VERSION}"
        )))
    }
}

/// Creates the tables on first open, otherwise checks the stored layout.
fn initialize_layout(connection: &mut Connection) -> Result<(), SqliteStoreError> {
    let tx = connection.transaction().map_err(db_error)?;
    tx.execute_batch("CREATE TABLE IF NOT EXISTS kv_meta (version INTEGER NOT NULL);")
        .map_err(db_error)?;
    if let Some(version) = stored_version(&tx)? {
        check_version(version)?;
    } else {
        tx.execute("INSERT INTO kv_meta (version) VALUES (?1)", params![SCHEMA_VERSION])
            .map_err(db_error)?;
        tx.execute_batch(
            "CREATE TABLE IF NOT EXISTS kv_entries (
                key TEXT PRIMARY KEY,
                value BLOB NOT NULL,
                metadata TEXT,
                updated_at INTEGER NOT NULL
            );",
        )
        .map_err(db_error)?;
    }
    tx.commit().map_err(db_error)
}

/// Write timestamp for `kv_entries.updated_at`.
fn unix_millis() -> i64 {
    let elapsed = SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default();
    i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX)
}
