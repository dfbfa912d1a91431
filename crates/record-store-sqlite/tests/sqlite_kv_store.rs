// crates/record-store-sqlite/tests/sqlite_kv_store.rs
// ============================================================================
// Module: SQLite Key-Value Store Tests
// Description: Persistence, metadata, and schema-version checks.
// Purpose: Validate the SQLite backend against the KvStore contract.
// Dependencies: record-store-sqlite, record-store-core, tempfile, tokio
// ============================================================================

//! ## Overview
//! Each test opens a fresh database in a temporary directory.

#![allow(
    clippy::expect_used,
    clippy::unwrap_used,
    clippy::panic,
    reason = "Test-only assertions use unwrap/expect for clarity."
)]

use std::sync::Arc;

use async_trait::async_trait;
use record_store_core::KvStore;
use record_store_core::NoopEventSink;
use record_store_core::Record;
use record_store_core::RecordService;
use record_store_core::SchemaError;
use record_store_core::SchemaValidator;
use record_store_core::SharedKvStore;
use record_store_core::StoreError;
use record_store_core::VisibilityMode;
use record_store_sqlite::MAX_VALUE_BYTES;
use record_store_sqlite::SqliteKvStore;
use record_store_sqlite::SqliteStoreConfig;
use record_store_sqlite::SqliteStoreError;
use serde_json::json;
use tempfile::TempDir;

// ============================================================================
// SECTION: Fixtures
// ============================================================================

struct AcceptAll;

#[async_trait]
impl SchemaValidator for AcceptAll {
    async fn validate(&self, _record: &Record) -> Result<(), SchemaError> {
        Ok(())
    }
}

fn open(dir: &TempDir) -> SqliteKvStore {
    SqliteKvStore::new(&SqliteStoreConfig::at_path(dir.path().join("records.db"))).unwrap()
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[tokio::test]
async fn values_and_metadata_survive_reopen() {
    let dir = TempDir::new().unwrap();
    {
        let store = open(&dir);
        store.put("record:a", b"{\"x\":1}".to_vec(), Some(json!({"mode": 1}))).await.unwrap();
        store.put("record:a:accesskey", b"secret".to_vec(), None).await.unwrap();
    }
    let store = open(&dir);
    let entry = store.get_with_metadata("record:a").await.unwrap();
    assert_eq!(entry.value.as_deref(), Some(b"{\"x\":1}".as_slice()));
    assert_eq!(entry.metadata, Some(json!({"mode": 1})));
    assert_eq!(store.get_metadata("record:a:accesskey").await.unwrap(), None);
    assert_eq!(store.get("record:a:accesskey").await.unwrap(), Some(b"secret".to_vec()));
    store.readiness().await.unwrap();
}

#[tokio::test]
async fn put_replaces_value_and_metadata_together() {
    let dir = TempDir::new().unwrap();
    let store = open(&dir);
    store.put("k", b"1".to_vec(), Some(json!({"v": 1}))).await.unwrap();
    store.put("k", b"2".to_vec(), None).await.unwrap();
    let entry = store.get_with_metadata("k").await.unwrap();
    assert_eq!(entry.value, Some(b"2".to_vec()));
    assert_eq!(entry.metadata, None);
}

#[tokio::test]
async fn missing_keys_read_as_absent_and_delete_is_idempotent() {
    let dir = TempDir::new().unwrap();
    let store = open(&dir);
    assert_eq!(store.get("nope").await.unwrap(), None);
    let entry = store.get_with_metadata("nope").await.unwrap();
    assert!(entry.value.is_none() && entry.metadata.is_none());
    store.delete("nope").await.unwrap();
    store.put("k", Vec::new(), None).await.unwrap();
    assert_eq!(store.get("k").await.unwrap(), Some(Vec::new()));
    store.delete("k").await.unwrap();
    assert_eq!(store.get("k").await.unwrap(), None);
}

#[tokio::test]
async fn list_keys_matches_literal_prefixes_in_order() {
    let dir = TempDir::new().unwrap();
    let store = open(&dir);
    for key in ["record:b", "record:a", "record:a:accesskey", "records:count", "other"] {
        store.put(key, b"v".to_vec(), None).await.unwrap();
    }
    assert_eq!(
        store.list_keys("record:").await.unwrap(),
        vec!["record:a", "record:a:accesskey", "record:b"]
    );
    store.put("x%_y", b"v".to_vec(), None).await.unwrap();
    assert_eq!(store.list_keys("x%").await.unwrap(), vec!["x%_y"]);
    assert_eq!(store.list_keys("").await.unwrap().len(), 6);
}

#[tokio::test]
async fn oversized_values_are_rejected() {
    let dir = TempDir::new().unwrap();
    let store = open(&dir);
    let result = store.put("big", vec![0_u8; MAX_VALUE_BYTES + 1], None).await;
    assert!(matches!(result, Err(StoreError::Invalid(_))));
    assert_eq!(store.get("big").await.unwrap(), None);
}

#[test]
fn unsupported_schema_version_is_rejected() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("records.db");
    drop(SqliteKvStore::new(&SqliteStoreConfig::at_path(&path)).unwrap());
    let connection = rusqlite::Connection::open(&path).unwrap();
    connection.execute("UPDATE kv_meta SET version = 99", []).unwrap();
    drop(connection);
    assert!(matches!(
        SqliteKvStore::new(&SqliteStoreConfig::at_path(&path)),
        Err(SqliteStoreError::VersionMismatch(_))
    ));
}

#[test]
fn directory_paths_are_rejected() {
    let dir = TempDir::new().unwrap();
    assert!(matches!(
        SqliteKvStore::new(&SqliteStoreConfig::at_path(dir.path())),
        Err(SqliteStoreError::Invalid(_))
    ));
}

#[test]
fn missing_parent_directories_are_created() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("deeper").join("records.db");
    SqliteKvStore::new(&SqliteStoreConfig::at_path(&path)).unwrap();
    assert!(path.exists());
}

#[tokio::test]
async fn record_lifecycle_runs_against_sqlite() {
    let dir = TempDir::new().unwrap();
    let service = RecordService::new(
        SharedKvStore::from_store(open(&dir)),
        Arc::new(AcceptAll),
        Arc::new(NoopEventSink),
    );
    let created = service
        .create(Record::from_data(json!({"name": "ada"}), VisibilityMode::Read), None)
        .await
        .unwrap();
    let id = created.record.id.clone();

    let reopened = RecordService::new(
        SharedKvStore::from_store(open(&dir)),
        Arc::new(AcceptAll),
        Arc::new(NoopEventSink),
    );
    let loaded = reopened.get(&id).await.unwrap().unwrap();
    assert_eq!(loaded.data, json!({"name": "ada"}));
    assert!(loaded.metadata.is_public_read());
    assert_eq!(reopened.get_access_key(&id).await.unwrap(), Some(created.access_key));
    assert_eq!(reopened.get_count().await, 1);

    assert!(reopened.delete_by_id(&id).await.unwrap());
    assert_eq!(reopened.get(&id).await.unwrap(), None);
    assert_eq!(reopened.get_count().await, 0);
    let report = reopened.inspect_keyspace().await.unwrap();
    assert_eq!(report.record_count, 0);
    assert_eq!(report.access_key_count, 0);
}
