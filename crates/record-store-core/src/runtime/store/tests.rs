// crates/record-store-core/src/runtime/store/tests.rs
// ============================================================================
// Module: In-Memory Store Tests
// Description: Unit tests for the in-memory key-value store.
// Purpose: Validate get/put/delete semantics and prefix listing.
// Dependencies: record-store-core, serde_json, tokio
// ============================================================================

//! ## Overview
//! Exercises [`super::InMemoryKvStore`] through the shared wrapper.

#![allow(
    clippy::expect_used,
    clippy::unwrap_used,
    clippy::panic,
    reason = "Test-only assertions use unwrap/expect for clarity."
)]

use serde_json::json;

use super::InMemoryKvStore;
use super::SharedKvStore;
use crate::interfaces::KvStore;

#[tokio::test]
async fn put_then_get_with_metadata() {
    let store = SharedKvStore::from_store(InMemoryKvStore::new());
    store.put("record:a", b"{}".to_vec(), Some(json!({"mode": 0}))).await.unwrap();
    let entry = store.get_with_metadata("record:a").await.unwrap();
    assert_eq!(entry.value.as_deref(), Some(b"{}".as_slice()));
    assert_eq!(entry.metadata, Some(json!({"mode": 0})));
    assert_eq!(store.get_metadata("record:a").await.unwrap(), Some(json!({"mode": 0})));
}

#[tokio::test]
async fn missing_key_reads_as_absent() {
    let store = InMemoryKvStore::new();
    assert!(store.get("nope").await.unwrap().is_none());
    let entry = store.get_with_metadata("nope").await.unwrap();
    assert!(entry.value.is_none());
    assert!(entry.metadata.is_none());
}

#[tokio::test]
async fn put_replaces_metadata_and_delete_is_idempotent() {
    let store = InMemoryKvStore::new();
    store.put("k", b"1".to_vec(), Some(json!(1))).await.unwrap();
    store.put("k", b"2".to_vec(), None).await.unwrap();
    assert!(store.get_metadata("k").await.unwrap().is_none());
    store.delete("k").await.unwrap();
    store.delete("k").await.unwrap();
    assert!(store.get("k").await.unwrap().is_none());
}

#[tokio::test]
async fn list_keys_filters_by_prefix() {
    let store = InMemoryKvStore::new();
    for key in ["record:b", "record:a", "record:a:accesskey", "records:count", "other"] {
        store.put(key, Vec::new(), None).await.unwrap();
    }
    let keys = store.list_keys("record:").await.unwrap();
    assert_eq!(keys, vec!["record:a", "record:a:accesskey", "record:b"]);
    assert!(store.readiness().await.is_ok());
}
