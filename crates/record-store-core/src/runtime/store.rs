// crates/record-store-core/src/runtime/store.rs
// ============================================================================
// Module: Record Store In-Memory Backend
// Description: In-memory key-value store and a shared store wrapper.
// Purpose: Provide a deterministic store without external dependencies.
// Dependencies: async-trait, crate::interfaces
// ============================================================================

//! ## Overview
//! This module provides an in-memory implementation of [`KvStore`] for tests,
//! local demos, and `type = "memory"` deployments, plus a clonable wrapper
//! around any shared store. The in-memory store is not durable.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;

use crate::interfaces::KvEntry;
use crate::interfaces::KvStore;
use crate::interfaces::StoreError;

// ============================================================================
// SECTION: In-Memory Store
// ============================================================================

/// Stored value with its metadata.
#[derive(Debug, Clone)]
struct StoredEntry {
    /// Value bytes.
    value: Vec<u8>,
    /// Metadata attached on the last put.
    metadata: Option<Value>,
}

/// In-memory key-value store.
#[derive(Debug, Default, Clone)]
pub struct InMemoryKvStore {
    /// Entry map protected by a mutex.
    entries: Arc<Mutex<BTreeMap<String, StoredEntry>>>,
}

impl InMemoryKvStore {
    /// Creates a new empty in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: Arc::new(Mutex::new(BTreeMap::new())),
        }
    }

    /// Runs `f` against the locked entry map.
    fn with_entries<T>(
        &self,
        f: impl FnOnce(&mut BTreeMap<String, StoredEntry>) -> T,
    ) -> Result<T, StoreError> {
        let mut guard = self
            .entries
            .lock()
            .map_err(|_| StoreError::Store("key-value store mutex poisoned".to_string()))?;
        Ok(f(&mut guard))
    }
}

#[async_trait]
impl KvStore for InMemoryKvStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        self.with_entries(|entries| entries.get(key).map(|entry| entry.value.clone()))
    }

    async fn get_with_metadata(&self, key: &str) -> Result<KvEntry, StoreError> {
        self.with_entries(|entries| {
            entries.get(key).map_or_else(KvEntry::default, |entry| KvEntry {
                value: Some(entry.value.clone()),
                metadata: entry.metadata.clone(),
            })
        })
    }

    async fn put(
        &self,
        key: &str,
        value: Vec<u8>,
        metadata: Option<Value>,
    ) -> Result<(), StoreError> {
        self.with_entries(|entries| {
            entries.insert(
                key.to_string(),
                StoredEntry {
                    value,
                    metadata,
                },
            );
        })
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        self.with_entries(|entries| {
            entries.remove(key);
        })
    }

    async fn list_keys(&self, prefix: &str) -> Result<Vec<String>, StoreError> {
        self.with_entries(|entries| {
            entries
                .range(prefix.to_string()..)
                .take_while(|(key, _)| key.starts_with(prefix))
                .map(|(key, _)| key.clone())
                .collect()
        })
    }
}

// ============================================================================
// SECTION: Shared Store Wrapper
// ============================================================================

/// Shared key-value store backed by an `Arc` trait object.
#[derive(Clone)]
pub struct SharedKvStore {
    /// Inner store implementation.
    inner: Arc<dyn KvStore>,
}

impl SharedKvStore {
    /// Wraps a key-value store in a shared, clonable wrapper.
    #[must_use]
    pub fn from_store(store: impl KvStore + 'static) -> Self {
        Self {
            inner: Arc::new(store),
        }
    }

    /// Wraps an existing shared store.
    #[must_use]
    pub const fn new(store: Arc<dyn KvStore>) -> Self {
        Self {
            inner: store,
        }
    }
}

#[async_trait]
impl KvStore for SharedKvStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        self.inner.get(key).await
    }

    async fn get_with_metadata(&self, key: &str) -> Result<KvEntry, StoreError> {
        self.inner.get_with_metadata(key).await
    }

    async fn get_metadata(&self, key: &str) -> Result<Option<Value>, StoreError> {
        self.inner.get_metadata(key).await
    }

    async fn put(
        &self,
        key: &str,
        value: Vec<u8>,
        metadata: Option<Value>,
    ) -> Result<(), StoreError> {
        self.inner.put(key, value, metadata).await
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        self.inner.delete(key).await
    }

    async fn list_keys(&self, prefix: &str) -> Result<Vec<String>, StoreError> {
        self.inner.list_keys(prefix).await
    }

    async fn readiness(&self) -> Result<(), StoreError> {
        self.inner.readiness().await
    }
}

#[cfg(test)]
mod tests;
