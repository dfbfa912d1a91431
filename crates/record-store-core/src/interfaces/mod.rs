// crates/record-store-core/src/interfaces/mod.rs
// ============================================================================
// Module: Record Store Interfaces
// Description: Backend-agnostic key-value storage and schema validation.
// Purpose: Define the contract surfaces consumed by the record service.
// Dependencies: async-trait, serde_json, thiserror, crate::core
// ============================================================================

//! ## Overview
//! Interfaces define how the record service reaches durable storage and
//! schema validation without embedding backend-specific details. All
//! operations are async and may suspend on I/O.
//!
//! Security posture: keys and payloads passed to implementations come from
//! untrusted requests; keys are validated by [`crate::KeyBuilder`] first.

// ============================================================================
// SECTION: Imports
// ============================================================================

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use crate::core::Record;

// ============================================================================
// SECTION: Key-Value Store
// ============================================================================

/// Key-value store errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Store I/O error.
    #[error("key-value store io error: {0}")]
    Io(String),
    /// Stored data is corrupted or fails integrity checks.
    #[error("key-value store corruption: {0}")]
    Corrupt(String),
    /// Store data version is incompatible.
    #[error("key-value store version mismatch: {0}")]
    VersionMismatch(String),
    /// Store input or data is invalid.
    #[error("key-value store invalid data: {0}")]
    Invalid(String),
    /// Store reported an error.
    #[error("key-value store error: {0}")]
    Store(String),
}

/// Value and metadata read together from a single key.
///
/// Either half may be absent independently.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct KvEntry {
    /// Stored value bytes.
    pub value: Option<Vec<u8>>,
    /// Metadata attached on the last put.
    pub metadata: Option<Value>,
}

/// Asynchronous key-value store capability.
#[async_trait]
pub trait KvStore: Send + Sync {
    /// Reads the value stored at `key`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the read fails.
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError>;

    /// Reads the value and metadata stored at `key` in one round trip.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the read fails.
    async fn get_with_metadata(&self, key: &str) -> Result<KvEntry, StoreError>;

    /// Reads only the metadata stored at `key`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the read fails.
    async fn get_metadata(&self, key: &str) -> Result<Option<Value>, StoreError> {
        Ok(self.get_with_metadata(key).await?.metadata)
    }

    /// Writes `value` at `key`, replacing any previous value and metadata.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the write fails.
    async fn put(&self, key: &str, value: Vec<u8>, metadata: Option<Value>)
    -> Result<(), StoreError>;

    /// Deletes `key`. Deleting an absent key succeeds.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the delete fails.
    async fn delete(&self, key: &str) -> Result<(), StoreError>;

    /// Lists keys starting with `prefix` in ascending order.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when listing fails.
    async fn list_keys(&self, prefix: &str) -> Result<Vec<String>, StoreError>;

    /// Reports store readiness for liveness/readiness probes.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the store is unavailable.
    async fn readiness(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

// ============================================================================
// SECTION: Schema Validator
// ============================================================================

/// Schema validation errors.
///
/// # Invariants
/// - `Violation` means the schema was resolved and the payload failed it.
/// - `FetchFailed` means the schema could not be resolved or compiled.
#[derive(Debug, Error)]
pub enum SchemaError {
    /// Payload does not satisfy its declared schema.
    #[error("record violates its schema")]
    Violation {
        /// Validation error messages.
        errors: Vec<String>,
    },
    /// Schema URL is untrusted, unreachable, or malformed.
    #[error("schema fetch failed: {0}")]
    FetchFailed(String),
}

/// Validates a record against the schema embedded in its payload.
#[async_trait]
pub trait SchemaValidator: Send + Sync {
    /// Validates `record`.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError`] when the schema cannot be resolved or the
    /// payload violates it.
    async fn validate(&self, record: &Record) -> Result<(), SchemaError>;
}
