// crates/record-store-core/src/runtime/service.rs
// ============================================================================
// Module: Record Service
// Description: Orchestrates record CRUD over a key-value store.
// Purpose: Compose key derivation, entities, and schema validation.
// Dependencies: serde, serde_json, thiserror, crate::{core, interfaces}
// ============================================================================

//! ## Overview
//! [`RecordService`] is the sole owner of the key-value store handle. Every
//! write validates the record against its embedded schema before touching
//! storage. Reads treat a missing payload or missing metadata as absence.
//!
//! Consistency model:
//! - Creation writes the access key, then the data entry; the two writes are
//!   not atomic and a failure in between leaves an orphaned access key that
//!   [`RecordService::inspect_keyspace`] reports.
//! - Updates and patches are read-then-write with last-writer-wins.
//! - The record counter is approximate; its maintenance failures are logged
//!   through the [`EventSink`] and never fail the record operation.
//!
//! The service never compares access keys; callers authorize against
//! [`RecordService::get_access_key`].

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::core::AccessKey;
use crate::core::AccessKeyError;
use crate::core::JsonPatch;
use crate::core::KeyBuilder;
use crate::core::KeyError;
use crate::core::PatchError;
use crate::core::Record;
use crate::core::RecordId;
use crate::core::RecordMetadata;
use crate::core::keys::KEY_SEPARATOR;
use crate::core::keys::RECORD_KEY_PREFIX;
use crate::interfaces::KvStore;
use crate::interfaces::SchemaError;
use crate::interfaces::SchemaValidator;
use crate::interfaces::StoreError;
use crate::runtime::events::EventLevel;
use crate::runtime::events::EventSink;
use crate::runtime::events::ServiceEvent;
use crate::runtime::store::SharedKvStore;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Record service errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling and map one-to-one onto
///   transport status codes at the HTTP boundary.
#[derive(Debug, Error)]
pub enum RecordError {
    /// Record identity is malformed or reserved.
    #[error("invalid record id: {0}")]
    InvalidIdentity(String),
    /// Record or its metadata is absent.
    #[error("record not found")]
    NotFound,
    /// Access key missing or mismatched.
    #[error("unauthorized")]
    Unauthorized,
    /// Payload fails its declared JSON Schema.
    #[error("record violates its schema")]
    SchemaViolation {
        /// Validation error messages.
        errors: Vec<String>,
    },
    /// Schema URL untrusted, unreachable, or malformed.
    #[error("schema fetch failed: {0}")]
    SchemaFetchFailed(String),
    /// JSON-Patch batch could not be applied.
    #[error("patch application failed: {0}")]
    PatchApplicationFailed(String),
    /// Backing store error.
    #[error("storage unavailable: {0}")]
    StorageUnavailable(String),
    /// Client-supplied access key is malformed.
    #[error("invalid access key: {0}")]
    InvalidAccessKey(String),
}

impl From<KeyError> for RecordError {
    fn from(err: KeyError) -> Self {
        Self::InvalidIdentity(err.to_string())
    }
}

impl From<StoreError> for RecordError {
    fn from(err: StoreError) -> Self {
        Self::StorageUnavailable(err.to_string())
    }
}

impl From<SchemaError> for RecordError {
    fn from(err: SchemaError) -> Self {
        match err {
            SchemaError::Violation {
                errors,
            } => Self::SchemaViolation {
                errors,
            },
            SchemaError::FetchFailed(message) => Self::SchemaFetchFailed(message),
        }
    }
}

impl From<PatchError> for RecordError {
    fn from(err: PatchError) -> Self {
        Self::PatchApplicationFailed(err.0)
    }
}

impl From<AccessKeyError> for RecordError {
    fn from(err: AccessKeyError) -> Self {
        Self::InvalidAccessKey(err.to_string())
    }
}

// ============================================================================
// SECTION: Results
// ============================================================================

/// Result of a successful create.
#[derive(Debug, Clone)]
pub struct CreatedRecord {
    /// Stored record.
    pub record: Record,
    /// Effective access key, disclosed only at creation.
    pub access_key: AccessKey,
}

/// Classification of the record keyspace.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct KeyspaceReport {
    /// Number of record data entries.
    pub record_count: usize,
    /// Number of access-key entries.
    pub access_key_count: usize,
    /// Identities with an access key but no data entry.
    pub orphaned_access_keys: Vec<String>,
    /// Identities with a data entry but no access key.
    pub records_without_access_key: Vec<String>,
    /// Keys under the record prefix that match neither shape.
    pub unrecognized_keys: Vec<String>,
    /// Current value of the approximate counter.
    pub counter: u64,
}

// ============================================================================
// SECTION: Record Service
// ============================================================================

/// Orchestrates record persistence.
#[derive(Clone)]
pub struct RecordService {
    /// Key-value store handle.
    store: SharedKvStore,
    /// Embedded-schema validator.
    validator: Arc<dyn SchemaValidator>,
    /// Sink for swallowed failures.
    events: Arc<dyn EventSink>,
}

impl RecordService {
    /// Creates a record service.
    #[must_use]
    pub fn new(
        store: SharedKvStore,
        validator: Arc<dyn SchemaValidator>,
        events: Arc<dyn EventSink>,
    ) -> Self {
        Self {
            store,
            validator,
            events,
        }
    }

    /// Validates a record against its embedded schema.
    ///
    /// # Errors
    ///
    /// Returns [`RecordError::SchemaViolation`] or
    /// [`RecordError::SchemaFetchFailed`].
    pub async fn validate(&self, record: &Record) -> Result<(), RecordError> {
        self.validator.validate(record).await.map_err(RecordError::from)
    }

    /// Persists a new record and its access key.
    ///
    /// The access key is `provided_key` when given, else freshly generated.
    /// Validation happens before any write.
    ///
    /// # Errors
    ///
    /// Returns [`RecordError`] for malformed keys or identities, schema
    /// failures, and storage failures. Counter failures are swallowed.
    pub async fn create(
        &self,
        record: Record,
        provided_key: Option<&str>,
    ) -> Result<CreatedRecord, RecordError> {
        let access_key = match provided_key {
            Some(raw) => AccessKey::parse(raw)?,
            None => AccessKey::generate(),
        };
        let access_key_key = KeyBuilder::for_access_key(record.id.as_str())?;
        self.validate(&record).await?;

        self.store.put(&access_key_key, access_key.as_str().as_bytes().to_vec(), None).await?;
        self.put_record(&record).await?;
        if let Err(err) = self.adjust_count(CountAdjustment::Increment).await {
            self.report_counter_failure("increment_count", &record.id, &err);
        }
        Ok(CreatedRecord {
            record,
            access_key,
        })
    }

    /// Loads a record with its metadata in one round trip.
    ///
    /// # Errors
    ///
    /// Returns [`RecordError`] for malformed identities or storage failures,
    /// including undecodable stored payloads.
    pub async fn get(&self, id: &RecordId) -> Result<Option<Record>, RecordError> {
        let key = KeyBuilder::for_record(id.as_str())?;
        let entry = self.store.get_with_metadata(&key).await?;
        let data = entry
            .value
            .map(|bytes| serde_json::from_slice::<Value>(&bytes))
            .transpose()
            .map_err(|err| StoreError::Corrupt(format!("record payload: {err}")))?;
        let metadata = entry.metadata.map(decode_metadata).transpose()?;
        Ok(Record::from_kv_result(id.clone(), data, metadata))
    }

    /// Loads only the metadata of a record.
    ///
    /// # Errors
    ///
    /// Returns [`RecordError`] for malformed identities or storage failures.
    pub async fn get_metadata(&self, id: &RecordId) -> Result<Option<RecordMetadata>, RecordError> {
        let key = KeyBuilder::for_record(id.as_str())?;
        let metadata = self.store.get_metadata(&key).await?;
        Ok(metadata.map(decode_metadata).transpose()?)
    }

    /// Loads the stored access key of a record.
    ///
    /// # Errors
    ///
    /// Returns [`RecordError`] for malformed identities or storage failures.
    pub async fn get_access_key(&self, id: &RecordId) -> Result<Option<AccessKey>, RecordError> {
        let key = KeyBuilder::for_access_key(id.as_str())?;
        let Some(bytes) = self.store.get(&key).await? else {
            return Ok(None);
        };
        let text = String::from_utf8(bytes)
            .map_err(|_| StoreError::Corrupt("access key is not utf-8".to_string()))?;
        Ok(Some(AccessKey::from_stored(text)))
    }

    /// Replaces the payload of an existing record.
    ///
    /// # Errors
    ///
    /// Returns [`RecordError::NotFound`] when the record is absent, schema
    /// errors when the new payload is invalid, and storage failures.
    pub async fn update_by_id(&self, id: &RecordId, data: Value) -> Result<Record, RecordError> {
        self.mutate(id, |record| {
            record.set_data(data);
            Ok(())
        })
        .await
    }

    /// Applies a JSON-Patch batch to an existing record.
    ///
    /// # Errors
    ///
    /// Returns [`RecordError::NotFound`] when the record is absent,
    /// [`RecordError::PatchApplicationFailed`] when any operation fails,
    /// schema errors when the result is invalid, and storage failures.
    pub async fn patch_by_id(
        &self,
        id: &RecordId,
        patch: &JsonPatch,
    ) -> Result<Record, RecordError> {
        self.mutate(id, |record| Ok(record.apply_patch(patch)?)).await
    }

    /// Deletes a record and its access key. Idempotent.
    ///
    /// When no data entry exists, a leftover access key is still removed and
    /// the counter is left untouched.
    ///
    /// # Errors
    ///
    /// Returns [`RecordError`] for malformed identities or storage failures.
    pub async fn delete_by_id(&self, id: &RecordId) -> Result<bool, RecordError> {
        let data_key = KeyBuilder::for_record(id.as_str())?;
        let access_key_key = KeyBuilder::for_access_key(id.as_str())?;
        if self.store.get(&data_key).await?.is_none() {
            self.store.delete(&access_key_key).await?;
            return Ok(true);
        }
        self.store.delete(&data_key).await?;
        self.store.delete(&access_key_key).await?;
        if let Err(err) = self.adjust_count(CountAdjustment::Decrement).await {
            self.report_counter_failure("decrement_count", id, &err);
        }
        Ok(true)
    }

    /// Returns the approximate record count; 0 when missing, malformed, or
    /// unreadable.
    pub async fn get_count(&self) -> u64 {
        match self.read_count().await {
            Ok(count) => count,
            Err(err) => {
                self.events.record(&ServiceEvent::new(
                    EventLevel::Warn,
                    "get_count",
                    None,
                    err.to_string(),
                ));
                0
            }
        }
    }

    /// Classifies every key under the record prefix.
    ///
    /// # Errors
    ///
    /// Returns [`RecordError::StorageUnavailable`] when listing or reading
    /// the counter fails.
    pub async fn inspect_keyspace(&self) -> Result<KeyspaceReport, RecordError> {
        let prefix = format!("{RECORD_KEY_PREFIX}{KEY_SEPARATOR}");
        let keys = self.store.list_keys(&prefix).await?;
        let mut record_ids = BTreeSet::new();
        let mut access_key_ids = BTreeSet::new();
        let mut unrecognized_keys = Vec::new();
        for key in &keys {
            match KeyBuilder::extract_record_id(key) {
                Some(id) if KeyBuilder::is_record_key(key) => {
                    record_ids.insert(id.to_string());
                }
                Some(id) => {
                    access_key_ids.insert(id.to_string());
                }
                None => unrecognized_keys.push(key.clone()),
            }
        }
        Ok(KeyspaceReport {
            record_count: record_ids.len(),
            access_key_count: access_key_ids.len(),
            orphaned_access_keys: access_key_ids.difference(&record_ids).cloned().collect(),
            records_without_access_key: record_ids.difference(&access_key_ids).cloned().collect(),
            unrecognized_keys,
            counter: self.read_count().await?,
        })
    }

    /// Reports backing store readiness.
    ///
    /// # Errors
    ///
    /// Returns [`RecordError::StorageUnavailable`] when the store is not ready.
    pub async fn readiness(&self) -> Result<(), RecordError> {
        Ok(self.store.readiness().await?)
    }

    /// Load, transform, re-validate, and persist an existing record.
    async fn mutate(
        &self,
        id: &RecordId,
        transform: impl FnOnce(&mut Record) -> Result<(), RecordError> + Send,
    ) -> Result<Record, RecordError> {
        let mut record = self.get(id).await?.ok_or(RecordError::NotFound)?;
        transform(&mut record)?;
        self.validate(&record).await?;
        self.put_record(&record).await?;
        Ok(record)
    }

    /// Writes the data entry with its metadata attached.
    async fn put_record(&self, record: &Record) -> Result<(), RecordError> {
        let key = KeyBuilder::for_record(record.id.as_str())?;
        let value = serde_json::to_vec(&record.data)
            .map_err(|err| StoreError::Invalid(format!("record payload: {err}")))?;
        let metadata = serde_json::to_value(&record.metadata)
            .map_err(|err| StoreError::Invalid(format!("record metadata: {err}")))?;
        self.store.put(&key, value, Some(metadata)).await?;
        Ok(())
    }

    /// Reads the counter, coercing missing or malformed values to 0.
    async fn read_count(&self) -> Result<u64, StoreError> {
        let raw = self.store.get(KeyBuilder::for_record_count()).await?;
        Ok(raw
            .and_then(|bytes| String::from_utf8(bytes).ok())
            .and_then(|text| text.trim().parse::<u64>().ok())
            .unwrap_or(0))
    }

    /// Read-then-write counter adjustment, floored at zero.
    async fn adjust_count(&self, adjustment: CountAdjustment) -> Result<(), StoreError> {
        let current = self.read_count().await?;
        let next = match adjustment {
            CountAdjustment::Increment => current.saturating_add(1),
            CountAdjustment::Decrement => current.saturating_sub(1),
        };
        self.store.put(KeyBuilder::for_record_count(), next.to_string().into_bytes(), None).await
    }

    /// Logs a swallowed counter failure.
    fn report_counter_failure(&self, operation: &'static str, id: &RecordId, err: &StoreError) {
        self.events.record(&ServiceEvent::new(
            EventLevel::Error,
            operation,
            Some(id.to_string()),
            err.to_string(),
        ));
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Direction of a counter adjustment.
#[derive(Debug, Clone, Copy)]
enum CountAdjustment {
    /// Add one.
    Increment,
    /// Subtract one, never below zero.
    Decrement,
}

/// Decodes stored metadata.
fn decode_metadata(value: Value) -> Result<RecordMetadata, StoreError> {
    serde_json::from_value(value)
        .map_err(|err| StoreError::Corrupt(format!("record metadata: {err}")))
}
