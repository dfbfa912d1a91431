// crates/record-store-core/src/core/record.rs
// ============================================================================
// Module: Record Entities
// Description: Stored JSON documents, audit metadata, and JSON-Patch logic.
// Purpose: Model records in memory independently of persistence.
// Dependencies: json-patch, serde, serde_json, time, url
// ============================================================================

//! ## Overview
//! A [`Record`] pairs an opaque identity with an arbitrary JSON payload and
//! [`RecordMetadata`]. Entities never touch storage; the record service is
//! responsible for persisting them.
//!
//! Invariants:
//! - `updated_at >= created_at` for every metadata value built here.
//! - Patch batches are all-or-nothing.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use time::OffsetDateTime;
use url::Url;

use crate::core::identifiers::RecordId;

/// Ordered batch of RFC 6902 JSON-Patch operations.
pub type JsonPatch = json_patch::Patch;

// ============================================================================
// SECTION: Visibility
// ============================================================================

/// Record visibility mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum VisibilityMode {
    /// Private: reads require the access key.
    #[default]
    None,
    /// Publicly readable without an access key.
    Read,
}

impl From<VisibilityMode> for u8 {
    fn from(mode: VisibilityMode) -> Self {
        match mode {
            VisibilityMode::None => 0,
            VisibilityMode::Read => 1,
        }
    }
}

impl TryFrom<u8> for VisibilityMode {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::None),
            1 => Ok(Self::Read),
            other => Err(format!("unknown visibility mode: {other}")),
        }
    }
}

// ============================================================================
// SECTION: Metadata
// ============================================================================

/// Audit metadata stored alongside a record payload.
///
/// # Invariants
/// - `updated_at >= created_at`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordMetadata {
    /// Creation timestamp, set once.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    /// Timestamp of the last successful mutation.
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
    /// Visibility mode.
    #[serde(default)]
    pub mode: VisibilityMode,
}

impl RecordMetadata {
    /// Creates metadata stamped at `at` for both timestamps.
    #[must_use]
    pub const fn new(at: OffsetDateTime, mode: VisibilityMode) -> Self {
        Self {
            created_at: at,
            updated_at: at,
            mode,
        }
    }

    /// Refreshes `updated_at` to the current time.
    pub fn touch(&mut self) {
        self.touch_at(OffsetDateTime::now_utc());
    }

    /// Refreshes `updated_at`, never moving it before `created_at`.
    pub fn touch_at(&mut self, at: OffsetDateTime) {
        self.updated_at = at.max(self.created_at);
    }

    /// Returns true when the record is publicly readable.
    #[must_use]
    pub const fn is_public_read(&self) -> bool {
        matches!(self.mode, VisibilityMode::Read)
    }
}

// ============================================================================
// SECTION: Record
// ============================================================================

/// Patch application failure; the record payload is left unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("patch application failed: {0}")]
pub struct PatchError(pub String);

/// Stored JSON document with its identity and metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    /// Record identity.
    pub id: RecordId,
    /// Arbitrary JSON payload.
    pub data: Value,
    /// Audit metadata.
    pub metadata: RecordMetadata,
}

impl Record {
    /// Builds a new record with a fresh identity and `created_at = updated_at = now`.
    #[must_use]
    pub fn from_data(data: Value, mode: VisibilityMode) -> Self {
        Self {
            id: RecordId::generate(),
            data,
            metadata: RecordMetadata::new(OffsetDateTime::now_utc(), mode),
        }
    }

    /// Reconstructs a record from a storage read.
    ///
    /// Returns `None` when either the payload or the metadata is missing; a
    /// torn read is treated as absence, never as partial data.
    #[must_use]
    pub fn from_kv_result(
        id: RecordId,
        data: Option<Value>,
        metadata: Option<RecordMetadata>,
    ) -> Option<Self> {
        Some(Self {
            id,
            data: data?,
            metadata: metadata?,
        })
    }

    /// Replaces the payload and refreshes `updated_at`.
    pub fn set_data(&mut self, data: Value) {
        self.data = data;
        self.metadata.touch();
    }

    /// Applies a JSON-Patch batch.
    ///
    /// # Errors
    ///
    /// Returns [`PatchError`] when any operation fails; `data` and metadata
    /// are left untouched in that case.
    pub fn apply_patch(&mut self, patch: &JsonPatch) -> Result<(), PatchError> {
        let mut candidate = self.data.clone();
        json_patch::patch(&mut candidate, &patch.0).map_err(|err| PatchError(err.to_string()))?;
        self.set_data(candidate);
        Ok(())
    }

    /// Returns the `$schema` URL embedded in an object payload, if any.
    #[must_use]
    pub fn schema_url(&self) -> Option<Url> {
        let raw = self.data.as_object()?.get("$schema")?.as_str()?;
        Url::parse(raw).ok()
    }
}
