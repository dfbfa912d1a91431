// crates/record-store-core/src/lib.rs
// ============================================================================
// Module: Record Store Core Library
// Description: Public API surface for the record store core.
// Purpose: Expose record entities, storage interfaces, and the record service.
// Dependencies: crate::{core, interfaces, runtime}
// ============================================================================

//! ## Overview
//! Record store core maps record identities onto key-value storage, enforces
//! the access-key namespace, applies JSON-Patch batches, and keeps an
//! approximate record counter. It is backend-agnostic: storage, schema
//! validation, and event logging are reached through explicit interfaces.
//!
//! Security posture: record payloads and identities are untrusted inputs and
//! are validated before any storage operation.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod core;
pub mod interfaces;
pub mod runtime;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use core::*;

pub use interfaces::KvEntry;
pub use interfaces::KvStore;
pub use interfaces::SchemaError;
pub use interfaces::SchemaValidator;
pub use interfaces::StoreError;
pub use runtime::CreatedRecord;
pub use runtime::EventLevel;
pub use runtime::EventSink;
pub use runtime::FileEventSink;
pub use runtime::InMemoryKvStore;
pub use runtime::KeyspaceReport;
pub use runtime::LogFile;
pub use runtime::NoopEventSink;
pub use runtime::RecordError;
pub use runtime::RecordService;
pub use runtime::ServiceEvent;
pub use runtime::SharedKvStore;
pub use runtime::StderrEventSink;
