// crates/record-store-core/src/runtime/mod.rs
// ============================================================================
// Module: Record Store Runtime
// Description: Record service, in-memory store, and service event sinks.
// Purpose: Execute record operations against the storage interfaces.
// Dependencies: crate::{core, interfaces}
// ============================================================================

//! ## Overview
//! Runtime modules compose the pure core types with the storage and schema
//! interfaces. All transports call into the same [`RecordService`].

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod events;
pub mod service;
pub mod store;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use events::EventLevel;
pub use events::EventSink;
pub use events::FileEventSink;
pub use events::LogFile;
pub use events::NoopEventSink;
pub use events::ServiceEvent;
pub use events::StderrEventSink;
pub use service::CreatedRecord;
pub use service::KeyspaceReport;
pub use service::RecordError;
pub use service::RecordService;
pub use store::InMemoryKvStore;
pub use store::SharedKvStore;
