// crates/record-store-sqlite/src/lib.rs
// ============================================================================
// Module: SQLite Key-Value Store
// Description: Durable KvStore backend using SQLite WAL.
// Purpose: Provide production persistence for the record service.
// Dependencies: record-store-core, rusqlite
// ============================================================================

//! ## Overview
//! This crate provides a SQLite-backed [`record_store_core::KvStore`]
//! implementation. Each key holds one value blob and optional JSON metadata,
//! replaced together on every put. Security posture: database contents are
//! untrusted and decoded fail-closed.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod store;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use store::MAX_VALUE_BYTES;
pub use store::SqliteJournalMode;
pub use store::SqliteKvStore;
pub use store::SqliteStoreConfig;
pub use store::SqliteStoreError;
pub use store::SqliteSyncMode;
