// crates/record-store-core/src/core/mod.rs
// ============================================================================
// Module: Record Store Core Types
// Description: Identifiers, storage keys, and record entities.
// Purpose: Group the pure, side-effect-free building blocks of the store.
// Dependencies: serde, serde_json, time, url
// ============================================================================

//! ## Overview
//! Core types never perform I/O. The record service composes them with the
//! storage and validation interfaces.

pub mod identifiers;
pub mod keys;
pub mod record;

pub use identifiers::ACCESS_KEY_LENGTH;
pub use identifiers::AccessKey;
pub use identifiers::AccessKeyError;
pub use identifiers::ID_ALPHABET;
pub use identifiers::MAX_ACCESS_KEY_LENGTH;
pub use identifiers::RECORD_ID_LENGTH;
pub use identifiers::RecordId;
pub use keys::KeyBuilder;
pub use keys::KeyError;
pub use record::JsonPatch;
pub use record::PatchError;
pub use record::Record;
pub use record::RecordMetadata;
pub use record::VisibilityMode;
