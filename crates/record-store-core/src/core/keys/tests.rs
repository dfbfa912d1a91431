// crates/record-store-core/src/core/keys/tests.rs
// ============================================================================
// Module: Key Builder Tests
// Description: Unit tests for key derivation and inverse mapping.
// Purpose: Validate identity rejection and key classification.
// Dependencies: record-store-core
// ============================================================================

//! ## Overview
//! Covers identity validation and the key classification helpers.

#![allow(
    clippy::expect_used,
    clippy::unwrap_used,
    clippy::panic,
    reason = "Test-only assertions use unwrap/expect for clarity."
)]

use super::KeyBuilder;
use super::KeyError;
use super::RECORD_COUNT_KEY;

#[test]
fn derives_namespaced_keys() {
    assert_eq!(KeyBuilder::for_record("abc").unwrap(), "record:abc");
    assert_eq!(KeyBuilder::for_access_key("abc").unwrap(), "record:abc:accesskey");
    assert_eq!(KeyBuilder::for_record_count(), RECORD_COUNT_KEY);
}

#[test]
fn validate_id_rejects_collision_prone_identities() {
    assert_eq!(KeyBuilder::validate_id(""), Err(KeyError::Empty));
    assert_eq!(KeyBuilder::validate_id("a:b"), Err(KeyError::ContainsSeparator));
    assert_eq!(KeyBuilder::validate_id(" abc"), Err(KeyError::SurroundingWhitespace));
    assert_eq!(KeyBuilder::validate_id("abc\n"), Err(KeyError::SurroundingWhitespace));
    assert_eq!(
        KeyBuilder::validate_id("accesskey"),
        Err(KeyError::Reserved("accesskey".to_string()))
    );
    assert_eq!(KeyBuilder::validate_id("count"), Err(KeyError::Reserved("count".to_string())));
}

#[test]
fn key_derivation_rejects_invalid_identity_before_formatting() {
    assert!(KeyBuilder::for_record("x:accesskey").is_err());
    assert!(KeyBuilder::for_access_key("count").is_err());
}

#[test]
fn extract_record_id_inverts_derivation() {
    let data = KeyBuilder::for_record("Abc123").unwrap();
    let access = KeyBuilder::for_access_key("Abc123").unwrap();
    assert_eq!(KeyBuilder::extract_record_id(&data), Some("Abc123"));
    assert_eq!(KeyBuilder::extract_record_id(&access), Some("Abc123"));
}

#[test]
fn extract_record_id_returns_none_for_malformed_keys() {
    assert_eq!(KeyBuilder::extract_record_id(RECORD_COUNT_KEY), None);
    assert_eq!(KeyBuilder::extract_record_id("record:"), None);
    assert_eq!(KeyBuilder::extract_record_id("record:abc:other"), None);
    assert_eq!(KeyBuilder::extract_record_id("record:abc:accesskey:x"), None);
    assert_eq!(KeyBuilder::extract_record_id("other:abc"), None);
    assert_eq!(KeyBuilder::extract_record_id("record:count"), None);
}

#[test]
fn classifies_record_and_access_key_keys() {
    assert!(KeyBuilder::is_record_key("record:abc"));
    assert!(!KeyBuilder::is_access_key_key("record:abc"));
    assert!(KeyBuilder::is_access_key_key("record:abc:accesskey"));
    assert!(!KeyBuilder::is_record_key("record:abc:accesskey"));
    assert!(!KeyBuilder::is_record_key(RECORD_COUNT_KEY));
    assert!(!KeyBuilder::is_access_key_key(RECORD_COUNT_KEY));
}
