// crates/record-store-core/src/core/identifiers/tests.rs
// ============================================================================
// Module: Identifier Tests
// Description: Unit tests for identifier generation and access-key parsing.
// Purpose: Validate alphabet, lengths, and access-key rejection paths.
// Dependencies: record-store-core
// ============================================================================

//! ## Overview
//! Exercises random generation and client-supplied access-key validation.

#![allow(
    clippy::expect_used,
    clippy::unwrap_used,
    clippy::panic,
    clippy::use_debug,
    reason = "Test-only assertions use unwrap/expect for clarity."
)]

use super::ACCESS_KEY_LENGTH;
use super::AccessKey;
use super::AccessKeyError;
use super::ID_ALPHABET;
use super::MAX_ACCESS_KEY_LENGTH;
use super::RECORD_ID_LENGTH;
use super::RecordId;

#[test]
fn generated_record_ids_use_alphabet_and_length() {
    for _ in 0..64 {
        let id = RecordId::generate();
        assert_eq!(id.as_str().len(), RECORD_ID_LENGTH);
        assert!(id.as_str().bytes().all(|byte| ID_ALPHABET.contains(&byte)));
    }
}

#[test]
fn generated_record_ids_are_distinct() {
    let first = RecordId::generate();
    let second = RecordId::generate();
    assert_ne!(first, second);
}

#[test]
fn generated_access_keys_use_alphabet_and_length() {
    let key = AccessKey::generate();
    assert_eq!(key.as_str().len(), ACCESS_KEY_LENGTH);
    assert!(key.as_str().bytes().all(|byte| ID_ALPHABET.contains(&byte)));
}

#[test]
fn access_key_debug_is_redacted() {
    let key = AccessKey::parse("super-secret").unwrap();
    let rendered = format!("{key:?}");
    assert!(!rendered.contains("super-secret"));
}

#[test]
fn access_key_parse_rejects_malformed_values() {
    assert_eq!(AccessKey::parse("").unwrap_err(), AccessKeyError::Empty);
    assert_eq!(
        AccessKey::parse("a".repeat(MAX_ACCESS_KEY_LENGTH + 1)).unwrap_err(),
        AccessKeyError::TooLong
    );
    assert_eq!(AccessKey::parse("has space").unwrap_err(), AccessKeyError::InvalidCharacters);
    assert_eq!(AccessKey::parse("tab\there").unwrap_err(), AccessKeyError::InvalidCharacters);
    assert_eq!(AccessKey::parse("nul\u{0}").unwrap_err(), AccessKeyError::InvalidCharacters);
}

#[test]
fn access_key_parse_accepts_bounded_values() {
    let key = AccessKey::parse("a".repeat(MAX_ACCESS_KEY_LENGTH)).unwrap();
    assert_eq!(key.as_str().len(), MAX_ACCESS_KEY_LENGTH);
    assert_eq!(AccessKey::parse("my-key_01").unwrap().as_str(), "my-key_01");
}
