// crates/record-store-core/src/core/identifiers.rs
// ============================================================================
// Module: Record Store Identifiers
// Description: Record identities and access-key secrets.
// Purpose: Provide strongly typed, serializable IDs with random generation.
// Dependencies: rand, serde, thiserror
// ============================================================================

//! ## Overview
//! Record identifiers are opaque strings. Generated identifiers and access
//! keys are drawn from an OS CSPRNG over an alphabet without look-alike
//! characters. Key-namespace validation of identifiers lives in
//! [`crate::core::keys`]; this module only wraps and generates values.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use rand::Rng;
use rand::rngs::OsRng;
use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Alphabet used for generated identifiers and access keys.
pub const ID_ALPHABET: &[u8] = b"346789ABCDEFGHJKLMNPQRTUVWXYabcdefghijkmnpqrtwxyz";
/// Length of generated record identifiers.
pub const RECORD_ID_LENGTH: usize = 16;
/// Length of generated access keys.
pub const ACCESS_KEY_LENGTH: usize = 24;
/// Maximum accepted length of a client-supplied access key, in bytes.
pub const MAX_ACCESS_KEY_LENGTH: usize = 256;

// ============================================================================
// SECTION: Record Identifier
// ============================================================================

/// Record identifier.
///
/// # Invariants
/// - Generated identifiers always pass [`crate::KeyBuilder::validate_id`].
/// - Identifiers built from untrusted input are validated when a storage key
///   is derived, not on construction.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(String);

impl RecordId {
    /// Creates a record identifier from an existing value.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generates a fresh random record identifier.
    #[must_use]
    pub fn generate() -> Self {
        Self(random_token(RECORD_ID_LENGTH))
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for RecordId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for RecordId {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

// ============================================================================
// SECTION: Access Key
// ============================================================================

/// Errors raised for malformed client-supplied access keys.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AccessKeyError {
    /// Access key is empty.
    #[error("access key must be non-empty")]
    Empty,
    /// Access key exceeds the length limit.
    #[error("access key exceeds 256 bytes")]
    TooLong,
    /// Access key contains whitespace or control characters.
    #[error("access key contains whitespace or control characters")]
    InvalidCharacters,
}

/// Secret bound one-to-one to a record.
///
/// # Invariants
/// - The secret never appears in `Debug` output.
/// - Values built with [`AccessKey::parse`] are non-empty, bounded, and free
///   of whitespace and control characters.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessKey(String);

impl AccessKey {
    /// Generates a fresh random access key.
    #[must_use]
    pub fn generate() -> Self {
        Self(random_token(ACCESS_KEY_LENGTH))
    }

    /// Parses a client-supplied access key.
    ///
    /// # Errors
    ///
    /// Returns [`AccessKeyError`] when the key is empty, too long, or contains
    /// whitespace or control characters.
    pub fn parse(value: impl Into<String>) -> Result<Self, AccessKeyError> {
        let value = value.into();
        if value.is_empty() {
            return Err(AccessKeyError::Empty);
        }
        if value.len() > MAX_ACCESS_KEY_LENGTH {
            return Err(AccessKeyError::TooLong);
        }
        if value.chars().any(|ch| ch.is_whitespace() || ch.is_control()) {
            return Err(AccessKeyError::InvalidCharacters);
        }
        Ok(Self(value))
    }

    /// Wraps an access key read back from storage without re-validating it.
    #[must_use]
    pub const fn from_stored(value: String) -> Self {
        Self(value)
    }

    /// Returns the secret as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AccessKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessKey(<redacted>)")
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Draws a random token of `length` characters from [`ID_ALPHABET`].
fn random_token(length: usize) -> String {
    let mut rng = OsRng;
    (0..length)
        .map(|_| {
            let index = rng.gen_range(0..ID_ALPHABET.len());
            char::from(ID_ALPHABET[index])
        })
        .collect()
}

#[cfg(test)]
mod tests;
