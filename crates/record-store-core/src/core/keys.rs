// crates/record-store-core/src/core/keys.rs
// ============================================================================
// Module: Record Store Key Builder
// Description: Namespaced storage keys derived from record identities.
// Purpose: Keep key derivation injective and collision-free.
// Dependencies: thiserror
// ============================================================================

//! ## Overview
//! Every stored key belongs to exactly one namespace: a record data key
//! (`record:{id}`), an access-key key (`record:{id}:accesskey`), or the
//! singleton counter key (`records:count`). Identities are validated before
//! any key is derived so a crafted identity cannot alias another entry.
//!
//! Security posture: identities are untrusted input; see
//! [`KeyBuilder::validate_id`].

// ============================================================================
// SECTION: Imports
// ============================================================================

use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Namespace separator between key segments.
pub const KEY_SEPARATOR: char = ':';
/// Prefix shared by data keys and access-key keys.
pub const RECORD_KEY_PREFIX: &str = "record";
/// Suffix marking an access-key key.
pub const ACCESS_KEY_SUFFIX: &str = "accesskey";
/// Singleton key holding the approximate record counter.
pub const RECORD_COUNT_KEY: &str = "records:count";
/// Identities that may never be used as a record identity.
pub const RESERVED_IDS: [&str; 2] = [ACCESS_KEY_SUFFIX, "count"];

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Identity validation failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeyError {
    /// Identity is empty.
    #[error("record id must be non-empty")]
    Empty,
    /// Identity contains the namespace separator.
    #[error("record id must not contain ':'")]
    ContainsSeparator,
    /// Identity has leading or trailing whitespace.
    #[error("record id must not have leading or trailing whitespace")]
    SurroundingWhitespace,
    /// Identity equals a reserved token.
    #[error("record id is reserved: {0}")]
    Reserved(String),
}

// ============================================================================
// SECTION: Key Builder
// ============================================================================

/// Stateless mapping from record identity to storage keys.
///
/// # Invariants
/// - For valid identities, data keys and access-key keys never collide with
///   each other, across identities, or with [`RECORD_COUNT_KEY`].
pub struct KeyBuilder;

impl KeyBuilder {
    /// Validates a record identity.
    ///
    /// # Errors
    ///
    /// Returns [`KeyError`] when the identity is empty, contains the
    /// separator, has surrounding whitespace, or equals a reserved token.
    pub fn validate_id(id: &str) -> Result<(), KeyError> {
        if id.is_empty() {
            return Err(KeyError::Empty);
        }
        if id.contains(KEY_SEPARATOR) {
            return Err(KeyError::ContainsSeparator);
        }
        if id.trim() != id {
            return Err(KeyError::SurroundingWhitespace);
        }
        if RESERVED_IDS.contains(&id) {
            return Err(KeyError::Reserved(id.to_string()));
        }
        Ok(())
    }

    /// Returns the data key for a record.
    ///
    /// # Errors
    ///
    /// Returns [`KeyError`] when the identity is invalid.
    pub fn for_record(id: &str) -> Result<String, KeyError> {
        Self::validate_id(id)?;
        Ok(format!("{RECORD_KEY_PREFIX}{KEY_SEPARATOR}{id}"))
    }

    /// Returns the access-key key for a record.
    ///
    /// # Errors
    ///
    /// Returns [`KeyError`] when the identity is invalid.
    pub fn for_access_key(id: &str) -> Result<String, KeyError> {
        Self::validate_id(id)?;
        Ok(format!("{RECORD_KEY_PREFIX}{KEY_SEPARATOR}{id}{KEY_SEPARATOR}{ACCESS_KEY_SUFFIX}"))
    }

    /// Returns the singleton counter key.
    #[must_use]
    pub const fn for_record_count() -> &'static str {
        RECORD_COUNT_KEY
    }

    /// Extracts the record identity from a data key or access-key key.
    ///
    /// Returns `None` for keys outside the record namespace or carrying an
    /// invalid identity.
    #[must_use]
    pub fn extract_record_id(key: &str) -> Option<&str> {
        let rest = key.strip_prefix(RECORD_KEY_PREFIX)?.strip_prefix(KEY_SEPARATOR)?;
        let id = match rest.split_once(KEY_SEPARATOR) {
            None => rest,
            Some((id, suffix)) if suffix == ACCESS_KEY_SUFFIX => id,
            Some(_) => return None,
        };
        Self::validate_id(id).ok()?;
        Some(id)
    }

    /// Returns true when `key` is a well-formed data key.
    #[must_use]
    pub fn is_record_key(key: &str) -> bool {
        Self::extract_record_id(key)
            .is_some_and(|id| key.len() == RECORD_KEY_PREFIX.len() + 1 + id.len())
    }

    /// Returns true when `key` is a well-formed access-key key.
    #[must_use]
    pub fn is_access_key_key(key: &str) -> bool {
        Self::extract_record_id(key).is_some() && !Self::is_record_key(key)
    }
}

#[cfg(test)]
mod tests;
