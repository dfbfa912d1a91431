// crates/record-store-http/src/access.rs
// ============================================================================
// Module: Access Key Enforcement
// Description: Access-key extraction, comparison, and per-record checks.
// Purpose: Gate record routes on the key bound to each record.
// Dependencies: axum, record-store-core, subtle
// ============================================================================

//! ## Overview
//! Clients present a key through `X-Access-Key` or `Authorization: Bearer`.
//! A missing key is 401, a record without a stored key is 404, and a
//! mismatch is 401. Comparison is constant-time in the key bytes.
//! Publicly readable records skip the check on read routes only.

// ============================================================================
// SECTION: Imports
// ============================================================================

use axum::http::HeaderMap;
use axum::http::header::AUTHORIZATION;
use record_store_core::AccessKey;
use record_store_core::RecordId;
use record_store_core::RecordMetadata;
use record_store_core::RecordService;
use subtle::ConstantTimeEq;

use crate::error::ApiError;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Header carrying the access key.
pub const ACCESS_KEY_HEADER: &str = "x-access-key";
/// Header carrying the record identity on creation.
pub const RECORD_ID_HEADER: &str = "x-record-id";
/// Authorization scheme accepted as an access-key carrier.
const BEARER_SCHEME: &str = "bearer";

// ============================================================================
// SECTION: Extraction
// ============================================================================

/// Returns the access key presented in `headers`, if any.
///
/// `X-Access-Key` wins over `Authorization: Bearer`. Empty values count as
/// absent.
#[must_use]
pub fn presented_access_key(headers: &HeaderMap) -> Option<&str> {
    let direct = headers
        .get(ACCESS_KEY_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty());
    direct.or_else(|| {
        let value = headers.get(AUTHORIZATION)?.to_str().ok()?.trim();
        let (scheme, token) = value.split_once(' ')?;
        let token = token.trim();
        (scheme.eq_ignore_ascii_case(BEARER_SCHEME) && !token.is_empty()).then_some(token)
    })
}

/// Compares a presented key with the stored key in constant time.
#[must_use]
pub fn keys_match(presented: &str, stored: &AccessKey) -> bool {
    presented.as_bytes().ct_eq(stored.as_str().as_bytes()).into()
}

// ============================================================================
// SECTION: Authorization
// ============================================================================

/// Access rule applied by a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum AccessRule {
    /// A matching key is always required.
    KeyRequired,
    /// Publicly readable records need no key.
    PublicRead,
}

/// Authorizes a request against the key stored for `id`.
///
/// Returns the metadata loaded while checking public visibility so read
/// routes can reuse it.
pub(crate) async fn authorize(
    service: &RecordService,
    id: &RecordId,
    headers: &HeaderMap,
    rule: AccessRule,
) -> Result<Option<RecordMetadata>, ApiError> {
    let metadata = match rule {
        AccessRule::KeyRequired => None,
        AccessRule::PublicRead => {
            let metadata = service.get_metadata(id).await?;
            if metadata.as_ref().is_some_and(RecordMetadata::is_public_read) {
                return Ok(metadata);
            }
            metadata
        }
    };
    let presented = presented_access_key(headers)
        .ok_or_else(|| ApiError::unauthorized("access key is required"))?;
    let stored = service.get_access_key(id).await?.ok_or_else(ApiError::not_found)?;
    if !keys_match(presented, &stored) {
        return Err(ApiError::unauthorized("invalid access key"));
    }
    Ok(metadata)
}
