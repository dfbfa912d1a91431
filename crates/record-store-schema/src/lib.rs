// crates/record-store-schema/src/lib.rs
// ============================================================================
// Module: Record Store Schema Library
// Description: Embedded JSON Schema resolution and validation.
// Purpose: Validate record payloads against the schema they reference.
// Dependencies: jsonschema, reqwest, record-store-core
// ============================================================================

//! ## Overview
//! Records may reference their own JSON Schema through a `$schema` URL. This
//! crate fetches such schemas over HTTPS from an allow-listed set of domains,
//! caches successful responses for a bounded time, and validates payloads
//! with the draft the fetched schema declares.
//!
//! Security posture: schema URLs are client-supplied and are a
//! server-side-request-forgery vector. Scheme, credentials, host, size, and
//! redirects are all checked before a body is trusted, and fetched schemas
//! never trigger further network I/O through remote `$ref`s.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod fetcher;
pub mod validator;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use fetcher::DEFAULT_MAX_CACHE_ENTRIES;
pub use fetcher::DEFAULT_TRUSTED_DOMAINS;
pub use fetcher::FetchError;
pub use fetcher::SchemaFetcher;
pub use fetcher::SchemaFetcherConfig;
pub use validator::JsonSchemaValidator;
pub use validator::draft_for_schema;
pub use validator::is_meta_schema_url;
pub use validator::validate_against;
