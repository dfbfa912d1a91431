// crates/record-store-schema/src/validator.rs
// ============================================================================
// Module: JSON Schema Validator
// Description: Record validation against fetched, draft-aware schemas.
// Purpose: Implement the core schema-validator interface.
// Dependencies: async-trait, jsonschema, record-store-core
// ============================================================================

//! ## Overview
//! Records without a `$schema` URL, or whose `$schema` is a json-schema.org
//! meta-schema, are accepted without any fetch. Otherwise the referenced
//! schema is fetched and compiled with the draft named by its own
//! `$schema`, defaulting to 2020-12.

// ============================================================================
// SECTION: Imports
// ============================================================================

use async_trait::async_trait;
use jsonschema::Draft;
use record_store_core::Record;
use record_store_core::SchemaError;
use record_store_core::SchemaValidator;
use serde_json::Value;
use url::Url;

use crate::fetcher::FetchError;
use crate::fetcher::SchemaFetcher;
use crate::fetcher::SchemaFetcherConfig;
use crate::fetcher::normalize_host;

// ============================================================================
// SECTION: Validator
// ============================================================================

/// Schema validator backed by a [`SchemaFetcher`].
pub struct JsonSchemaValidator {
    /// Policy-checked schema fetcher.
    fetcher: SchemaFetcher,
}

impl JsonSchemaValidator {
    /// Creates a validator with a new fetcher.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError`] when the fetcher configuration is invalid.
    pub fn new(config: SchemaFetcherConfig) -> Result<Self, FetchError> {
        Ok(Self::from_fetcher(SchemaFetcher::new(config)?))
    }

    /// Wraps an existing fetcher.
    #[must_use]
    pub const fn from_fetcher(fetcher: SchemaFetcher) -> Self {
        Self {
            fetcher,
        }
    }
}

#[async_trait]
impl SchemaValidator for JsonSchemaValidator {
    async fn validate(&self, record: &Record) -> Result<(), SchemaError> {
        let Some(url) = record.schema_url() else {
            return Ok(());
        };
        if is_meta_schema_url(&url) {
            return Ok(());
        }
        let schema = self
            .fetcher
            .fetch(&url)
            .await
            .map_err(|err| SchemaError::FetchFailed(err.to_string()))?;
        validate_against(&schema, &record.data)
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Returns true for json-schema.org draft meta-schema URLs.
#[must_use]
pub fn is_meta_schema_url(url: &Url) -> bool {
    url.host_str().is_some_and(|host| normalize_host(host) == "json-schema.org")
        && url.path().starts_with("/draft")
}

/// Resolves the draft a schema declares through its own `$schema`.
#[must_use]
pub fn draft_for_schema(schema: &Value) -> Draft {
    let Some(uri) = schema.get("$schema").and_then(Value::as_str) else {
        return Draft::Draft202012;
    };
    let trimmed = uri.trim().trim_end_matches('#');
    let location = trimmed
        .strip_prefix("https://")
        .or_else(|| trimmed.strip_prefix("http://"))
        .unwrap_or(trimmed);
    match location {
        "json-schema.org/draft-04/schema" => Draft::Draft4,
        "json-schema.org/draft-06/schema" => Draft::Draft6,
        "json-schema.org/draft-07/schema" => Draft::Draft7,
        "json-schema.org/draft/2019-09/schema" => Draft::Draft201909,
        _ => Draft::Draft202012,
    }
}

/// Validates `instance` against `schema`.
///
/// # Errors
///
/// Returns [`SchemaError::FetchFailed`] when the schema does not compile and
/// [`SchemaError::Violation`] with every validation message otherwise.
pub fn validate_against(schema: &Value, instance: &Value) -> Result<(), SchemaError> {
    let validator = jsonschema::options()
        .with_draft(draft_for_schema(schema))
        .build(schema)
        .map_err(|err| SchemaError::FetchFailed(format!("schema compilation failed: {err}")))?;
    let errors: Vec<String> = validator.iter_errors(instance).map(|err| err.to_string()).collect();
    if errors.is_empty() {
        Ok(())
    } else {
        Err(SchemaError::Violation {
            errors,
        })
    }
}
