//! Section validation tests for record-store-config.
// crates/record-store-config/tests/section_validation.rs
// =============================================================================
// Module: Section Validation Tests
// Description: Validate per-section constraints.
// Purpose: Ensure invalid server, store, schema, and logging settings fail.
// =============================================================================

use std::path::PathBuf;

use record_store_config::LogSinkKind;
use record_store_config::StoreType;

mod common;

use common::TestResult;
use common::assert_invalid;

#[test]
fn server_rejects_bad_bind() -> TestResult {
    let mut config = common::minimal_config().map_err(|err| err.to_string())?;
    config.server.bind = "not-an-address".to_string();
    assert_invalid(config.validate(), "server.bind")
}

#[test]
fn server_body_limit_is_bounded() -> TestResult {
    let mut config = common::minimal_config().map_err(|err| err.to_string())?;
    config.server.max_body_bytes = 0;
    assert_invalid(config.validate(), "server.max_body_bytes")?;
    config.server.max_body_bytes = 16 * 1024 * 1024 + 1;
    assert_invalid(config.validate(), "server.max_body_bytes")?;
    config.server.max_body_bytes = 16 * 1024 * 1024;
    config.validate().map_err(|err| err.to_string())
}

#[test]
fn server_rejects_blank_or_malformed_hosts() -> TestResult {
    let mut config = common::minimal_config().map_err(|err| err.to_string())?;
    config.server.allowed_hosts = vec!["  ".to_string()];
    assert_invalid(config.validate(), "must be non-empty")?;
    config.server.allowed_hosts = vec!["example.com/path".to_string()];
    assert_invalid(config.validate(), "invalid entry")
}

#[test]
fn memory_store_rejects_path() -> TestResult {
    let mut config = common::minimal_config().map_err(|err| err.to_string())?;
    config.store.path = Some(PathBuf::from("records.db"));
    assert_invalid(config.validate(), "memory store must not set path")
}

#[test]
fn sqlite_store_requires_path() -> TestResult {
    let mut config = common::minimal_config().map_err(|err| err.to_string())?;
    config.store.store_type = StoreType::Sqlite;
    assert_invalid(config.validate(), "sqlite store requires path")?;
    config.store.path = Some(PathBuf::from("records.db"));
    config.store.busy_timeout_ms = 0;
    assert_invalid(config.validate(), "busy_timeout_ms")
}

#[test]
fn schema_requires_trusted_domains() -> TestResult {
    let mut config = common::minimal_config().map_err(|err| err.to_string())?;
    config.schema.trusted_domains.clear();
    assert_invalid(config.validate(), "schema.trusted_domains must not be empty")
}

#[test]
fn schema_timeout_is_bounded() -> TestResult {
    let mut config = common::minimal_config().map_err(|err| err.to_string())?;
    config.schema.timeout_ms = 99;
    assert_invalid(config.validate(), "between 100 and 30000")?;
    config.schema.timeout_ms = 30_001;
    assert_invalid(config.validate(), "between 100 and 30000")
}

#[test]
fn schema_size_limit_is_bounded() -> TestResult {
    let mut config = common::minimal_config().map_err(|err| err.to_string())?;
    config.schema.max_schema_bytes = 0;
    assert_invalid(config.validate(), "schema.max_schema_bytes")
}

#[test]
fn schema_cache_capacity_is_bounded() -> TestResult {
    let mut config = common::minimal_config().map_err(|err| err.to_string())?;
    config.schema.max_cache_entries = 0;
    config.validate().map_err(|err| err.to_string())?;
    if config.schema.fetcher_config().max_cache_entries != 0 {
        return Err("cache capacity not forwarded to fetcher".to_string());
    }
    config.schema.max_cache_entries = 4097;
    assert_invalid(config.validate(), "schema.max_cache_entries")
}

#[test]
fn file_logging_requires_path() -> TestResult {
    let mut config = common::minimal_config().map_err(|err| err.to_string())?;
    config.logging.sink = LogSinkKind::File;
    assert_invalid(config.validate(), "file logging sink requires path")?;
    config.logging.sink = LogSinkKind::None;
    config.logging.path = Some("events.jsonl".to_string());
    assert_invalid(config.validate(), "logging.path requires sink")
}
