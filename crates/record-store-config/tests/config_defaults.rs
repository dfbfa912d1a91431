//! Config defaults and load resolution tests for record-store-config.
// crates/record-store-config/tests/config_defaults.rs
// =============================================================================
// Module: Config Defaults and Load Tests
// Description: Validate default values and file loading limits.
// Purpose: Ensure an empty config is usable and loading fails closed.
// =============================================================================

use std::path::Path;
use std::time::Duration;

use record_store_config::ConfigError;
use record_store_config::LogSinkKind;
use record_store_config::RecordStoreConfig;
use record_store_config::StoreType;
use tempfile::TempDir;

mod common;

use common::TestResult;
use common::assert_invalid;

#[test]
fn empty_config_uses_documented_defaults() -> TestResult {
    let mut config = common::minimal_config().map_err(|err| err.to_string())?;
    config.validate().map_err(|err| err.to_string())?;
    if config.server.bind != "127.0.0.1:8787" {
        return Err(format!("unexpected bind {}", config.server.bind));
    }
    if config.server.max_body_bytes != 1024 * 1024 || !config.server.allowed_hosts.is_empty() {
        return Err("unexpected server defaults".to_string());
    }
    if config.store.store_type != StoreType::Memory || config.store.sqlite_config().is_some() {
        return Err("store should default to memory".to_string());
    }
    if config.logging.sink != LogSinkKind::Stderr {
        return Err("logging should default to stderr".to_string());
    }
    let fetcher = config.schema.fetcher_config();
    if fetcher.timeout != Duration::from_secs(5)
        || fetcher.cache_ttl != Duration::from_secs(300)
        || fetcher.max_cache_entries != 256
        || fetcher.allow_http
        || !fetcher.trusted_domains.iter().any(|domain| domain == "json-schema.org")
    {
        return Err("unexpected schema fetcher defaults".to_string());
    }
    Ok(())
}

#[test]
fn full_config_parses_every_section() -> TestResult {
    let dir = TempDir::new().map_err(|err| err.to_string())?;
    let path = dir.path().join("record-store.toml");
    std::fs::write(
        &path,
        r#"
[server]
bind = "0.0.0.0:9000"
max_body_bytes = 2048
allowed_hosts = ["Records.Example.COM.", "records.example.com"]

[store]
type = "sqlite"
path = "data/records.db"
journal_mode = "delete"
sync_mode = "normal"

[schema]
trusted_domains = ["schemas.example.com"]
timeout_ms = 250
cache_ttl_secs = 0
allow_http = true

[logging]
sink = "file"
path = "logs/events.jsonl"
"#,
    )
    .map_err(|err| err.to_string())?;
    let config = RecordStoreConfig::load(Some(&path)).map_err(|err| err.to_string())?;
    if config.server.allowed_hosts != vec!["records.example.com".to_string()] {
        return Err(format!("hosts not normalized: {}", config.server.allowed_hosts.join(",")));
    }
    let sqlite = config.store.sqlite_config().ok_or("sqlite config missing")?;
    if sqlite.path != Path::new("data/records.db") || sqlite.busy_timeout_ms != 5_000 {
        return Err("unexpected sqlite settings".to_string());
    }
    let fetcher = config.schema.fetcher_config();
    if fetcher.timeout != Duration::from_millis(250) || !fetcher.allow_http {
        return Err("unexpected schema settings".to_string());
    }
    if config.logging.sink != LogSinkKind::File {
        return Err("expected file sink".to_string());
    }
    Ok(())
}

#[test]
fn explicit_missing_file_is_an_io_error() -> TestResult {
    let dir = TempDir::new().map_err(|err| err.to_string())?;
    match RecordStoreConfig::load(Some(&dir.path().join("absent.toml"))) {
        Err(ConfigError::Io(_)) => Ok(()),
        Err(other) => Err(format!("unexpected error: {other}")),
        Ok(_) => Err("missing explicit config must fail".to_string()),
    }
}

#[test]
fn oversized_config_is_rejected() -> TestResult {
    let bytes = vec![b'#'; 1024 * 1024 + 1];
    assert_invalid(RecordStoreConfig::from_bytes(&bytes), "larger than 1 MiB")
}

#[test]
fn non_utf8_config_is_rejected() -> TestResult {
    assert_invalid(RecordStoreConfig::from_bytes(&[0xff, 0xfe]), "must be utf-8")
}

#[test]
fn malformed_toml_is_a_parse_error() -> TestResult {
    match RecordStoreConfig::from_bytes(b"[server\nbind = 1") {
        Err(ConfigError::Parse(_)) => Ok(()),
        Err(other) => Err(format!("unexpected error: {other}")),
        Ok(_) => Err("malformed toml must fail".to_string()),
    }
}

#[test]
fn overlong_config_path_is_rejected() -> TestResult {
    let long = "a".repeat(300);
    assert_invalid(
        RecordStoreConfig::load(Some(Path::new(&long))),
        "component longer than 255 bytes",
    )
}
