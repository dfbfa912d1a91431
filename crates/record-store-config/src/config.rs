// crates/record-store-config/src/config.rs
// ============================================================================
// Module: Record Store Configuration
// Description: Configuration loading and validation for the record store.
// Purpose: Provide strict, fail-closed config parsing with hard limits.
// Dependencies: record-store-schema, record-store-sqlite, serde, toml
// ============================================================================

//! ## Overview
//! Configuration is loaded from a TOML file with strict size and path limits.
//! An explicitly named file must exist; the default `record-store.toml` is
//! optional and built-in defaults apply when it is absent.
//! Security posture: config inputs are untrusted.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::env;
use std::fs;
use std::io::ErrorKind;
use std::net::SocketAddr;
use std::path::Path;
use std::path::PathBuf;
use std::time::Duration;

use record_store_schema::DEFAULT_MAX_CACHE_ENTRIES;
use record_store_schema::DEFAULT_TRUSTED_DOMAINS;
use record_store_schema::SchemaFetcherConfig;
use record_store_sqlite::SqliteJournalMode;
use record_store_sqlite::SqliteStoreConfig;
use record_store_sqlite::SqliteSyncMode;
use serde::Deserialize;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// File read from the working directory when no path is given.
pub const DEFAULT_CONFIG_NAME: &str = "record-store.toml";
/// Environment variable naming the config file.
pub const CONFIG_ENV_VAR: &str = "RECORD_STORE_CONFIG";
/// Largest config file accepted.
pub(crate) const MAX_CONFIG_FILE_SIZE: usize = 1024 * 1024;
/// Longest accepted path component.
pub(crate) const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Longest accepted path.
pub(crate) const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Default server bind address.
pub(crate) const DEFAULT_BIND: &str = "127.0.0.1:8787";
/// Default maximum request body size in bytes.
pub(crate) const DEFAULT_MAX_BODY_BYTES: usize = 1024 * 1024;
/// Maximum allowed request body size in bytes.
pub(crate) const MAX_MAX_BODY_BYTES: usize = 16 * 1024 * 1024;
/// Maximum number of allowed host entries.
pub(crate) const MAX_ALLOWED_HOSTS: usize = 64;
/// Maximum length of a single allowed host entry.
pub(crate) const MAX_HOST_LENGTH: usize = 253;
/// Default `SQLite` busy timeout in milliseconds.
pub(crate) const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;
/// Default schema fetch timeout in milliseconds.
pub(crate) const DEFAULT_SCHEMA_TIMEOUT_MS: u64 = 5_000;
/// Minimum schema fetch timeout in milliseconds.
pub(crate) const MIN_SCHEMA_TIMEOUT_MS: u64 = 100;
/// Maximum schema fetch timeout in milliseconds.
pub(crate) const MAX_SCHEMA_TIMEOUT_MS: u64 = 30_000;
/// Default schema cache TTL in seconds.
pub(crate) const DEFAULT_SCHEMA_CACHE_TTL_SECS: u64 = 300;
/// Maximum schema cache TTL in seconds.
pub(crate) const MAX_SCHEMA_CACHE_TTL_SECS: u64 = 86_400;
/// Default max schema size in bytes.
pub(crate) const DEFAULT_MAX_SCHEMA_BYTES: usize = 1024 * 1024;
/// Maximum allowed schema size in bytes.
pub(crate) const MAX_MAX_SCHEMA_BYTES: usize = 10 * 1024 * 1024;
/// Upper bound for `schema.max_cache_entries`.
pub(crate) const MAX_SCHEMA_CACHE_ENTRIES: usize = 4096;
/// Maximum number of trusted schema domains.
pub(crate) const MAX_TRUSTED_DOMAINS: usize = 64;

// ============================================================================
// SECTION: Configuration Types
// ============================================================================

/// Record store configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RecordStoreConfig {
    /// HTTP server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Key-value store backend configuration.
    #[serde(default)]
    pub store: StoreConfig,
    /// Schema fetch configuration.
    #[serde(default)]
    pub schema: SchemaConfig,
    /// Structured event logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl RecordStoreConfig {
    /// Loads and validates the config file.
    ///
    /// Resolution order is the explicit `path`, then [`CONFIG_ENV_VAR`],
    /// then [`DEFAULT_CONFIG_NAME`] in the working directory. Only the
    /// default file may be absent.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when loading or validation fails.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let (resolved, source) = resolve_path(path)?;
        validate_path(&resolved)?;
        let bytes = match fs::read(&resolved) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == ErrorKind::NotFound && source == PathSource::Default => {
                let mut config = Self::default();
                config.validate()?;
                return Ok(config);
            }
            Err(err) => {
                return Err(ConfigError::Io(format!("{}: {err}", resolved.display())));
            }
        };
        Self::from_bytes(&bytes)
    }

    /// Parses and validates configuration from raw file bytes.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the bytes exceed limits, are not UTF-8,
    /// fail to parse, or fail validation.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ConfigError> {
        if bytes.len() > MAX_CONFIG_FILE_SIZE {
            return Err(ConfigError::Invalid("config file larger than 1 MiB".to_string()));
        }
        let content = std::str::from_utf8(bytes)
            .map_err(|_| ConfigError::Invalid("config file must be utf-8".to_string()))?;
        let mut config: Self =
            toml::from_str(content).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Checks every section and normalizes host names.
    ///
    /// Host and domain lists are normalized in place.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when configuration is invalid.
    pub fn validate(&mut self) -> Result<(), ConfigError> {
        self.server.validate()?;
        self.store.validate()?;
        self.schema.validate()?;
        self.logging.validate()?;
        Ok(())
    }
}

/// HTTP server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Bind address for the HTTP listener.
    #[serde(default = "default_bind")]
    pub bind: String,
    /// Maximum request body size in bytes.
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
    /// Host header allow-list; empty allows every host.
    #[serde(default)]
    pub allowed_hosts: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            max_body_bytes: default_max_body_bytes(),
            allowed_hosts: Vec::new(),
        }
    }
}

impl ServerConfig {
    /// Returns the parsed bind address.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when the bind address is malformed.
    pub fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.bind
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid("server.bind is not a valid address".to_string()))
    }

    /// Validates and normalizes server configuration.
    fn validate(&mut self) -> Result<(), ConfigError> {
        self.bind_addr()?;
        if self.max_body_bytes == 0 || self.max_body_bytes > MAX_MAX_BODY_BYTES {
            return Err(ConfigError::Invalid(format!(
                "server.max_body_bytes must be between 1 and {MAX_MAX_BODY_BYTES}"
            )));
        }
        self.allowed_hosts = normalize_names("server.allowed_hosts", &self.allowed_hosts)?;
        if self.allowed_hosts.len() > MAX_ALLOWED_HOSTS {
            return Err(ConfigError::Invalid(format!(
                "server.allowed_hosts exceeds {MAX_ALLOWED_HOSTS} entries"
            )));
        }
        Ok(())
    }
}

/// Key-value store configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    /// Store backend type.
    #[serde(rename = "type", default)]
    pub store_type: StoreType,
    /// Database file; required for `type = "sqlite"`.
    #[serde(default)]
    pub path: Option<PathBuf>,
    /// Milliseconds to wait on a locked database.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
    /// Journal mode pragma.
    #[serde(default)]
    pub journal_mode: SqliteJournalMode,
    /// Synchronous pragma.
    #[serde(default)]
    pub sync_mode: SqliteSyncMode,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            store_type: StoreType::default(),
            path: None,
            busy_timeout_ms: default_busy_timeout_ms(),
            journal_mode: SqliteJournalMode::default(),
            sync_mode: SqliteSyncMode::default(),
        }
    }
}

impl StoreConfig {
    /// Returns the `SQLite` settings when the sqlite backend is selected.
    #[must_use]
    pub fn sqlite_config(&self) -> Option<SqliteStoreConfig> {
        match (self.store_type, &self.path) {
            (StoreType::Sqlite, Some(path)) => Some(SqliteStoreConfig {
                path: path.clone(),
                busy_timeout_ms: self.busy_timeout_ms,
                journal_mode: self.journal_mode,
                sync_mode: self.sync_mode,
            }),
            _ => None,
        }
    }

    /// Validates store configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        match self.store_type {
            StoreType::Memory => {
                if self.path.is_some() {
                    return Err(ConfigError::Invalid("memory store must not set path".to_string()));
                }
                Ok(())
            }
            StoreType::Sqlite => {
                let path = self.path.as_ref().ok_or_else(|| {
                    ConfigError::Invalid("sqlite store requires path".to_string())
                })?;
                validate_path_string("store.path", &path.to_string_lossy())?;
                if self.busy_timeout_ms == 0 {
                    return Err(ConfigError::Invalid(
                        "store.busy_timeout_ms must be greater than zero".to_string(),
                    ));
                }
                Ok(())
            }
        }
    }
}

/// Key-value store backend type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum StoreType {
    /// Process-local map; contents vanish on restart.
    #[default]
    Memory,
    /// Use the `SQLite`-backed durable store.
    Sqlite,
}

/// Schema fetch configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct SchemaConfig {
    /// Domains schemas may be fetched from; subdomains are included.
    #[serde(default = "default_trusted_domains")]
    pub trusted_domains: Vec<String>,
    /// Fetch timeout in milliseconds.
    #[serde(default = "default_schema_timeout_ms")]
    pub timeout_ms: u64,
    /// Cache TTL for fetched schemas in seconds.
    #[serde(default = "default_schema_cache_ttl_secs")]
    pub cache_ttl_secs: u64,
    /// Maximum schema document size in bytes.
    #[serde(default = "default_max_schema_bytes")]
    pub max_schema_bytes: usize,
    /// Maximum number of cached schemas; 0 disables the cache.
    #[serde(default = "default_max_cache_entries")]
    pub max_cache_entries: usize,
    /// Permit cleartext `http` schema URLs (local development only).
    #[serde(default)]
    pub allow_http: bool,
}

impl Default for SchemaConfig {
    fn default() -> Self {
        Self {
            trusted_domains: default_trusted_domains(),
            timeout_ms: default_schema_timeout_ms(),
            cache_ttl_secs: default_schema_cache_ttl_secs(),
            max_schema_bytes: default_max_schema_bytes(),
            max_cache_entries: default_max_cache_entries(),
            allow_http: false,
        }
    }
}

impl SchemaConfig {
    /// Builds the fetcher configuration for these settings.
    #[must_use]
    pub fn fetcher_config(&self) -> SchemaFetcherConfig {
        SchemaFetcherConfig {
            trusted_domains: self.trusted_domains.clone(),
            timeout: Duration::from_millis(self.timeout_ms),
            cache_ttl: Duration::from_secs(self.cache_ttl_secs),
            max_schema_bytes: self.max_schema_bytes,
            max_cache_entries: self.max_cache_entries,
            allow_http: self.allow_http,
            ..SchemaFetcherConfig::default()
        }
    }

    /// Validates and normalizes schema configuration.
    fn validate(&mut self) -> Result<(), ConfigError> {
        self.trusted_domains = normalize_names("schema.trusted_domains", &self.trusted_domains)?;
        if self.trusted_domains.is_empty() {
            return Err(ConfigError::Invalid(
                "schema.trusted_domains must not be empty".to_string(),
            ));
        }
        if self.trusted_domains.len() > MAX_TRUSTED_DOMAINS {
            return Err(ConfigError::Invalid(format!(
                "schema.trusted_domains exceeds {MAX_TRUSTED_DOMAINS} entries"
            )));
        }
        validate_timeout_range(
            "schema.timeout_ms",
            self.timeout_ms,
            MIN_SCHEMA_TIMEOUT_MS,
            MAX_SCHEMA_TIMEOUT_MS,
        )?;
        if self.cache_ttl_secs > MAX_SCHEMA_CACHE_TTL_SECS {
            return Err(ConfigError::Invalid(format!(
                "schema.cache_ttl_secs must not exceed {MAX_SCHEMA_CACHE_TTL_SECS}"
            )));
        }
        if self.max_schema_bytes == 0 || self.max_schema_bytes > MAX_MAX_SCHEMA_BYTES {
            return Err(ConfigError::Invalid(format!(
                "schema.max_schema_bytes must be between 1 and {MAX_MAX_SCHEMA_BYTES}"
            )));
        }
        if self.max_cache_entries > MAX_SCHEMA_CACHE_ENTRIES {
            return Err(ConfigError::Invalid(format!(
                "schema.max_cache_entries must not exceed {MAX_SCHEMA_CACHE_ENTRIES}"
            )));
        }
        Ok(())
    }
}

/// Structured event logging configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoggingConfig {
    /// Destination for JSON-line events.
    #[serde(default)]
    pub sink: LogSinkKind,
    /// Log file path when `sink = "file"`.
    #[serde(default)]
    pub path: Option<String>,
}

impl LoggingConfig {
    /// Validates logging configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        match (self.sink, &self.path) {
            (LogSinkKind::File, Some(path)) => validate_path_string("logging.path", path),
            (LogSinkKind::File, None) => {
                Err(ConfigError::Invalid("file logging sink requires path".to_string()))
            }
            (_, Some(_)) => {
                Err(ConfigError::Invalid("logging.path requires sink = \"file\"".to_string()))
            }
            (_, None) => Ok(()),
        }
    }
}

/// Logging sink selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LogSinkKind {
    /// Write events to stderr.
    #[default]
    Stderr,
    /// Append events to a file.
    File,
    /// Discard events.
    None,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Failures while reading or checking `record-store.toml`.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("config read failed: {0}")]
    Io(String),
    /// TOML parsing error.
    #[error("config is not valid toml: {0}")]
    Parse(String),
    /// A value is out of range or inconsistent.
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Where a resolved config path came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PathSource {
    /// Passed explicitly by the caller.
    Explicit,
    /// Read from [`CONFIG_ENV_VAR`].
    Environment,
    /// Fallback [`DEFAULT_CONFIG_NAME`].
    Default,
}

/// Picks the config file and remembers where the choice came from.
fn resolve_path(path: Option<&Path>) -> Result<(PathBuf, PathSource), ConfigError> {
    if let Some(path) = path {
        return Ok((path.to_path_buf(), PathSource::Explicit));
    }
    if let Ok(env_path) = env::var(CONFIG_ENV_VAR) {
        if env_path.len() > MAX_TOTAL_PATH_LENGTH {
            return Err(ConfigError::Invalid("config path longer than 4096 bytes".to_string()));
        }
        return Ok((PathBuf::from(env_path), PathSource::Environment));
    }
    Ok((PathBuf::from(DEFAULT_CONFIG_NAME), PathSource::Default))
}

/// Rejects overlong config paths before opening them.
fn validate_path(path: &Path) -> Result<(), ConfigError> {
    let text = path.to_string_lossy();
    if text.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid("config path longer than 4096 bytes".to_string()));
    }
    for component in path.components() {
        let value = component.as_os_str().to_string_lossy();
        if value.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid(
                "config path has a component longer than 255 bytes".to_string(),
            ));
        }
    }
    Ok(())
}

/// Rejects empty or overlong path strings.
fn validate_path_string(field: &str, value: &str) -> Result<(), ConfigError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::Invalid(format!("{field} must be non-empty")));
    }
    if trimmed.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid(format!("{field} exceeds max length")));
    }
    for component in Path::new(trimmed).components() {
        let component_value = component.as_os_str().to_string_lossy();
        if component_value.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid(format!("{field} path component too long")));
        }
    }
    Ok(())
}

/// Trims, lowercases, and deduplicates host-like names.
fn normalize_names(field: &str, names: &[String]) -> Result<Vec<String>, ConfigError> {
    let mut normalized = Vec::with_capacity(names.len());
    for name in names {
        let value = name.trim().trim_end_matches('.').to_ascii_lowercase();
        if value.is_empty() {
            return Err(ConfigError::Invalid(format!("{field} entries must be non-empty")));
        }
        if value.len() > MAX_HOST_LENGTH || value.chars().any(|ch| ch.is_whitespace() || ch == '/')
        {
            return Err(ConfigError::Invalid(format!("{field} contains an invalid entry")));
        }
        normalized.push(value);
    }
    normalized.sort();
    normalized.dedup();
    Ok(normalized)
}

/// Rejects millisecond values outside `min_ms..=max_ms`.
fn validate_timeout_range(
    field: &str,
    value_ms: u64,
    min_ms: u64,
    max_ms: u64,
) -> Result<(), ConfigError> {
    if value_ms < min_ms || value_ms > max_ms {
        return Err(ConfigError::Invalid(format!(
            "{field} must be between {min_ms} and {max_ms} milliseconds",
        )));
    }
    Ok(())
}

/// Default server bind address.
fn default_bind() -> String {
    DEFAULT_BIND.to_string()
}

/// Default maximum request body size.
const fn default_max_body_bytes() -> usize {
    DEFAULT_MAX_BODY_BYTES
}

/// Default `SQLite` busy timeout.
const fn default_busy_timeout_ms() -> u64 {
    DEFAULT_BUSY_TIMEOUT_MS
}

/// Default trusted schema domains.
fn default_trusted_domains() -> Vec<String> {
    DEFAULT_TRUSTED_DOMAINS.iter().map(ToString::to_string).collect()
}

/// Default schema fetch timeout.
const fn default_schema_timeout_ms() -> u64 {
    DEFAULT_SCHEMA_TIMEOUT_MS
}

/// Default schema cache TTL.
const fn default_schema_cache_ttl_secs() -> u64 {
    DEFAULT_SCHEMA_CACHE_TTL_SECS
}

/// Default max schema size.
const fn default_max_schema_bytes() -> usize {
    DEFAULT_MAX_SCHEMA_BYTES
}

/// Default schema cache capacity.
const fn default_max_cache_entries() -> usize {
    DEFAULT_MAX_CACHE_ENTRIES
}
