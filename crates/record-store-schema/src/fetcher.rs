// crates/record-store-schema/src/fetcher.rs
// ============================================================================
// Module: Schema Fetcher
// Description: Bounded HTTPS retrieval of JSON Schemas with a TTL cache.
// Purpose: Resolve client-referenced schemas without SSRF exposure.
// Dependencies: reqwest, serde_json, url
// ============================================================================

//! ## Overview
//! [`SchemaFetcher`] issues GET requests for schema URLs that pass the
//! configured policy and keeps successful bodies in memory for `cache_ttl`.
//! Failures are never cached.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Mutex;
use std::time::Duration;
use std::time::Instant;

use reqwest::Client;
use reqwest::Response;
use reqwest::redirect::Policy;
use serde_json::Value;
use thiserror::Error;
use url::Url;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Domains trusted for schema retrieval when none are configured.
pub const DEFAULT_TRUSTED_DOMAINS: [&str; 5] = [
    "json-schema.org",
    "schemastore.org",
    "githubusercontent.com",
    "unpkg.com",
    "cdn.jsdelivr.net",
];

/// Default fetch timeout in milliseconds.
const DEFAULT_TIMEOUT_MS: u64 = 5_000;
/// Default cache time-to-live in seconds.
const DEFAULT_CACHE_TTL_SECS: u64 = 300;
/// Default maximum schema body size in bytes.
const DEFAULT_MAX_SCHEMA_BYTES: usize = 1024 * 1024;
/// Default number of schemas held in the cache.
pub const DEFAULT_MAX_CACHE_ENTRIES: usize = 256;

// ============================================================================
// SECTION: Configuration
// ============================================================================

/// Configuration for schema retrieval.
///
/// # Invariants
/// - `allow_http = false` blocks cleartext `http://` URLs.
/// - URL hosts must equal, or be a subdomain of, a `trusted_domains` entry.
/// - `max_schema_bytes` is a hard upper bound on response bodies.
/// - `timeout` applies to the full request lifecycle.
/// - The cache never holds more than `max_cache_entries` schemas; zero
///   disables caching.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaFetcherConfig {
    /// Trusted domains; subdomains are trusted too.
    pub trusted_domains: Vec<String>,
    /// Request timeout.
    pub timeout: Duration,
    /// Time-to-live for cached schemas.
    pub cache_ttl: Duration,
    /// Maximum response size allowed, in bytes.
    pub max_schema_bytes: usize,
    /// Maximum number of cached schemas.
    pub max_cache_entries: usize,
    /// Allow cleartext HTTP (local development only).
    pub allow_http: bool,
    /// User agent string for outbound requests.
    pub user_agent: String,
}

impl Default for SchemaFetcherConfig {
    fn default() -> Self {
        Self {
            trusted_domains: DEFAULT_TRUSTED_DOMAINS.iter().map(ToString::to_string).collect(),
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
            cache_ttl: Duration::from_secs(DEFAULT_CACHE_TTL_SECS),
            max_schema_bytes: DEFAULT_MAX_SCHEMA_BYTES,
            max_cache_entries: DEFAULT_MAX_CACHE_ENTRIES,
            allow_http: false,
            user_agent: concat!("record-store/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Schema retrieval failures.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Error)]
pub enum FetchError {
    /// URL violates the retrieval policy.
    #[error("schema url not allowed: {0}")]
    UrlNotAllowed(String),
    /// Request could not be completed.
    #[error("schema request failed: {0}")]
    Request(String),
    /// Server answered with a non-success status.
    #[error("schema request returned status {0}")]
    Status(u16),
    /// Response body exceeds the size limit.
    #[error("schema response exceeds {0} bytes")]
    TooLarge(usize),
    /// Response body is not JSON.
    #[error("schema response is not valid json: {0}")]
    InvalidBody(String),
    /// Fetcher configuration is invalid.
    #[error("schema fetcher configuration invalid: {0}")]
    Config(String),
}

// ============================================================================
// SECTION: Fetcher
// ============================================================================

/// Cached schema body.
struct CachedSchema {
    /// Time the schema was fetched.
    fetched_at: Instant,
    /// Parsed schema document.
    schema: Arc<Value>,
}

/// Policy-checked, caching schema fetcher.
///
/// # Invariants
/// - Redirects are not followed.
/// - Only 2xx JSON bodies within the size limit are cached.
pub struct SchemaFetcher {
    /// Retrieval policy and limits.
    config: SchemaFetcherConfig,
    /// HTTP client configured with timeout and redirect policy.
    client: Client,
    /// Cached schemas keyed by URL.
    cache: Mutex<HashMap<String, CachedSchema>>,
}

impl SchemaFetcher {
    /// Creates a fetcher with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Config`] when no trusted domain is configured or
    /// the HTTP client cannot be built.
    pub fn new(config: SchemaFetcherConfig) -> Result<Self, FetchError> {
        if config.trusted_domains.iter().all(|domain| normalize_host(domain).is_empty()) {
            return Err(FetchError::Config("trusted_domains must not be empty".to_string()));
        }
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.clone())
            .redirect(Policy::none())
            .build()
            .map_err(|err| FetchError::Config(format!("http client build failed: {err}")))?;
        Ok(Self {
            config,
            client,
            cache: Mutex::new(HashMap::new()),
        })
    }

    /// Returns the fetcher configuration.
    #[must_use]
    pub const fn config(&self) -> &SchemaFetcherConfig {
        &self.config
    }

    /// Fetches the schema at `url`, serving from cache when fresh.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError`] when the URL is not allowed, the request fails,
    /// the status is not 2xx, or the body is too large or not JSON.
    pub async fn fetch(&self, url: &Url) -> Result<Arc<Value>, FetchError> {
        validate_schema_url(url, &self.config)?;
        if let Some(schema) = self.cached(url.as_str()) {
            return Ok(schema);
        }
        let mut response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|err| FetchError::Request(err.without_url().to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }
        let body = read_response_limited(&mut response, self.config.max_schema_bytes).await?;
        let schema: Value = serde_json::from_slice(&body)
            .map_err(|err| FetchError::InvalidBody(err.to_string()))?;
        let schema = Arc::new(schema);
        self.insert(url.as_str(), Arc::clone(&schema));
        Ok(schema)
    }

    /// Returns a fresh cached schema, evicting it when expired.
    fn cached(&self, key: &str) -> Option<Arc<Value>> {
        let mut cache = self.cache.lock().ok()?;
        match cache.get(key) {
            Some(entry) if entry.fetched_at.elapsed() < self.config.cache_ttl => {
                Some(Arc::clone(&entry.schema))
            }
            Some(_) => {
                cache.remove(key);
                None
            }
            None => None,
        }
    }

    /// Stores a successfully fetched schema.
    ///
    /// Expired entries are dropped first; when the cache is still full the
    /// oldest entry is evicted.
    fn insert(&self, key: &str, schema: Arc<Value>) {
        let max_entries = self.config.max_cache_entries;
        if max_entries == 0 {
            return;
        }
        let Ok(mut cache) = self.cache.lock() else {
            return;
        };
        let ttl = self.config.cache_ttl;
        cache.retain(|_, entry| entry.fetched_at.elapsed() < ttl);
        while cache.len() >= max_entries && !cache.contains_key(key) {
            let oldest = cache
                .iter()
                .min_by_key(|(_, entry)| entry.fetched_at)
                .map(|(url, _)| url.clone());
            match oldest {
                Some(url) => {
                    cache.remove(&url);
                }
                None => break,
            }
        }
        cache.insert(
            key.to_string(),
            CachedSchema {
                fetched_at: Instant::now(),
                schema,
            },
        );
    }

    /// Returns the number of schemas currently cached.
    #[must_use]
    pub fn cache_len(&self) -> usize {
        self.cache.lock().map_or(0, |cache| cache.len())
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Validates URL scheme, credentials, and trusted-domain policy.
///
/// # Errors
///
/// Returns [`FetchError::UrlNotAllowed`] when any check fails.
pub fn validate_schema_url(url: &Url, config: &SchemaFetcherConfig) -> Result<(), FetchError> {
    match url.scheme() {
        "https" => {}
        "http" if config.allow_http => {}
        scheme => return Err(FetchError::UrlNotAllowed(format!("unsupported scheme {scheme}"))),
    }
    if !url.username().is_empty() || url.password().is_some() {
        return Err(FetchError::UrlNotAllowed("url credentials are not allowed".to_string()));
    }
    let host = url
        .host_str()
        .map(normalize_host)
        .ok_or_else(|| FetchError::UrlNotAllowed("url host required".to_string()))?;
    if !is_trusted_host(&host, &config.trusted_domains) {
        return Err(FetchError::UrlNotAllowed(format!("host {host} is not trusted")));
    }
    Ok(())
}

/// Returns true when `host` equals or is a subdomain of a trusted domain.
fn is_trusted_host(host: &str, trusted_domains: &[String]) -> bool {
    trusted_domains.iter().map(|domain| normalize_host(domain)).any(|domain| {
        !domain.is_empty()
            && (host == domain
                || host.strip_suffix(domain.as_str()).is_some_and(|rest| rest.ends_with('.')))
    })
}

/// Normalizes host labels for allow-list comparisons.
pub(crate) fn normalize_host(host: &str) -> String {
    let trimmed = host.trim().trim_end_matches('.');
    let trimmed =
        trimmed.strip_prefix('[').and_then(|inner| inner.strip_suffix(']')).unwrap_or(trimmed);
    trimmed.to_ascii_lowercase()
}

/// Reads the response body while enforcing a byte limit.
async fn read_response_limited(
    response: &mut Response,
    max_bytes: usize,
) -> Result<Vec<u8>, FetchError> {
    let max_bytes_u64 = u64::try_from(max_bytes).unwrap_or(u64::MAX);
    if let Some(expected) = response.content_length()
        && expected > max_bytes_u64
    {
        return Err(FetchError::TooLarge(max_bytes));
    }
    let mut buf = Vec::new();
    while let Some(chunk) =
        response.chunk().await.map_err(|err| FetchError::Request(err.to_string()))?
    {
        if buf.len().saturating_add(chunk.len()) > max_bytes {
            return Err(FetchError::TooLarge(max_bytes));
        }
        buf.extend_from_slice(&chunk);
    }
    Ok(buf)
}
