// crates/record-store-http/src/audit.rs
// ============================================================================
// Module: Request Audit Logging
// Description: Structured audit events for HTTP request handling.
// Purpose: Emit one redacted JSON-line event per request.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! Audit events describe who touched which route and how it ended. They
//! carry the record identity when known but never access keys or payloads.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io;
use std::io::Write;
use std::path::Path;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use record_store_core::LogFile;
use serde::Serialize;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Coarse request outcome classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestOutcome {
    /// 1xx-3xx response.
    Success,
    /// 4xx response.
    Rejected,
    /// 5xx response.
    Failed,
}

impl RequestOutcome {
    /// Classifies a response status code.
    #[must_use]
    pub const fn from_status(status: u16) -> Self {
        match status {
            500.. => Self::Failed,
            400..=499 => Self::Rejected,
            _ => Self::Success,
        }
    }
}

/// HTTP request audit event payload.
#[derive(Debug, Clone, Serialize)]
pub struct RequestAuditEvent {
    /// Event identifier.
    pub event: &'static str,
    /// Event timestamp (milliseconds since epoch).
    pub timestamp_ms: u128,
    /// HTTP method.
    pub method: String,
    /// Route template the request matched.
    pub route: &'static str,
    /// Record identity when the route names one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record_id: Option<String>,
    /// Response status code.
    pub status: u16,
    /// Outcome classification.
    pub outcome: RequestOutcome,
    /// Normalized error kind label.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<&'static str>,
}

/// Inputs required to construct a request audit event.
pub struct RequestAuditParams {
    /// HTTP method.
    pub method: String,
    /// Route template the request matched.
    pub route: &'static str,
    /// Record identity when the route names one.
    pub record_id: Option<String>,
    /// Response status code.
    pub status: u16,
    /// Normalized error kind label.
    pub error_kind: Option<&'static str>,
}

impl RequestAuditEvent {
    /// Creates a new audit event with a consistent timestamp.
    #[must_use]
    pub fn new(params: RequestAuditParams) -> Self {
        let timestamp_ms =
            SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_millis();
        Self {
            event: "record_request",
            timestamp_ms,
            method: params.method,
            route: params.route,
            record_id: params.record_id,
            status: params.status,
            outcome: RequestOutcome::from_status(params.status),
            error_kind: params.error_kind,
        }
    }
}

// ============================================================================
// SECTION: Trait
// ============================================================================

/// Audit sink for HTTP request events.
pub trait AuditSink: Send + Sync {
    /// Record an audit event.
    fn record(&self, event: &RequestAuditEvent);
}

/// Audit sink that logs JSON lines to stderr.
pub struct StderrAuditSink;

impl AuditSink for StderrAuditSink {
    fn record(&self, event: &RequestAuditEvent) {
        if let Ok(payload) = serde_json::to_string(event) {
            let _ = writeln!(std::io::stderr(), "{payload}");
        }
    }
}

/// Audit sink that logs JSON lines to a file.
pub struct FileAuditSink {
    /// Destination log, possibly shared with the service event sink.
    log: LogFile,
}

impl FileAuditSink {
    /// Opens the audit log file in append mode.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened.
    pub fn new(path: &Path) -> io::Result<Self> {
        Ok(Self::with_log(LogFile::open(path)?))
    }

    /// Writes to an already opened log.
    #[must_use]
    pub const fn with_log(log: LogFile) -> Self {
        Self {
            log,
        }
    }
}

impl AuditSink for FileAuditSink {
    fn record(&self, event: &RequestAuditEvent) {
        self.log.append_json(event);
    }
}

/// No-op audit sink.
pub struct NoopAuditSink;

impl AuditSink for NoopAuditSink {
    fn record(&self, _event: &RequestAuditEvent) {}
}

#[cfg(test)]
mod tests;
