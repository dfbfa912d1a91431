// crates/record-store-core/src/runtime/events.rs
// ============================================================================
// Module: Record Service Events
// Description: Structured service events and their sinks.
// Purpose: Report swallowed failures without a hard logging dependency.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! The record service reports non-fatal failures (counter maintenance, for
//! instance) as JSON-line events. Sinks decide where the lines go. Events
//! never carry access keys or record payloads.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs::OpenOptions;
use std::io;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use std::sync::Mutex;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use serde::Serialize;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Severity of a service event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EventLevel {
    /// Informational event.
    Info,
    /// Recoverable anomaly.
    Warn,
    /// Failure that was swallowed.
    Error,
}

/// Service event payload.
#[derive(Debug, Clone, Serialize)]
pub struct ServiceEvent {
    /// Event identifier.
    pub event: &'static str,
    /// Event timestamp (milliseconds since epoch).
    pub timestamp_ms: u128,
    /// Event severity.
    pub level: EventLevel,
    /// Service operation that produced the event.
    pub operation: &'static str,
    /// Record identifier when relevant.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record_id: Option<String>,
    /// Human-readable detail.
    pub message: String,
}

impl ServiceEvent {
    /// Builds a `record_service` event stamped with the current time.
    #[must_use]
    pub fn new(
        level: EventLevel,
        operation: &'static str,
        record_id: Option<String>,
        message: impl Into<String>,
    ) -> Self {
        let timestamp_ms =
            SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_millis();
        Self {
            event: "record_service",
            timestamp_ms,
            level,
            operation,
            record_id,
            message: message.into(),
        }
    }
}

// ============================================================================
// SECTION: Sinks
// ============================================================================

/// Sink for service events.
pub trait EventSink: Send + Sync {
    /// Record an event.
    fn record(&self, event: &ServiceEvent);
}

/// Event sink that logs JSON lines to stderr.
pub struct StderrEventSink;

impl EventSink for StderrEventSink {
    fn record(&self, event: &ServiceEvent) {
        if let Ok(payload) = serde_json::to_string(event) {
            let _ = writeln!(std::io::stderr(), "{payload}");
        }
    }
}

/// Append-only JSON-lines file shared by every sink that logs to it.
///
/// # Invariants
/// - Each line reaches the file in one `write_all` under one lock, so
///   writers sharing a handle never interleave within a line.
#[derive(Clone)]
pub struct LogFile {
    /// Handle opened in append mode.
    file: Arc<Mutex<std::fs::File>>,
}

impl LogFile {
    /// Opens `path` for appending, creating it when missing.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened.
    pub fn open(path: &Path) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            file: Arc::new(Mutex::new(file)),
        })
    }

    /// Serializes `event` and appends it as one line; failures are dropped.
    pub fn append_json<T: Serialize>(&self, event: &T) {
        let Ok(mut line) = serde_json::to_vec(event) else {
            return;
        };
        line.push(b'\n');
        if let Ok(mut file) = self.file.lock() {
            let _ = file.write_all(&line);
            let _ = file.flush();
        }
    }
}

/// Event sink that appends JSON lines to a file.
pub struct FileEventSink {
    /// Destination log.
    log: LogFile,
}

impl FileEventSink {
    /// Opens the event log file in append mode.
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

impl EventSink for FileEventSink {
    fn record(&self, event: &ServiceEvent) {
        self.log.append_json(event);
    }
}

/// No-op event sink.
pub struct NoopEventSink;

impl EventSink for NoopEventSink {
    fn record(&self, _event: &ServiceEvent) {}
}

#[cfg(test)]
mod tests;
