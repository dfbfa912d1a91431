// crates/record-store-core/src/runtime/events/tests.rs
// ============================================================================
// Module: Service Event Tests
// Description: Unit tests for service event serialization and file sinks.
// Purpose: Ensure events are single JSON lines with stable field names.
// Dependencies: record-store-core, serde_json, tempfile
// ============================================================================

//! ## Overview
//! Checks the wire shape of service events and the append-only file sink.

#![allow(
    clippy::expect_used,
    clippy::unwrap_used,
    clippy::panic,
    reason = "Test-only assertions use unwrap/expect for clarity."
)]

use serde_json::Value;

use super::EventLevel;
use super::EventSink;
use super::FileEventSink;
use super::ServiceEvent;

#[test]
fn event_serializes_with_stable_fields() {
    let event = ServiceEvent::new(EventLevel::Error, "increment_count", None, "store down");
    let value = serde_json::to_value(&event).unwrap();
    assert_eq!(value["event"], "record_service");
    assert_eq!(value["level"], "error");
    assert_eq!(value["operation"], "increment_count");
    assert_eq!(value["message"], "store down");
    assert!(value.get("record_id").is_none());
    assert!(value["timestamp_ms"].as_u64().unwrap() > 0);
}

#[test]
fn file_sink_appends_one_line_per_event() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("events.jsonl");
    let sink = FileEventSink::new(&path).unwrap();
    sink.record(&ServiceEvent::new(EventLevel::Warn, "delete", Some("abc".to_string()), "one"));
    sink.record(&ServiceEvent::new(EventLevel::Info, "create", None, "two"));
    let contents = std::fs::read_to_string(&path).unwrap();
    let lines: Vec<Value> =
        contents.lines().map(|line| serde_json::from_str(line).unwrap()).collect();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0]["record_id"], "abc");
    assert_eq!(lines[1]["operation"], "create");
}
