// crates/record-store-http/src/audit/tests.rs
// ============================================================================
// Module: Request Audit Tests
// Description: Unit tests for audit event shape and file sink output.
// Purpose: Ensure events serialize as redacted JSON lines.
// Dependencies: record-store-http, serde_json, tempfile
// ============================================================================

//! ## Overview
//! Checks the serialized event shape and append-only file output.

#![allow(
    clippy::expect_used,
    clippy::unwrap_used,
    clippy::panic,
    reason = "Test-only assertions use unwrap/expect for clarity."
)]

use std::sync::Arc;
use std::thread;

use record_store_core::EventLevel;
use record_store_core::EventSink;
use record_store_core::FileEventSink;
use record_store_core::LogFile;
use record_store_core::ServiceEvent;
use serde_json::Value;

use super::AuditSink;
use super::FileAuditSink;
use super::RequestAuditEvent;
use super::RequestAuditParams;
use super::RequestOutcome;

fn event(
    status: u16,
    record_id: Option<&str>,
    error_kind: Option<&'static str>,
) -> RequestAuditEvent {
    RequestAuditEvent::new(RequestAuditParams {
        method: "GET".to_string(),
        route: "/r/{id}",
        record_id: record_id.map(str::to_string),
        status,
        error_kind,
    })
}

#[test]
fn outcome_follows_status_class() {
    assert_eq!(RequestOutcome::from_status(200), RequestOutcome::Success);
    assert_eq!(RequestOutcome::from_status(302), RequestOutcome::Success);
    assert_eq!(RequestOutcome::from_status(404), RequestOutcome::Rejected);
    assert_eq!(RequestOutcome::from_status(503), RequestOutcome::Failed);
}

#[test]
fn optional_fields_are_omitted_when_absent() {
    let value = serde_json::to_value(event(200, None, None)).unwrap();
    assert_eq!(value["event"], "record_request");
    assert_eq!(value["outcome"], "success");
    assert!(value.get("record_id").is_none());
    assert!(value.get("error_kind").is_none());

    let value = serde_json::to_value(event(401, Some("abc"), Some("unauthorized"))).unwrap();
    assert_eq!(value["record_id"], "abc");
    assert_eq!(value["error_kind"], "unauthorized");
    assert_eq!(value["outcome"], "rejected");
}

#[test]
fn file_sink_appends_json_lines() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("audit.jsonl");
    {
        let sink = FileAuditSink::new(&path).unwrap();
        sink.record(&event(200, Some("a"), None));
    }
    let sink = FileAuditSink::new(&path).unwrap();
    sink.record(&event(404, Some("b"), Some("not_found")));

    let content = std::fs::read_to_string(&path).unwrap();
    let lines: Vec<Value> =
        content.lines().map(|line| serde_json::from_str(line).unwrap()).collect();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0]["record_id"], "a");
    assert_eq!(lines[1]["status"], 404);
}

#[test]
fn audit_and_service_events_share_one_log_without_tearing() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("record-store.jsonl");
    let log = LogFile::open(&path).unwrap();
    let audit = Arc::new(FileAuditSink::with_log(log.clone()));
    let events = Arc::new(FileEventSink::with_log(log));

    let mut writers = Vec::new();
    for worker in 0 .. 4 {
        let audit = Arc::clone(&audit);
        let events = Arc::clone(&events);
        writers.push(thread::spawn(move || {
            let padding = "x".repeat(2048);
            for index in 0 .. 50 {
                let id = format!("w{worker}-{index}-{padding}");
                audit.record(&event(200, Some(&id), None));
                events.record(&ServiceEvent::new(EventLevel::Info, "create", Some(id), "ok"));
            }
        }));
    }
    for writer in writers {
        writer.join().unwrap();
    }

    let content = std::fs::read_to_string(&path).unwrap();
    let lines: Vec<Value> =
        content.lines().map(|line| serde_json::from_str(line).unwrap()).collect();
    assert_eq!(lines.len(), 400);
    let audit_lines = lines.iter().filter(|line| line["event"] == "record_request").count();
    assert_eq!(audit_lines, 200);
}
