// crates/record-store-http/src/routes/tests.rs
// ============================================================================
// Module: HTTP Route Helper Tests
// Description: Unit tests for route labels and the Host allow-list.
// Purpose: Ensure audit labels and host filtering are stable.
// Dependencies: record-store-http
// ============================================================================

//! ## Overview
//! Pure helper checks; full request flows live in the integration suite.

#![allow(
    clippy::expect_used,
    clippy::unwrap_used,
    clippy::panic,
    reason = "Test-only assertions use unwrap/expect for clarity."
)]

use super::host_allowed;
use super::path_record_id;
use super::route_label;

#[test]
fn route_labels_cover_every_route() {
    assert_eq!(route_label("/r"), "/r");
    assert_eq!(route_label("/r/"), "/r");
    assert_eq!(route_label("/r/abc"), "/r/{id}");
    assert_eq!(route_label("/r/abc/metadata"), "/r/{id}/metadata");
    assert_eq!(route_label("/metrics"), "/metrics");
    assert_eq!(route_label("/healthz"), "/healthz");
    assert_eq!(route_label("/r/abc/other"), "unmatched");
    assert_eq!(route_label("/"), "unmatched");
}

#[test]
fn record_id_is_taken_from_record_paths_only() {
    assert_eq!(path_record_id("/r/abc"), Some("abc".to_string()));
    assert_eq!(path_record_id("/r/abc/metadata"), Some("abc".to_string()));
    assert_eq!(path_record_id("/r"), None);
    assert_eq!(path_record_id("/metrics"), None);
}

#[test]
fn empty_allow_list_admits_every_host() {
    assert!(host_allowed(&[], Some("anything.example")));
    assert!(host_allowed(&[], None));
}

#[test]
fn allow_list_matches_exact_hosts_and_localhost() {
    let allowed = vec!["records.example.com".to_string()];
    assert!(host_allowed(&allowed, Some("records.example.com")));
    assert!(host_allowed(&allowed, Some("Records.Example.com")));
    assert!(host_allowed(&allowed, Some("localhost:8787")));
    assert!(!host_allowed(&allowed, Some("records.example.com.evil")));
    assert!(!host_allowed(&allowed, Some("127.0.0.1:8787")));
    assert!(!host_allowed(&allowed, None));
}
