// crates/record-store-http/src/lib.rs
// ============================================================================
// Module: Record Store HTTP Library
// Description: HTTP boundary for the record service.
// Purpose: Route requests, enforce access keys, and emit request audits.
// Dependencies: axum, record-store-core, record-store-config, subtle
// ============================================================================

//! ## Overview
//! `record-store-http` exposes the record service over HTTP with axum. It
//! owns transport concerns only: Host allow-listing, body limits, access-key
//! comparison, error-to-status mapping, and one audit event per request.
//! Record semantics stay in [`record_store_core::RecordService`].
//!
//! Security posture: every request is untrusted; access keys and payloads
//! are never logged.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod access;
pub mod audit;
pub mod error;
pub mod routes;
pub mod server;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use access::ACCESS_KEY_HEADER;
pub use access::RECORD_ID_HEADER;
pub use access::keys_match;
pub use access::presented_access_key;
pub use audit::AuditSink;
pub use audit::FileAuditSink;
pub use audit::NoopAuditSink;
pub use audit::RequestAuditEvent;
pub use audit::RequestAuditParams;
pub use audit::RequestOutcome;
pub use audit::StderrAuditSink;
pub use error::ApiError;
pub use routes::ApiState;
pub use routes::host_allowed;
pub use routes::route_label;
pub use routes::router;
pub use server::RecordServer;
pub use server::ServerError;
pub use server::build_service;
