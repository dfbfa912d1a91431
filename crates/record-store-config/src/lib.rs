// crates/record-store-config/src/lib.rs
// ============================================================================
// Module: Record Store Config Library
// Description: Canonical config model and validation.
// Purpose: Single source of truth for record-store.toml semantics.
// Dependencies: record-store-schema, record-store-sqlite, serde, toml
// ============================================================================

//! ## Overview
//! `record-store-config` defines the configuration model for the record
//! store server and CLI. Loading is strict and fail-closed: oversized,
//! non-UTF-8, or inconsistent configuration is rejected before anything
//! binds a socket or opens a database.
//!
//! Security posture: config inputs are untrusted.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use config::*;
