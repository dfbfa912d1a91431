// crates/record-store-http/src/error.rs
// ============================================================================
// Module: HTTP Error Mapping
// Description: Record errors mapped onto status codes and JSON bodies.
// Purpose: Keep status selection in one place.
// Dependencies: axum, record-store-core, serde
// ============================================================================

//! ## Overview
//! Every failed request answers with `{"message": ..., "errors"?: [...]}`.
//! The normalized error kind travels in a response extension so the audit
//! layer can record it without re-deriving it from the status.

// ============================================================================
// SECTION: Imports
// ============================================================================

use axum::Json;
use axum::extract::rejection::BytesRejection;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::response::Response;
use record_store_core::RecordError;
use serde::Serialize;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Normalized error label attached to error responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ErrorKind(pub &'static str);

/// JSON error body.
#[derive(Debug, Serialize)]
struct ErrorBody {
    /// Human-readable message.
    message: String,
    /// Schema validation messages.
    #[serde(skip_serializing_if = "Option::is_none")]
    errors: Option<Vec<String>>,
}

/// HTTP-facing error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    /// Response status.
    status: StatusCode,
    /// Normalized error kind label.
    kind: &'static str,
    /// Human-readable message.
    message: String,
    /// Schema validation messages.
    errors: Option<Vec<String>>,
}

impl ApiError {
    /// Creates an error with an explicit status and kind.
    #[must_use]
    pub fn new(status: StatusCode, kind: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            kind,
            message: message.into(),
            errors: None,
        }
    }

    /// 400 for malformed client input.
    #[must_use]
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "bad_request", message)
    }

    /// 401 for missing or mismatched access keys.
    #[must_use]
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "unauthorized", message)
    }

    /// 404 for absent records.
    #[must_use]
    pub fn not_found() -> Self {
        Self::new(StatusCode::NOT_FOUND, "not_found", "record not found")
    }

    /// 500 for failures that are not the client's doing.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "internal", message)
    }

    /// Maps a body extraction failure; oversized bodies become 413.
    #[must_use]
    pub fn from_body_rejection(rejection: &BytesRejection) -> Self {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            Self::new(StatusCode::PAYLOAD_TOO_LARGE, "payload_too_large", "request body too large")
        } else {
            Self::bad_request(rejection.body_text())
        }
    }

    /// Returns the response status.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    /// Returns the normalized error kind.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        self.kind
    }

    /// Returns the human-readable message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<RecordError> for ApiError {
    fn from(err: RecordError) -> Self {
        let message = err.to_string();
        match err {
            RecordError::InvalidIdentity(_) => {
                Self::new(StatusCode::BAD_REQUEST, "invalid_identity", message)
            }
            RecordError::InvalidAccessKey(_) => {
                Self::new(StatusCode::BAD_REQUEST, "invalid_access_key", message)
            }
            RecordError::SchemaViolation {
                errors,
            } => Self {
                errors: Some(errors),
                ..Self::new(StatusCode::BAD_REQUEST, "schema_violation", message)
            },
            RecordError::SchemaFetchFailed(_) => {
                Self::new(StatusCode::BAD_REQUEST, "schema_fetch_failed", message)
            }
            RecordError::PatchApplicationFailed(_) => {
                Self::new(StatusCode::BAD_REQUEST, "patch_application_failed", message)
            }
            RecordError::Unauthorized => Self::unauthorized(message),
            RecordError::NotFound => Self::not_found(),
            RecordError::StorageUnavailable(_) => {
                Self::new(StatusCode::SERVICE_UNAVAILABLE, "storage_unavailable", message)
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            message: self.message,
            errors: self.errors,
        };
        let mut response = (self.status, Json(body)).into_response();
        response.extensions_mut().insert(ErrorKind(self.kind));
        response
    }
}
