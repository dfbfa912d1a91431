// crates/record-store-http/src/routes.rs
// ============================================================================
// Module: HTTP Routes
// Description: Router, record handlers, and request middleware.
// Purpose: Translate HTTP requests into record service calls.
// Dependencies: axum, record-store-core, serde, serde_json
// ============================================================================

//! ## Overview
//! Routes live under `/r` plus `/metrics` and `/healthz`. Three layers wrap
//! every route. The outermost emits a request audit event. Below it,
//! [`CorsLayer`] answers browser preflights for any origin and exposes the
//! identity and key headers returned on creation. The innermost enforces the
//! Host allow-list. Bodies are capped by
//! [`DefaultBodyLimit`] and read as raw bytes so oversized and malformed
//! payloads map onto the JSON error shape.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;
use std::time::Duration;

use axum::Json;
use axum::Router;
use axum::body::Bytes;
use axum::extract::DefaultBodyLimit;
use axum::extract::Path;
use axum::extract::Query;
use axum::extract::Request;
use axum::extract::State;
use axum::extract::rejection::BytesRejection;
use axum::extract::rejection::QueryRejection;
use axum::http::HeaderMap;
use axum::http::HeaderName;
use axum::http::HeaderValue;
use axum::http::Method;
use axum::http::StatusCode;
use axum::http::header::AUTHORIZATION;
use axum::http::header::CONTENT_TYPE;
use axum::http::header::HOST;
use axum::middleware;
use axum::middleware::Next;
use axum::response::IntoResponse;
use axum::response::Response;
use axum::routing::get;
use axum::routing::post;
use record_store_core::JsonPatch;
use record_store_core::Record;
use record_store_core::RecordId;
use record_store_core::RecordMetadata;
use record_store_core::RecordService;
use record_store_core::VisibilityMode;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;
use serde_json::json;
use tower_http::cors::Any;
use tower_http::cors::CorsLayer;

use crate::access::ACCESS_KEY_HEADER;
use crate::access::AccessRule;
use crate::access::RECORD_ID_HEADER;
use crate::access::authorize;
use crate::audit::AuditSink;
use crate::audit::RequestAuditEvent;
use crate::audit::RequestAuditParams;
use crate::error::ApiError;
use crate::error::ErrorKind;

// ============================================================================
// SECTION: State
// ============================================================================

/// Shared state for HTTP handlers.
#[derive(Clone)]
pub struct ApiState {
    /// Record service.
    service: RecordService,
    /// Request audit sink.
    audit: Arc<dyn AuditSink>,
    /// Normalized Host allow-list; empty allows every host.
    allowed_hosts: Arc<[String]>,
    /// Maximum request body size in bytes.
    max_body_bytes: usize,
}

impl ApiState {
    /// Creates handler state.
    #[must_use]
    pub fn new(
        service: RecordService,
        audit: Arc<dyn AuditSink>,
        allowed_hosts: Vec<String>,
        max_body_bytes: usize,
    ) -> Self {
        Self {
            service,
            audit,
            allowed_hosts: allowed_hosts.into(),
            max_body_bytes,
        }
    }
}

// ============================================================================
// SECTION: Router
// ============================================================================

/// Builds the record API router.
pub fn router(state: ApiState) -> Router {
    let max_body_bytes = state.max_body_bytes;
    Router::new()
        .route("/r", post(create_record))
        .route(
            "/r/{id}",
            get(read_record).put(update_record).patch(patch_record).delete(delete_record),
        )
        .route("/r/{id}/metadata", get(read_metadata))
        .route("/metrics", get(metrics))
        .route("/healthz", get(healthz))
        .fallback(unmatched)
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .layer(middleware::from_fn_with_state(state.clone(), check_host))
        .layer(cors_layer())
        .layer(middleware::from_fn_with_state(state.clone(), audit_request))
        .with_state(state)
}

/// Seconds browsers may cache a preflight answer.
const CORS_MAX_AGE_SECS: u64 = 600;

/// Cross-origin policy: any origin, no credentials.
fn cors_layer() -> CorsLayer {
    let access_key = HeaderName::from_static(ACCESS_KEY_HEADER);
    let record_id = HeaderName::from_static(RECORD_ID_HEADER);
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::PATCH, Method::DELETE])
        .allow_headers([access_key.clone(), AUTHORIZATION, CONTENT_TYPE])
        .expose_headers([record_id, access_key])
        .max_age(Duration::from_secs(CORS_MAX_AGE_SECS))
}

// ============================================================================
// SECTION: Handlers
// ============================================================================

/// Query parameters accepted on creation.
#[derive(Debug, Deserialize)]
struct CreateQuery {
    /// `true` marks the record publicly readable.
    #[serde(default)]
    public: Option<String>,
}

/// Metadata response body.
#[derive(Debug, Serialize)]
struct MetadataBody {
    /// Record identity.
    id: RecordId,
    /// Stored metadata.
    #[serde(flatten)]
    metadata: RecordMetadata,
}

/// Handles `POST /r`.
async fn create_record(
    State(state): State<ApiState>,
    query: Result<Query<CreateQuery>, QueryRejection>,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> Result<Response, ApiError> {
    let Query(query) = query.map_err(|rejection| ApiError::bad_request(rejection.body_text()))?;
    let data = parse_json(body)?;
    let mode = if query.public.as_deref() == Some("true") {
        VisibilityMode::Read
    } else {
        VisibilityMode::None
    };
    let provided_key = match headers.get(ACCESS_KEY_HEADER) {
        Some(value) => Some(
            value
                .to_str()
                .map_err(|_| ApiError::bad_request("access key must be visible ascii"))?,
        ),
        None => None,
    };
    let created = state.service.create(Record::from_data(data, mode), provided_key).await?;
    let record_id = header_value(created.record.id.as_str())?;
    let access_key = header_value(created.access_key.as_str())?;
    Ok((
        [(RECORD_ID_HEADER, record_id), (ACCESS_KEY_HEADER, access_key)],
        Json(created.record.data),
    )
        .into_response())
}

/// Handles `GET /r/{id}`.
async fn read_record(
    State(state): State<ApiState>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<Value>, ApiError> {
    let id = RecordId::new(id);
    authorize(&state.service, &id, &headers, AccessRule::PublicRead).await?;
    let record = state.service.get(&id).await?.ok_or_else(ApiError::not_found)?;
    Ok(Json(record.data))
}

/// Handles `GET /r/{id}/metadata`.
async fn read_metadata(
    State(state): State<ApiState>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<MetadataBody>, ApiError> {
    let id = RecordId::new(id);
    let loaded = authorize(&state.service, &id, &headers, AccessRule::PublicRead).await?;
    let metadata = match loaded {
        Some(metadata) => metadata,
        None => state.service.get_metadata(&id).await?.ok_or_else(ApiError::not_found)?,
    };
    Ok(Json(MetadataBody {
        id,
        metadata,
    }))
}

/// Handles `PUT /r/{id}`.
async fn update_record(
    State(state): State<ApiState>,
    Path(id): Path<String>,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> Result<Json<Value>, ApiError> {
    let id = RecordId::new(id);
    let data = parse_json(body)?;
    authorize(&state.service, &id, &headers, AccessRule::KeyRequired).await?;
    let record = state.service.update_by_id(&id, data).await?;
    Ok(Json(record.data))
}

/// Handles `PATCH /r/{id}`.
async fn patch_record(
    State(state): State<ApiState>,
    Path(id): Path<String>,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> Result<Json<Value>, ApiError> {
    let id = RecordId::new(id);
    let bytes = body.map_err(|rejection| ApiError::from_body_rejection(&rejection))?;
    let patch: JsonPatch = serde_json::from_slice(&bytes).map_err(|err| {
        ApiError::bad_request(format!("request body must be a JSON Patch array: {err}"))
    })?;
    authorize(&state.service, &id, &headers, AccessRule::KeyRequired).await?;
    let record = state.service.patch_by_id(&id, &patch).await?;
    Ok(Json(record.data))
}

/// Handles `DELETE /r/{id}`.
async fn delete_record(
    State(state): State<ApiState>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<Value>, ApiError> {
    let id = RecordId::new(id);
    authorize(&state.service, &id, &headers, AccessRule::KeyRequired).await?;
    state.service.delete_by_id(&id).await?;
    Ok(Json(json!({ "ok": true })))
}

/// Handles `GET /metrics`.
async fn metrics(State(state): State<ApiState>) -> Json<Value> {
    Json(json!({ "totalCount": state.service.get_count().await }))
}

/// Handles `GET /healthz`.
async fn healthz(State(state): State<ApiState>) -> Result<Json<Value>, ApiError> {
    state.service.readiness().await?;
    Ok(Json(json!({ "status": "ok" })))
}

/// Answers requests that match no route.
async fn unmatched() -> ApiError {
    ApiError::new(StatusCode::NOT_FOUND, "no_route", "not found")
}

// ============================================================================
// SECTION: Middleware
// ============================================================================

/// Rejects requests whose Host is not allow-listed.
async fn check_host(State(state): State<ApiState>, request: Request, next: Next) -> Response {
    let host = request
        .headers()
        .get(HOST)
        .and_then(|value| value.to_str().ok())
        .or_else(|| request.uri().authority().map(|authority| authority.as_str()));
    if host_allowed(&state.allowed_hosts, host) {
        next.run(request).await
    } else {
        ApiError::new(StatusCode::NOT_FOUND, "host_not_allowed", "not found").into_response()
    }
}

/// Emits one audit event per request.
async fn audit_request(State(state): State<ApiState>, request: Request, next: Next) -> Response {
    let method = request.method().as_str().to_string();
    let path = request.uri().path().to_string();
    let response = next.run(request).await;
    let record_id = response
        .headers()
        .get(RECORD_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
        .or_else(|| path_record_id(&path));
    let error_kind = response.extensions().get::<ErrorKind>().map(|kind| kind.0);
    state.audit.record(&RequestAuditEvent::new(RequestAuditParams {
        method,
        route: route_label(&path),
        record_id,
        status: response.status().as_u16(),
        error_kind,
    }));
    response
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Returns true when `host` passes the allow-list.
///
/// An empty list allows every host; `localhost*` is always allowed.
#[must_use]
pub fn host_allowed(allowed_hosts: &[String], host: Option<&str>) -> bool {
    if allowed_hosts.is_empty() {
        return true;
    }
    let Some(host) = host else {
        return false;
    };
    let host = host.trim().to_ascii_lowercase();
    host.starts_with("localhost") || allowed_hosts.iter().any(|allowed| *allowed == host)
}

/// Maps a request path onto its route template.
#[must_use]
pub fn route_label(path: &str) -> &'static str {
    let segments: Vec<&str> = path.split('/').filter(|segment| !segment.is_empty()).collect();
    match segments.as_slice() {
        ["r"] => "/r",
        ["r", _] => "/r/{id}",
        ["r", _, "metadata"] => "/r/{id}/metadata",
        ["metrics"] => "/metrics",
        ["healthz"] => "/healthz",
        _ => "unmatched",
    }
}

/// Extracts the record identity segment from a record route path.
fn path_record_id(path: &str) -> Option<String> {
    let mut segments = path.split('/').filter(|segment| !segment.is_empty());
    match (segments.next(), segments.next()) {
        (Some("r"), Some(id)) => Some(id.to_string()),
        _ => None,
    }
}

/// Reads a request body as JSON.
fn parse_json(body: Result<Bytes, BytesRejection>) -> Result<Value, ApiError> {
    let bytes = body.map_err(|rejection| ApiError::from_body_rejection(&rejection))?;
    serde_json::from_slice(&bytes)
        .map_err(|err| ApiError::bad_request(format!("request body must be valid JSON: {err}")))
}

/// Converts a generated or validated token into a header value.
fn header_value(value: &str) -> Result<HeaderValue, ApiError> {
    HeaderValue::from_str(value)
        .map_err(|_| ApiError::internal("response header value is not representable"))
}

#[cfg(test)]
mod tests;
