// crates/record-store-http/src/server.rs
// ============================================================================
// Module: Record Server
// Description: Server assembly from validated configuration.
// Purpose: Wire store, validator, sinks, and router, then serve HTTP.
// Dependencies: axum, record-store-config, record-store-schema, record-store-sqlite, tokio
// ============================================================================

//! ## Overview
//! [`RecordServer::from_config`] validates configuration, opens the
//! configured store, builds the schema validator and log sinks, and prepares
//! the router. [`RecordServer::serve`] binds the configured address.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::future::Future;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use axum::Router;
use record_store_config::LogSinkKind;
use record_store_config::LoggingConfig;
use record_store_config::RecordStoreConfig;
use record_store_config::StoreConfig;
use record_store_config::StoreType;
use record_store_core::EventSink;
use record_store_core::FileEventSink;
use record_store_core::InMemoryKvStore;
use record_store_core::LogFile;
use record_store_core::NoopEventSink;
use record_store_core::RecordService;
use record_store_core::SharedKvStore;
use record_store_core::StderrEventSink;
use record_store_schema::JsonSchemaValidator;
use record_store_sqlite::SqliteKvStore;
use thiserror::Error;
use tokio::net::TcpListener;

use crate::audit::AuditSink;
use crate::audit::FileAuditSink;
use crate::audit::NoopAuditSink;
use crate::audit::StderrAuditSink;
use crate::routes::ApiState;
use crate::routes::router;

// ============================================================================
// SECTION: Server
// ============================================================================

/// Record store HTTP server.
pub struct RecordServer {
    /// Listener address.
    bind: SocketAddr,
    /// Record service shared with the router.
    service: RecordService,
    /// Router ready to serve.
    app: Router,
}

impl RecordServer {
    /// Builds a server from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError`] when configuration is invalid or a backend
    /// cannot be initialized.
    pub fn from_config(mut config: RecordStoreConfig) -> Result<Self, ServerError> {
        config.validate().map_err(|err| ServerError::Config(err.to_string()))?;
        let bind = config.server.bind_addr().map_err(|err| ServerError::Config(err.to_string()))?;
        let log = open_log(&config.logging)?;
        let service = assemble_service(&config, build_event_sink(&config.logging, log.as_ref()))?;
        let audit = build_audit_sink(&config.logging, log.as_ref());
        let state = ApiState::new(
            service.clone(),
            audit,
            config.server.allowed_hosts.clone(),
            config.server.max_body_bytes,
        );
        Ok(Self {
            bind,
            service,
            app: router(state),
        })
    }

    /// Returns the configured bind address.
    #[must_use]
    pub const fn bind_addr(&self) -> SocketAddr {
        self.bind
    }

    /// Returns the record service backing this server.
    #[must_use]
    pub const fn service(&self) -> &RecordService {
        &self.service
    }

    /// Serves requests on the configured address until the process ends.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Transport`] when binding or serving fails.
    pub async fn serve(self) -> Result<(), ServerError> {
        let listener = TcpListener::bind(self.bind)
            .await
            .map_err(|err| ServerError::Transport(format!("http bind failed: {err}")))?;
        self.serve_with_shutdown(listener, std::future::pending()).await
    }

    /// Serves requests on `listener` until `shutdown` resolves.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Transport`] when serving fails.
    pub async fn serve_with_shutdown(
        self,
        listener: TcpListener,
        shutdown: impl Future<Output = ()> + Send + 'static,
    ) -> Result<(), ServerError> {
        axum::serve(listener, self.app)
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|err| ServerError::Transport(format!("http server failed: {err}")))
    }
}

// ============================================================================
// SECTION: Assembly
// ============================================================================

/// Builds the record service from configuration.
///
/// # Errors
///
/// Returns [`ServerError::Init`] when the store, validator, or event sink
/// cannot be created.
pub fn build_service(config: &RecordStoreConfig) -> Result<RecordService, ServerError> {
    let log = open_log(&config.logging)?;
    assemble_service(config, build_event_sink(&config.logging, log.as_ref()))
}

/// Builds the record service around an existing event sink.
fn assemble_service(
    config: &RecordStoreConfig,
    events: Arc<dyn EventSink>,
) -> Result<RecordService, ServerError> {
    let store = build_store(&config.store)?;
    let validator = JsonSchemaValidator::new(config.schema.fetcher_config())
        .map_err(|err| ServerError::Init(err.to_string()))?;
    Ok(RecordService::new(store, Arc::new(validator), events))
}

/// Opens the configured key-value store.
fn build_store(config: &StoreConfig) -> Result<SharedKvStore, ServerError> {
    match config.store_type {
        StoreType::Memory => Ok(SharedKvStore::from_store(InMemoryKvStore::new())),
        StoreType::Sqlite => {
            let sqlite = config.sqlite_config().ok_or_else(|| {
                ServerError::Config("sqlite store requires path".to_string())
            })?;
            let store =
                SqliteKvStore::new(&sqlite).map_err(|err| ServerError::Init(err.to_string()))?;
            Ok(SharedKvStore::from_store(store))
        }
    }
}

/// Opens the log file once for every file-backed sink.
fn open_log(config: &LoggingConfig) -> Result<Option<LogFile>, ServerError> {
    if config.sink != LogSinkKind::File {
        return Ok(None);
    }
    let path = config
        .path
        .as_deref()
        .map(|path| Path::new(path.trim()))
        .ok_or_else(|| ServerError::Config("file logging sink requires path".to_string()))?;
    LogFile::open(path)
        .map(Some)
        .map_err(|err| ServerError::Init(format!("log file open failed: {err}")))
}

/// Builds the service event sink.
fn build_event_sink(config: &LoggingConfig, log: Option<&LogFile>) -> Arc<dyn EventSink> {
    match (config.sink, log) {
        (LogSinkKind::Stderr, _) => Arc::new(StderrEventSink),
        (LogSinkKind::File, Some(log)) => Arc::new(FileEventSink::with_log(log.clone())),
        (LogSinkKind::File | LogSinkKind::None, _) => Arc::new(NoopEventSink),
    }
}

/// Builds the request audit sink.
fn build_audit_sink(config: &LoggingConfig, log: Option<&LogFile>) -> Arc<dyn AuditSink> {
    match (config.sink, log) {
        (LogSinkKind::Stderr, _) => Arc::new(StderrAuditSink),
        (LogSinkKind::File, Some(log)) => Arc::new(FileAuditSink::with_log(log.clone())),
        (LogSinkKind::File | LogSinkKind::None, _) => Arc::new(NoopAuditSink),
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Record server errors.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Configuration errors.
    #[error("config error: {0}")]
    Config(String),
    /// Initialization errors.
    #[error("init error: {0}")]
    Init(String),
    /// Transport errors.
    #[error("transport error: {0}")]
    Transport(String),
}
