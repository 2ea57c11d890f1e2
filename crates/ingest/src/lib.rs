//! HTTP Source - REST API for event ingestion
//!
//! # Endpoints
//!
//! - `POST /api/v1/event?token=<client secret>` - browser (c2s) events
//! - `POST /api/v1/s2s/event` - server (s2s) events, token via
//!   `X-Auth-Token` header or `token` query parameter
//! - `GET /health` - health check
//!
//! A request body is one JSON event object. The handler decodes it,
//! enriches it through the matching preprocessor and queues it on the
//! token's log writer; the 200 response means *queued for durable write*,
//! not persisted.

mod decode;
mod error;
mod handlers;
mod response;
mod token_store;


use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use en_events::{ClientPreprocessor, ServerPreprocessor};
use en_logwriter::AsyncLogger;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

pub use error::IngestError;
pub use token_store::TokenStore;

use handlers::{HandlerState, health_check, ingest_client_event, ingest_server_event};

/// HTTP source configuration
#[derive(Debug, Clone)]
pub struct IngestConfig {
    /// Bind address (e.g. "0.0.0.0")
    pub address: String,

    /// Listen port
    pub port: u16,

    /// Maximum request payload size in bytes
    pub max_payload_bytes: usize,
}

impl IngestConfig {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.address, self.port)
    }
}

/// HTTP source for event ingestion
pub struct HttpSource {
    config: IngestConfig,
    state: Arc<HandlerState>,
}

impl HttpSource {
    pub fn new(
        config: IngestConfig,
        token_store: Arc<TokenStore>,
        logger: Arc<AsyncLogger>,
        client_preprocessor: Arc<ClientPreprocessor>,
        server_preprocessor: Arc<ServerPreprocessor>,
    ) -> Self {
        let state = Arc::new(HandlerState {
            token_store,
            logger,
            client_preprocessor,
            server_preprocessor,
            max_payload_bytes: config.max_payload_bytes,
        });
        Self { config, state }
    }

    /// Run the HTTP source until cancelled
    pub async fn run(self, cancel: CancellationToken) -> Result<(), IngestError> {
        let bind_addr = self.config.bind_address();

        let listener = TcpListener::bind(&bind_addr)
            .await
            .map_err(|e| IngestError::Bind {
                address: bind_addr.clone(),
                source: e,
            })?;

        tracing::info!(address = %bind_addr, "HTTP source listening");

        let app = build_router(self.state).into_make_service_with_connect_info::<SocketAddr>();
        let server = axum::serve(listener, app).with_graceful_shutdown(shutdown_signal(cancel));

        let result = server
            .await
            .map_err(|e| IngestError::Serve(e.to_string()));

        tracing::info!(address = %bind_addr, "HTTP source stopped");
        result
    }
}

/// Build the axum router
fn build_router(state: Arc<HandlerState>) -> Router {
    Router::new()
        .route("/api/v1/event", post(ingest_client_event))
        .route("/api/v1/s2s/event", post(ingest_server_event))
        .route("/health", get(health_check))
        .with_state(state)
}

async fn shutdown_signal(cancel: CancellationToken) {
    cancel.cancelled().await;
}
