//! Axum handlers for the ingestion endpoints

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Json;
use axum::body::Bytes;
use axum::extract::{ConnectInfo, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use en_events::{ClientPreprocessor, Preprocessor, RequestContext, ServerPreprocessor};
use en_logwriter::AsyncLogger;
use serde::Deserialize;

use crate::decode::decode_fact;
use crate::response::{error_response, ok_response};
use crate::token_store::TokenStore;

/// Shared state for handlers
pub struct HandlerState {
    pub token_store: Arc<TokenStore>,
    pub logger: Arc<AsyncLogger>,
    pub client_preprocessor: Arc<ClientPreprocessor>,
    pub server_preprocessor: Arc<ServerPreprocessor>,
    pub max_payload_bytes: usize,
}

/// `?token=<secret>` query parameter
#[derive(Debug, Deserialize)]
pub struct TokenQuery {
    #[serde(default)]
    token: Option<String>,
}

/// POST /api/v1/event - browser (c2s) events
pub async fn ingest_client_event(
    State(state): State<Arc<HandlerState>>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    Query(query): Query<TokenQuery>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    if body.len() > state.max_payload_bytes {
        return error_response(
            StatusCode::PAYLOAD_TOO_LARGE,
            "payload_too_large",
            format!(
                "payload size {} exceeds limit {}",
                body.len(),
                state.max_payload_bytes
            ),
        );
    }

    let Some(secret) = query.token else {
        return error_response(StatusCode::UNAUTHORIZED, "unauthorized", "missing token");
    };
    let Some(token_id) = state.token_store.resolve_client(&secret) else {
        return error_response(StatusCode::UNAUTHORIZED, "unauthorized", "unknown token");
    };
    let token_id = token_id.to_string();

    ingest(
        &state,
        state.client_preprocessor.as_ref(),
        &token_id,
        &headers,
        addr,
        &body,
    )
    .await
}

/// POST /api/v1/s2s/event - server (s2s) events
///
/// The token comes from the `X-Auth-Token` header, falling back to the
/// `token` query parameter.
pub async fn ingest_server_event(
    State(state): State<Arc<HandlerState>>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    Query(query): Query<TokenQuery>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    if body.len() > state.max_payload_bytes {
        return error_response(
            StatusCode::PAYLOAD_TOO_LARGE,
            "payload_too_large",
            format!(
                "payload size {} exceeds limit {}",
                body.len(),
                state.max_payload_bytes
            ),
        );
    }

    let secret = headers
        .get("x-auth-token")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .or(query.token);
    let Some(secret) = secret else {
        return error_response(StatusCode::UNAUTHORIZED, "unauthorized", "missing token");
    };
    let Some(token_id) = state.token_store.resolve_server(&secret) else {
        return error_response(
            StatusCode::UNAUTHORIZED,
            "unauthorized",
            "The token isn't a server token. Please use s2s integration token",
        );
    };
    let token_id = token_id.to_string();

    ingest(
        &state,
        state.server_preprocessor.as_ref(),
        &token_id,
        &headers,
        addr,
        &body,
    )
    .await
}

/// Decode, enrich and queue one event
async fn ingest(
    state: &HandlerState,
    preprocessor: &dyn Preprocessor,
    token_id: &str,
    headers: &HeaderMap,
    addr: SocketAddr,
    body: &[u8],
) -> Response {
    let mut fact = match decode_fact(body) {
        Ok(fact) => fact,
        Err(err) => {
            return error_response(StatusCode::BAD_REQUEST, "invalid_body", err.to_string());
        }
    };

    let request = RequestContext {
        headers,
        remote_addr: Some(addr),
    };
    if let Err(err) = preprocessor.preprocess(&mut fact, &request) {
        return error_response(StatusCode::BAD_REQUEST, "invalid_event", err.to_string());
    }

    if let Err(err) = state.logger.consume(token_id, fact).await {
        tracing::error!(token = token_id, error = %err, "event queueing failed");
        return error_response(
            StatusCode::SERVICE_UNAVAILABLE,
            "service_unavailable",
            err.to_string(),
        );
    }

    ok_response()
}

/// GET /health - health check endpoint
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, Json(serde_json::json!({"status": "ok"})))
}
