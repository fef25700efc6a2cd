//! HTTP request handlers for the key/value endpoints.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{MatchedPath, Query, Request, State};
use axum::http::{header, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use tracing::Instrument;

use crate::error::TxkvError;
use crate::txlog::Log;
use super::AppState;

// =============================================================================
// Request / Response Bodies
// =============================================================================

/// Body of `POST /kv/set`
#[derive(Debug, Deserialize)]
pub struct SetRequest {
    pub key: String,
    #[serde(default)]
    pub value: String,
}

/// Query string of `/kv/get` and `/kv/delete`
#[derive(Debug, Deserialize)]
pub struct KeyQuery {
    pub key: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StatusResponse {
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct GetResponse {
    pub status: String,
    pub value: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub time: String,
}

impl StatusResponse {
    fn ok(message: &str) -> Self {
        Self {
            status: "ok".to_string(),
            message: Some(message.to_string()),
        }
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// Handle GET /health
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        time: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
    })
}

/// Handle GET /metrics
pub async fn metrics<L: Log + 'static>(
    State(state): State<Arc<AppState<L>>>,
) -> Result<Response, ApiError> {
    let text = state
        .metrics
        .render()
        .map_err(|e| ApiError::internal(format!("failed to render metrics: {}", e)))?;
    Ok(([(header::CONTENT_TYPE, "text/plain; version=0.0.4")], text).into_response())
}

/// Handle POST /kv/set
///
/// The body is decoded as JSON whatever its `Content-Type` says.
pub async fn set_key<L: Log + 'static>(
    State(state): State<Arc<AppState<L>>>,
    body: Bytes,
) -> Result<Response, ApiError> {
    let span = tracing::debug_span!(parent: &state.span, "set");
    set_value(&state, &body).instrument(span).await
}

async fn set_value<L: Log + 'static>(state: &AppState<L>, body: &[u8]) -> Result<Response, ApiError> {
    let request: SetRequest = serde_json::from_slice(body).map_err(|e| {
        tracing::warn!(error = %e, "failed to decode set request");
        ApiError::bad_request(format!("invalid JSON body: {}", e))
    })?;

    if request.key.is_empty() {
        return Err(ApiError::bad_request("key must not be empty"));
    }

    let store = Arc::clone(&state.store);
    let key = request.key.clone();
    tokio::task::spawn_blocking(move || store.set(request.key.as_bytes(), request.value.as_bytes()))
        .await
        .map_err(|e| ApiError::internal(format!("set task failed: {}", e)))?
        .map_err(|e| ApiError::store("set", &key, e))?;

    tracing::debug!(key = %key, "value set");
    Ok(Json(StatusResponse::ok("value set")).into_response())
}

/// Handle GET /kv/get?key=
pub async fn get_key<L: Log + 'static>(
    State(state): State<Arc<AppState<L>>>,
    Query(query): Query<KeyQuery>,
) -> Result<Json<GetResponse>, ApiError> {
    let key = required_key(query)?;
    match state.store.get(key.as_bytes()) {
        Some(value) => Ok(Json(GetResponse {
            status: "ok".to_string(),
            value: String::from_utf8_lossy(&value).into_owned(),
        })),
        None => Err(ApiError::new(StatusCode::NOT_FOUND, "key not found")),
    }
}

/// Handle DELETE /kv/delete?key=
pub async fn delete_key<L: Log + 'static>(
    State(state): State<Arc<AppState<L>>>,
    Query(query): Query<KeyQuery>,
) -> Result<Response, ApiError> {
    let span = tracing::debug_span!(parent: &state.span, "delete");
    delete_value(&state, query).instrument(span).await
}

async fn delete_value<L: Log + 'static>(
    state: &AppState<L>,
    query: KeyQuery,
) -> Result<Response, ApiError> {
    let key = required_key(query)?;

    let store = Arc::clone(&state.store);
    let owned = key.clone();
    tokio::task::spawn_blocking(move || store.delete(owned.as_bytes()))
        .await
        .map_err(|e| ApiError::internal(format!("delete task failed: {}", e)))?
        .map_err(|e| ApiError::store("delete", &key, e))?;

    tracing::debug!(key = %key, "key deleted");
    Ok(Json(StatusResponse::ok("key deleted")).into_response())
}

fn required_key(query: KeyQuery) -> Result<String, ApiError> {
    match query.key {
        Some(key) if !key.is_empty() => Ok(key),
        _ => Err(ApiError::bad_request("missing key parameter")),
    }
}

// =============================================================================
// Request Counting
// =============================================================================

/// Count every response, including ones produced before a handler runs
/// (405 from method routing, extractor rejections, unknown paths).
pub async fn track_requests<L: Log + 'static>(
    State(state): State<Arc<AppState<L>>>,
    request: Request,
    next: Next,
) -> Response {
    let handler = request
        .extensions()
        .get::<MatchedPath>()
        .map(|path| handler_label(path.as_str()))
        .unwrap_or("unmatched");
    let method = request.method().clone();

    let response = next.run(request).await;
    state
        .metrics
        .observe(handler, method.as_str(), response.status().as_u16());
    response
}

/// Metric label for a route template
fn handler_label(path: &str) -> &'static str {
    match path {
        "/kv/set" => "set",
        "/kv/get" => "get",
        "/kv/delete" => "delete",
        "/health" => "health",
        "/metrics" => "metrics",
        _ => "unmatched",
    }
}

// =============================================================================
// Errors
// =============================================================================

/// Application-level error type for HTTP handlers.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    fn internal(message: impl Into<String>) -> Self {
        let message = message.into();
        tracing::error!("{}", message);
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    /// Engine failures are logged here and reported as 500
    fn store(op: &str, key: &str, err: TxkvError) -> Self {
        tracing::error!(error = %err, key = %key, "store {} failed", op);
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = StatusResponse {
            status: "error".to_string(),
            message: Some(self.message),
        };
        (self.status, Json(body)).into_response()
    }
}
