use axum::{
    extract::State,
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{debug, warn};

use crate::config::Config;
use crate::hook::PreCallHook;
use crate::metrics::{self, record_upstream_failure};
use crate::sse::stream_response;

/// Client headers forwarded to the upstream untouched.
const FORWARDED_HEADERS: [&str; 4] = [
    "authorization",
    "x-api-key",
    "anthropic-version",
    "anthropic-beta",
];

/// Shared application state threaded through Axum handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub hook: Arc<PreCallHook>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let hook = Arc::new(PreCallHook::new(config.router()));
        Self { config, hook }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ProxyError {
    #[error("upstream request failed: {0}")]
    Upstream(#[from] reqwest::Error),
    #[error("invalid header value: {0}")]
    InvalidHeader(#[from] reqwest::header::InvalidHeaderValue),
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let status = match &self {
            ProxyError::Upstream(e) if e.is_timeout() => StatusCode::GATEWAY_TIMEOUT,
            ProxyError::Upstream(_) => StatusCode::BAD_GATEWAY,
            ProxyError::InvalidHeader(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let body = ErrorResponse {
            error: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

/// Build the HTTP surface around `state`.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/v1/messages", post(handle_messages))
        .route("/v1/chat/completions", post(handle_chat_completions))
        .route("/health", get(health))
        .route("/metrics", get(metrics::metrics_handler))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn handle_messages(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<Value>,
) -> Response {
    forward(&state, "/v1/messages", &headers, request).await
}

pub async fn handle_chat_completions(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<Value>,
) -> Response {
    forward(&state, "/v1/chat/completions", &headers, request).await
}

async fn health() -> &'static str {
    "ok"
}

async fn forward(state: &AppState, path: &str, headers: &HeaderMap, request: Value) -> Response {
    let request = state.hook.apply(request);
    match try_forward(&state.config, path, headers, &request).await {
        Ok(response) => response,
        Err(e) => {
            warn!(path, "forwarding failed: {}", e);
            record_upstream_failure(match &e {
                ProxyError::Upstream(err) if err.is_timeout() => "timeout",
                ProxyError::Upstream(err) if err.is_connect() => "connect",
                ProxyError::Upstream(_) => "request",
                ProxyError::InvalidHeader(_) => "header",
            });
            e.into_response()
        }
    }
}

async fn try_forward(
    config: &Config,
    path: &str,
    inbound: &HeaderMap,
    request: &Value,
) -> Result<Response, ProxyError> {
    let url = config.upstream_url(path);

    let mut headers = reqwest::header::HeaderMap::new();
    for name in FORWARDED_HEADERS {
        if let Some(value) = inbound.get(name) {
            headers.insert(name, reqwest::header::HeaderValue::from_bytes(value.as_bytes())?);
        }
    }
    if let Some(api_key) = &config.upstream().api_key {
        headers.insert(
            reqwest::header::AUTHORIZATION,
            format!("Bearer {}", api_key).parse()?,
        );
    }

    let model = request.get("model").and_then(Value::as_str).unwrap_or("unknown");
    debug!(url = %url, model, "forwarding request");

    let resp = config
        .http_client()
        .post(&url)
        .headers(headers)
        .json(request)
        .send()
        .await?;

    let streaming = request
        .get("stream")
        .and_then(Value::as_bool)
        .unwrap_or(false);

    if streaming && resp.status().is_success() {
        return Ok(stream_response(resp));
    }

    let status = StatusCode::from_u16(resp.status().as_u16()).unwrap_or(StatusCode::BAD_GATEWAY);
    let content_type = resp
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| HeaderValue::from_bytes(v.as_bytes()).ok())
        .unwrap_or_else(|| HeaderValue::from_static("application/json"));
    let body = resp.bytes().await?;

    let mut response = (status, body).into_response();
    response
        .headers_mut()
        .insert(header::CONTENT_TYPE, content_type);
    Ok(response)
}
