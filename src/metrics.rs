use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use lazy_static::lazy_static;
use prometheus::{
    register_counter, register_counter_vec, register_gauge, Counter, CounterVec, Encoder, Gauge,
    TextEncoder,
};
use tracing::error;

use crate::reasoning::ReasoningStrength;

lazy_static! {
    static ref DECISIONS_TOTAL: CounterVec = register_counter_vec!(
        "reasoning_router_decisions_total",
        "Requests rewritten per classified reasoning strength",
        &["strength"]
    )
    .unwrap();

    static ref BYPASS_TOTAL: Counter = register_counter!(
        "reasoning_router_bypass_total",
        "Requests not addressed to the routed model"
    )
    .unwrap();

    static ref SELF_ROUTE_TOTAL: CounterVec = register_counter_vec!(
        "reasoning_router_self_route_total",
        "Requests left unchanged because the route target equals the request model",
        &["strength"]
    )
    .unwrap();

    static ref UPSTREAM_FAILURES_TOTAL: CounterVec = register_counter_vec!(
        "reasoning_router_upstream_failures_total",
        "Failures talking to the upstream gateway per reason",
        &["reason"]
    )
    .unwrap();

    static ref ACTIVE_STREAMS: Gauge = register_gauge!(
        "reasoning_router_active_streams",
        "Current number of relayed response streams"
    )
    .unwrap();
}

pub fn record_decision(strength: ReasoningStrength) {
    DECISIONS_TOTAL
        .with_label_values(&[strength.as_str()])
        .inc();
}

pub fn record_bypass() {
    BYPASS_TOTAL.inc();
}

pub fn record_self_route(strength: ReasoningStrength) {
    SELF_ROUTE_TOTAL
        .with_label_values(&[strength.as_str()])
        .inc();
}

pub fn record_upstream_failure(reason: &str) {
    UPSTREAM_FAILURES_TOTAL.with_label_values(&[reason]).inc();
}

pub fn increment_active_streams(delta: i64) {
    ACTIVE_STREAMS.add(delta as f64);
}

/// Render every registered metric in the prometheus text format.
pub fn render() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    Ok(String::from_utf8_lossy(&buffer).into_owned())
}

pub async fn metrics_handler() -> impl IntoResponse {
    match render() {
        Ok(body) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, TextEncoder::new().format_type().to_string())],
            body,
        )
            .into_response(),
        Err(e) => {
            error!("failed to encode metrics: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
