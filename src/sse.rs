//! Response relay.
//!
//! Upstream chunks are handed to the client as they arrive: no channel, no
//! re-framing, no full-body buffering. The relay owns the upstream stream, so
//! when the client disconnects and axum drops the body the upstream request is
//! dropped (and cancelled) with it.

use axum::{
    body::Body,
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use futures::Stream;
use std::pin::Pin;
use std::task::{Context, Poll};

use crate::metrics::increment_active_streams;

/// Keeps the active-stream gauge in step with live relays.
#[derive(Debug)]
struct ActiveStreamGuard;

impl ActiveStreamGuard {
    fn new() -> Self {
        increment_active_streams(1);
        Self
    }
}

impl Drop for ActiveStreamGuard {
    fn drop(&mut self) {
        increment_active_streams(-1);
    }
}

/// Pass-through stream wrapper. Yields exactly what the inner stream yields,
/// in order, and ends when it ends.
pub struct RelayStream<S> {
    inner: Pin<Box<S>>,
    _guard: ActiveStreamGuard,
}

/// Wrap `upstream` for relaying.
pub fn relay<S: Stream>(upstream: S) -> RelayStream<S> {
    RelayStream {
        inner: Box::pin(upstream),
        _guard: ActiveStreamGuard::new(),
    }
}

impl<S: Stream> Stream for RelayStream<S> {
    type Item = S::Item;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.inner.as_mut().poll_next(cx)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

/// Turn an upstream streaming response into an axum response with the same
/// status and content type.
pub fn stream_response(resp: reqwest::Response) -> Response {
    let status = StatusCode::from_u16(resp.status().as_u16()).unwrap_or(StatusCode::BAD_GATEWAY);
    let content_type = resp
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| HeaderValue::from_bytes(v.as_bytes()).ok())
        .unwrap_or_else(|| HeaderValue::from_static("text/event-stream"));

    let body = Body::from_stream(relay(resp.bytes_stream()));

    let mut response = (status, body).into_response();
    let headers = response.headers_mut();
    headers.insert(header::CONTENT_TYPE, content_type);
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    response
}
