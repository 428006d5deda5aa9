//! Route middleware that runs before the handler reads the body.

use axum::extract::{Request, State};
use axum::http::header::CONTENT_ENCODING;
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;

use crate::http::request::request_id;
use crate::http::response::{self, RequestError};
use crate::observability::metrics;

/// Hold a permit from `limit` for the whole request, body included.
pub async fn limit_concurrency(
    State(limit): State<Arc<Semaphore>>,
    request: Request,
    next: Next,
) -> Response {
    let Ok(_permit) = limit.acquire().await else {
        return response::status(StatusCode::SERVICE_UNAVAILABLE);
    };
    next.run(request).await
}

/// Refuse bodies whose `Content-Encoding` decompression left in place.
///
/// Decoded bodies have the header stripped, so anything still set other than
/// `identity` is an encoding the receiver cannot read.
pub async fn reject_undecoded_body(request: Request, next: Next) -> Response {
    let encoding = request
        .headers()
        .get(CONTENT_ENCODING)
        .map(|v| String::from_utf8_lossy(v.as_bytes()).trim().to_ascii_lowercase())
        .filter(|e| !e.is_empty() && e != "identity");

    let Some(encoding) = encoding else {
        return next.run(request).await;
    };

    let start = Instant::now();
    let error = RequestError::UnsupportedEncoding(encoding);
    tracing::warn!(
        request_id = %request_id(request.headers()),
        error = %error,
        "Agent request rejected"
    );
    let response = error.into_response();
    metrics::record_request("unknown", response.status().as_u16(), start);
    response
}
