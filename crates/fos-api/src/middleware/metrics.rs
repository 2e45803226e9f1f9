//! # Request Metrics
//!
//! HTTP-level metrics recorded through the `metrics` facade. Whatever
//! recorder the binary installs (Prometheus in `fos serve`) collects them;
//! with no recorder installed they are no-ops.
//!
//! - `fos_http_requests_total{method, path, status}`
//! - `fos_http_request_duration_seconds{method, path}`
//!
//! `path` is the matched route template (`/v1/proposals/{id}`), never the
//! raw URI, so label cardinality stays bounded.

use std::time::Instant;

use axum::extract::{MatchedPath, Request};
use axum::middleware::Next;
use axum::response::Response;

/// Record a counter and a latency histogram per request.
pub async fn metrics_middleware(request: Request, next: Next) -> Response {
    let method = request.method().to_string();
    let path = request
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| "unmatched".to_string());
    let started = Instant::now();

    let response = next.run(request).await;

    let status = response.status().as_u16().to_string();
    metrics::counter!(
        "fos_http_requests_total",
        "method" => method.clone(),
        "path" => path.clone(),
        "status" => status
    )
    .increment(1);
    metrics::histogram!(
        "fos_http_request_duration_seconds",
        "method" => method,
        "path" => path
    )
    .record(started.elapsed().as_secs_f64());

    response
}
