//! # fos-api — Axum API Services
//!
//! HTTP surface over one [`SharedPlatform`](fos_engine::SharedPlatform).
//! Queries take the read lock, commands take the write lock, and every
//! platform error maps to a structured JSON body via [`AppError`].
//!
//! ## API Surface
//!
//! | Prefix                         | Module                    | Component           |
//! |--------------------------------|---------------------------|---------------------|
//! | `/v1/identities/*`             | [`routes::identities`]    | ComplianceRegistry  |
//! | `/v1/token`, `/v1/balances/*`, `/v1/transfers*`, `/v1/approvals` | [`routes::token`] | AssetLedger |
//! | `/v1/offering/*`               | [`routes::offering`]      | PrimaryOffering     |
//! | `/v1/exit/*`                   | [`routes::exit`]          | ExitDistribution    |
//! | `/v1/proposals/*`, `/v1/voting-power/*` | [`routes::proposals`] | GovernanceEngine |
//! | `/v1/settlement/*`             | [`routes::settlement`]    | Settlement token    |
//! | `/v1/events`, `/v1/snapshot`   | [`routes::events`]        | Journal             |
//!
//! ## Middleware Stack (execution order)
//!
//! ```text
//! TraceLayer → MetricsMiddleware → AuthMiddleware → Handler
//! ```
//!
//! Health probes and `/metrics` sit outside the auth layer.
//!
//! ## Crate Policy
//!
//! - No business logic in route handlers; every decision is the platform's.
//! - The platform lock is never held across an `.await`.

pub mod auth;
pub mod error;
pub mod extractors;
pub mod middleware;
pub mod routes;
pub mod state;

use axum::extract::{DefaultBodyLimit, State};
use axum::http::{header, StatusCode};
use axum::middleware::from_fn;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Extension, Router};
use tower_http::trace::TraceLayer;

pub use error::AppError;
pub use state::{ApiConfig, AppState};

use crate::auth::AuthConfig;

/// Request bodies are small JSON documents.
const BODY_LIMIT_BYTES: usize = 64 * 1024;

/// Assemble the application router.
pub fn app(state: AppState) -> Router {
    let auth_config = AuthConfig {
        token: state.config.auth_token.clone(),
        caller_tokens: state.config.caller_tokens.clone(),
    };

    let api = routes::router()
        .layer(DefaultBodyLimit::max(BODY_LIMIT_BYTES))
        .layer(from_fn(auth::auth_middleware))
        .layer(from_fn(middleware::metrics::metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(Extension(auth_config))
        .with_state(state.clone());

    let mut unauthenticated = Router::new()
        .route("/health/liveness", get(liveness))
        .route("/health/readiness", get(readiness));
    if state.metrics.is_some() {
        unauthenticated = unauthenticated.route("/metrics", get(prometheus_metrics));
    }
    let unauthenticated = unauthenticated.with_state(state);

    Router::new().merge(unauthenticated).merge(api)
}

/// Liveness probe. Always 200 while the process runs.
async fn liveness() -> &'static str {
    "ok"
}

/// Readiness probe.
///
/// 503 when the platform lock cannot be taken without waiting, or when a
/// cross-component invariant is violated.
async fn readiness(State(state): State<AppState>) -> impl IntoResponse {
    let Some(platform) = state.platform.try_read() else {
        return (StatusCode::SERVICE_UNAVAILABLE, "platform busy".to_string()).into_response();
    };
    let violations = platform.check_invariants();
    if !violations.is_empty() {
        tracing::error!(?violations, "ledger invariants violated");
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            format!("invariants violated: {}", violations.join("; ")),
        )
            .into_response();
    }
    (StatusCode::OK, "ready".to_string()).into_response()
}

/// Prometheus scrape endpoint.
async fn prometheus_metrics(State(state): State<AppState>) -> impl IntoResponse {
    match &state.metrics {
        Some(handle) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4; charset=utf-8")],
            handle.render(),
        )
            .into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}
