//! # Journal and Snapshot API

use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;

use fos_engine::{LedgerEvent, PlatformSnapshot};

use crate::error::AppError;
use crate::extractors::extract_query;
use crate::state::AppState;

/// Maximum events returned per request.
const PAGE_LIMIT: usize = 1_000;

#[derive(Debug, Deserialize)]
pub struct EventsQuery {
    /// Return events with a sequence number strictly greater than this.
    #[serde(default)]
    pub since: u64,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/events", get(events))
        .route("/v1/snapshot", get(snapshot))
}

async fn events(
    State(state): State<AppState>,
    query: Result<Query<EventsQuery>, QueryRejection>,
) -> Result<Json<Vec<LedgerEvent>>, AppError> {
    let EventsQuery { since } = extract_query(query)?;
    let platform = state.platform.read();
    let page = platform.events(since).iter().take(PAGE_LIMIT).cloned().collect();
    Ok(Json(page))
}

async fn snapshot(State(state): State<AppState>) -> Json<PlatformSnapshot> {
    Json(state.platform.read().snapshot())
}
