//! # API Routes
//!
//! One module per platform component. Queries are `GET`, commands are
//! `POST`. Handlers parse the request, take the platform lock for exactly
//! one call, and map the result; no business logic lives here.

pub mod events;
pub mod exit;
pub mod identities;
pub mod offering;
pub mod proposals;
pub mod settlement;
pub mod token;

use axum::Router;

use crate::state::AppState;

/// All `/v1` routes.
pub fn router() -> Router<AppState> {
    Router::new()
        .merge(identities::router())
        .merge(token::router())
        .merge(offering::router())
        .merge(exit::router())
        .merge(proposals::router())
        .merge(settlement::router())
        .merge(events::router())
}
