//! # Extraction Helpers
//!
//! Map body, query, and path parsing failures onto [`AppError`] so every
//! rejection uses the structured error body.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::Query;
use axum::Json;

use fos_core::{Address, ProposalId};

use crate::error::AppError;

/// Extract a JSON body, mapping deserialization errors to [`AppError::BadRequest`].
///
/// ```ignore
/// async fn handler(body: Result<Json<T>, JsonRejection>) -> Result<..., AppError> {
///     let req = extract_json(body)?;
/// }
/// ```
pub fn extract_json<T>(result: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    result
        .map(|Json(v)| v)
        .map_err(|err| AppError::BadRequest(err.body_text()))
}

/// Extract a query string, mapping failures to [`AppError::BadRequest`].
pub fn extract_query<T>(result: Result<Query<T>, QueryRejection>) -> Result<T, AppError> {
    result
        .map(|Query(v)| v)
        .map_err(|err| AppError::BadRequest(err.body_text()))
}

/// Parse an address path segment.
pub fn path_address(raw: &str) -> Result<Address, AppError> {
    Ok(Address::parse(raw)?)
}

/// Parse a proposal id path segment. Accepts `7` or `proposal:7`.
pub fn path_proposal_id(raw: &str) -> Result<ProposalId, AppError> {
    let digits = raw.strip_prefix("proposal:").unwrap_or(raw);
    digits
        .parse::<u64>()
        .map(ProposalId)
        .map_err(|_| AppError::BadRequest(format!("invalid proposal id: {raw:?}")))
}
