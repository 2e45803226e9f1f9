//! # Compliance Registry API
//!
//! Identity management is restricted to the platform authority; lookups
//! are open to any caller.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use fos_compliance::Identity;
use fos_core::{Address, CountryCode, FosError, Timestamp};

use crate::auth::Caller;
use crate::error::AppError;
use crate::extractors::{extract_json, path_address};
use crate::state::AppState;

/// Request to register an identity.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AddIdentityRequest {
    pub address: Address,
    pub expiry: Timestamp,
    pub country: CountryCode,
}

/// Request to move an identity's expiry.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RenewIdentityRequest {
    pub expiry: Timestamp,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct VerifiedResponse {
    pub address: Address,
    pub verified: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RevokedResponse {
    pub address: Address,
    pub revoked: bool,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/identities", get(list_identities).post(add_identity))
        .route("/v1/identities/{address}", get(get_identity))
        .route("/v1/identities/{address}/verified", get(is_verified))
        .route("/v1/identities/{address}/revoke", post(revoke_identity))
        .route("/v1/identities/{address}/renew", post(renew_identity))
}

async fn list_identities(State(state): State<AppState>) -> Json<Vec<Identity>> {
    let platform = state.platform.read();
    Json(platform.registry().identities().cloned().collect())
}

async fn add_identity(
    State(state): State<AppState>,
    Caller(caller): Caller,
    body: Result<Json<AddIdentityRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Identity>), AppError> {
    let req = extract_json(body)?;
    let identity =
        state
            .platform
            .write()
            .add_identity(&caller, req.address, req.expiry, req.country)?;
    Ok((StatusCode::CREATED, Json(identity)))
}

async fn get_identity(
    State(state): State<AppState>,
    Path(address): Path<String>,
) -> Result<Json<Identity>, AppError> {
    let address = path_address(&address)?;
    let platform = state.platform.read();
    let identity = platform
        .registry()
        .get_identity(&address)
        .cloned()
        .ok_or_else(|| FosError::NotFound(format!("identity {address}")))?;
    Ok(Json(identity))
}

async fn is_verified(
    State(state): State<AppState>,
    Path(address): Path<String>,
) -> Result<Json<VerifiedResponse>, AppError> {
    let address = path_address(&address)?;
    let verified = state.platform.read().is_verified(&address);
    Ok(Json(VerifiedResponse { address, verified }))
}

async fn revoke_identity(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Path(address): Path<String>,
) -> Result<Json<RevokedResponse>, AppError> {
    let address = path_address(&address)?;
    state.platform.write().remove_identity(&caller, &address)?;
    Ok(Json(RevokedResponse {
        address,
        revoked: true,
    }))
}

async fn renew_identity(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Path(address): Path<String>,
    body: Result<Json<RenewIdentityRequest>, JsonRejection>,
) -> Result<Json<Identity>, AppError> {
    let address = path_address(&address)?;
    let req = extract_json(body)?;
    let identity = state
        .platform
        .write()
        .renew_identity(&caller, &address, req.expiry)?;
    Ok(Json(identity))
}
