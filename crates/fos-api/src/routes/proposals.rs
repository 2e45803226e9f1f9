//! # Governance API
//!
//! Proposal creation and voting are gated on compliance and a non-zero
//! balance. Execution and finalization are open to any caller once the
//! voting window has closed.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use fos_core::{Address, FosError, ProposalId};
use fos_governance::{decode_hex_payload, Proposal, ProposalKind, VoteRecord, VotingPower};

use crate::auth::Caller;
use crate::error::AppError;
use crate::extractors::{extract_json, path_address, path_proposal_id};
use crate::state::AppState;

/// Request to open a proposal.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateProposalRequest {
    pub kind: ProposalKind,
    pub description: String,
    /// Hex-encoded payload, optionally `0x`-prefixed. Omitted means empty.
    #[serde(default)]
    pub payload: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VoteRequest {
    pub support: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PassedResponse {
    pub proposal_id: ProposalId,
    pub passed: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct VotingPowerResponse {
    pub address: Address,
    #[serde(flatten)]
    pub power: VotingPower,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/proposals", get(list_proposals).post(create_proposal))
        .route("/v1/proposals/{id}", get(get_proposal))
        .route("/v1/proposals/{id}/passed", get(has_passed))
        .route("/v1/proposals/{id}/votes/{voter}", get(get_vote))
        .route("/v1/proposals/{id}/vote", post(vote))
        .route("/v1/proposals/{id}/execute", post(execute))
        .route("/v1/proposals/{id}/finalize", post(finalize))
        .route("/v1/proposals/{id}/cancel", post(cancel))
        .route("/v1/voting-power/{address}", get(voting_power))
}

async fn list_proposals(State(state): State<AppState>) -> Json<Vec<Proposal>> {
    let platform = state.platform.read();
    Json(platform.governance().proposals().cloned().collect())
}

async fn create_proposal(
    State(state): State<AppState>,
    Caller(caller): Caller,
    body: Result<Json<CreateProposalRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Proposal>), AppError> {
    let req = extract_json(body)?;
    let payload = decode_hex_payload(&req.payload)?;
    let proposal =
        state
            .platform
            .write()
            .create_proposal(&caller, req.kind, &req.description, &payload)?;
    Ok((StatusCode::CREATED, Json(proposal)))
}

async fn get_proposal(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Proposal>, AppError> {
    let id = path_proposal_id(&id)?;
    let platform = state.platform.read();
    Ok(Json(platform.governance().get_proposal(id)?.clone()))
}

async fn has_passed(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<PassedResponse>, AppError> {
    let proposal_id = path_proposal_id(&id)?;
    let passed = state.platform.read().has_proposal_passed(proposal_id)?;
    Ok(Json(PassedResponse {
        proposal_id,
        passed,
    }))
}

async fn get_vote(
    State(state): State<AppState>,
    Path((id, voter)): Path<(String, String)>,
) -> Result<Json<VoteRecord>, AppError> {
    let id = path_proposal_id(&id)?;
    let voter = path_address(&voter)?;
    let platform = state.platform.read();
    platform.governance().get_proposal(id)?;
    let record = platform
        .governance()
        .vote_record(id, &voter)
        .cloned()
        .ok_or_else(|| FosError::NotFound(format!("vote by {voter} on {id}")))?;
    Ok(Json(record))
}

async fn vote(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Path(id): Path<String>,
    body: Result<Json<VoteRequest>, JsonRejection>,
) -> Result<Json<VoteRecord>, AppError> {
    let id = path_proposal_id(&id)?;
    let req = extract_json(body)?;
    let record = state.platform.write().vote(&caller, id, req.support)?;
    Ok(Json(record))
}

async fn execute(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Path(id): Path<String>,
) -> Result<Json<Proposal>, AppError> {
    let id = path_proposal_id(&id)?;
    Ok(Json(state.platform.write().execute_proposal(&caller, id)?))
}

async fn finalize(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Path(id): Path<String>,
) -> Result<Json<Proposal>, AppError> {
    let id = path_proposal_id(&id)?;
    Ok(Json(state.platform.write().finalize_proposal(&caller, id)?))
}

async fn cancel(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Path(id): Path<String>,
) -> Result<Json<Proposal>, AppError> {
    let id = path_proposal_id(&id)?;
    Ok(Json(state.platform.write().cancel_proposal(&caller, id)?))
}

async fn voting_power(
    State(state): State<AppState>,
    Path(address): Path<String>,
) -> Result<Json<VotingPowerResponse>, AppError> {
    let address = path_address(&address)?;
    let power = state.platform.read().voting_power(&address);
    Ok(Json(VotingPowerResponse { address, power }))
}
