//! # Settlement Asset API
//!
//! Balances and approvals on the settlement token. Minting exists for
//! funding participants in test and demo deployments and is restricted to
//! the platform authority.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use fos_core::{Address, SettlementAmount};
use fos_ledger::SettlementAsset;

use crate::auth::Caller;
use crate::error::AppError;
use crate::extractors::{extract_json, path_address};
use crate::state::AppState;

#[derive(Debug, Serialize, Deserialize)]
pub struct SettlementBalanceResponse {
    pub address: Address,
    pub symbol: String,
    pub balance: SettlementAmount,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SettlementApproveRequest {
    pub spender: Address,
    pub amount: SettlementAmount,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SettlementAllowanceResponse {
    pub owner: Address,
    pub spender: Address,
    pub allowance: SettlementAmount,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MintRequest {
    pub to: Address,
    pub amount: SettlementAmount,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/settlement/approve", post(approve))
        .route("/v1/settlement/mint", post(mint))
        .route("/v1/settlement/{address}", get(balance))
}

async fn balance(
    State(state): State<AppState>,
    Path(address): Path<String>,
) -> Result<Json<SettlementBalanceResponse>, AppError> {
    let address = path_address(&address)?;
    let platform = state.platform.read();
    let settlement = platform.settlement();
    Ok(Json(SettlementBalanceResponse {
        balance: settlement.balance_of(&address),
        symbol: settlement.symbol().to_string(),
        address,
    }))
}

async fn approve(
    State(state): State<AppState>,
    Caller(caller): Caller,
    body: Result<Json<SettlementApproveRequest>, JsonRejection>,
) -> Result<Json<SettlementAllowanceResponse>, AppError> {
    let req = extract_json(body)?;
    let mut platform = state.platform.write();
    platform.settlement_approve(&caller, &req.spender, req.amount)?;
    Ok(Json(SettlementAllowanceResponse {
        allowance: platform.settlement().allowance(&caller, &req.spender),
        owner: caller,
        spender: req.spender,
    }))
}

async fn mint(
    State(state): State<AppState>,
    Caller(caller): Caller,
    body: Result<Json<MintRequest>, JsonRejection>,
) -> Result<Json<SettlementBalanceResponse>, AppError> {
    let req = extract_json(body)?;
    let mut platform = state.platform.write();
    platform.mint_settlement(&caller, &req.to, req.amount)?;
    let settlement = platform.settlement();
    Ok(Json(SettlementBalanceResponse {
        balance: settlement.balance_of(&req.to),
        symbol: settlement.symbol().to_string(),
        address: req.to,
    }))
}
