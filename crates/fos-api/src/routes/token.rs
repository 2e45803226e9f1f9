//! # Asset Ledger API
//!
//! Token metadata, balances, allowances, and holder-initiated transfers.
//! Transfers pass the same compliance and transfers-enabled gates as every
//! other unit movement.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use fos_core::{Address, UnitAmount};
use fos_ledger::TokenMetadata;

use crate::auth::Caller;
use crate::error::AppError;
use crate::extractors::{extract_json, path_address};
use crate::state::AppState;

#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    pub metadata: TokenMetadata,
    pub total_supply: UnitAmount,
    pub max_supply: UnitAmount,
    pub transfers_enabled: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BalanceResponse {
    pub address: Address,
    pub balance: UnitAmount,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AllowanceResponse {
    pub owner: Address,
    pub spender: Address,
    pub allowance: UnitAmount,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TransferRequest {
    pub to: Address,
    pub units: UnitAmount,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ApproveRequest {
    pub spender: Address,
    pub units: UnitAmount,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TransferFromRequest {
    pub from: Address,
    pub to: Address,
    pub units: UnitAmount,
}

/// Outcome of a unit movement.
#[derive(Debug, Serialize, Deserialize)]
pub struct TransferResponse {
    pub from: Address,
    pub to: Address,
    pub units: UnitAmount,
    pub from_balance: UnitAmount,
    pub to_balance: UnitAmount,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/token", get(token))
        .route("/v1/holders", get(holders))
        .route("/v1/balances/{address}", get(balance))
        .route("/v1/allowances/{owner}/{spender}", get(allowance))
        .route("/v1/transfers", post(transfer))
        .route("/v1/transfers/from", post(transfer_from))
        .route("/v1/approvals", post(approve))
}

async fn token(State(state): State<AppState>) -> Json<TokenResponse> {
    let platform = state.platform.read();
    let ledger = platform.ledger();
    Json(TokenResponse {
        metadata: ledger.metadata().clone(),
        total_supply: ledger.total_supply(),
        max_supply: ledger.max_supply(),
        transfers_enabled: ledger.transfers_enabled(),
    })
}

async fn holders(State(state): State<AppState>) -> Json<Vec<BalanceResponse>> {
    let platform = state.platform.read();
    let holders = platform
        .ledger()
        .holders()
        .filter(|(_, balance)| !balance.is_zero())
        .map(|(address, balance)| BalanceResponse {
            address: address.clone(),
            balance,
        })
        .collect();
    Json(holders)
}

async fn balance(
    State(state): State<AppState>,
    Path(address): Path<String>,
) -> Result<Json<BalanceResponse>, AppError> {
    let address = path_address(&address)?;
    let balance = state.platform.read().ledger().balance_of(&address);
    Ok(Json(BalanceResponse { address, balance }))
}

async fn allowance(
    State(state): State<AppState>,
    Path((owner, spender)): Path<(String, String)>,
) -> Result<Json<AllowanceResponse>, AppError> {
    let owner = path_address(&owner)?;
    let spender = path_address(&spender)?;
    let allowance = state.platform.read().ledger().allowance(&owner, &spender);
    Ok(Json(AllowanceResponse {
        owner,
        spender,
        allowance,
    }))
}

async fn transfer(
    State(state): State<AppState>,
    Caller(caller): Caller,
    body: Result<Json<TransferRequest>, JsonRejection>,
) -> Result<Json<TransferResponse>, AppError> {
    let req = extract_json(body)?;
    let mut platform = state.platform.write();
    platform.transfer(&caller, &req.to, req.units)?;
    Ok(Json(TransferResponse {
        from_balance: platform.ledger().balance_of(&caller),
        to_balance: platform.ledger().balance_of(&req.to),
        from: caller,
        to: req.to,
        units: req.units,
    }))
}

async fn transfer_from(
    State(state): State<AppState>,
    Caller(caller): Caller,
    body: Result<Json<TransferFromRequest>, JsonRejection>,
) -> Result<Json<TransferResponse>, AppError> {
    let req = extract_json(body)?;
    let mut platform = state.platform.write();
    platform.transfer_from(&caller, &req.from, &req.to, req.units)?;
    Ok(Json(TransferResponse {
        from_balance: platform.ledger().balance_of(&req.from),
        to_balance: platform.ledger().balance_of(&req.to),
        from: req.from,
        to: req.to,
        units: req.units,
    }))
}

async fn approve(
    State(state): State<AppState>,
    Caller(caller): Caller,
    body: Result<Json<ApproveRequest>, JsonRejection>,
) -> Result<Json<AllowanceResponse>, AppError> {
    let req = extract_json(body)?;
    let mut platform = state.platform.write();
    platform.approve(&caller, &req.spender, req.units)?;
    Ok(Json(AllowanceResponse {
        allowance: platform.ledger().allowance(&caller, &req.spender),
        owner: caller,
        spender: req.spender,
    }))
}
