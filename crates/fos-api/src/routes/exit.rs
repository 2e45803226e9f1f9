//! # Exit Distribution API
//!
//! Proceeds deposit (authority only) and pro-rata redemption. Redemption
//! quotes are zero until proceeds are deposited.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use fos_core::{Address, PricePerUnit, SettlementAmount, UnitAmount};
use fos_exit::DistributionState;

use crate::auth::Caller;
use crate::error::AppError;
use crate::extractors::{extract_json, extract_query};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct RedemptionQuery {
    pub units: UnitAmount,
}

#[derive(Debug, Deserialize)]
pub struct ReturnQuery {
    pub holder: Address,
    pub initial_investment: SettlementAmount,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DepositRequest {
    pub amount: SettlementAmount,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RedeemRequest {
    pub units: UnitAmount,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RedemptionResponse {
    pub units: UnitAmount,
    pub payout: SettlementAmount,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ReturnResponse {
    pub holder: Address,
    pub initial_investment: SettlementAmount,
    /// Gain over the initial investment in basis points; losses read zero.
    pub return_bps: u128,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DepositResponse {
    pub amount: SettlementAmount,
    pub final_price_per_unit: PricePerUnit,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/exit", get(distribution))
        .route("/v1/exit/redemption", get(redemption))
        .route("/v1/exit/return", get(investment_return))
        .route("/v1/exit/deposit", post(deposit))
        .route("/v1/exit/redeem", post(redeem))
}

async fn distribution(State(state): State<AppState>) -> Json<DistributionState> {
    Json(state.platform.read().exit().state())
}

async fn redemption(
    State(state): State<AppState>,
    query: Result<Query<RedemptionQuery>, QueryRejection>,
) -> Result<Json<RedemptionResponse>, AppError> {
    let RedemptionQuery { units } = extract_query(query)?;
    let payout = state.platform.read().calculate_redemption(units)?;
    Ok(Json(RedemptionResponse { units, payout }))
}

async fn investment_return(
    State(state): State<AppState>,
    query: Result<Query<ReturnQuery>, QueryRejection>,
) -> Result<Json<ReturnResponse>, AppError> {
    let q = extract_query(query)?;
    let return_bps = state
        .platform
        .read()
        .calculate_return(&q.holder, q.initial_investment)?;
    Ok(Json(ReturnResponse {
        holder: q.holder,
        initial_investment: q.initial_investment,
        return_bps,
    }))
}

async fn deposit(
    State(state): State<AppState>,
    Caller(caller): Caller,
    body: Result<Json<DepositRequest>, JsonRejection>,
) -> Result<Json<DepositResponse>, AppError> {
    let req = extract_json(body)?;
    let final_price_per_unit = state.platform.write().deposit_proceeds(&caller, req.amount)?;
    Ok(Json(DepositResponse {
        amount: req.amount,
        final_price_per_unit,
    }))
}

async fn redeem(
    State(state): State<AppState>,
    Caller(caller): Caller,
    body: Result<Json<RedeemRequest>, JsonRejection>,
) -> Result<Json<RedemptionResponse>, AppError> {
    let req = extract_json(body)?;
    let payout = state.platform.write().redeem(&caller, req.units)?;
    Ok(Json(RedemptionResponse {
        units: req.units,
        payout,
    }))
}
