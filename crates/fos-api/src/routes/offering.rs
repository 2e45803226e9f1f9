//! # Primary Offering API

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use fos_core::{Address, SettlementAmount, UnitAmount};
use fos_offering::OfferingState;

use crate::auth::Caller;
use crate::error::AppError;
use crate::extractors::{extract_json, extract_query};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct UnitsQuery {
    pub units: UnitAmount,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BuyRequest {
    pub units: UnitAmount,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WithdrawRequest {
    pub to: Address,
}

/// Price of `units`, quoted or charged.
#[derive(Debug, Serialize, Deserialize)]
pub struct CostResponse {
    pub units: UnitAmount,
    pub cost: SettlementAmount,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct WithdrawResponse {
    pub to: Address,
    pub amount: SettlementAmount,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/offering", get(offering))
        .route("/v1/offering/cost", get(cost))
        .route("/v1/offering/buy", post(buy))
        .route("/v1/offering/close", post(close))
        .route("/v1/offering/withdraw", post(withdraw))
}

async fn offering(State(state): State<AppState>) -> Json<OfferingState> {
    Json(state.platform.read().offering().state())
}

async fn cost(
    State(state): State<AppState>,
    query: Result<Query<UnitsQuery>, QueryRejection>,
) -> Result<Json<CostResponse>, AppError> {
    let UnitsQuery { units } = extract_query(query)?;
    let cost = state.platform.read().calculate_cost(units)?;
    Ok(Json(CostResponse { units, cost }))
}

async fn buy(
    State(state): State<AppState>,
    Caller(caller): Caller,
    body: Result<Json<BuyRequest>, JsonRejection>,
) -> Result<Json<CostResponse>, AppError> {
    let req = extract_json(body)?;
    let cost = state.platform.write().buy_tokens(&caller, req.units)?;
    Ok(Json(CostResponse {
        units: req.units,
        cost,
    }))
}

async fn close(
    State(state): State<AppState>,
    Caller(caller): Caller,
) -> Result<Json<OfferingState>, AppError> {
    let mut platform = state.platform.write();
    platform.close_sale(&caller)?;
    Ok(Json(platform.offering().state()))
}

async fn withdraw(
    State(state): State<AppState>,
    Caller(caller): Caller,
    body: Result<Json<WithdrawRequest>, JsonRejection>,
) -> Result<Json<WithdrawResponse>, AppError> {
    let req = extract_json(body)?;
    let amount = state.platform.write().withdraw_funds(&caller, &req.to)?;
    Ok(Json(WithdrawResponse { to: req.to, amount }))
}
