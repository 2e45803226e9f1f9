//! # API Error Types
//!
//! Structured error type implementing `axum::response::IntoResponse`.
//! Domain errors keep their machine-readable kind as the response `code`;
//! request-shape problems detected before the platform is reached use the
//! transport codes below.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use fos_core::FosError;

/// Structured JSON error response body.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

/// Inner error detail.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorDetail {
    /// Machine-readable error code (e.g. "INSUFFICIENT_BALANCE", "BAD_REQUEST").
    pub code: String,
    /// Human-readable error message.
    pub message: String,
}

/// Application-level error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// A platform command or query was rejected.
    #[error(transparent)]
    Domain(#[from] FosError),

    /// Request body or query string could not be parsed (400).
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Missing or invalid credentials (401).
    #[error("unauthorized: {0}")]
    Unauthorized(String),
}

impl AppError {
    /// HTTP status and machine-readable code for this error.
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            Self::Domain(err) => (domain_status(err), err.kind()),
            Self::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            Self::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
        }
    }
}

fn domain_status(err: &FosError) -> StatusCode {
    match err {
        FosError::PermissionDenied { .. } => StatusCode::FORBIDDEN,
        FosError::NotFound(_) => StatusCode::NOT_FOUND,
        FosError::NotVerified(_)
        | FosError::InsufficientBalance { .. }
        | FosError::InsufficientAllowance { .. }
        | FosError::InvalidAmount(_)
        | FosError::InvalidPayload(_) => StatusCode::UNPROCESSABLE_ENTITY,
        FosError::TransfersRestricted
        | FosError::CapExceeded { .. }
        | FosError::SaleInactive
        | FosError::AlreadyDeposited
        | FosError::NotYetDeposited
        | FosError::AlreadyVoted { .. }
        | FosError::VotingClosed(_)
        | FosError::VotingStillOpen(_)
        | FosError::ProposalNotActive { .. }
        | FosError::ProposalRejectedOnTally { .. } => StatusCode::CONFLICT,
        FosError::SettlementFailure(_) => StatusCode::BAD_GATEWAY,
        FosError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        // Never expose internal error messages to clients.
        let message = if matches!(self, Self::Domain(FosError::Config(_))) {
            tracing::error!(error = %self, "internal server error");
            "An internal error occurred".to_string()
        } else {
            self.to_string()
        };

        let body = ErrorBody {
            error: ErrorDetail {
                code: code.to_string(),
                message,
            },
        };
        (status, Json(body)).into_response()
    }
}
