//! # Authentication
//!
//! Two pieces of request identity:
//!
//! - **Bearer token** ([`auth_middleware`]): when the server is configured
//!   with a shared token or caller tokens, every API request must present
//!   one of them. Compared in constant time.
//! - **Caller** ([`Caller`]): the account a request acts as, taken from the
//!   `x-fos-caller` header. The platform makes every authorization decision
//!   from this address.
//!
//! ## Trust Boundary
//!
//! Requests are not signed. Without caller tokens the `x-fos-caller` header
//! is self-asserted: any client holding the shared token may act as any
//! account, the authority included. With caller tokens configured
//! (`FOS_CALLER_TOKENS`), a command is accepted only when its bearer token is
//! the one bound to the claimed caller; the shared token then opens queries
//! but cannot act as anyone.

use axum::extract::{FromRequestParts, Request};
use axum::http::request::Parts;
use std::collections::BTreeMap;
use std::sync::Arc;

use axum::http::{header, HeaderMap, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use subtle::ConstantTimeEq;

use fos_core::{Address, FosError};

use crate::error::{AppError, ErrorBody, ErrorDetail};

/// Header carrying the caller's account address.
pub const CALLER_HEADER: &str = "x-fos-caller";

// ── Bearer token ────────────────────────────────────────────────────────────

/// A secret that never appears in `Debug` output.
#[derive(Clone)]
pub struct SecretToken(String);

impl SecretToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    fn matches(&self, provided: &str) -> bool {
        self.0.as_bytes().ct_eq(provided.as_bytes()).into()
    }
}

impl std::fmt::Debug for SecretToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SecretToken(***)")
    }
}

/// Tokens bound to the accounts they may act as.
pub type CallerTokens = BTreeMap<Address, SecretToken>;

/// Tokens expected by [`auth_middleware`] and [`Caller`], injected as a
/// request extension.
#[derive(Debug, Clone, Default)]
pub struct AuthConfig {
    pub token: Option<SecretToken>,
    pub caller_tokens: Arc<CallerTokens>,
}

impl AuthConfig {
    fn is_open(&self) -> bool {
        self.token.is_none() && self.caller_tokens.is_empty()
    }

    /// True when `provided` is the shared token or any caller token. Every
    /// candidate is compared.
    fn accepts(&self, provided: &str) -> bool {
        let shared = self.token.as_ref().is_some_and(|t| t.matches(provided));
        self.caller_tokens
            .values()
            .fold(shared, |found, token| token.matches(provided) | found)
    }
}

/// The token after `Bearer `, if the request carries one.
fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
}

/// Reject requests without a configured bearer token. Pass-through when no
/// token is configured.
pub async fn auth_middleware(request: Request, next: Next) -> Response {
    let config = request
        .extensions()
        .get::<AuthConfig>()
        .cloned()
        .unwrap_or_default();

    if config.is_open() {
        return next.run(request).await;
    }

    let auth_header = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());

    match auth_header {
        Some(value) if value.starts_with("Bearer ") => {
            if config.accepts(&value[7..]) {
                next.run(request).await
            } else {
                tracing::warn!("authentication failed: invalid bearer token");
                unauthorized_response("invalid bearer token")
            }
        }
        Some(_) => {
            tracing::warn!("authentication failed: non-Bearer authorization scheme");
            unauthorized_response("authorization header must use Bearer scheme")
        }
        None => {
            tracing::warn!("authentication failed: missing authorization header");
            unauthorized_response("missing authorization header")
        }
    }
}

fn unauthorized_response(message: &str) -> Response {
    let body = ErrorBody {
        error: ErrorDetail {
            code: "UNAUTHORIZED".to_string(),
            message: message.to_string(),
        },
    };
    (StatusCode::UNAUTHORIZED, Json(body)).into_response()
}

// ── Caller ──────────────────────────────────────────────────────────────────

/// The account a command acts as.
///
/// When caller tokens are configured the request's bearer token must be the
/// one bound to this address; otherwise `PERMISSION_DENIED`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller(pub Address);

impl<S: Send + Sync> FromRequestParts<S> for Caller {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let raw = parts
            .headers
            .get(CALLER_HEADER)
            .ok_or_else(|| AppError::Unauthorized(format!("missing {CALLER_HEADER} header")))?
            .to_str()
            .map_err(|_| AppError::BadRequest(format!("{CALLER_HEADER} is not ASCII")))?;
        let address = Address::parse(raw)?;

        if let Some(config) = parts.extensions.get::<AuthConfig>() {
            if !config.caller_tokens.is_empty() {
                let bound = config.caller_tokens.get(&address);
                let presented = bearer_token(&parts.headers);
                let authorized = matches!((bound, presented), (Some(t), Some(p)) if t.matches(p));
                if !authorized {
                    tracing::warn!(caller = %address, "caller token mismatch");
                    return Err(FosError::permission_denied(
                        &address,
                        "act without the token bound to it",
                    )
                    .into());
                }
            }
        }
        Ok(Self(address))
    }
}
