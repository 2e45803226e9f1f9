//! # Application State
//!
//! Shared state for the Axum application, passed to all route handlers
//! via the `State` extractor.

use std::net::SocketAddr;
use std::sync::Arc;

use metrics_exporter_prometheus::PrometheusHandle;

use fos_engine::SharedPlatform;

use fos_core::Address;

use crate::auth::{CallerTokens, SecretToken};

/// Default listen address.
pub const DEFAULT_BIND: &str = "127.0.0.1:8080";

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub bind: SocketAddr,
    /// When set, every `/v1` request must carry `Authorization: Bearer <token>`.
    pub auth_token: Option<SecretToken>,
    /// Per-account tokens. When non-empty, commands must present the token
    /// bound to their caller.
    pub caller_tokens: Arc<CallerTokens>,
}

impl ApiConfig {
    /// True when neither a shared token nor caller tokens are configured.
    pub fn is_unauthenticated(&self) -> bool {
        self.auth_token.is_none() && self.caller_tokens.is_empty()
    }

    /// Read `FOS_BIND`, `FOS_AUTH_TOKEN` and `FOS_CALLER_TOKENS` from the
    /// environment.
    pub fn from_env() -> Result<Self, String> {
        let bind = std::env::var("FOS_BIND").unwrap_or_else(|_| DEFAULT_BIND.to_string());
        let bind = bind
            .parse()
            .map_err(|e| format!("FOS_BIND {bind:?} is not a socket address: {e}"))?;
        let auth_token = std::env::var("FOS_AUTH_TOKEN")
            .ok()
            .filter(|t| !t.is_empty())
            .map(SecretToken::new);
        let caller_tokens = match std::env::var("FOS_CALLER_TOKENS") {
            Ok(raw) => parse_caller_tokens(&raw)?,
            Err(_) => CallerTokens::new(),
        };
        Ok(Self {
            bind,
            auth_token,
            caller_tokens: Arc::new(caller_tokens),
        })
    }
}

/// Parse `address=token` pairs separated by commas.
pub fn parse_caller_tokens(raw: &str) -> Result<CallerTokens, String> {
    let mut tokens = CallerTokens::new();
    for entry in raw.split(',').map(str::trim).filter(|e| !e.is_empty()) {
        let (address, token) = entry
            .split_once('=')
            .ok_or_else(|| format!("FOS_CALLER_TOKENS entry {entry:?} is not address=token"))?;
        let address = Address::parse(address.trim())
            .map_err(|e| format!("FOS_CALLER_TOKENS: {e}"))?;
        let token = token.trim();
        if token.is_empty() {
            return Err(format!("FOS_CALLER_TOKENS: empty token for {address}"));
        }
        if tokens.insert(address.clone(), SecretToken::new(token)).is_some() {
            return Err(format!("FOS_CALLER_TOKENS: {address} listed twice"));
        }
    }
    Ok(tokens)
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([127, 0, 0, 1], 8080)),
            auth_token: None,
            caller_tokens: Arc::default(),
        }
    }
}

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub platform: SharedPlatform,
    pub config: ApiConfig,
    /// Renders `/metrics`. `None` disables the endpoint.
    pub metrics: Option<PrometheusHandle>,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("config", &self.config)
            .field("metrics", &self.metrics.is_some())
            .finish_non_exhaustive()
    }
}

impl AppState {
    pub fn new(platform: SharedPlatform, config: ApiConfig) -> Self {
        Self {
            platform,
            config,
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_caller_tokens() {
        let tokens = parse_caller_tokens(" 0xA0=ops-key , 0x01=alice ,").unwrap();
        assert_eq!(tokens.len(), 2);
        assert!(tokens.contains_key(&Address::parse("0xa0").unwrap()));
        assert!(tokens.contains_key(&Address::parse("0x0001").unwrap()));
        assert!(parse_caller_tokens("").unwrap().is_empty());
    }

    #[test]
    fn test_parse_caller_tokens_rejects_malformed_entries() {
        assert!(parse_caller_tokens("0x01").is_err());
        assert!(parse_caller_tokens("nope=tok").is_err());
        assert!(parse_caller_tokens("0x01=").is_err());
        assert!(parse_caller_tokens("0x01=a,0x001=b").is_err());
    }

    #[test]
    fn test_default_config_is_unauthenticated() {
        assert!(ApiConfig::default().is_unauthenticated());
    }
}
