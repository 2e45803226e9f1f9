//! # Middleware
//!
//! Request-level metrics. Authentication lives in [`crate::auth`].

pub mod metrics;
