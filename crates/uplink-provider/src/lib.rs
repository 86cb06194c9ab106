//! Provider API adapter for the uplink usage pipeline.
//!
//! Wraps the satellite-connectivity provider's enterprise API: OAuth2
//! client-credentials authentication, the usage-query endpoint, and the
//! shared throttle / retry machinery that paces every outbound call.

pub mod auth;
pub mod client;
pub mod throttle;

pub use auth::{AuthConfig, TokenManager};
pub use client::{ProviderClient, ProviderConfig};
pub use throttle::{RetryPolicy, Throttle, call_with_retries};
