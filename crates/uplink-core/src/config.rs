//! Import configuration.

use serde::{Deserialize, Serialize};

/// Options for a historical import run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportOptions {
    /// Maximum days per provider call.
    #[serde(default = "default_chunk_days")]
    pub chunk_days: u32,
    /// Retry attempts for rate-limited and transient failures.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Terminals processed concurrently. The throttle below is shared
    /// across workers, so this bounds in-flight work, not call rate.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    /// Base delay for exponential backoff.
    #[serde(default = "default_backoff_base_ms")]
    pub backoff_base_ms: u64,
    /// Upper bound on a single backoff delay.
    #[serde(default = "default_backoff_cap_ms")]
    pub backoff_cap_ms: u64,
    /// Minimum spacing between any two provider calls.
    #[serde(default = "default_min_interval_ms")]
    pub min_interval_ms: u64,
    /// Hard timeout on each provider call, distinct from backoff delays.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Nominal cycle length for synthetic boundary derivation.
    #[serde(default = "default_cycle_length_days")]
    pub cycle_length_days: u32,
}

fn default_chunk_days() -> u32 {
    7
}

fn default_max_retries() -> u32 {
    5
}

fn default_concurrency() -> usize {
    3
}

fn default_backoff_base_ms() -> u64 {
    500
}

fn default_backoff_cap_ms() -> u64 {
    30_000
}

fn default_min_interval_ms() -> u64 {
    1_000
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_cycle_length_days() -> u32 {
    30
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            chunk_days: default_chunk_days(),
            max_retries: default_max_retries(),
            concurrency: default_concurrency(),
            backoff_base_ms: default_backoff_base_ms(),
            backoff_cap_ms: default_backoff_cap_ms(),
            min_interval_ms: default_min_interval_ms(),
            request_timeout_secs: default_request_timeout_secs(),
            cycle_length_days: default_cycle_length_days(),
        }
    }
}
