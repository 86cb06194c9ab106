//! Error types for the uplink usage pipeline.

use chrono::NaiveDate;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    // Provider errors
    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Rate limited by provider")]
    RateLimited { retry_after_secs: Option<u64> },

    #[error("Transient provider error: {0}")]
    Transient(String),

    #[error("Invalid fetch range {start}..{end}: {reason}")]
    InvalidRange {
        start: NaiveDate,
        end: NaiveDate,
        reason: String,
    },

    #[error("Retries exhausted after {attempts} attempts: {last}")]
    ExhaustedRetries { attempts: u32, last: String },

    // Data quality errors
    #[error("Validation failed for {date}: {reason}")]
    Validation { date: NaiveDate, reason: String },

    // Terminal errors
    #[error("Terminal not found: {0}")]
    TerminalNotFound(String),

    // Infrastructure errors
    #[error("Database error: {0}")]
    Database(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Configuration error: {0}")]
    Config(String),

    // Generic
    #[error("Internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Whether this error is eligible for retry with backoff.
    ///
    /// Auth failures and range errors are caller bugs or require
    /// re-authentication; retrying them unchanged cannot succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::RateLimited { .. } | Error::Transient(_))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}
