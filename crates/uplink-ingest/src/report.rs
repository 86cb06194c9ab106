//! Per-terminal job reporting.
//!
//! Every window's outcome is enumerated: a day with no data is visible as
//! "not fetched" or "validation-dropped", never silently missing.

use crate::windows::FetchWindow;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uplink_core::Error;
use uplink_core::ids::{JobId, TerminalId};

/// Classified failure cause, carried in reports and audit events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    Auth,
    RateLimited,
    Transient,
    InvalidRange,
    ExhaustedRetries,
    Validation,
    TerminalNotFound,
    Database,
    Internal,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::Auth => "auth",
            FailureKind::RateLimited => "rate_limited",
            FailureKind::Transient => "transient",
            FailureKind::InvalidRange => "invalid_range",
            FailureKind::ExhaustedRetries => "exhausted_retries",
            FailureKind::Validation => "validation",
            FailureKind::TerminalNotFound => "terminal_not_found",
            FailureKind::Database => "database",
            FailureKind::Internal => "internal",
        }
    }
}

impl From<&Error> for FailureKind {
    fn from(err: &Error) -> Self {
        match err {
            Error::Auth(_) => FailureKind::Auth,
            Error::RateLimited { .. } => FailureKind::RateLimited,
            Error::Transient(_) => FailureKind::Transient,
            Error::InvalidRange { .. } => FailureKind::InvalidRange,
            Error::ExhaustedRetries { .. } => FailureKind::ExhaustedRetries,
            Error::Validation { .. } => FailureKind::Validation,
            Error::TerminalNotFound(_) => FailureKind::TerminalNotFound,
            Error::Database(_) => FailureKind::Database,
            Error::Io(_) | Error::Serialization(_) | Error::Config(_) | Error::Internal(_) => {
                FailureKind::Internal
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WindowStatus {
    Succeeded,
    Failed,
    /// Not attempted because the run was cancelled.
    Skipped,
}

/// Outcome of one fetch window for one terminal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WindowOutcome {
    pub window: FetchWindow,
    pub status: WindowStatus,
    pub days_fetched: u32,
    pub days_dropped: u32,
    pub error_kind: Option<FailureKind>,
    pub error: Option<String>,
}

impl WindowOutcome {
    pub fn succeeded(window: FetchWindow, days_fetched: u32, days_dropped: u32) -> Self {
        Self {
            window,
            status: WindowStatus::Succeeded,
            days_fetched,
            days_dropped,
            error_kind: None,
            error: None,
        }
    }

    pub fn failed(window: FetchWindow, days_fetched: u32, days_dropped: u32, err: &Error) -> Self {
        Self {
            window,
            status: WindowStatus::Failed,
            days_fetched,
            days_dropped,
            error_kind: Some(FailureKind::from(err)),
            error: Some(err.to_string()),
        }
    }

    pub fn skipped(window: FetchWindow) -> Self {
        Self {
            window,
            status: WindowStatus::Skipped,
            days_fetched: 0,
            days_dropped: 0,
            error_kind: None,
            error: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Succeeded,
    Partial,
    Failed,
}

/// Full account of one terminal's import.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TerminalReport {
    pub terminal_id: TerminalId,
    pub status: JobStatus,
    pub windows: Vec<WindowOutcome>,
    pub windows_succeeded: u32,
    pub windows_failed: u32,
    pub windows_skipped: u32,
    pub days_fetched: u32,
    pub days_dropped: u32,
    pub cycles_recomputed: u32,
    /// Aggregation ran but failed; ingested rows are persisted regardless.
    pub aggregation_error: Option<String>,
    /// Terminal-level failure that prevented any window from running.
    pub error_kind: Option<FailureKind>,
    pub error: Option<String>,
}

impl TerminalReport {
    /// Build a report from per-window outcomes.
    pub fn from_outcomes(
        terminal_id: TerminalId,
        windows: Vec<WindowOutcome>,
        cycles_recomputed: u32,
        aggregation_error: Option<String>,
    ) -> Self {
        let windows_succeeded = windows
            .iter()
            .filter(|o| o.status == WindowStatus::Succeeded)
            .count() as u32;
        let windows_failed = windows
            .iter()
            .filter(|o| o.status == WindowStatus::Failed)
            .count() as u32;
        let windows_skipped = windows
            .iter()
            .filter(|o| o.status == WindowStatus::Skipped)
            .count() as u32;
        let days_fetched = windows.iter().map(|o| o.days_fetched).sum();
        let days_dropped = windows.iter().map(|o| o.days_dropped).sum();

        let status = if windows_failed == 0 && windows_skipped == 0 && aggregation_error.is_none() {
            JobStatus::Succeeded
        } else if windows_succeeded == 0 && windows_failed > 0 {
            JobStatus::Failed
        } else {
            JobStatus::Partial
        };

        Self {
            terminal_id,
            status,
            windows,
            windows_succeeded,
            windows_failed,
            windows_skipped,
            days_fetched,
            days_dropped,
            cycles_recomputed,
            aggregation_error,
            error_kind: None,
            error: None,
        }
    }

    /// A terminal that failed before any window could run.
    pub fn failed(terminal_id: TerminalId, err: &Error) -> Self {
        Self {
            terminal_id,
            status: JobStatus::Failed,
            windows: vec![],
            windows_succeeded: 0,
            windows_failed: 0,
            windows_skipped: 0,
            days_fetched: 0,
            days_dropped: 0,
            cycles_recomputed: 0,
            aggregation_error: None,
            error_kind: Some(FailureKind::from(err)),
            error: Some(err.to_string()),
        }
    }
}

/// Report for a whole import run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportReport {
    pub job_id: JobId,
    pub range_start: NaiveDate,
    pub range_end: NaiveDate,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub terminals: Vec<TerminalReport>,
}

impl ImportReport {
    pub fn status(&self) -> JobStatus {
        if self.terminals.iter().all(|t| t.status == JobStatus::Succeeded) {
            JobStatus::Succeeded
        } else if self.terminals.iter().all(|t| t.status == JobStatus::Failed) {
            JobStatus::Failed
        } else {
            JobStatus::Partial
        }
    }

    pub fn days_fetched(&self) -> u32 {
        self.terminals.iter().map(|t| t.days_fetched).sum()
    }

    pub fn days_dropped(&self) -> u32 {
        self.terminals.iter().map(|t| t.days_dropped).sum()
    }
}
