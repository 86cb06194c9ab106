//! Structured audit events emitted by the ingestion pipeline.
//!
//! The pipeline reports what happened; an external sink decides how events
//! are formatted and stored.

use crate::cycle::CycleStatus;
use crate::ids::{JobId, TerminalId};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// All audit events in the ingestion pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ImportEvent {
    // Terminal lifecycle
    TerminalStarted(TerminalStartedPayload),
    TerminalCompleted(TerminalCompletedPayload),

    // Window lifecycle
    WindowStarted(WindowStartedPayload),
    WindowSucceeded(WindowSucceededPayload),
    WindowFailed(WindowFailedPayload),

    // Data quality
    RowDropped(RowDroppedPayload),

    // Aggregation
    CycleRecomputed(CycleRecomputedPayload),
}

impl ImportEvent {
    /// Returns the audit subject for this event.
    pub fn subject(&self) -> String {
        match self {
            ImportEvent::TerminalStarted(p) => format!("import.{}.started", p.terminal_id),
            ImportEvent::TerminalCompleted(p) => format!("import.{}.completed", p.terminal_id),
            ImportEvent::WindowStarted(p) => {
                format!("import.{}.window.{}.started", p.terminal_id, p.window_start)
            }
            ImportEvent::WindowSucceeded(p) => {
                format!("import.{}.window.{}.succeeded", p.terminal_id, p.window_start)
            }
            ImportEvent::WindowFailed(p) => {
                format!("import.{}.window.{}.failed", p.terminal_id, p.window_start)
            }
            ImportEvent::RowDropped(p) => {
                format!("import.{}.row.{}.dropped", p.terminal_id, p.date)
            }
            ImportEvent::CycleRecomputed(p) => {
                format!("cycle.{}.{}.recomputed", p.terminal_id, p.cycle_start)
            }
        }
    }
}

// === Terminal payloads ===

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TerminalStartedPayload {
    pub job_id: JobId,
    pub terminal_id: TerminalId,
    pub range_start: NaiveDate,
    pub range_end: NaiveDate,
    pub window_count: u32,
    pub started_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TerminalCompletedPayload {
    pub job_id: JobId,
    pub terminal_id: TerminalId,
    pub windows_succeeded: u32,
    pub windows_failed: u32,
    pub days_fetched: u32,
    pub days_dropped: u32,
    pub completed_at: DateTime<Utc>,
}

// === Window payloads ===

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WindowStartedPayload {
    pub job_id: JobId,
    pub terminal_id: TerminalId,
    pub window_start: NaiveDate,
    pub window_end: NaiveDate,
    pub started_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WindowSucceededPayload {
    pub job_id: JobId,
    pub terminal_id: TerminalId,
    pub window_start: NaiveDate,
    pub window_end: NaiveDate,
    pub days_fetched: u32,
    pub days_dropped: u32,
    pub completed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WindowFailedPayload {
    pub job_id: JobId,
    pub terminal_id: TerminalId,
    pub window_start: NaiveDate,
    pub window_end: NaiveDate,
    pub error_kind: String,
    pub error: String,
    pub failed_at: DateTime<Utc>,
}

// === Data-quality payloads ===

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RowDroppedPayload {
    pub job_id: JobId,
    pub terminal_id: TerminalId,
    pub date: NaiveDate,
    pub reason: String,
    pub dropped_at: DateTime<Utc>,
}

// === Aggregation payloads ===

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CycleRecomputedPayload {
    pub terminal_id: TerminalId,
    pub cycle_start: NaiveDate,
    pub cycle_end: NaiveDate,
    pub total_gb: f64,
    pub days_in_cycle: u32,
    pub status: CycleStatus,
    pub recomputed_at: DateTime<Utc>,
}
