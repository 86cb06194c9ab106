//! Port traits (hexagonal architecture).
//!
//! These traits define the interfaces between the core domain and external
//! adapters: the provider API, relational storage, and the audit sink.

use crate::cycle::BillingCycle;
use crate::events::ImportEvent;
use crate::ids::{AccountId, TerminalId};
use crate::terminal::Terminal;
use crate::usage::{DailyUsageRecord, FetchedDay};
use crate::Result;
use async_trait::async_trait;
use chrono::NaiveDate;

/// Read-only access to daily usage data held by the connectivity provider.
#[async_trait]
pub trait UsageProvider: Send + Sync {
    /// Fetch daily usage rows for one terminal over an inclusive date range.
    ///
    /// An empty vec means the provider has no data for the range; failures
    /// are reported through the error taxonomy. Implementations must not
    /// write to storage.
    async fn fetch_usage(
        &self,
        account: &AccountId,
        terminal: &TerminalId,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<FetchedDay>>;
}

/// Repository for persisted daily usage rows.
#[async_trait]
pub trait UsageRepository: Send + Sync {
    /// Insert or overwrite the row identified by (terminal, date).
    ///
    /// Calling this repeatedly with identical input leaves the same row.
    async fn upsert(&self, record: &DailyUsageRecord) -> Result<()>;

    /// Rows for a terminal in `[start, end]`, ascending by date. Missing
    /// dates are simply absent.
    async fn get_range(
        &self,
        terminal: &TerminalId,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<DailyUsageRecord>>;

    /// The most recent ingested date for a terminal, if any.
    async fn latest_date(&self, terminal: &TerminalId) -> Result<Option<NaiveDate>>;
}

/// Repository for billing-cycle summaries.
#[async_trait]
pub trait CycleRepository: Send + Sync {
    /// Insert or overwrite the cycle identified by (terminal, cycle_start).
    ///
    /// An existing `billed` status must survive the upsert.
    async fn upsert(&self, cycle: &BillingCycle) -> Result<()>;

    /// Get one cycle by its composite key.
    async fn get(&self, terminal: &TerminalId, cycle_start: NaiveDate)
        -> Result<Option<BillingCycle>>;

    /// Cycles for a terminal whose range intersects `[start, end]`.
    async fn get_overlapping(
        &self,
        terminal: &TerminalId,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<BillingCycle>>;
}

/// Repository for terminal records.
#[async_trait]
pub trait TerminalRepository: Send + Sync {
    /// Get a terminal by its external identifier.
    async fn get(&self, terminal: &TerminalId) -> Result<Option<Terminal>>;

    /// All terminals currently marked active.
    async fn list_active(&self) -> Result<Vec<Terminal>>;
}

/// Sink for structured audit events.
#[async_trait]
pub trait AuditSink: Send + Sync {
    /// Record an event. Failures here must not abort ingestion.
    async fn record(&self, event: ImportEvent) -> Result<()>;
}
