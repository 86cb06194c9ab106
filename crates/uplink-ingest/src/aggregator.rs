//! Billing-cycle aggregation.
//!
//! Cycles are recomputed wholesale from the daily rows in their range, never
//! incrementally patched. Provider-reported boundaries stored on the rows
//! are authoritative; fixed-length synthetic cycles anchored at the
//! terminal's service start are derived only for rows lacking them.

use chrono::{Duration, NaiveDate, Utc};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, error};
use uplink_core::Result;
use uplink_core::cycle::{BillingCycle, CycleBounds, CycleStatus};
use uplink_core::events::{CycleRecomputedPayload, ImportEvent};
use uplink_core::ids::TerminalId;
use uplink_core::ports::{AuditSink, CycleRepository, UsageRepository};
use uplink_core::terminal::Terminal;
use uplink_core::usage::DailyUsageRecord;

/// Recomputes billing-cycle summaries for ranges touched by ingestion.
pub struct CycleAggregator {
    usage: Arc<dyn UsageRepository>,
    cycles: Arc<dyn CycleRepository>,
    audit: Arc<dyn AuditSink>,
    cycle_length_days: u32,
}

impl CycleAggregator {
    pub fn new(
        usage: Arc<dyn UsageRepository>,
        cycles: Arc<dyn CycleRepository>,
        audit: Arc<dyn AuditSink>,
        cycle_length_days: u32,
    ) -> Self {
        Self {
            usage,
            cycles,
            audit,
            cycle_length_days: cycle_length_days.max(1),
        }
    }

    /// Recompute every cycle whose range intersects `[start, end]`.
    ///
    /// Returns the recomputed cycles in ascending order of start date.
    pub async fn recompute_range(
        &self,
        terminal: &Terminal,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<BillingCycle>> {
        let touched = self
            .usage
            .get_range(&terminal.terminal_id, start, end)
            .await?;

        let mut bounds: BTreeSet<CycleBounds> = BTreeSet::new();

        for row in &touched {
            bounds.insert(self.bounds_for_row(terminal, row));
        }

        // Previously persisted cycles intersecting the range are refreshed
        // too, so a boundary change on re-ingestion cannot leave a stale
        // summary behind.
        for existing in self
            .cycles
            .get_overlapping(&terminal.terminal_id, start, end)
            .await?
        {
            bounds.insert(existing.bounds());
        }

        if bounds.is_empty() {
            return Ok(vec![]);
        }

        let latest = self.usage.latest_date(&terminal.terminal_id).await?;

        let mut recomputed = Vec::with_capacity(bounds.len());
        for b in bounds {
            let rows = self
                .usage
                .get_range(&terminal.terminal_id, b.start, b.end)
                .await?;

            let mut cycle = summarize(&terminal.terminal_id, b, &rows, latest);

            if let Some(existing) = self.cycles.get(&terminal.terminal_id, b.start).await?
                && existing.status.is_billed()
            {
                cycle.status = CycleStatus::Billed;
            }

            self.cycles.upsert(&cycle).await?;

            debug!(
                terminal_id = %terminal.terminal_id,
                cycle_start = %cycle.cycle_start,
                days_in_cycle = cycle.days_in_cycle,
                total_gb = cycle.total_gb,
                "Recomputed billing cycle"
            );

            let event = ImportEvent::CycleRecomputed(CycleRecomputedPayload {
                terminal_id: terminal.terminal_id.clone(),
                cycle_start: cycle.cycle_start,
                cycle_end: cycle.cycle_end,
                total_gb: cycle.total_gb,
                days_in_cycle: cycle.days_in_cycle,
                status: cycle.status,
                recomputed_at: Utc::now(),
            });
            if let Err(e) = self.audit.record(event).await {
                error!(error = %e, "Failed to record cycle audit event");
            }

            recomputed.push(cycle);
        }

        Ok(recomputed)
    }

    /// Boundaries for one daily row: provider-reported when stored,
    /// synthetic otherwise.
    fn bounds_for_row(&self, terminal: &Terminal, row: &DailyUsageRecord) -> CycleBounds {
        if let (Some(start), Some(end)) = (row.cycle_start, row.cycle_end) {
            return CycleBounds::new(start, end);
        }
        // Anchor at the recorded service start; a terminal without one is
        // anchored at the row's own date, which still yields stable
        // fixed-length boundaries for any data on or after it.
        let anchor = terminal.service_start_date.unwrap_or(row.usage_date);
        synthetic_bounds(anchor, row.usage_date, self.cycle_length_days)
    }
}

/// The fixed-length cycle containing `date`, anchored at `anchor`.
fn synthetic_bounds(anchor: NaiveDate, date: NaiveDate, length_days: u32) -> CycleBounds {
    let len = length_days as i64;
    let offset = (date - anchor).num_days();
    let k = offset.div_euclid(len);
    let start = anchor + Duration::days(k * len);
    CycleBounds::new(start, start + Duration::days(len - 1))
}

fn summarize(
    terminal_id: &TerminalId,
    bounds: CycleBounds,
    rows: &[DailyUsageRecord],
    latest: Option<NaiveDate>,
) -> BillingCycle {
    let priority_gb: f64 = rows.iter().map(|r| r.priority_gb).sum();
    let standard_gb: f64 = rows.iter().map(|r| r.standard_gb).sum();
    let total_gb: f64 = rows.iter().map(|r| r.total_gb).sum();

    // Active while the cycle's end has not fallen behind the newest data we
    // hold for this terminal.
    let status = match latest {
        Some(latest) if bounds.end < latest => CycleStatus::Completed,
        _ => CycleStatus::Active,
    };

    BillingCycle {
        terminal_id: terminal_id.clone(),
        cycle_start: bounds.start,
        cycle_end: bounds.end,
        priority_gb,
        standard_gb,
        total_gb,
        days_in_cycle: rows.len() as u32,
        status,
        updated_at: Utc::now(),
    }
}
