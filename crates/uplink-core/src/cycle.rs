//! Billing-cycle types.

use crate::ids::TerminalId;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Inclusive billing-cycle boundaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CycleBounds {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl CycleBounds {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// Calendar length of the cycle in days, inclusive of both endpoints.
    pub fn calendar_days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CycleStatus {
    /// The cycle's end date is at or beyond the latest ingested data.
    Active,
    /// The cycle lies fully in the past relative to ingested data.
    Completed,
    /// Invoiced. Set externally; the aggregator never writes this state.
    Billed,
}

impl CycleStatus {
    pub fn is_billed(&self) -> bool {
        matches!(self, CycleStatus::Billed)
    }
}

/// Aggregated usage for one terminal over one billing cycle.
///
/// Derived entirely from daily usage rows in `[start, end]`; recomputed, not
/// incrementally patched, whenever an underlying row changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BillingCycle {
    pub terminal_id: TerminalId,
    pub cycle_start: NaiveDate,
    pub cycle_end: NaiveDate,
    pub priority_gb: f64,
    pub standard_gb: f64,
    pub total_gb: f64,
    /// Count of daily rows actually present in the cycle range. A value
    /// below the calendar length marks a partial or gappy cycle.
    pub days_in_cycle: u32,
    pub status: CycleStatus,
    pub updated_at: DateTime<Utc>,
}

impl BillingCycle {
    pub fn bounds(&self) -> CycleBounds {
        CycleBounds::new(self.cycle_start, self.cycle_end)
    }

    /// Whether fewer days of data exist than the cycle's calendar length.
    pub fn is_partial(&self) -> bool {
        (self.days_in_cycle as i64) < self.bounds().calendar_days()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn bounds_contains_is_inclusive() {
        let bounds = CycleBounds::new(day(2025, 1, 1), day(2025, 1, 30));
        assert!(bounds.contains(day(2025, 1, 1)));
        assert!(bounds.contains(day(2025, 1, 30)));
        assert!(!bounds.contains(day(2025, 1, 31)));
        assert_eq!(bounds.calendar_days(), 30);
    }

    #[test]
    fn partial_cycle_detection() {
        let cycle = BillingCycle {
            terminal_id: TerminalId::from("SL-1"),
            cycle_start: day(2025, 1, 1),
            cycle_end: day(2025, 1, 30),
            priority_gb: 1.0,
            standard_gb: 2.0,
            total_gb: 3.0,
            days_in_cycle: 12,
            status: CycleStatus::Active,
            updated_at: Utc::now(),
        };
        assert!(cycle.is_partial());
    }
}
