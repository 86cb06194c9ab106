//! Daily usage types and row validation.

use crate::cycle::CycleBounds;
use crate::ids::TerminalId;
use crate::{Error, Result};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// One day of usage as returned by the provider, before persistence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FetchedDay {
    pub date: NaiveDate,
    pub priority_gb: f64,
    pub standard_gb: f64,
    /// Billing-cycle boundaries the provider reported for this day, when
    /// present in the raw response.
    pub cycle: Option<CycleBounds>,
}

impl FetchedDay {
    /// Check a fetched row against the window it was requested for.
    ///
    /// Rows outside the window, or with negative or non-finite figures, are
    /// data-quality failures for that single date and must not reach the
    /// store.
    pub fn validate(&self, window_start: NaiveDate, window_end: NaiveDate) -> Result<()> {
        if self.date < window_start || self.date > window_end {
            return Err(Error::Validation {
                date: self.date,
                reason: format!(
                    "date outside requested window {}..{}",
                    window_start, window_end
                ),
            });
        }
        for (name, value) in [
            ("priority_gb", self.priority_gb),
            ("standard_gb", self.standard_gb),
        ] {
            if !value.is_finite() {
                return Err(Error::Validation {
                    date: self.date,
                    reason: format!("{name} is not a finite number"),
                });
            }
            if value < 0.0 {
                return Err(Error::Validation {
                    date: self.date,
                    reason: format!("{name} is negative ({value})"),
                });
            }
        }
        Ok(())
    }
}

/// A persisted daily usage row, unique per (terminal, date).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyUsageRecord {
    pub terminal_id: TerminalId,
    pub usage_date: NaiveDate,
    pub priority_gb: f64,
    pub standard_gb: f64,
    /// Always priority + standard. Provider-supplied totals are ignored in
    /// favour of recomputation.
    pub total_gb: f64,
    pub cycle_start: Option<NaiveDate>,
    pub cycle_end: Option<NaiveDate>,
    pub imported_at: DateTime<Utc>,
}

impl DailyUsageRecord {
    /// Build a record from a validated fetched row, recomputing the total.
    pub fn from_fetched(terminal_id: TerminalId, day: &FetchedDay) -> Self {
        Self {
            terminal_id,
            usage_date: day.date,
            priority_gb: day.priority_gb,
            standard_gb: day.standard_gb,
            total_gb: day.priority_gb + day.standard_gb,
            cycle_start: day.cycle.as_ref().map(|c| c.start),
            cycle_end: day.cycle.as_ref().map(|c| c.end),
            imported_at: Utc::now(),
        }
    }
}
