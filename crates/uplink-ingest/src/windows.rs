//! Fetch-window planning.

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use uplink_core::{Error, Result};

/// One bounded, inclusive sub-range of an import request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl FetchWindow {
    pub fn days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }
}

/// Split `[start, end]` into ordered, disjoint, contiguous windows of at
/// most `chunk_days` days whose union is exactly the requested range.
///
/// Deterministic: the same input always yields the same windows.
pub fn plan_windows(start: NaiveDate, end: NaiveDate, chunk_days: u32) -> Result<Vec<FetchWindow>> {
    if chunk_days == 0 {
        return Err(Error::Config("chunk_days must be at least 1".to_string()));
    }
    if end < start {
        return Err(Error::InvalidRange {
            start,
            end,
            reason: "end date precedes start date".to_string(),
        });
    }

    let step = Duration::days(chunk_days as i64);
    let mut windows = Vec::new();
    let mut cursor = start;

    while cursor <= end {
        let window_end = (cursor + step - Duration::days(1)).min(end);
        windows.push(FetchWindow {
            start: cursor,
            end: window_end,
        });
        cursor = window_end + Duration::days(1);
    }

    Ok(windows)
}
