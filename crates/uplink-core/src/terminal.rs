//! Terminal (service line) types.

use crate::ids::{AccountId, TerminalId};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A single connectivity terminal whose usage is tracked independently.
///
/// Identity fields are immutable; only `nickname` and `active` change over a
/// terminal's lifetime, and never through the ingestion pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Terminal {
    pub terminal_id: TerminalId,
    pub account_number: AccountId,
    pub nickname: Option<String>,
    pub active: bool,
    /// First day of service, used as the anchor when billing-cycle
    /// boundaries have to be derived rather than read from the provider.
    pub service_start_date: Option<NaiveDate>,
}
