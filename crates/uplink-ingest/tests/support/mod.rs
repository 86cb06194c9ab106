//! In-memory port implementations for pipeline tests.

use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};
use uplink_core::Result;
use uplink_core::cycle::BillingCycle;
use uplink_core::events::ImportEvent;
use uplink_core::ids::{AccountId, TerminalId};
use uplink_core::ports::{
    AuditSink, CycleRepository, TerminalRepository, UsageProvider, UsageRepository,
};
use uplink_core::terminal::Terminal;
use uplink_core::usage::{DailyUsageRecord, FetchedDay};

pub fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn terminal(id: &str, service_start: Option<NaiveDate>) -> Terminal {
    Terminal {
        terminal_id: TerminalId::from(id),
        account_number: AccountId::from("ACC-1"),
        nickname: None,
        active: true,
        service_start_date: service_start,
    }
}

// === Usage repository ===

#[derive(Default)]
pub struct MemoryUsageRepository {
    rows: Mutex<BTreeMap<(String, NaiveDate), DailyUsageRecord>>,
}

impl MemoryUsageRepository {
    pub fn all_rows(&self) -> Vec<DailyUsageRecord> {
        self.rows.lock().unwrap().values().cloned().collect()
    }

    pub fn row(&self, terminal: &TerminalId, date: NaiveDate) -> Option<DailyUsageRecord> {
        self.rows
            .lock()
            .unwrap()
            .get(&(terminal.as_str().to_string(), date))
            .cloned()
    }
}

#[async_trait]
impl UsageRepository for MemoryUsageRepository {
    async fn upsert(&self, record: &DailyUsageRecord) -> Result<()> {
        self.rows.lock().unwrap().insert(
            (record.terminal_id.as_str().to_string(), record.usage_date),
            record.clone(),
        );
        Ok(())
    }

    async fn get_range(
        &self,
        terminal: &TerminalId,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<DailyUsageRecord>> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .values()
            .filter(|r| {
                r.terminal_id == *terminal && r.usage_date >= start && r.usage_date <= end
            })
            .cloned()
            .collect())
    }

    async fn latest_date(&self, terminal: &TerminalId) -> Result<Option<NaiveDate>> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .values()
            .filter(|r| r.terminal_id == *terminal)
            .map(|r| r.usage_date)
            .max())
    }
}

// === Cycle repository ===

#[derive(Default)]
pub struct MemoryCycleRepository {
    cycles: Mutex<BTreeMap<(String, NaiveDate), BillingCycle>>,
}

impl MemoryCycleRepository {
    pub fn all_cycles(&self) -> Vec<BillingCycle> {
        self.cycles.lock().unwrap().values().cloned().collect()
    }

    pub fn seed(&self, cycle: BillingCycle) {
        self.cycles.lock().unwrap().insert(
            (cycle.terminal_id.as_str().to_string(), cycle.cycle_start),
            cycle,
        );
    }
}

#[async_trait]
impl CycleRepository for MemoryCycleRepository {
    async fn upsert(&self, cycle: &BillingCycle) -> Result<()> {
        let mut cycles = self.cycles.lock().unwrap();
        let key = (cycle.terminal_id.as_str().to_string(), cycle.cycle_start);
        let mut next = cycle.clone();
        // Same contract as the real store: billed survives recomputation.
        if let Some(existing) = cycles.get(&key)
            && existing.status.is_billed()
        {
            next.status = existing.status;
        }
        cycles.insert(key, next);
        Ok(())
    }

    async fn get(
        &self,
        terminal: &TerminalId,
        cycle_start: NaiveDate,
    ) -> Result<Option<BillingCycle>> {
        Ok(self
            .cycles
            .lock()
            .unwrap()
            .get(&(terminal.as_str().to_string(), cycle_start))
            .cloned())
    }

    async fn get_overlapping(
        &self,
        terminal: &TerminalId,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<BillingCycle>> {
        Ok(self
            .cycles
            .lock()
            .unwrap()
            .values()
            .filter(|c| c.terminal_id == *terminal && c.cycle_start <= end && c.cycle_end >= start)
            .cloned()
            .collect())
    }
}

// === Terminal repository ===

pub struct MemoryTerminalRepository {
    terminals: Vec<Terminal>,
}

impl MemoryTerminalRepository {
    pub fn new(terminals: Vec<Terminal>) -> Self {
        Self { terminals }
    }
}

#[async_trait]
impl TerminalRepository for MemoryTerminalRepository {
    async fn get(&self, terminal: &TerminalId) -> Result<Option<Terminal>> {
        Ok(self
            .terminals
            .iter()
            .find(|t| t.terminal_id == *terminal)
            .cloned())
    }

    async fn list_active(&self) -> Result<Vec<Terminal>> {
        Ok(self.terminals.iter().filter(|t| t.active).cloned().collect())
    }
}

// === Audit sink ===

#[derive(Default)]
pub struct RecordingAuditSink {
    events: Mutex<Vec<ImportEvent>>,
}

impl RecordingAuditSink {
    pub fn events(&self) -> Vec<ImportEvent> {
        self.events.lock().unwrap().clone()
    }
}

#[async_trait]
impl AuditSink for RecordingAuditSink {
    async fn record(&self, event: ImportEvent) -> Result<()> {
        self.events.lock().unwrap().push(event);
        Ok(())
    }
}

// === Provider ===

type FetchScript = Arc<dyn Fn(NaiveDate, NaiveDate) -> Result<Vec<FetchedDay>> + Send + Sync>;

/// Provider whose behaviour is scripted per terminal.
#[derive(Default)]
pub struct ScriptedProvider {
    scripts: Mutex<HashMap<String, FetchScript>>,
    calls: Mutex<HashMap<String, u32>>,
}

impl ScriptedProvider {
    pub fn script<F>(&self, terminal: &str, f: F)
    where
        F: Fn(NaiveDate, NaiveDate) -> Result<Vec<FetchedDay>> + Send + Sync + 'static,
    {
        self.scripts
            .lock()
            .unwrap()
            .insert(terminal.to_string(), Arc::new(f));
    }

    pub fn calls_for(&self, terminal: &str) -> u32 {
        self.calls
            .lock()
            .unwrap()
            .get(terminal)
            .copied()
            .unwrap_or(0)
    }
}

#[async_trait]
impl UsageProvider for ScriptedProvider {
    async fn fetch_usage(
        &self,
        _account: &AccountId,
        terminal: &TerminalId,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<FetchedDay>> {
        *self
            .calls
            .lock()
            .unwrap()
            .entry(terminal.as_str().to_string())
            .or_insert(0) += 1;

        let script = self
            .scripts
            .lock()
            .unwrap()
            .get(terminal.as_str())
            .cloned();
        match script {
            Some(f) => f(start, end),
            None => Ok(vec![]),
        }
    }
}

/// Constant daily usage over the window.
pub fn steady_usage(
    priority_gb: f64,
    standard_gb: f64,
) -> impl Fn(NaiveDate, NaiveDate) -> Result<Vec<FetchedDay>> + Send + Sync {
    move |start, end| {
        let mut rows = Vec::new();
        let mut date = start;
        while date <= end {
            rows.push(FetchedDay {
                date,
                priority_gb,
                standard_gb,
                cycle: None,
            });
            date += chrono::Duration::days(1);
        }
        Ok(rows)
    }
}
