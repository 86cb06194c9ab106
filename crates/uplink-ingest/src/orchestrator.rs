//! Import orchestration.
//!
//! Terminals run concurrently under a bounded worker pool; windows within a
//! terminal run sequentially. Failure containment is strict: a bad row is
//! dropped, a failed window is recorded, a failed terminal never blocks the
//! rest of the batch.

use crate::aggregator::CycleAggregator;
use crate::report::{ImportReport, TerminalReport, WindowOutcome};
use crate::windows::{FetchWindow, plan_windows};
use chrono::{NaiveDate, Utc};
use futures::stream::{self, StreamExt};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{error, info, warn};
use uplink_core::config::ImportOptions;
use uplink_core::events::{
    ImportEvent, RowDroppedPayload, TerminalCompletedPayload, TerminalStartedPayload,
    WindowFailedPayload, WindowStartedPayload, WindowSucceededPayload,
};
use uplink_core::ids::{JobId, TerminalId};
use uplink_core::ports::{AuditSink, TerminalRepository, UsageProvider, UsageRepository};
use uplink_core::terminal::Terminal;
use uplink_core::usage::DailyUsageRecord;
use uplink_core::{Error, Result};
use uplink_provider::{RetryPolicy, Throttle, call_with_retries};

/// Drives a historical import across a batch of terminals.
pub struct ImportOrchestrator {
    provider: Arc<dyn UsageProvider>,
    terminals: Arc<dyn TerminalRepository>,
    usage: Arc<dyn UsageRepository>,
    aggregator: CycleAggregator,
    audit: Arc<dyn AuditSink>,
    throttle: Arc<Throttle>,
    retry: RetryPolicy,
    options: ImportOptions,
}

impl ImportOrchestrator {
    pub fn new(
        provider: Arc<dyn UsageProvider>,
        terminals: Arc<dyn TerminalRepository>,
        usage: Arc<dyn UsageRepository>,
        cycles: Arc<dyn uplink_core::ports::CycleRepository>,
        audit: Arc<dyn AuditSink>,
        throttle: Arc<Throttle>,
        options: ImportOptions,
    ) -> Self {
        let aggregator = CycleAggregator::new(
            usage.clone(),
            cycles,
            audit.clone(),
            options.cycle_length_days,
        );
        let retry = RetryPolicy::from_options(&options);
        Self {
            provider,
            terminals,
            usage,
            aggregator,
            audit,
            throttle,
            retry,
            options,
        }
    }

    /// Run a historical import for the given terminals over `[start, end]`.
    ///
    /// `end` defaults to the current date. Cancellation stops new windows
    /// and terminals from launching; in-flight fetches complete normally and
    /// everything already persisted stays valid.
    pub async fn run(
        &self,
        terminal_ids: Vec<TerminalId>,
        start: NaiveDate,
        end: Option<NaiveDate>,
        cancel: watch::Receiver<bool>,
    ) -> Result<ImportReport> {
        let end = end.unwrap_or_else(|| Utc::now().date_naive());
        if end < start {
            return Err(Error::InvalidRange {
                start,
                end,
                reason: "end date precedes start date".to_string(),
            });
        }

        let job_id = JobId::new();
        let started_at = Utc::now();

        info!(
            job_id = %job_id,
            terminals = terminal_ids.len(),
            start = %start,
            end = %end,
            concurrency = self.options.concurrency,
            "Starting historical import"
        );

        let mut terminals: Vec<TerminalReport> = stream::iter(terminal_ids)
            .map(|terminal_id| {
                let cancel = cancel.clone();
                async move {
                    self.import_terminal(job_id, terminal_id, start, end, cancel)
                        .await
                }
            })
            .buffer_unordered(self.options.concurrency.max(1))
            .collect()
            .await;

        terminals.sort_by(|a, b| a.terminal_id.as_str().cmp(b.terminal_id.as_str()));

        let report = ImportReport {
            job_id,
            range_start: start,
            range_end: end,
            started_at,
            finished_at: Utc::now(),
            terminals,
        };

        info!(
            job_id = %job_id,
            status = ?report.status(),
            days_fetched = report.days_fetched(),
            days_dropped = report.days_dropped(),
            "Historical import finished"
        );

        Ok(report)
    }

    /// Import one terminal's full range. Never propagates an error: every
    /// failure is folded into the returned report.
    async fn import_terminal(
        &self,
        job_id: JobId,
        terminal_id: TerminalId,
        start: NaiveDate,
        end: NaiveDate,
        cancel: watch::Receiver<bool>,
    ) -> TerminalReport {
        let terminal = match self.terminals.get(&terminal_id).await {
            Ok(Some(t)) => t,
            Ok(None) => {
                let err = Error::TerminalNotFound(terminal_id.to_string());
                warn!(terminal_id = %terminal_id, "Terminal not found, skipping");
                return TerminalReport::failed(terminal_id, &err);
            }
            Err(e) => {
                error!(terminal_id = %terminal_id, error = %e, "Terminal lookup failed");
                return TerminalReport::failed(terminal_id, &e);
            }
        };

        let windows = match plan_windows(start, end, self.options.chunk_days) {
            Ok(w) => w,
            Err(e) => return TerminalReport::failed(terminal_id, &e),
        };

        self.record(ImportEvent::TerminalStarted(TerminalStartedPayload {
            job_id,
            terminal_id: terminal.terminal_id.clone(),
            range_start: start,
            range_end: end,
            window_count: windows.len() as u32,
            started_at: Utc::now(),
        }))
        .await;

        let mut outcomes = Vec::with_capacity(windows.len());
        for window in windows {
            if *cancel.borrow() {
                outcomes.push(WindowOutcome::skipped(window));
                continue;
            }
            outcomes.push(self.import_window(job_id, &terminal, window).await);
        }

        let mut cycles_recomputed = 0;
        let mut aggregation_error = None;
        if outcomes.iter().any(|o| o.days_fetched > 0) {
            match self.aggregator.recompute_range(&terminal, start, end).await {
                Ok(cycles) => cycles_recomputed = cycles.len() as u32,
                Err(e) => {
                    error!(
                        terminal_id = %terminal.terminal_id,
                        error = %e,
                        "Billing-cycle recomputation failed"
                    );
                    aggregation_error = Some(e.to_string());
                }
            }
        }

        let report = TerminalReport::from_outcomes(
            terminal.terminal_id.clone(),
            outcomes,
            cycles_recomputed,
            aggregation_error,
        );

        self.record(ImportEvent::TerminalCompleted(TerminalCompletedPayload {
            job_id,
            terminal_id: terminal.terminal_id.clone(),
            windows_succeeded: report.windows_succeeded,
            windows_failed: report.windows_failed,
            days_fetched: report.days_fetched,
            days_dropped: report.days_dropped,
            completed_at: Utc::now(),
        }))
        .await;

        report
    }

    /// Fetch, validate, and persist one window.
    async fn import_window(
        &self,
        job_id: JobId,
        terminal: &Terminal,
        window: FetchWindow,
    ) -> WindowOutcome {
        self.record(ImportEvent::WindowStarted(WindowStartedPayload {
            job_id,
            terminal_id: terminal.terminal_id.clone(),
            window_start: window.start,
            window_end: window.end,
            started_at: Utc::now(),
        }))
        .await;

        let fetched = call_with_retries(&self.throttle, &self.retry, || {
            self.provider.fetch_usage(
                &terminal.account_number,
                &terminal.terminal_id,
                window.start,
                window.end,
            )
        })
        .await;

        let rows = match fetched {
            Ok(rows) => rows,
            Err(e) => {
                warn!(
                    terminal_id = %terminal.terminal_id,
                    window_start = %window.start,
                    window_end = %window.end,
                    error = %e,
                    "Window fetch failed"
                );
                return self.window_failed(job_id, terminal, window, 0, 0, e).await;
            }
        };

        let mut days_fetched = 0;
        let mut days_dropped = 0;

        for row in &rows {
            if let Err(e) = row.validate(window.start, window.end) {
                days_dropped += 1;
                warn!(
                    terminal_id = %terminal.terminal_id,
                    date = %row.date,
                    error = %e,
                    "Dropping row that failed validation"
                );
                self.record(ImportEvent::RowDropped(RowDroppedPayload {
                    job_id,
                    terminal_id: terminal.terminal_id.clone(),
                    date: row.date,
                    reason: e.to_string(),
                    dropped_at: Utc::now(),
                }))
                .await;
                continue;
            }

            let record = DailyUsageRecord::from_fetched(terminal.terminal_id.clone(), row);
            if let Err(e) = self.usage.upsert(&record).await {
                // Storage failing mid-window fails the window; rows already
                // written stay valid thanks to idempotent upserts.
                return self
                    .window_failed(job_id, terminal, window, days_fetched, days_dropped, e)
                    .await;
            }
            days_fetched += 1;
        }

        self.record(ImportEvent::WindowSucceeded(WindowSucceededPayload {
            job_id,
            terminal_id: terminal.terminal_id.clone(),
            window_start: window.start,
            window_end: window.end,
            days_fetched,
            days_dropped,
            completed_at: Utc::now(),
        }))
        .await;

        WindowOutcome::succeeded(window, days_fetched, days_dropped)
    }

    async fn window_failed(
        &self,
        job_id: JobId,
        terminal: &Terminal,
        window: FetchWindow,
        days_fetched: u32,
        days_dropped: u32,
        err: Error,
    ) -> WindowOutcome {
        let outcome = WindowOutcome::failed(window, days_fetched, days_dropped, &err);
        self.record(ImportEvent::WindowFailed(WindowFailedPayload {
            job_id,
            terminal_id: terminal.terminal_id.clone(),
            window_start: window.start,
            window_end: window.end,
            error_kind: outcome
                .error_kind
                .map(|k| k.as_str().to_string())
                .unwrap_or_default(),
            error: err.to_string(),
            failed_at: Utc::now(),
        }))
        .await;
        outcome
    }

    async fn record(&self, event: ImportEvent) {
        if let Err(e) = self.audit.record(event).await {
            error!(error = %e, "Failed to record audit event");
        }
    }
}
