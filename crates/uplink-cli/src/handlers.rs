//! Command handlers.

use crate::commands::{ImportArgs, PlanArgs, RecomputeArgs};
use crate::config::CliConfig;
use anyhow::bail;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::info;
use uplink_core::config::ImportOptions;
use uplink_core::ids::TerminalId;
use uplink_core::ports::TerminalRepository;
use uplink_db::{Database, PgCycleRepository, PgTerminalRepository, PgUsageRepository};
use uplink_ingest::{
    CycleAggregator, ImportOrchestrator, ImportReport, TracingAuditSink, plan_windows,
};
use uplink_provider::{AuthConfig, ProviderClient, ProviderConfig, Throttle};

pub async fn import(config: &CliConfig, args: ImportArgs) -> anyhow::Result<()> {
    let mut options = ImportOptions::default();
    if let Some(chunk_days) = args.chunk_days {
        options.chunk_days = chunk_days;
    }
    if let Some(max_retries) = args.max_retries {
        options.max_retries = max_retries;
    }
    if let Some(concurrency) = args.concurrency {
        options.concurrency = concurrency;
    }

    let db = Database::connect(&config.database_url).await?;
    db.migrate().await?;

    let auth = AuthConfig {
        token_url: config.token_url.clone(),
        client_id: config.client_id.clone(),
        client_secret: config.client_secret.clone(),
    };
    let mut provider_config = ProviderConfig::new(&config.api_url, auth);
    provider_config.request_timeout_secs = options.request_timeout_secs;
    let provider = Arc::new(ProviderClient::new(provider_config)?);

    let terminals = Arc::new(PgTerminalRepository::new(db.pool().clone()));
    let usage = Arc::new(PgUsageRepository::new(db.pool().clone()));
    let cycles = Arc::new(PgCycleRepository::new(db.pool().clone()));
    let throttle = Arc::new(Throttle::from_options(&options));

    let terminal_ids: Vec<TerminalId> = if args.terminals.is_empty() {
        let active = terminals.list_active().await?;
        if active.is_empty() {
            bail!("no active terminals found; provide --terminal explicitly");
        }
        active.into_iter().map(|t| t.terminal_id).collect()
    } else {
        args.terminals.iter().map(TerminalId::new).collect()
    };

    let orchestrator = ImportOrchestrator::new(
        provider,
        terminals,
        usage,
        cycles,
        Arc::new(TracingAuditSink),
        throttle,
        options,
    );

    // Ctrl-C stops launching new windows; in-flight fetches finish and
    // persisted progress stays valid for a re-run.
    let (cancel_tx, cancel_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Cancellation requested, finishing in-flight windows");
            cancel_tx.send(true).ok();
        }
    });

    let report = orchestrator
        .run(terminal_ids, args.start, args.end, cancel_rx)
        .await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }

    Ok(())
}

pub fn plan(args: PlanArgs) -> anyhow::Result<()> {
    let chunk_days = args
        .chunk_days
        .unwrap_or_else(|| ImportOptions::default().chunk_days);
    let windows = plan_windows(args.start, args.end, chunk_days)?;

    println!(
        "{} window(s) of up to {} day(s) covering {}..{}:",
        windows.len(),
        chunk_days,
        args.start,
        args.end
    );
    for (i, w) in windows.iter().enumerate() {
        println!("  {:>3}  {} .. {}  ({} days)", i + 1, w.start, w.end, w.days());
    }

    Ok(())
}

pub async fn recompute(config: &CliConfig, args: RecomputeArgs) -> anyhow::Result<()> {
    let db = Database::connect(&config.database_url).await?;
    db.migrate().await?;

    let terminals = PgTerminalRepository::new(db.pool().clone());
    let usage = Arc::new(PgUsageRepository::new(db.pool().clone()));
    let cycles = Arc::new(PgCycleRepository::new(db.pool().clone()));

    let terminal_id = TerminalId::new(&args.terminal);
    let Some(terminal) = terminals.get(&terminal_id).await? else {
        bail!("terminal {} not found", args.terminal);
    };

    let aggregator = CycleAggregator::new(
        usage,
        cycles,
        Arc::new(TracingAuditSink),
        ImportOptions::default().cycle_length_days,
    );
    let recomputed = aggregator
        .recompute_range(&terminal, args.start, args.end)
        .await?;

    if recomputed.is_empty() {
        println!("No stored usage in range; nothing recomputed.");
        return Ok(());
    }

    println!("Recomputed {} cycle(s):", recomputed.len());
    for cycle in recomputed {
        println!(
            "  {} .. {}  total {:>8.2} GB  ({} days, {:?})",
            cycle.cycle_start, cycle.cycle_end, cycle.total_gb, cycle.days_in_cycle, cycle.status
        );
    }

    Ok(())
}

fn print_report(report: &ImportReport) {
    println!(
        "Import {}  {}..{}  status: {:?}",
        report.job_id,
        report.range_start,
        report.range_end,
        report.status()
    );
    println!(
        "  {} day(s) fetched, {} dropped across {} terminal(s)",
        report.days_fetched(),
        report.days_dropped(),
        report.terminals.len()
    );

    for t in &report.terminals {
        println!(
            "  {:<24} {:<9?} windows {}/{} ok  days {} fetched / {} dropped  cycles {}",
            t.terminal_id.to_string(),
            t.status,
            t.windows_succeeded,
            t.windows.len(),
            t.days_fetched,
            t.days_dropped,
            t.cycles_recomputed
        );
        if let Some(error) = &t.error {
            println!("      error: {error}");
        }
        for w in &t.windows {
            if let Some(error) = &w.error {
                println!("      {} .. {}: {error}", w.window.start, w.window.end);
            }
        }
        if let Some(error) = &t.aggregation_error {
            println!("      aggregation error: {error}");
        }
    }
}
