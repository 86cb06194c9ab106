//! Serialization roundtrip tests for uplink-core types.

use chrono::{NaiveDate, Utc};
use uplink_core::cycle::{BillingCycle, CycleBounds, CycleStatus};
use uplink_core::events::*;
use uplink_core::ids::{JobId, TerminalId};
use uplink_core::usage::{DailyUsageRecord, FetchedDay};

fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[test]
fn test_fetched_day_roundtrip() {
    let row = FetchedDay {
        date: day(2025, 3, 4),
        priority_gb: 1.25,
        standard_gb: 8.5,
        cycle: Some(CycleBounds::new(day(2025, 3, 1), day(2025, 3, 30))),
    };

    let json = serde_json::to_string(&row).expect("serialize");
    let parsed: FetchedDay = serde_json::from_str(&json).expect("deserialize");

    assert_eq!(row, parsed);
}

#[test]
fn test_daily_usage_record_roundtrip() {
    let record = DailyUsageRecord {
        terminal_id: TerminalId::from("SL-900212-31415-26"),
        usage_date: day(2025, 3, 4),
        priority_gb: 1.25,
        standard_gb: 8.5,
        total_gb: 9.75,
        cycle_start: None,
        cycle_end: None,
        imported_at: Utc::now(),
    };

    let json = serde_json::to_string(&record).expect("serialize");
    let parsed: DailyUsageRecord = serde_json::from_str(&json).expect("deserialize");

    assert_eq!(record.terminal_id, parsed.terminal_id);
    assert_eq!(record.usage_date, parsed.usage_date);
    assert_eq!(record.total_gb, parsed.total_gb);
}

#[test]
fn test_cycle_status_snake_case() {
    let json = serde_json::to_string(&CycleStatus::Active).expect("serialize");
    assert_eq!(json, r#""active""#);
    let parsed: CycleStatus = serde_json::from_str(r#""billed""#).expect("deserialize");
    assert_eq!(parsed, CycleStatus::Billed);
}

#[test]
fn test_billing_cycle_roundtrip() {
    let cycle = BillingCycle {
        terminal_id: TerminalId::from("SL-1"),
        cycle_start: day(2025, 2, 1),
        cycle_end: day(2025, 3, 2),
        priority_gb: 12.0,
        standard_gb: 88.0,
        total_gb: 100.0,
        days_in_cycle: 30,
        status: CycleStatus::Completed,
        updated_at: Utc::now(),
    };

    let json = serde_json::to_string(&cycle).expect("serialize");
    let parsed: BillingCycle = serde_json::from_str(&json).expect("deserialize");

    assert_eq!(cycle.cycle_start, parsed.cycle_start);
    assert_eq!(cycle.status, parsed.status);
    assert_eq!(cycle.days_in_cycle, parsed.days_in_cycle);
}

#[test]
fn test_window_failed_event_tag_and_subject() {
    let event = ImportEvent::WindowFailed(WindowFailedPayload {
        job_id: JobId::new(),
        terminal_id: TerminalId::from("SL-1"),
        window_start: day(2025, 3, 1),
        window_end: day(2025, 3, 7),
        error_kind: "exhausted_retries".to_string(),
        error: "Transient provider error: 503".to_string(),
        failed_at: Utc::now(),
    });

    assert_eq!(event.subject(), "import.SL-1.window.2025-03-01.failed");

    let json = serde_json::to_string(&event).expect("serialize");
    assert!(json.contains(r#""type":"window_failed""#));
    let parsed: ImportEvent = serde_json::from_str(&json).expect("deserialize");
    assert!(matches!(parsed, ImportEvent::WindowFailed(_)));
}

#[test]
fn test_cycle_recomputed_event_roundtrip() {
    let event = ImportEvent::CycleRecomputed(CycleRecomputedPayload {
        terminal_id: TerminalId::from("SL-2"),
        cycle_start: day(2025, 1, 1),
        cycle_end: day(2025, 1, 30),
        total_gb: 42.5,
        days_in_cycle: 12,
        status: CycleStatus::Active,
        recomputed_at: Utc::now(),
    });

    let json = serde_json::to_string(&event).expect("serialize");
    let parsed: ImportEvent = serde_json::from_str(&json).expect("deserialize");

    match parsed {
        ImportEvent::CycleRecomputed(p) => {
            assert_eq!(p.days_in_cycle, 12);
            assert_eq!(p.status, CycleStatus::Active);
        }
        other => panic!("unexpected event: {other:?}"),
    }
}
