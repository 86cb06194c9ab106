//! Historical usage ingestion pipeline.
//!
//! Decomposes an import request into bounded fetch windows, drives throttled
//! provider calls per terminal, persists validated rows idempotently, and
//! recomputes the billing cycles touched by the ingested range.

pub mod aggregator;
pub mod audit;
pub mod orchestrator;
pub mod report;
pub mod windows;

pub use aggregator::CycleAggregator;
pub use audit::TracingAuditSink;
pub use orchestrator::ImportOrchestrator;
pub use report::{FailureKind, ImportReport, JobStatus, TerminalReport, WindowOutcome, WindowStatus};
pub use windows::{FetchWindow, plan_windows};
