//! Tracing-backed audit sink.

use async_trait::async_trait;
use tracing::info;
use uplink_core::Result;
use uplink_core::events::ImportEvent;
use uplink_core::ports::AuditSink;

/// Records audit events as structured tracing output.
///
/// Deployments with a dedicated audit store provide their own `AuditSink`;
/// this sink is the default and keeps the pipeline observable on its own.
pub struct TracingAuditSink;

#[async_trait]
impl AuditSink for TracingAuditSink {
    async fn record(&self, event: ImportEvent) -> Result<()> {
        let payload = serde_json::to_string(&event)?;
        info!(
            target: "uplink::audit",
            subject = %event.subject(),
            payload = %payload,
            "audit event"
        );
        Ok(())
    }
}
