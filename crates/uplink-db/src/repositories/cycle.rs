//! PostgreSQL implementation of CycleRepository.

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::{PgPool, Row};
use uplink_core::cycle::{BillingCycle, CycleStatus};
use uplink_core::ids::TerminalId;
use uplink_core::ports::CycleRepository;
use uplink_core::{Error, Result};

/// PostgreSQL implementation of CycleRepository.
pub struct PgCycleRepository {
    pool: PgPool,
}

impl PgCycleRepository {
    /// Create a new PgCycleRepository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn status_to_str(status: &CycleStatus) -> &'static str {
        match status {
            CycleStatus::Active => "active",
            CycleStatus::Completed => "completed",
            CycleStatus::Billed => "billed",
        }
    }

    fn str_to_status(s: &str) -> CycleStatus {
        match s {
            "active" => CycleStatus::Active,
            "completed" => CycleStatus::Completed,
            "billed" => CycleStatus::Billed,
            _ => CycleStatus::Active,
        }
    }

    fn row_to_cycle(r: &sqlx::postgres::PgRow) -> BillingCycle {
        let status_str: String = r.get("status");
        BillingCycle {
            terminal_id: TerminalId::new(r.get::<String, _>("terminal_id")),
            cycle_start: r.get("cycle_start"),
            cycle_end: r.get("cycle_end"),
            priority_gb: r.get("priority_gb"),
            standard_gb: r.get("standard_gb"),
            total_gb: r.get("total_gb"),
            days_in_cycle: r.get::<i32, _>("days_in_cycle") as u32,
            status: Self::str_to_status(&status_str),
            updated_at: r.get("updated_at"),
        }
    }
}

#[async_trait]
impl CycleRepository for PgCycleRepository {
    async fn upsert(&self, cycle: &BillingCycle) -> Result<()> {
        // A billed cycle keeps its status; everything else is overwritten
        // with the recomputed values.
        sqlx::query(
            r#"INSERT INTO billing_cycles
               (terminal_id, cycle_start, cycle_end, priority_gb, standard_gb, total_gb, days_in_cycle, status, updated_at)
               VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
               ON CONFLICT (terminal_id, cycle_start) DO UPDATE SET
                   cycle_end = EXCLUDED.cycle_end,
                   priority_gb = EXCLUDED.priority_gb,
                   standard_gb = EXCLUDED.standard_gb,
                   total_gb = EXCLUDED.total_gb,
                   days_in_cycle = EXCLUDED.days_in_cycle,
                   status = CASE WHEN billing_cycles.status = 'billed'
                                 THEN billing_cycles.status
                                 ELSE EXCLUDED.status END,
                   updated_at = EXCLUDED.updated_at"#,
        )
        .bind(cycle.terminal_id.as_str())
        .bind(cycle.cycle_start)
        .bind(cycle.cycle_end)
        .bind(cycle.priority_gb)
        .bind(cycle.standard_gb)
        .bind(cycle.total_gb)
        .bind(cycle.days_in_cycle as i32)
        .bind(Self::status_to_str(&cycle.status))
        .bind(cycle.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| Error::Database(e.to_string()))?;

        Ok(())
    }

    async fn get(
        &self,
        terminal: &TerminalId,
        cycle_start: NaiveDate,
    ) -> Result<Option<BillingCycle>> {
        let row = sqlx::query(
            "SELECT terminal_id, cycle_start, cycle_end, priority_gb, standard_gb, total_gb, days_in_cycle, status, updated_at \
             FROM billing_cycles WHERE terminal_id = $1 AND cycle_start = $2",
        )
        .bind(terminal.as_str())
        .bind(cycle_start)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| Error::Database(e.to_string()))?;

        Ok(row.as_ref().map(Self::row_to_cycle))
    }

    async fn get_overlapping(
        &self,
        terminal: &TerminalId,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<BillingCycle>> {
        let rows = sqlx::query(
            "SELECT terminal_id, cycle_start, cycle_end, priority_gb, standard_gb, total_gb, days_in_cycle, status, updated_at \
             FROM billing_cycles \
             WHERE terminal_id = $1 AND cycle_start <= $3 AND cycle_end >= $2 \
             ORDER BY cycle_start ASC",
        )
        .bind(terminal.as_str())
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| Error::Database(e.to_string()))?;

        Ok(rows.iter().map(Self::row_to_cycle).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping_roundtrip() {
        for status in [
            CycleStatus::Active,
            CycleStatus::Completed,
            CycleStatus::Billed,
        ] {
            let s = PgCycleRepository::status_to_str(&status);
            assert_eq!(PgCycleRepository::str_to_status(s), status);
        }
    }
}
