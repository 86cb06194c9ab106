//! PostgreSQL implementation of UsageRepository.

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::{PgPool, Row};
use uplink_core::ids::TerminalId;
use uplink_core::ports::UsageRepository;
use uplink_core::usage::DailyUsageRecord;
use uplink_core::{Error, Result};

/// PostgreSQL implementation of UsageRepository.
pub struct PgUsageRepository {
    pool: PgPool,
}

impl PgUsageRepository {
    /// Create a new PgUsageRepository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn row_to_record(r: &sqlx::postgres::PgRow) -> DailyUsageRecord {
        DailyUsageRecord {
            terminal_id: TerminalId::new(r.get::<String, _>("terminal_id")),
            usage_date: r.get("usage_date"),
            priority_gb: r.get("priority_gb"),
            standard_gb: r.get("standard_gb"),
            total_gb: r.get("total_gb"),
            cycle_start: r.get("cycle_start"),
            cycle_end: r.get("cycle_end"),
            imported_at: r.get("imported_at"),
        }
    }
}

#[async_trait]
impl UsageRepository for PgUsageRepository {
    async fn upsert(&self, record: &DailyUsageRecord) -> Result<()> {
        sqlx::query(
            r#"INSERT INTO daily_usage
               (terminal_id, usage_date, priority_gb, standard_gb, total_gb, cycle_start, cycle_end, imported_at)
               VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
               ON CONFLICT (terminal_id, usage_date) DO UPDATE SET
                   priority_gb = EXCLUDED.priority_gb,
                   standard_gb = EXCLUDED.standard_gb,
                   total_gb = EXCLUDED.total_gb,
                   cycle_start = EXCLUDED.cycle_start,
                   cycle_end = EXCLUDED.cycle_end,
                   imported_at = EXCLUDED.imported_at"#,
        )
        .bind(record.terminal_id.as_str())
        .bind(record.usage_date)
        .bind(record.priority_gb)
        .bind(record.standard_gb)
        .bind(record.total_gb)
        .bind(record.cycle_start)
        .bind(record.cycle_end)
        .bind(record.imported_at)
        .execute(&self.pool)
        .await
        .map_err(|e| Error::Database(e.to_string()))?;

        Ok(())
    }

    async fn get_range(
        &self,
        terminal: &TerminalId,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<DailyUsageRecord>> {
        let rows = sqlx::query(
            "SELECT terminal_id, usage_date, priority_gb, standard_gb, total_gb, cycle_start, cycle_end, imported_at \
             FROM daily_usage \
             WHERE terminal_id = $1 AND usage_date BETWEEN $2 AND $3 \
             ORDER BY usage_date ASC",
        )
        .bind(terminal.as_str())
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| Error::Database(e.to_string()))?;

        Ok(rows.iter().map(Self::row_to_record).collect())
    }

    async fn latest_date(&self, terminal: &TerminalId) -> Result<Option<NaiveDate>> {
        let row = sqlx::query(
            "SELECT MAX(usage_date) as latest FROM daily_usage WHERE terminal_id = $1",
        )
        .bind(terminal.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| Error::Database(e.to_string()))?;

        Ok(row.get("latest"))
    }
}
