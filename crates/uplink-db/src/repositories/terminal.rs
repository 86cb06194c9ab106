//! PostgreSQL implementation of TerminalRepository.

use async_trait::async_trait;
use sqlx::{PgPool, Row};
use uplink_core::ids::{AccountId, TerminalId};
use uplink_core::ports::TerminalRepository;
use uplink_core::terminal::Terminal;
use uplink_core::{Error, Result};

/// PostgreSQL implementation of TerminalRepository.
pub struct PgTerminalRepository {
    pool: PgPool,
}

impl PgTerminalRepository {
    /// Create a new PgTerminalRepository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn row_to_terminal(r: &sqlx::postgres::PgRow) -> Terminal {
        Terminal {
            terminal_id: TerminalId::new(r.get::<String, _>("terminal_id")),
            account_number: AccountId::new(r.get::<String, _>("account_number")),
            nickname: r.get("nickname"),
            active: r.get("active"),
            service_start_date: r.get("service_start_date"),
        }
    }
}

#[async_trait]
impl TerminalRepository for PgTerminalRepository {
    async fn get(&self, terminal: &TerminalId) -> Result<Option<Terminal>> {
        let row = sqlx::query(
            "SELECT terminal_id, account_number, nickname, active, service_start_date \
             FROM terminals WHERE terminal_id = $1",
        )
        .bind(terminal.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| Error::Database(e.to_string()))?;

        Ok(row.as_ref().map(Self::row_to_terminal))
    }

    async fn list_active(&self) -> Result<Vec<Terminal>> {
        let rows = sqlx::query(
            "SELECT terminal_id, account_number, nickname, active, service_start_date \
             FROM terminals WHERE active = TRUE ORDER BY terminal_id ASC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| Error::Database(e.to_string()))?;

        Ok(rows.iter().map(Self::row_to_terminal).collect())
    }
}
