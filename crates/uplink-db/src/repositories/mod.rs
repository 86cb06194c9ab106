//! Repository implementations backed by PostgreSQL.

mod cycle;
mod terminal;
mod usage;

pub use cycle::PgCycleRepository;
pub use terminal::PgTerminalRepository;
pub use usage::PgUsageRepository;
