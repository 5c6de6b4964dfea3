//! PostgreSQL adapters - Database implementations for repository ports.
//!
//! - `PostgresLedgerRepository` - member-scoped transactions behind advisory locks
//! - `PostgresLedgerReader` - single-statement snapshot queries
//!
//! Schema lives in `migrations/` and is applied with [`run_migrations`].

mod ledger_reader;
mod ledger_repository;
mod rows;

pub use ledger_reader::PostgresLedgerReader;
pub use ledger_repository::PostgresLedgerRepository;

use sqlx::PgPool;

/// Applies the embedded schema migrations.
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}
