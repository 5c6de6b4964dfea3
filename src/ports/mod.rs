//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the domain and the outside world. Adapters implement these ports.
//!
//! - `LedgerRepository` / `MemberTransaction` - member-scoped units of work for mutations
//! - `LedgerReader` - snapshot queries for views and dashboards

mod ledger_reader;
mod ledger_repository;

pub use ledger_reader::{LedgerReader, LedgerStatistics, MemberLedgerView, SessionFilter};
pub use ledger_repository::{LedgerRepository, MemberTransaction};
