//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the domain to external systems:
//! - `memory` - In-memory ledger store (tests, single-node use)
//! - `postgres` - PostgreSQL ledger store
//! - `http` - REST API over the ledger facade

pub mod http;
pub mod memory;
pub mod postgres;

pub use memory::InMemoryLedgerStore;
pub use postgres::{PostgresLedgerReader, PostgresLedgerRepository};
