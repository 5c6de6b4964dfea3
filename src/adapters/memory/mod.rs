//! In-memory adapters for tests and single-node deployments.

mod ledger_store;

pub use ledger_store::InMemoryLedgerStore;
