//! HTTP adapters - REST API implementations.

pub mod ledger;

pub use ledger::{ledger_router, LedgerAppState};
