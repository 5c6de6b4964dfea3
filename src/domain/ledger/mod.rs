//! Ledger-wide error taxonomy shared by handlers and adapters.

mod errors;

pub use errors::{ConflictKind, EntityKind, LedgerError};
