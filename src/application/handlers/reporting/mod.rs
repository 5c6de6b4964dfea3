//! Reporting query handlers for the staff dashboard and roster.

mod get_ledger_stats;
mod list_members;

pub use get_ledger_stats::{GetLedgerStatsHandler, GetLedgerStatsQuery};
pub use list_members::ListMembersHandler;
