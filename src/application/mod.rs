//! Application layer - Commands, Queries, and Handlers.
//!
//! This layer orchestrates domain operations and coordinates between ports.
//! Command handlers (write) run inside a member-scoped unit of work; query
//! handlers (read) work from store snapshots. `LedgerFacade` bundles them.

pub mod authorization;
pub mod context;
pub mod deadline;
pub mod handlers;
mod ledger;

pub use context::CallContext;
pub use ledger::LedgerFacade;

pub use handlers::{
    // Session handlers
    EndSessionCommand, EndSessionResult, GetSessionQuery, ListSessionsQuery, StartSessionCommand,
    StartSessionResult, MAX_SESSION_PAGE_SIZE,
    // Time-bank handlers
    CreditTimeCommand, CreditTimeResult, GetTimeBankQuery,
    // Membership handlers
    GetMembershipQuery, MembershipView, SetMembershipCommand, SetMembershipResult,
    // Reporting handlers
    GetLedgerStatsQuery,
};
