//! Application handlers.
//!
//! Command handlers open a member-scoped unit of work, run their checks
//! under the call deadline and commit. Query handlers read snapshots.

pub mod membership;
pub mod reporting;
pub mod session;
pub mod time_bank;

pub use membership::{
    GetMembershipHandler, GetMembershipQuery, MembershipView, SetMembershipCommand,
    SetMembershipHandler, SetMembershipResult,
};
pub use reporting::{GetLedgerStatsHandler, GetLedgerStatsQuery, ListMembersHandler};
pub use session::{
    EndSessionCommand, EndSessionHandler, EndSessionResult, GetSessionHandler, GetSessionQuery,
    ListSessionsHandler, ListSessionsQuery, StartSessionCommand, StartSessionHandler,
    StartSessionResult, MAX_SESSION_PAGE_SIZE,
};
pub use time_bank::{
    CreditTimeCommand, CreditTimeHandler, CreditTimeResult, GetTimeBankHandler, GetTimeBankQuery,
};
