//! Membership command and query handlers.

mod get_membership;
mod set_membership;

pub use get_membership::{GetMembershipHandler, GetMembershipQuery, MembershipView};
pub use set_membership::{SetMembershipCommand, SetMembershipHandler, SetMembershipResult};
