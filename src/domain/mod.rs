//! Domain layer containing business logic and domain types.
//!
//! # Module Organization
//!
//! - `foundation` - Shared domain primitives (value objects, IDs, caller identity, errors)
//! - `membership` - Membership validity windows and the entitlement rule
//! - `time_bank` - Prepaid minute balances, credits and clamped debits
//! - `play_session` - Session lifecycle and billing
//! - `ledger` - Error taxonomy returned by ledger operations

pub mod foundation;
pub mod ledger;
pub mod membership;
pub mod play_session;
pub mod time_bank;
