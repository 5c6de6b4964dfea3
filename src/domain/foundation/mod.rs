//! Foundation module - Shared domain primitives.
//!
//! Value objects, identifiers, caller identity and error types shared by
//! the membership, time-bank and play-session modules.

mod auth;
mod errors;
mod ids;
mod state_machine;
mod timestamp;

pub use auth::{Actor, Role};
pub use errors::{DomainError, ErrorCode, ValidationError};
pub use ids::{MemberId, MembershipId, PlaySessionId, TimeBankId, MAX_MEMBER_ID_LENGTH};
pub use state_machine::StateMachine;
pub use timestamp::Timestamp;
