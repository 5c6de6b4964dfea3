//! Membership domain module.
//!
//! Validity window and status of each member's current membership, and the
//! entitlement rule built on them.

mod record;
mod status;

pub use record::{entitlement, ExpiryReason, MembershipRecord};
pub use status::MembershipStatus;
