//! Play session domain module.
//!
//! Session lifecycle and the billing rules applied when a session ends.

mod aggregate;
mod billing;
mod status;

pub use aggregate::PlaySession;
pub use billing::{billable_minutes, format_duration, MINIMUM_BILLABLE_MINUTES};
pub use status::PlaySessionStatus;
