//! Role checks applied before any ledger work starts.
//!
//! Staff (`Admin`) may change any member's ledger. Members may only read
//! their own records.

use tracing::debug;

use crate::domain::foundation::{Actor, MemberId};
use crate::domain::ledger::LedgerError;

/// Fails with `Forbidden` unless the actor is an admin.
pub fn require_admin(actor: &Actor, action: &str) -> Result<(), LedgerError> {
    if actor.is_admin() {
        return Ok(());
    }
    debug!(actor = %actor.member_id, role = %actor.role, action, "admin role required");
    Err(LedgerError::forbidden(action))
}

/// Fails with `Forbidden` unless the actor is an admin or `member_id` itself.
pub fn require_view(actor: &Actor, member_id: &MemberId, action: &str) -> Result<(), LedgerError> {
    if actor.can_view(member_id) {
        return Ok(());
    }
    debug!(actor = %actor.member_id, member_id = %member_id, action, "cross-member read denied");
    Err(LedgerError::forbidden(action))
}
