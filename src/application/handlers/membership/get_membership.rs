//! GetMembershipHandler - Query handler for a member's current membership.

use std::sync::Arc;

use serde::Serialize;

use crate::application::authorization::require_view;
use crate::application::context::CallContext;
use crate::domain::foundation::MemberId;
use crate::domain::ledger::LedgerError;
use crate::domain::membership::{ExpiryReason, MembershipRecord};
use crate::ports::LedgerReader;

/// Query to get a member's membership.
#[derive(Debug, Clone)]
pub struct GetMembershipQuery {
    pub member_id: MemberId,
}

/// Membership plus its entitlement evaluated at query time.
#[derive(Debug, Clone, Serialize)]
pub struct MembershipView {
    pub record: MembershipRecord,
    pub has_access: bool,
    pub days_remaining: u32,
    pub expiry: Option<ExpiryReason>,
}

/// Handler for membership lookups.
pub struct GetMembershipHandler {
    reader: Arc<dyn LedgerReader>,
}

impl GetMembershipHandler {
    pub fn new(reader: Arc<dyn LedgerReader>) -> Self {
        Self { reader }
    }

    pub async fn handle(
        &self,
        query: GetMembershipQuery,
        ctx: &CallContext,
    ) -> Result<MembershipView, LedgerError> {
        require_view(&ctx.actor, &query.member_id, "read this membership")?;

        let record = self
            .reader
            .get_membership(&query.member_id)
            .await?
            .ok_or_else(|| LedgerError::membership_not_found(&query.member_id))?;

        let now = ctx.now();
        Ok(MembershipView {
            has_access: record.grants_access_at(&now),
            days_remaining: record.days_remaining(&now),
            expiry: record.entitlement_at(&now).err(),
            record,
        })
    }
}
