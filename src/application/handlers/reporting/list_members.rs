//! ListMembersHandler - Query handler for the member roster.

use std::sync::Arc;

use crate::application::authorization::require_admin;
use crate::application::context::CallContext;
use crate::domain::ledger::LedgerError;
use crate::ports::{LedgerReader, MemberLedgerView};

/// Handler for the staff roster: every member with membership and balance.
pub struct ListMembersHandler {
    reader: Arc<dyn LedgerReader>,
}

impl ListMembersHandler {
    pub fn new(reader: Arc<dyn LedgerReader>) -> Self {
        Self { reader }
    }

    pub async fn handle(&self, ctx: &CallContext) -> Result<Vec<MemberLedgerView>, LedgerError> {
        require_admin(&ctx.actor, "list members")?;
        Ok(self.reader.list_roster().await?)
    }
}
