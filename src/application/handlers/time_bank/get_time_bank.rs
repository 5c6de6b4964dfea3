//! GetTimeBankHandler - Query handler for a member's balance.

use std::sync::Arc;

use crate::application::authorization::require_view;
use crate::application::context::CallContext;
use crate::domain::foundation::MemberId;
use crate::domain::ledger::LedgerError;
use crate::domain::time_bank::TimeBankBalance;
use crate::ports::LedgerReader;

/// Query to get a member's time-bank balance.
#[derive(Debug, Clone)]
pub struct GetTimeBankQuery {
    pub member_id: MemberId,
}

/// Handler for balance lookups.
///
/// Never fails with `NotFound`: a member without an account has balance zero.
pub struct GetTimeBankHandler {
    reader: Arc<dyn LedgerReader>,
}

impl GetTimeBankHandler {
    pub fn new(reader: Arc<dyn LedgerReader>) -> Self {
        Self { reader }
    }

    pub async fn handle(
        &self,
        query: GetTimeBankQuery,
        ctx: &CallContext,
    ) -> Result<TimeBankBalance, LedgerError> {
        require_view(&ctx.actor, &query.member_id, "read this time bank")?;

        let account = self.reader.get_time_bank(&query.member_id).await?;
        Ok(TimeBankBalance::of(query.member_id, account.as_ref()))
    }
}
