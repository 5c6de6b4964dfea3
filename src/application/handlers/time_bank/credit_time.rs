//! CreditTimeHandler - Command handler for topping up a member's time bank.

use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use crate::application::authorization::require_admin;
use crate::application::context::CallContext;
use crate::application::deadline::before_deadline;
use crate::domain::foundation::MemberId;
use crate::domain::ledger::LedgerError;
use crate::domain::time_bank::{credit_amount, TimeBankAccount};
use crate::ports::LedgerRepository;

/// Command to add prepaid minutes.
#[derive(Debug, Clone)]
pub struct CreditTimeCommand {
    pub member_id: MemberId,
    /// Requested amount; must be positive.
    pub minutes: i64,
}

/// Result of a successful credit.
#[derive(Debug, Clone)]
pub struct CreditTimeResult {
    pub account: TimeBankAccount,
    /// True if this credit opened the account.
    pub opened: bool,
}

/// Handler for time-bank credits.
///
/// Opens the account on the first credit, otherwise adds to the balance.
pub struct CreditTimeHandler {
    repository: Arc<dyn LedgerRepository>,
    operation_timeout: Duration,
    max_credit_minutes: u32,
}

impl CreditTimeHandler {
    pub fn new(
        repository: Arc<dyn LedgerRepository>,
        operation_timeout: Duration,
        max_credit_minutes: u32,
    ) -> Self {
        Self {
            repository,
            operation_timeout,
            max_credit_minutes,
        }
    }

    pub async fn handle(
        &self,
        cmd: CreditTimeCommand,
        ctx: &CallContext,
    ) -> Result<CreditTimeResult, LedgerError> {
        require_admin(&ctx.actor, "credit time")?;
        let minutes = credit_amount(cmd.minutes, self.max_credit_minutes)?;
        let deadline = ctx.deadline_or(self.operation_timeout);

        let (mut tx, account, opened) = before_deadline(deadline, "credit_time", async {
            let mut tx = self.repository.begin(&cmd.member_id).await?;
            let now = ctx.now();

            let (account, opened) = match tx.time_bank().await? {
                Some(mut account) => {
                    account.credit(minutes, now)?;
                    (account, false)
                }
                None => (TimeBankAccount::open(cmd.member_id.clone(), minutes, now), true),
            };

            tx.save_time_bank(&account).await?;
            Ok::<_, LedgerError>((tx, account, opened))
        })
        .await?;

        tx.commit().await?;

        info!(
            member_id = %account.member_id(),
            credited = minutes,
            balance_minutes = account.balance_minutes(),
            opened,
            "time credited"
        );

        Ok(CreditTimeResult { account, opened })
    }
}
