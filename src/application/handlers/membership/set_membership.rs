//! SetMembershipHandler - Command handler for granting or revising a membership.

use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use crate::application::authorization::require_admin;
use crate::application::context::CallContext;
use crate::application::deadline::before_deadline;
use crate::domain::foundation::{MemberId, Timestamp};
use crate::domain::ledger::LedgerError;
use crate::domain::membership::{MembershipRecord, MembershipStatus};
use crate::ports::LedgerRepository;

/// Command to set a member's current membership.
#[derive(Debug, Clone)]
pub struct SetMembershipCommand {
    pub member_id: MemberId,
    pub end_date: Timestamp,
    pub status: MembershipStatus,
}

/// Result of a successful upsert.
#[derive(Debug, Clone)]
pub struct SetMembershipResult {
    pub record: MembershipRecord,
    /// True if this call granted the member's first membership.
    pub created: bool,
}

/// Handler for setting memberships.
///
/// Creates the record on first grant, otherwise rewrites end date and status
/// of the current record in place.
pub struct SetMembershipHandler {
    repository: Arc<dyn LedgerRepository>,
    operation_timeout: Duration,
}

impl SetMembershipHandler {
    pub fn new(repository: Arc<dyn LedgerRepository>, operation_timeout: Duration) -> Self {
        Self {
            repository,
            operation_timeout,
        }
    }

    pub async fn handle(
        &self,
        cmd: SetMembershipCommand,
        ctx: &CallContext,
    ) -> Result<SetMembershipResult, LedgerError> {
        require_admin(&ctx.actor, "set a membership")?;
        let deadline = ctx.deadline_or(self.operation_timeout);

        let (mut tx, record, created) = before_deadline(deadline, "set_membership", async {
            let mut tx = self.repository.begin(&cmd.member_id).await?;
            let now = ctx.now();

            let (record, created) = match tx.membership().await? {
                Some(mut record) => {
                    record.revise(cmd.end_date, cmd.status, now)?;
                    (record, false)
                }
                None => (
                    MembershipRecord::grant(cmd.member_id.clone(), cmd.end_date, cmd.status, now),
                    true,
                ),
            };

            tx.save_membership(&record).await?;
            Ok::<_, LedgerError>((tx, record, created))
        })
        .await?;

        tx.commit().await?;

        info!(
            member_id = %record.member_id,
            end_date = %record.end_date.as_datetime().to_rfc3339(),
            status = %record.status,
            created,
            "membership set"
        );

        Ok(SetMembershipResult { record, created })
    }
}
