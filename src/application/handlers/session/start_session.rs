//! StartSessionHandler - Command handler for opening a play session.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info};

use crate::application::authorization::require_admin;
use crate::application::context::CallContext;
use crate::application::deadline::before_deadline;
use crate::domain::foundation::MemberId;
use crate::domain::ledger::LedgerError;
use crate::domain::membership::entitlement;
use crate::domain::play_session::PlaySession;
use crate::ports::LedgerRepository;

/// Command to start a play session for a member.
#[derive(Debug, Clone)]
pub struct StartSessionCommand {
    pub member_id: MemberId,
}

/// Result of a successful start.
#[derive(Debug, Clone)]
pub struct StartSessionResult {
    pub session: PlaySession,
    /// Balance at start; nothing is debited until the session ends.
    pub balance_minutes: u32,
}

/// Handler for starting play sessions.
///
/// Checks run in order inside the member's scope:
/// 1. no active session (`Conflict`)
/// 2. membership entitles the member at `now` (`MembershipExpired`)
/// 3. balance is above zero (`InsufficientBalance`)
pub struct StartSessionHandler {
    repository: Arc<dyn LedgerRepository>,
    operation_timeout: Duration,
}

impl StartSessionHandler {
    pub fn new(repository: Arc<dyn LedgerRepository>, operation_timeout: Duration) -> Self {
        Self {
            repository,
            operation_timeout,
        }
    }

    pub async fn handle(
        &self,
        cmd: StartSessionCommand,
        ctx: &CallContext,
    ) -> Result<StartSessionResult, LedgerError> {
        require_admin(&ctx.actor, "start a play session")?;
        let deadline = ctx.deadline_or(self.operation_timeout);
        let member_id = cmd.member_id;

        let (mut tx, session, balance_minutes) = before_deadline(deadline, "start_session", async {
            let mut tx = self.repository.begin(&member_id).await?;
            let now = ctx.now();

            if let Some(active) = tx.active_session().await? {
                debug!(member_id = %member_id, active_session = %active.id, "start rejected: session in progress");
                return Err(LedgerError::active_session_exists(member_id.clone()));
            }

            let membership = tx.membership().await?;
            if let Err(reason) = entitlement(membership.as_ref(), &now) {
                debug!(member_id = %member_id, ?reason, "start rejected: no valid membership");
                return Err(LedgerError::membership_expired(member_id.clone(), reason));
            }

            let balance_minutes = tx
                .time_bank()
                .await?
                .map(|account| account.balance_minutes())
                .unwrap_or(0);
            if balance_minutes == 0 {
                debug!(member_id = %member_id, "start rejected: empty time bank");
                return Err(LedgerError::insufficient_balance(member_id.clone(), 0));
            }

            let session = PlaySession::start(member_id.clone(), now);
            tx.insert_session(&session).await?;
            Ok::<_, LedgerError>((tx, session, balance_minutes))
        })
        .await?;

        tx.commit().await?;

        info!(
            member_id = %session.member_id,
            session_id = %session.id,
            balance_minutes,
            "play session started"
        );

        Ok(StartSessionResult {
            session,
            balance_minutes,
        })
    }
}
