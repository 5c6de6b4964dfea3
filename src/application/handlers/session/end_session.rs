//! EndSessionHandler - Command handler for closing a play session.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::application::authorization::require_admin;
use crate::application::context::CallContext;
use crate::application::deadline::before_deadline;
use crate::domain::foundation::PlaySessionId;
use crate::domain::ledger::LedgerError;
use crate::domain::play_session::PlaySession;
use crate::domain::time_bank::{DebitClamped, DebitOutcome};
use crate::ports::LedgerRepository;

/// Command to end a play session.
#[derive(Debug, Clone)]
pub struct EndSessionCommand {
    pub session_id: PlaySessionId,
}

/// Result of a successful end.
#[derive(Debug, Clone)]
pub struct EndSessionResult {
    pub session: PlaySession,
    /// Balance after the debit.
    pub balance_minutes: u32,
    /// Set when the balance could not cover the billed minutes.
    pub debit_clamped: Option<DebitClamped>,
}

/// Handler for ending play sessions.
///
/// Bills the elapsed time (rounded up, at least one minute), debits it from
/// the time bank with the clamp-at-zero policy and completes the session,
/// all in one commit. Ending twice is a conflict, not a no-op.
pub struct EndSessionHandler {
    repository: Arc<dyn LedgerRepository>,
    operation_timeout: Duration,
}

impl EndSessionHandler {
    pub fn new(repository: Arc<dyn LedgerRepository>, operation_timeout: Duration) -> Self {
        Self {
            repository,
            operation_timeout,
        }
    }

    pub async fn handle(
        &self,
        cmd: EndSessionCommand,
        ctx: &CallContext,
    ) -> Result<EndSessionResult, LedgerError> {
        require_admin(&ctx.actor, "end a play session")?;
        let deadline = ctx.deadline_or(self.operation_timeout);
        let session_id = cmd.session_id;

        let (mut tx, session, outcome) = before_deadline(deadline, "end_session", async {
            let owner = self
                .repository
                .find_session_owner(&session_id)
                .await?
                .ok_or_else(|| LedgerError::session_not_found(&session_id))?;

            let mut tx = self.repository.begin(&owner).await?;
            let now = ctx.now();

            let mut session = tx
                .session(&session_id)
                .await?
                .ok_or_else(|| LedgerError::session_not_found(&session_id))?;
            if !session.is_active() {
                debug!(session_id = %session_id, "end rejected: already completed");
                return Err(LedgerError::already_completed(session_id));
            }

            let minutes = session.complete(now)?;

            let outcome = match tx.time_bank().await? {
                Some(mut account) => {
                    let outcome = account.debit(minutes, now);
                    tx.save_time_bank(&account).await?;
                    outcome
                }
                None => DebitOutcome::against_empty(minutes),
            };

            tx.update_session(&session).await?;
            Ok::<_, LedgerError>((tx, session, outcome))
        })
        .await?;

        tx.commit().await?;

        if let Some(clamp) = outcome.clamped {
            warn!(
                member_id = %session.member_id,
                session_id = %session.id,
                requested_minutes = clamp.requested_minutes,
                shortfall_minutes = clamp.shortfall_minutes,
                "debit clamped at zero balance"
            );
        }
        info!(
            member_id = %session.member_id,
            session_id = %session.id,
            minutes_used = session.minutes_used.unwrap_or_default(),
            balance_minutes = outcome.balance_minutes,
            "play session ended"
        );

        Ok(EndSessionResult {
            session,
            balance_minutes: outcome.balance_minutes,
            debit_clamped: outcome.clamped,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryLedgerStore;
    use crate::domain::foundation::{Actor, MemberId, Timestamp};
    use crate::domain::play_session::PlaySessionStatus;
    use crate::domain::time_bank::TimeBankAccount;
    use crate::ports::LedgerReader;

    fn member(id: &str) -> MemberId {
        MemberId::new(id).unwrap()
    }

    fn admin_at(now: Timestamp) -> CallContext {
        CallContext::new(Actor::admin(member("staff"))).at(now)
    }

    /// Stores an active session for alice started at `t0`, with `balance` minutes.
    async fn seed(store: &InMemoryLedgerStore, balance: Option<u32>, t0: Timestamp) -> PlaySessionId {
        let alice = member("alice");
        let session = PlaySession::start(alice.clone(), t0);
        let mut tx = store.begin(&alice).await.unwrap();
        if let Some(balance) = balance {
            tx.save_time_bank(&TimeBankAccount::open(alice, balance, t0))
                .await
                .unwrap();
        }
        tx.insert_session(&session).await.unwrap();
        tx.commit().await.unwrap();
        session.id
    }

    fn end(store: &InMemoryLedgerStore) -> EndSessionHandler {
        EndSessionHandler::new(Arc::new(store.clone()), Duration::from_secs(5))
    }

    #[tokio::test]
    async fn sixty_five_seconds_debits_two_minutes() {
        let store = InMemoryLedgerStore::new();
        let t0 = Timestamp::now();
        let session_id = seed(&store, Some(90), t0).await;

        let result = end(&store)
            .handle(EndSessionCommand { session_id }, &admin_at(t0.plus_secs(65)))
            .await
            .unwrap();

        assert_eq!(result.session.minutes_used, Some(2));
        assert_eq!(result.session.status, PlaySessionStatus::Completed);
        assert_eq!(result.session.end_time, Some(t0.plus_secs(65)));
        assert_eq!(result.balance_minutes, 88);
        assert!(result.debit_clamped.is_none());

        let account = store.get_time_bank(&member("alice")).await.unwrap().unwrap();
        assert_eq!(account.balance_minutes(), 88);
    }

    #[tokio::test]
    async fn ending_twice_conflicts() {
        let store = InMemoryLedgerStore::new();
        let t0 = Timestamp::now();
        let session_id = seed(&store, Some(90), t0).await;

        end(&store)
            .handle(EndSessionCommand { session_id }, &admin_at(t0.plus_secs(65)))
            .await
            .unwrap();
        let err = end(&store)
            .handle(EndSessionCommand { session_id }, &admin_at(t0.plus_secs(300)))
            .await
            .unwrap_err();

        assert_eq!(err, LedgerError::already_completed(session_id));
        let account = store.get_time_bank(&member("alice")).await.unwrap().unwrap();
        assert_eq!(account.balance_minutes(), 88);
    }

    #[tokio::test]
    async fn overdraw_clamps_and_still_completes() {
        let store = InMemoryLedgerStore::new();
        let t0 = Timestamp::now();
        let session_id = seed(&store, Some(5), t0).await;

        let result = end(&store)
            .handle(EndSessionCommand { session_id }, &admin_at(t0.plus_secs(12 * 60)))
            .await
            .unwrap();

        assert_eq!(result.balance_minutes, 0);
        assert_eq!(
            result.debit_clamped,
            Some(DebitClamped {
                requested_minutes: 12,
                debited_minutes: 5,
                shortfall_minutes: 7,
            })
        );
        assert_eq!(result.session.status, PlaySessionStatus::Completed);
    }

    #[tokio::test]
    async fn missing_account_reports_full_shortfall() {
        let store = InMemoryLedgerStore::new();
        let t0 = Timestamp::now();
        let session_id = seed(&store, None, t0).await;

        let result = end(&store)
            .handle(EndSessionCommand { session_id }, &admin_at(t0.plus_secs(30)))
            .await
            .unwrap();

        assert_eq!(result.balance_minutes, 0);
        assert_eq!(result.debit_clamped.map(|c| c.shortfall_minutes), Some(1));
        assert!(store.get_time_bank(&member("alice")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn unknown_session_is_not_found() {
        let store = InMemoryLedgerStore::new();
        let session_id = PlaySessionId::new();
        let err = end(&store)
            .handle(EndSessionCommand { session_id }, &admin_at(Timestamp::now()))
            .await
            .unwrap_err();
        assert_eq!(err, LedgerError::session_not_found(&session_id));
    }

    #[tokio::test]
    async fn clock_before_start_is_rejected() {
        let store = InMemoryLedgerStore::new();
        let t0 = Timestamp::now();
        let session_id = seed(&store, Some(90), t0).await;

        let err = end(&store)
            .handle(EndSessionCommand { session_id }, &admin_at(t0.plus_secs(-60)))
            .await
            .unwrap_err();

        assert!(matches!(err, LedgerError::Validation { .. }));
        let stored = store.get_session(&session_id).await.unwrap().unwrap();
        assert!(stored.is_active());
    }
}
