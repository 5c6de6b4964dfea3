//! LedgerFacade - single entry point for the club ledger.
//!
//! Owns one handler per operation, all sharing the same store. Every call
//! runs inside a `ledger` span carrying the operation name, the caller and
//! the correlation ID, so the handler log lines of one request group together.

use std::sync::Arc;

use tracing::{info_span, Instrument};

use crate::adapters::memory::InMemoryLedgerStore;
use crate::config::LedgerConfig;
use crate::domain::foundation::Timestamp;
use crate::domain::ledger::LedgerError;
use crate::domain::play_session::PlaySession;
use crate::domain::time_bank::TimeBankBalance;
use crate::ports::{LedgerReader, LedgerRepository, LedgerStatistics, MemberLedgerView};

use super::context::CallContext;
use super::handlers::{
    CreditTimeCommand, CreditTimeHandler, CreditTimeResult, EndSessionCommand, EndSessionHandler,
    EndSessionResult, GetLedgerStatsHandler, GetLedgerStatsQuery, GetMembershipHandler,
    GetMembershipQuery, GetSessionHandler, GetSessionQuery, GetTimeBankHandler, GetTimeBankQuery,
    ListMembersHandler, ListSessionsHandler, ListSessionsQuery, MembershipView,
    SetMembershipCommand, SetMembershipHandler, SetMembershipResult, StartSessionCommand,
    StartSessionHandler, StartSessionResult,
};

/// The ledger's request/response surface.
pub struct LedgerFacade {
    start_session: StartSessionHandler,
    end_session: EndSessionHandler,
    credit_time: CreditTimeHandler,
    set_membership: SetMembershipHandler,
    get_membership: GetMembershipHandler,
    get_time_bank: GetTimeBankHandler,
    get_session: GetSessionHandler,
    list_sessions: ListSessionsHandler,
    list_members: ListMembersHandler,
    stats: GetLedgerStatsHandler,
}

impl LedgerFacade {
    pub fn new(
        repository: Arc<dyn LedgerRepository>,
        reader: Arc<dyn LedgerReader>,
        config: &LedgerConfig,
    ) -> Self {
        let timeout = config.operation_timeout();
        Self {
            start_session: StartSessionHandler::new(repository.clone(), timeout),
            end_session: EndSessionHandler::new(repository.clone(), timeout),
            credit_time: CreditTimeHandler::new(
                repository.clone(),
                timeout,
                config.max_credit_minutes,
            ),
            set_membership: SetMembershipHandler::new(repository, timeout),
            get_membership: GetMembershipHandler::new(reader.clone()),
            get_time_bank: GetTimeBankHandler::new(reader.clone()),
            get_session: GetSessionHandler::new(reader.clone()),
            list_sessions: ListSessionsHandler::new(
                reader.clone(),
                config.default_session_page_size,
            ),
            list_members: ListMembersHandler::new(reader.clone()),
            stats: GetLedgerStatsHandler::new(reader),
        }
    }

    /// Facade over a fresh in-memory store.
    pub fn in_memory(config: &LedgerConfig) -> Self {
        let store = InMemoryLedgerStore::new();
        Self::new(Arc::new(store.clone()), Arc::new(store), config)
    }

    pub async fn start_session(
        &self,
        cmd: StartSessionCommand,
        ctx: &CallContext,
    ) -> Result<StartSessionResult, LedgerError> {
        self.start_session
            .handle(cmd, ctx)
            .instrument(span("start_session", ctx))
            .await
    }

    pub async fn end_session(
        &self,
        cmd: EndSessionCommand,
        ctx: &CallContext,
    ) -> Result<EndSessionResult, LedgerError> {
        self.end_session
            .handle(cmd, ctx)
            .instrument(span("end_session", ctx))
            .await
    }

    pub async fn credit_time(
        &self,
        cmd: CreditTimeCommand,
        ctx: &CallContext,
    ) -> Result<CreditTimeResult, LedgerError> {
        self.credit_time
            .handle(cmd, ctx)
            .instrument(span("credit_time", ctx))
            .await
    }

    pub async fn set_membership(
        &self,
        cmd: SetMembershipCommand,
        ctx: &CallContext,
    ) -> Result<SetMembershipResult, LedgerError> {
        self.set_membership
            .handle(cmd, ctx)
            .instrument(span("set_membership", ctx))
            .await
    }

    pub async fn get_membership(
        &self,
        query: GetMembershipQuery,
        ctx: &CallContext,
    ) -> Result<MembershipView, LedgerError> {
        self.get_membership
            .handle(query, ctx)
            .instrument(span("get_membership", ctx))
            .await
    }

    pub async fn get_time_bank(
        &self,
        query: GetTimeBankQuery,
        ctx: &CallContext,
    ) -> Result<TimeBankBalance, LedgerError> {
        self.get_time_bank
            .handle(query, ctx)
            .instrument(span("get_time_bank", ctx))
            .await
    }

    pub async fn get_session(
        &self,
        query: GetSessionQuery,
        ctx: &CallContext,
    ) -> Result<PlaySession, LedgerError> {
        self.get_session
            .handle(query, ctx)
            .instrument(span("get_session", ctx))
            .await
    }

    pub async fn list_sessions(
        &self,
        query: ListSessionsQuery,
        ctx: &CallContext,
    ) -> Result<Vec<PlaySession>, LedgerError> {
        self.list_sessions
            .handle(query, ctx)
            .instrument(span("list_sessions", ctx))
            .await
    }

    pub async fn list_members(
        &self,
        ctx: &CallContext,
    ) -> Result<Vec<MemberLedgerView>, LedgerError> {
        self.list_members
            .handle(ctx)
            .instrument(span("list_members", ctx))
            .await
    }

    /// Dashboard figures from one snapshot.
    pub async fn statistics(
        &self,
        query: GetLedgerStatsQuery,
        ctx: &CallContext,
    ) -> Result<LedgerStatistics, LedgerError> {
        self.stats
            .handle(query, ctx)
            .instrument(span("statistics", ctx))
            .await
    }

    /// Members whose current record is `Active`.
    pub async fn active_member_count(&self, ctx: &CallContext) -> Result<u64, LedgerError> {
        Ok(self
            .statistics(GetLedgerStatsQuery::default(), ctx)
            .await?
            .active_member_count)
    }

    /// Sessions in progress right now.
    pub async fn active_session_count(&self, ctx: &CallContext) -> Result<u64, LedgerError> {
        Ok(self
            .statistics(GetLedgerStatsQuery::default(), ctx)
            .await?
            .active_session_count)
    }

    /// Minutes billed by sessions that ended at or after `since`.
    pub async fn total_minutes_used(
        &self,
        since: Timestamp,
        ctx: &CallContext,
    ) -> Result<u64, LedgerError> {
        let query = GetLedgerStatsQuery { since: Some(since) };
        Ok(self.statistics(query, ctx).await?.total_minutes_used)
    }
}

fn span(operation: &'static str, ctx: &CallContext) -> tracing::Span {
    info_span!(
        "ledger",
        operation,
        actor = %ctx.actor.member_id,
        correlation_id = %ctx.correlation_id()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::{Actor, ErrorCode, MemberId};
    use crate::domain::membership::MembershipStatus;
    use crate::domain::play_session::PlaySessionStatus;

    fn member(id: &str) -> MemberId {
        MemberId::new(id).unwrap()
    }

    fn admin_at(now: Timestamp) -> CallContext {
        CallContext::new(Actor::admin(member("staff"))).at(now)
    }

    fn t0() -> Timestamp {
        Timestamp::parse_inclusive("t0", "2025-06-01T12:00:00Z").unwrap()
    }

    async fn enrolled(facade: &LedgerFacade, id: &str, minutes: i64) {
        let ctx = admin_at(t0());
        facade
            .set_membership(
                SetMembershipCommand {
                    member_id: member(id),
                    end_date: t0().plus_days(30),
                    status: MembershipStatus::Active,
                },
                &ctx,
            )
            .await
            .unwrap();
        facade
            .credit_time(
                CreditTimeCommand {
                    member_id: member(id),
                    minutes,
                },
                &ctx,
            )
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn play_session_round_trip_debits_rounded_minutes() {
        let facade = LedgerFacade::in_memory(&LedgerConfig::default());
        enrolled(&facade, "alice", 90).await;

        let started = facade
            .start_session(StartSessionCommand { member_id: member("alice") }, &admin_at(t0()))
            .await
            .unwrap();
        let ended = facade
            .end_session(
                EndSessionCommand {
                    session_id: started.session.id,
                },
                &admin_at(t0().plus_secs(65)),
            )
            .await
            .unwrap();

        assert_eq!(ended.session.minutes_used, Some(2));
        assert_eq!(ended.balance_minutes, 88);
        assert!(ended.debit_clamped.is_none());
    }

    #[tokio::test]
    async fn credits_accumulate_from_a_new_account() {
        let facade = LedgerFacade::in_memory(&LedgerConfig::default());
        let ctx = admin_at(t0());
        let cmd = |minutes| CreditTimeCommand {
            member_id: member("bob"),
            minutes,
        };

        assert_eq!(facade.credit_time(cmd(60), &ctx).await.unwrap().account.balance_minutes(), 60);
        assert_eq!(facade.credit_time(cmd(30), &ctx).await.unwrap().account.balance_minutes(), 90);
    }

    #[tokio::test]
    async fn configured_credit_ceiling_is_enforced() {
        let config = LedgerConfig {
            max_credit_minutes: 120,
            ..Default::default()
        };
        let facade = LedgerFacade::in_memory(&config);
        let err = facade
            .credit_time(
                CreditTimeCommand {
                    member_id: member("bob"),
                    minutes: 121,
                },
                &admin_at(t0()),
            )
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::ValidationFailed);
    }

    #[tokio::test]
    async fn aggregates_reflect_ledger_state() {
        let facade = LedgerFacade::in_memory(&LedgerConfig::default());
        enrolled(&facade, "alice", 90).await;
        enrolled(&facade, "carol", 30).await;

        let first = facade
            .start_session(StartSessionCommand { member_id: member("alice") }, &admin_at(t0()))
            .await
            .unwrap();
        facade
            .end_session(
                EndSessionCommand {
                    session_id: first.session.id,
                },
                &admin_at(t0().plus_secs(600)),
            )
            .await
            .unwrap();
        facade
            .start_session(StartSessionCommand { member_id: member("carol") }, &admin_at(t0()))
            .await
            .unwrap();

        let ctx = admin_at(t0().plus_secs(700));
        assert_eq!(facade.active_member_count(&ctx).await.unwrap(), 2);
        assert_eq!(facade.active_session_count(&ctx).await.unwrap(), 1);
        assert_eq!(facade.total_minutes_used(t0(), &ctx).await.unwrap(), 10);
        assert_eq!(
            facade
                .total_minutes_used(t0().plus_secs(601), &ctx)
                .await
                .unwrap(),
            0
        );
    }

    #[tokio::test]
    async fn session_listing_goes_through_configured_page_size() {
        let config = LedgerConfig {
            default_session_page_size: 1,
            ..Default::default()
        };
        let facade = LedgerFacade::in_memory(&config);
        enrolled(&facade, "alice", 90).await;
        enrolled(&facade, "carol", 90).await;
        for id in ["alice", "carol"] {
            facade
                .start_session(StartSessionCommand { member_id: member(id) }, &admin_at(t0()))
                .await
                .unwrap();
        }

        let page = facade
            .list_sessions(
                ListSessionsQuery {
                    status: Some(PlaySessionStatus::Active),
                    ..Default::default()
                },
                &admin_at(t0()),
            )
            .await
            .unwrap();
        assert_eq!(page.len(), 1);
    }

    #[tokio::test]
    async fn roster_lists_every_known_member() {
        let facade = LedgerFacade::in_memory(&LedgerConfig::default());
        enrolled(&facade, "alice", 90).await;
        facade
            .credit_time(
                CreditTimeCommand {
                    member_id: member("dave"),
                    minutes: 15,
                },
                &admin_at(t0()),
            )
            .await
            .unwrap();

        let roster = facade.list_members(&admin_at(t0())).await.unwrap();
        let ids: Vec<_> = roster.iter().map(|m| m.member_id.as_str().to_string()).collect();
        assert_eq!(ids, vec!["alice", "dave"]);
        assert!(roster[1].membership.is_none());
        assert_eq!(roster[1].balance_minutes, 15);
    }
}
