//! Ledger reader port (read side / CQRS queries).
//!
//! Reads never take a member scope. Each call observes one consistent
//! snapshot of the store, which may trail a concurrent writer by one commit.

use crate::domain::foundation::{DomainError, MemberId, PlaySessionId, Timestamp};
use crate::domain::membership::MembershipRecord;
use crate::domain::play_session::{PlaySession, PlaySessionStatus};
use crate::domain::time_bank::TimeBankAccount;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Reader port for ledger queries.
#[async_trait]
pub trait LedgerReader: Send + Sync {
    /// Current membership of a member, `None` if never granted.
    async fn get_membership(
        &self,
        member_id: &MemberId,
    ) -> Result<Option<MembershipRecord>, DomainError>;

    /// Time-bank account of a member, `None` if never credited.
    async fn get_time_bank(
        &self,
        member_id: &MemberId,
    ) -> Result<Option<TimeBankAccount>, DomainError>;

    /// A session by id.
    async fn get_session(&self, session_id: &PlaySessionId)
        -> Result<Option<PlaySession>, DomainError>;

    /// Sessions matching the filter, newest start first.
    async fn list_sessions(&self, filter: &SessionFilter) -> Result<Vec<PlaySession>, DomainError>;

    /// Every member known to the ledger with their membership and balance,
    /// ordered by member id.
    async fn list_roster(&self) -> Result<Vec<MemberLedgerView>, DomainError>;

    /// Dashboard aggregates taken from a single snapshot.
    async fn get_statistics(&self, since: Timestamp) -> Result<LedgerStatistics, DomainError>;
}

/// Criteria for listing sessions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionFilter {
    pub member_id: Option<MemberId>,
    pub status: Option<PlaySessionStatus>,
    pub limit: u32,
}

impl SessionFilter {
    pub fn with_limit(limit: u32) -> Self {
        Self {
            member_id: None,
            status: None,
            limit,
        }
    }

    pub fn for_member(mut self, member_id: MemberId) -> Self {
        self.member_id = Some(member_id);
        self
    }

    pub fn with_status(mut self, status: PlaySessionStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// True if the session passes the member and status criteria.
    pub fn matches(&self, session: &PlaySession) -> bool {
        self.member_id
            .as_ref()
            .map_or(true, |member_id| &session.member_id == member_id)
            && self.status.map_or(true, |status| session.status == status)
    }
}

/// One roster row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberLedgerView {
    pub member_id: MemberId,

    /// Current membership, if any.
    pub membership: Option<MembershipRecord>,

    /// Zero for members without a time-bank account.
    pub balance_minutes: u32,

    pub has_active_session: bool,
}

/// Dashboard aggregates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerStatistics {
    /// Members whose current record has status `Active`.
    pub active_member_count: u64,

    /// Sessions currently in progress.
    pub active_session_count: u64,

    /// Minutes billed by sessions that ended at or after `since`.
    pub total_minutes_used: u64,

    pub since: Timestamp,

    /// When the snapshot was taken.
    pub as_of: Timestamp,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn member(id: &str) -> MemberId {
        MemberId::new(id).unwrap()
    }

    #[test]
    fn ledger_reader_is_object_safe() {
        fn _accepts_dyn(_reader: &dyn LedgerReader) {}
    }

    #[test]
    fn filter_matches_member_and_status() {
        let session = PlaySession::start(member("a"), Timestamp::now());

        assert!(SessionFilter::with_limit(10).matches(&session));
        assert!(SessionFilter::with_limit(10).for_member(member("a")).matches(&session));
        assert!(!SessionFilter::with_limit(10).for_member(member("b")).matches(&session));
        assert!(!SessionFilter::with_limit(10)
            .with_status(PlaySessionStatus::Completed)
            .matches(&session));
    }
}
