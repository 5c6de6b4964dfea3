//! In-memory ledger store.
//!
//! Implements both ledger ports over shared tables guarded by a tokio
//! `RwLock`. Member scopes are per-member tokio mutexes held for the whole
//! unit of work; staged writes are applied under the table write lock at
//! commit, so readers never see half an operation.
//!
//! Used by tests and by single-node deployments without a database.

use async_trait::async_trait;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};

use crate::domain::foundation::{DomainError, ErrorCode, MemberId, PlaySessionId, Timestamp};
use crate::domain::membership::{MembershipRecord, MembershipStatus};
use crate::domain::play_session::{PlaySession, PlaySessionStatus};
use crate::domain::time_bank::TimeBankAccount;
use crate::ports::{
    LedgerReader, LedgerRepository, LedgerStatistics, MemberLedgerView, MemberTransaction,
    SessionFilter,
};

#[derive(Debug, Default)]
struct Tables {
    memberships: HashMap<MemberId, MembershipRecord>,
    time_banks: HashMap<MemberId, TimeBankAccount>,
    sessions: HashMap<PlaySessionId, PlaySession>,
}

impl Tables {
    fn sessions_of<'a>(&'a self, member_id: &'a MemberId) -> impl Iterator<Item = &'a PlaySession> {
        self.sessions
            .values()
            .filter(move |session| &session.member_id == member_id)
    }

    fn active_session_of<'a>(&'a self, member_id: &'a MemberId) -> Option<&'a PlaySession> {
        self.sessions_of(member_id).find(|session| session.is_active())
    }
}

/// In-memory implementation of [`LedgerRepository`] and [`LedgerReader`].
#[derive(Debug, Clone, Default)]
pub struct InMemoryLedgerStore {
    tables: Arc<RwLock<Tables>>,
    member_locks: Arc<Mutex<HashMap<MemberId, Arc<Mutex<()>>>>>,
}

impl InMemoryLedgerStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored sessions (useful for tests).
    pub async fn session_count(&self) -> usize {
        self.tables.read().await.sessions.len()
    }

    /// Number of active sessions of one member (useful for tests).
    pub async fn active_session_count_for(&self, member_id: &MemberId) -> usize {
        self.tables
            .read()
            .await
            .sessions_of(member_id)
            .filter(|session| session.is_active())
            .count()
    }

    /// Returns the member's scope mutex, evicting entries no scope holds.
    ///
    /// An entry whose only reference is the map itself has no open scope and
    /// no waiter, so dropping it cannot split a member across two mutexes.
    async fn member_lock(&self, member_id: &MemberId) -> Arc<Mutex<()>> {
        let mut locks = self.member_locks.lock().await;
        locks.retain(|_, lock| Arc::strong_count(lock) > 1);
        locks.entry(member_id.clone()).or_default().clone()
    }
}

#[async_trait]
impl LedgerRepository for InMemoryLedgerStore {
    async fn begin(&self, member_id: &MemberId) -> Result<Box<dyn MemberTransaction>, DomainError> {
        let guard = self.member_lock(member_id).await.lock_owned().await;
        Ok(Box::new(InMemoryMemberTransaction {
            member_id: member_id.clone(),
            tables: Arc::clone(&self.tables),
            staged: Staged::default(),
            committed: false,
            _guard: guard,
        }))
    }

    async fn find_session_owner(
        &self,
        session_id: &PlaySessionId,
    ) -> Result<Option<MemberId>, DomainError> {
        let tables = self.tables.read().await;
        Ok(tables
            .sessions
            .get(session_id)
            .map(|session| session.member_id.clone()))
    }
}

#[derive(Debug, Default)]
struct Staged {
    membership: Option<MembershipRecord>,
    time_bank: Option<TimeBankAccount>,
    sessions: HashMap<PlaySessionId, PlaySession>,
}

/// Unit of work over the in-memory tables.
///
/// Holds the member's mutex until dropped.
struct InMemoryMemberTransaction {
    member_id: MemberId,
    tables: Arc<RwLock<Tables>>,
    staged: Staged,
    committed: bool,
    _guard: OwnedMutexGuard<()>,
}

impl InMemoryMemberTransaction {
    async fn visible_session(&self, session_id: &PlaySessionId) -> Option<PlaySession> {
        if let Some(session) = self.staged.sessions.get(session_id) {
            return Some(session.clone());
        }
        let tables = self.tables.read().await;
        tables
            .sessions
            .get(session_id)
            .filter(|session| session.member_id == self.member_id)
            .cloned()
    }

    fn active_session_exists(&self) -> DomainError {
        DomainError::new(
            ErrorCode::ActiveSessionExists,
            format!("Member {} already has an active session", self.member_id),
        )
        .with_detail("member_id", self.member_id.to_string())
    }
}

#[async_trait]
impl MemberTransaction for InMemoryMemberTransaction {
    fn member_id(&self) -> &MemberId {
        &self.member_id
    }

    async fn membership(&mut self) -> Result<Option<MembershipRecord>, DomainError> {
        if let Some(record) = &self.staged.membership {
            return Ok(Some(record.clone()));
        }
        Ok(self.tables.read().await.memberships.get(&self.member_id).cloned())
    }

    async fn time_bank(&mut self) -> Result<Option<TimeBankAccount>, DomainError> {
        if let Some(account) = &self.staged.time_bank {
            return Ok(Some(account.clone()));
        }
        Ok(self.tables.read().await.time_banks.get(&self.member_id).cloned())
    }

    async fn active_session(&mut self) -> Result<Option<PlaySession>, DomainError> {
        let tables = self.tables.read().await;
        let committed = tables
            .active_session_of(&self.member_id)
            .filter(|session| !self.staged.sessions.contains_key(&session.id))
            .cloned();
        let staged = self
            .staged
            .sessions
            .values()
            .find(|session| session.is_active())
            .cloned();
        Ok(staged.or(committed))
    }

    async fn session(
        &mut self,
        session_id: &PlaySessionId,
    ) -> Result<Option<PlaySession>, DomainError> {
        Ok(self.visible_session(session_id).await)
    }

    async fn save_membership(&mut self, record: &MembershipRecord) -> Result<(), DomainError> {
        self.staged.membership = Some(record.clone());
        Ok(())
    }

    async fn save_time_bank(&mut self, account: &TimeBankAccount) -> Result<(), DomainError> {
        self.staged.time_bank = Some(account.clone());
        Ok(())
    }

    async fn insert_session(&mut self, session: &PlaySession) -> Result<(), DomainError> {
        if session.is_active() && self.active_session().await?.is_some() {
            return Err(self.active_session_exists());
        }
        self.staged.sessions.insert(session.id, session.clone());
        Ok(())
    }

    async fn update_session(&mut self, session: &PlaySession) -> Result<(), DomainError> {
        if self.visible_session(&session.id).await.is_none() {
            return Err(DomainError::new(
                ErrorCode::SessionNotFound,
                format!("Play session {} not found", session.id),
            )
            .with_detail("session_id", session.id.to_string()));
        }
        self.staged.sessions.insert(session.id, session.clone());
        Ok(())
    }

    async fn commit(&mut self) -> Result<(), DomainError> {
        if self.committed {
            return Err(DomainError::new(
                ErrorCode::InternalError,
                "Unit of work already committed",
            ));
        }
        let staged = std::mem::take(&mut self.staged);
        let mut tables = self.tables.write().await;

        // Store-level guard: one active session per member after this commit.
        let active_after = tables
            .sessions_of(&self.member_id)
            .filter(|session| !staged.sessions.contains_key(&session.id) && session.is_active())
            .count()
            + staged.sessions.values().filter(|s| s.is_active()).count();
        if active_after > 1 {
            return Err(self.active_session_exists());
        }

        if let Some(record) = staged.membership {
            tables.memberships.insert(self.member_id.clone(), record);
        }
        if let Some(account) = staged.time_bank {
            tables.time_banks.insert(self.member_id.clone(), account);
        }
        tables.sessions.extend(staged.sessions);
        self.committed = true;
        Ok(())
    }
}

#[async_trait]
impl LedgerReader for InMemoryLedgerStore {
    async fn get_membership(
        &self,
        member_id: &MemberId,
    ) -> Result<Option<MembershipRecord>, DomainError> {
        Ok(self.tables.read().await.memberships.get(member_id).cloned())
    }

    async fn get_time_bank(
        &self,
        member_id: &MemberId,
    ) -> Result<Option<TimeBankAccount>, DomainError> {
        Ok(self.tables.read().await.time_banks.get(member_id).cloned())
    }

    async fn get_session(
        &self,
        session_id: &PlaySessionId,
    ) -> Result<Option<PlaySession>, DomainError> {
        Ok(self.tables.read().await.sessions.get(session_id).cloned())
    }

    async fn list_sessions(&self, filter: &SessionFilter) -> Result<Vec<PlaySession>, DomainError> {
        let tables = self.tables.read().await;
        let mut sessions: Vec<PlaySession> = tables
            .sessions
            .values()
            .filter(|session| filter.matches(session))
            .cloned()
            .collect();
        sessions.sort_by(|a, b| b.start_time.cmp(&a.start_time));
        sessions.truncate(filter.limit as usize);
        Ok(sessions)
    }

    async fn list_roster(&self) -> Result<Vec<MemberLedgerView>, DomainError> {
        let tables = self.tables.read().await;
        let members: BTreeSet<&MemberId> = tables
            .memberships
            .keys()
            .chain(tables.time_banks.keys())
            .chain(tables.sessions.values().map(|session| &session.member_id))
            .collect();

        Ok(members
            .into_iter()
            .map(|member_id| MemberLedgerView {
                member_id: member_id.clone(),
                membership: tables.memberships.get(member_id).cloned(),
                balance_minutes: tables
                    .time_banks
                    .get(member_id)
                    .map(|account| account.balance_minutes())
                    .unwrap_or(0),
                has_active_session: tables.active_session_of(member_id).is_some(),
            })
            .collect())
    }

    async fn get_statistics(&self, since: Timestamp) -> Result<LedgerStatistics, DomainError> {
        let tables = self.tables.read().await;
        let active_member_count = tables
            .memberships
            .values()
            .filter(|record| record.status == MembershipStatus::Active)
            .count() as u64;
        let active_session_count = tables
            .sessions
            .values()
            .filter(|session| session.status == PlaySessionStatus::Active)
            .count() as u64;
        let total_minutes_used = tables
            .sessions
            .values()
            .filter(|session| session.end_time.map_or(false, |end| end >= since))
            .filter_map(|session| session.minutes_used)
            .map(u64::from)
            .sum();

        Ok(LedgerStatistics {
            active_member_count,
            active_session_count,
            total_minutes_used,
            since,
            as_of: Timestamp::now(),
        })
    }
}
