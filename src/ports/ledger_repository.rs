//! Ledger repository port (write side).
//!
//! Every mutation runs inside a [`MemberTransaction`]: a unit of work bound
//! to one member and serialized against every other unit of work on that
//! member. Units of work on different members never block each other.
//!
//! # Example
//!
//! ```ignore
//! async fn credit(repo: &dyn LedgerRepository, member_id: &MemberId, minutes: u32)
//!     -> Result<u32, DomainError>
//! {
//!     let mut tx = repo.begin(member_id).await?;
//!     let now = Timestamp::now();
//!     let account = match tx.time_bank().await? {
//!         Some(mut account) => { account.credit(minutes, now)?; account }
//!         None => TimeBankAccount::open(member_id.clone(), minutes, now),
//!     };
//!     tx.save_time_bank(&account).await?;
//!     tx.commit().await?;
//!     Ok(account.balance_minutes())
//! }
//! ```

use crate::domain::foundation::{DomainError, MemberId, PlaySessionId};
use crate::domain::membership::MembershipRecord;
use crate::domain::play_session::PlaySession;
use crate::domain::time_bank::TimeBankAccount;
use async_trait::async_trait;

/// Repository port for ledger mutations.
///
/// Implementations must ensure:
/// - At most one open unit of work per member at a time
/// - At most one `Active` play session per member, even if a caller skips
///   the check (the insert fails with `ActiveSessionExists`)
/// - Nothing staged in a unit of work is visible until `commit`
#[async_trait]
pub trait LedgerRepository: Send + Sync {
    /// Opens a unit of work for one member, waiting for any other unit of
    /// work on the same member to finish.
    ///
    /// # Errors
    ///
    /// - `DatabaseError` if the store cannot open the scope
    async fn begin(&self, member_id: &MemberId) -> Result<Box<dyn MemberTransaction>, DomainError>;

    /// Owner of a session, read outside any member scope.
    ///
    /// Ownership never changes, so the result can be used to pick the
    /// member whose scope must be opened before the session is re-read.
    async fn find_session_owner(
        &self,
        session_id: &PlaySessionId,
    ) -> Result<Option<MemberId>, DomainError>;
}

/// A member-scoped unit of work.
///
/// Reads observe committed state plus this unit's own staged writes.
/// Dropping the unit without calling [`commit`](Self::commit) discards
/// every staged write.
#[async_trait]
pub trait MemberTransaction: Send {
    /// The member this unit of work is bound to.
    fn member_id(&self) -> &MemberId;

    /// Current membership record, if any.
    async fn membership(&mut self) -> Result<Option<MembershipRecord>, DomainError>;

    /// Time-bank account, if one has been opened.
    async fn time_bank(&mut self) -> Result<Option<TimeBankAccount>, DomainError>;

    /// The member's active session, if any.
    async fn active_session(&mut self) -> Result<Option<PlaySession>, DomainError>;

    /// A session of this member by id. Sessions of other members read as `None`.
    async fn session(&mut self, session_id: &PlaySessionId)
        -> Result<Option<PlaySession>, DomainError>;

    /// Inserts or replaces the current membership record.
    async fn save_membership(&mut self, record: &MembershipRecord) -> Result<(), DomainError>;

    /// Inserts or replaces the time-bank account.
    async fn save_time_bank(&mut self, account: &TimeBankAccount) -> Result<(), DomainError>;

    /// Inserts a new session.
    ///
    /// # Errors
    ///
    /// - `ActiveSessionExists` if the member already has an active session
    async fn insert_session(&mut self, session: &PlaySession) -> Result<(), DomainError>;

    /// Rewrites an existing session.
    ///
    /// # Errors
    ///
    /// - `SessionNotFound` if the session does not exist for this member
    async fn update_session(&mut self, session: &PlaySession) -> Result<(), DomainError>;

    /// Applies every staged write atomically.
    ///
    /// # Errors
    ///
    /// - `DatabaseError` if the store rejects the commit; nothing is applied
    async fn commit(&mut self) -> Result<(), DomainError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ledger_repository_is_object_safe() {
        fn _accepts_dyn(_repo: &dyn LedgerRepository) {}
    }

    #[test]
    fn member_transaction_is_object_safe() {
        fn _accepts_dyn(_tx: Box<dyn MemberTransaction>) {}
    }
}
