//! Time-bank account entity.
//!
//! Prepaid minutes for one member. Opened lazily on the first credit,
//! topped up by credits and drawn down when play sessions end.
//!
//! # Invariants
//!
//! - `balance_minutes` is never negative (enforced by `u32`, debits clamp)
//! - One account per member

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{MemberId, TimeBankId, Timestamp, ValidationError};

/// Upper bound for a single credit.
pub const MAX_CREDIT_MINUTES: u32 = 1_000_000;

/// Validates a requested credit amount.
///
/// # Errors
///
/// - `OutOfRange` if `minutes` is not within `1..=max`
pub fn credit_amount(minutes: i64, max: u32) -> Result<u32, ValidationError> {
    let max = max.min(MAX_CREDIT_MINUTES);
    if minutes < 1 || minutes > i64::from(max) {
        return Err(ValidationError::out_of_range("minutes", 1, i64::from(max), minutes));
    }
    u32::try_from(minutes).map_err(|_| ValidationError::out_of_range("minutes", 1, i64::from(max), minutes))
}

/// Soft warning raised when a debit exceeded the available balance.
///
/// The session still ends; the balance is floored at zero and the shortfall
/// is reported so staff can bill it separately.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DebitClamped {
    pub requested_minutes: u32,
    pub debited_minutes: u32,
    pub shortfall_minutes: u32,
}

/// Result of a debit: the new balance plus an optional clamp warning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DebitOutcome {
    pub balance_minutes: u32,
    pub clamped: Option<DebitClamped>,
}

impl DebitOutcome {
    /// Debit against a member that has no account (balance zero).
    pub fn against_empty(requested_minutes: u32) -> Self {
        Self {
            balance_minutes: 0,
            clamped: (requested_minutes > 0).then_some(DebitClamped {
                requested_minutes,
                debited_minutes: 0,
                shortfall_minutes: requested_minutes,
            }),
        }
    }
}

/// Prepaid minute balance of one member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeBankAccount {
    id: TimeBankId,
    member_id: MemberId,
    balance_minutes: u32,
    created_at: Timestamp,
    updated_at: Timestamp,
}

impl TimeBankAccount {
    /// Opens an account with an initial (already validated) credit.
    pub fn open(member_id: MemberId, minutes: u32, now: Timestamp) -> Self {
        Self {
            id: TimeBankId::new(),
            member_id,
            balance_minutes: minutes,
            created_at: now,
            updated_at: now,
        }
    }

    /// Reconstitute an account from persistence.
    pub fn reconstitute(
        id: TimeBankId,
        member_id: MemberId,
        balance_minutes: u32,
        created_at: Timestamp,
        updated_at: Timestamp,
    ) -> Self {
        Self {
            id,
            member_id,
            balance_minutes,
            created_at,
            updated_at,
        }
    }

    pub fn id(&self) -> &TimeBankId {
        &self.id
    }

    pub fn member_id(&self) -> &MemberId {
        &self.member_id
    }

    pub fn balance_minutes(&self) -> u32 {
        self.balance_minutes
    }

    pub fn created_at(&self) -> &Timestamp {
        &self.created_at
    }

    pub fn updated_at(&self) -> &Timestamp {
        &self.updated_at
    }

    /// Adds minutes, returning the new balance.
    ///
    /// # Errors
    ///
    /// - `OutOfRange` if the balance would overflow
    pub fn credit(&mut self, minutes: u32, now: Timestamp) -> Result<u32, ValidationError> {
        let balance = self.balance_minutes.checked_add(minutes).ok_or_else(|| {
            ValidationError::out_of_range(
                "minutes",
                1,
                i64::from(u32::MAX - self.balance_minutes),
                i64::from(minutes),
            )
        })?;
        self.balance_minutes = balance;
        self.updated_at = now;
        Ok(balance)
    }

    /// Subtracts minutes, flooring the balance at zero.
    pub fn debit(&mut self, minutes: u32, now: Timestamp) -> DebitOutcome {
        let debited = minutes.min(self.balance_minutes);
        self.balance_minutes -= debited;
        self.updated_at = now;

        let clamped = (debited < minutes).then_some(DebitClamped {
            requested_minutes: minutes,
            debited_minutes: debited,
            shortfall_minutes: minutes - debited,
        });
        DebitOutcome {
            balance_minutes: self.balance_minutes,
            clamped,
        }
    }
}

/// Read view of a member's balance; members without an account read as zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeBankBalance {
    pub member_id: MemberId,
    pub account_id: Option<TimeBankId>,
    pub balance_minutes: u32,
}

impl TimeBankBalance {
    pub fn of(member_id: MemberId, account: Option<&TimeBankAccount>) -> Self {
        Self {
            member_id,
            account_id: account.map(|a| *a.id()),
            balance_minutes: account.map(|a| a.balance_minutes()).unwrap_or(0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn member() -> MemberId {
        MemberId::new("member-1").unwrap()
    }

    #[test]
    fn credit_amount_rejects_non_positive() {
        assert!(credit_amount(0, MAX_CREDIT_MINUTES).is_err());
        assert!(credit_amount(-30, MAX_CREDIT_MINUTES).is_err());
        assert_eq!(credit_amount(60, MAX_CREDIT_MINUTES).unwrap(), 60);
    }

    #[test]
    fn credit_amount_respects_configured_ceiling() {
        let err = credit_amount(601, 600).unwrap_err();
        assert!(matches!(err, ValidationError::OutOfRange { max: 600, actual: 601, .. }));
    }

    #[test]
    fn open_then_credit_accumulates() {
        let now = Timestamp::now();
        let mut account = TimeBankAccount::open(member(), 60, now);
        assert_eq!(account.credit(30, now).unwrap(), 90);
        assert_eq!(account.balance_minutes(), 90);
    }

    #[test]
    fn credit_overflow_is_rejected_without_change() {
        let now = Timestamp::now();
        let mut account = TimeBankAccount::open(member(), u32::MAX - 5, now);
        assert!(account.credit(10, now).is_err());
        assert_eq!(account.balance_minutes(), u32::MAX - 5);
    }

    #[test]
    fn debit_within_balance_is_not_clamped() {
        let now = Timestamp::now();
        let mut account = TimeBankAccount::open(member(), 90, now);
        let outcome = account.debit(2, now);
        assert_eq!(outcome.balance_minutes, 88);
        assert!(outcome.clamped.is_none());
    }

    #[test]
    fn debit_beyond_balance_clamps_to_zero() {
        let now = Timestamp::now();
        let mut account = TimeBankAccount::open(member(), 5, now);
        let outcome = account.debit(12, now);
        assert_eq!(outcome.balance_minutes, 0);
        assert_eq!(
            outcome.clamped,
            Some(DebitClamped {
                requested_minutes: 12,
                debited_minutes: 5,
                shortfall_minutes: 7,
            })
        );
    }

    #[test]
    fn debit_against_empty_reports_full_shortfall() {
        let outcome = DebitOutcome::against_empty(3);
        assert_eq!(outcome.balance_minutes, 0);
        assert_eq!(outcome.clamped.map(|c| c.shortfall_minutes), Some(3));
        assert!(DebitOutcome::against_empty(0).clamped.is_none());
    }

    #[test]
    fn balance_view_defaults_to_zero() {
        let view = TimeBankBalance::of(member(), None);
        assert_eq!(view.balance_minutes, 0);
        assert!(view.account_id.is_none());
    }

    proptest! {
        #[test]
        fn balance_never_underflows(
            initial in 1u32..10_000,
            ops in proptest::collection::vec((any::<bool>(), 0u32..5_000), 0..50),
        ) {
            let now = Timestamp::now();
            let mut account = TimeBankAccount::open(member(), initial, now);
            let mut expected: i64 = i64::from(initial);
            for (is_credit, minutes) in ops {
                if is_credit && minutes > 0 {
                    account.credit(minutes, now).unwrap();
                    expected += i64::from(minutes);
                } else {
                    let outcome = account.debit(minutes, now);
                    let shortfall = outcome.clamped.map(|c| c.shortfall_minutes).unwrap_or(0);
                    expected = expected - i64::from(minutes) + i64::from(shortfall);
                }
                prop_assert!(expected >= 0);
                prop_assert_eq!(i64::from(account.balance_minutes()), expected);
            }
        }
    }
}
