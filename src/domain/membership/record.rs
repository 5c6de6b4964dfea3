//! Membership record entity.
//!
//! A member has at most one current record. Granting access creates it;
//! renewals and status changes rewrite it in place. Records are never deleted.
//!
//! # Invariants
//!
//! - `end_date >= start_date`
//! - `member_id` is unique across records

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{MemberId, MembershipId, Timestamp, ValidationError};

use super::MembershipStatus;

/// Why a member is not currently entitled to play.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum ExpiryReason {
    /// No membership has ever been granted.
    NoMembership,
    /// The validity window ended at the given instant.
    Lapsed { end_date: Timestamp },
    /// The operator marked the membership inactive.
    Inactive,
}

/// The current membership of one member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MembershipRecord {
    pub id: MembershipId,
    pub member_id: MemberId,
    pub start_date: Timestamp,
    pub end_date: Timestamp,
    pub status: MembershipStatus,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl MembershipRecord {
    /// First grant of access for a member.
    ///
    /// The window starts now. When the requested end date is already in the
    /// past the start is pulled back to it, so a lapsed membership can still
    /// be recorded without breaking `end_date >= start_date`.
    pub fn grant(
        member_id: MemberId,
        end_date: Timestamp,
        status: MembershipStatus,
        now: Timestamp,
    ) -> Self {
        let start_date = if end_date.is_before(&now) { end_date } else { now };
        Self {
            id: MembershipId::new(),
            member_id,
            start_date,
            end_date,
            status,
            created_at: now,
            updated_at: now,
        }
    }

    /// Replaces the end date and status of the current record.
    ///
    /// # Errors
    ///
    /// - `InvalidFormat` on `end_date` if it precedes `start_date`
    pub fn revise(
        &mut self,
        end_date: Timestamp,
        status: MembershipStatus,
        now: Timestamp,
    ) -> Result<(), ValidationError> {
        if end_date.is_before(&self.start_date) {
            return Err(ValidationError::invalid_format(
                "end_date",
                format!(
                    "must not precede the membership start ({})",
                    self.start_date.as_datetime().to_rfc3339()
                ),
            ));
        }
        self.end_date = end_date;
        self.status = status;
        self.updated_at = now;
        Ok(())
    }

    /// Checks whether this record entitles the member to play at `now`.
    ///
    /// The end date takes precedence over the status flag: an `Active`
    /// record past its end date is expired.
    pub fn entitlement_at(&self, now: &Timestamp) -> Result<(), ExpiryReason> {
        if self.end_date.is_before(now) {
            return Err(ExpiryReason::Lapsed {
                end_date: self.end_date,
            });
        }
        if self.status == MembershipStatus::Inactive {
            return Err(ExpiryReason::Inactive);
        }
        Ok(())
    }

    pub fn grants_access_at(&self, now: &Timestamp) -> bool {
        self.entitlement_at(now).is_ok()
    }

    /// Whole days left in the window, zero once lapsed.
    pub fn days_remaining(&self, now: &Timestamp) -> u32 {
        let days = self.end_date.duration_since(now).num_days();
        u32::try_from(days.max(0)).unwrap_or(u32::MAX)
    }
}

/// Entitlement check for a member who may have no record at all.
pub fn entitlement(record: Option<&MembershipRecord>, now: &Timestamp) -> Result<(), ExpiryReason> {
    match record {
        Some(record) => record.entitlement_at(now),
        None => Err(ExpiryReason::NoMembership),
    }
}
