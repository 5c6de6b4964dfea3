//! Play session aggregate.
//!
//! One stretch of on-site play by a member. Opened by StartSession, closed
//! exactly once by EndSession, immutable afterwards.
//!
//! # Invariants
//!
//! - At most one `Active` session per member (enforced by the store)
//! - `end_time >= start_time` once set
//! - `minutes_used` is the ceiling of the wall-clock duration, at least 1

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{
    DomainError, ErrorCode, MemberId, PlaySessionId, StateMachine, Timestamp, ValidationError,
};

use super::{billable_minutes, PlaySessionStatus};

/// A member's play session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaySession {
    pub id: PlaySessionId,

    pub member_id: MemberId,

    pub start_time: Timestamp,

    /// Set when the session completes.
    pub end_time: Option<Timestamp>,

    /// Billed minutes, set when the session completes.
    pub minutes_used: Option<u32>,

    pub status: PlaySessionStatus,
}

impl PlaySession {
    /// Opens a new active session starting at `now`.
    pub fn start(member_id: MemberId, now: Timestamp) -> Self {
        Self {
            id: PlaySessionId::new(),
            member_id,
            start_time: now,
            end_time: None,
            minutes_used: None,
            status: PlaySessionStatus::Active,
        }
    }

    /// Reconstitute a session from persistence.
    pub fn reconstitute(
        id: PlaySessionId,
        member_id: MemberId,
        start_time: Timestamp,
        end_time: Option<Timestamp>,
        minutes_used: Option<u32>,
        status: PlaySessionStatus,
    ) -> Self {
        Self {
            id,
            member_id,
            start_time,
            end_time,
            minutes_used,
            status,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status.is_active()
    }

    /// Closes the session at `now` and returns the billed minutes.
    ///
    /// # Errors
    ///
    /// - `SessionAlreadyCompleted` if the session was already closed
    /// - `ValidationFailed` if `now` precedes `start_time`
    pub fn complete(&mut self, now: Timestamp) -> Result<u32, DomainError> {
        if !self.status.can_transition_to(&PlaySessionStatus::Completed) {
            return Err(DomainError::new(
                ErrorCode::SessionAlreadyCompleted,
                format!("Play session {} is already completed", self.id),
            )
            .with_detail("session_id", self.id.to_string()));
        }
        if now.is_before(&self.start_time) {
            return Err(ValidationError::invalid_format(
                "end_time",
                format!(
                    "must not precede the session start ({})",
                    self.start_time.as_datetime().to_rfc3339()
                ),
            )
            .into());
        }

        let minutes = billable_minutes(now.duration_since(&self.start_time));
        self.status = PlaySessionStatus::Completed;
        self.end_time = Some(now);
        self.minutes_used = Some(minutes);
        Ok(minutes)
    }
}
