//! Row types shared by the PostgreSQL ledger adapters.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::foundation::{
    DomainError, MemberId, MembershipId, PlaySessionId, TimeBankId, Timestamp,
};
use crate::domain::membership::{MembershipRecord, MembershipStatus};
use crate::domain::play_session::{PlaySession, PlaySessionStatus};
use crate::domain::time_bank::TimeBankAccount;

/// Name of the partial unique index guarding active sessions.
pub(super) const ONE_ACTIVE_SESSION_INDEX: &str = "play_sessions_one_active_per_member";

#[derive(Debug, sqlx::FromRow)]
pub(super) struct MembershipRow {
    pub id: Uuid,
    pub member_id: String,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<MembershipRow> for MembershipRecord {
    type Error = DomainError;

    fn try_from(row: MembershipRow) -> Result<Self, Self::Error> {
        Ok(MembershipRecord {
            id: MembershipId::from_uuid(row.id),
            member_id: parse_member_id(row.member_id)?,
            start_date: Timestamp::from_datetime(row.start_date),
            end_date: Timestamp::from_datetime(row.end_date),
            status: parse_membership_status(&row.status)?,
            created_at: Timestamp::from_datetime(row.created_at),
            updated_at: Timestamp::from_datetime(row.updated_at),
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
pub(super) struct TimeBankRow {
    pub id: Uuid,
    pub member_id: String,
    pub balance_minutes: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<TimeBankRow> for TimeBankAccount {
    type Error = DomainError;

    fn try_from(row: TimeBankRow) -> Result<Self, Self::Error> {
        Ok(TimeBankAccount::reconstitute(
            TimeBankId::from_uuid(row.id),
            parse_member_id(row.member_id)?,
            parse_minutes(row.balance_minutes)?,
            Timestamp::from_datetime(row.created_at),
            Timestamp::from_datetime(row.updated_at),
        ))
    }
}

#[derive(Debug, sqlx::FromRow)]
pub(super) struct PlaySessionRow {
    pub id: Uuid,
    pub member_id: String,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub minutes_used: Option<i64>,
    pub status: String,
}

impl TryFrom<PlaySessionRow> for PlaySession {
    type Error = DomainError;

    fn try_from(row: PlaySessionRow) -> Result<Self, Self::Error> {
        Ok(PlaySession::reconstitute(
            PlaySessionId::from_uuid(row.id),
            parse_member_id(row.member_id)?,
            Timestamp::from_datetime(row.start_time),
            row.end_time.map(Timestamp::from_datetime),
            row.minutes_used.map(parse_minutes).transpose()?,
            parse_session_status(&row.status)?,
        ))
    }
}

pub(super) fn parse_member_id(raw: String) -> Result<MemberId, DomainError> {
    MemberId::new(raw).map_err(|e| DomainError::database(format!("Invalid member_id: {}", e)))
}

pub(super) fn parse_minutes(raw: i64) -> Result<u32, DomainError> {
    u32::try_from(raw)
        .map_err(|_| DomainError::database(format!("Minute value out of range: {}", raw)))
}

pub(super) fn parse_membership_status(s: &str) -> Result<MembershipStatus, DomainError> {
    s.parse()
        .map_err(|_| DomainError::database(format!("Invalid membership status value: {}", s)))
}

pub(super) fn parse_session_status(s: &str) -> Result<PlaySessionStatus, DomainError> {
    s.parse()
        .map_err(|_| DomainError::database(format!("Invalid session status value: {}", s)))
}
