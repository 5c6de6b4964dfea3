//! HTTP DTOs (Data Transfer Objects) for ledger endpoints.
//!
//! These types define the JSON request/response structure for the ledger API.
//! They serve as the boundary between HTTP and the application layer.

use serde::{Deserialize, Serialize};

use crate::application::{
    CreditTimeResult, EndSessionResult, MembershipView, SetMembershipResult, StartSessionResult,
};
use crate::domain::foundation::Timestamp;
use crate::domain::membership::{ExpiryReason, MembershipRecord, MembershipStatus};
use crate::domain::play_session::{format_duration, PlaySession, PlaySessionStatus};
use crate::domain::time_bank::{DebitClamped, TimeBankBalance};
use crate::ports::{LedgerStatistics, MemberLedgerView};

fn rfc3339(ts: &Timestamp) -> String {
    ts.as_datetime().to_rfc3339()
}

// ════════════════════════════════════════════════════════════════════════════════
// Request DTOs
// ════════════════════════════════════════════════════════════════════════════════

/// Request to start a play session.
#[derive(Debug, Clone, Deserialize)]
pub struct StartSessionRequest {
    pub member_id: String,
}

/// Request to create or replace a member's membership.
#[derive(Debug, Clone, Deserialize)]
pub struct SetMembershipRequest {
    /// RFC 3339 timestamp or `YYYY-MM-DD` (valid through that UTC day).
    pub end_date: String,
    /// `active` or `inactive`; defaults to `active`.
    #[serde(default)]
    pub status: Option<String>,
}

/// Request to add prepaid minutes.
#[derive(Debug, Clone, Deserialize)]
pub struct CreditTimeRequest {
    pub minutes: i64,
}

/// Query string of the session list.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListSessionsParams {
    pub member_id: Option<String>,
    pub status: Option<String>,
    pub limit: Option<u32>,
}

/// Query string of the dashboard statistics.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StatsParams {
    pub since: Option<String>,
}

// ════════════════════════════════════════════════════════════════════════════════
// Response DTOs
// ════════════════════════════════════════════════════════════════════════════════

/// A play session as shown in the sessions table.
#[derive(Debug, Clone, Serialize)]
pub struct SessionResponse {
    pub id: String,
    pub member_id: String,
    pub start_time: String,
    pub end_time: Option<String>,
    pub minutes_used: Option<u32>,
    /// `"Xh Ym"` rendering of `minutes_used`.
    pub duration: Option<String>,
    pub status: PlaySessionStatus,
}

impl From<PlaySession> for SessionResponse {
    fn from(session: PlaySession) -> Self {
        Self {
            id: session.id.to_string(),
            member_id: session.member_id.to_string(),
            start_time: rfc3339(&session.start_time),
            end_time: session.end_time.as_ref().map(rfc3339),
            minutes_used: session.minutes_used,
            duration: session.minutes_used.map(format_duration),
            status: session.status,
        }
    }
}

/// Response for a started session.
#[derive(Debug, Clone, Serialize)]
pub struct StartSessionResponse {
    pub session: SessionResponse,
    pub balance_minutes: u32,
}

impl From<StartSessionResult> for StartSessionResponse {
    fn from(result: StartSessionResult) -> Self {
        Self {
            session: result.session.into(),
            balance_minutes: result.balance_minutes,
        }
    }
}

/// Response for an ended session.
#[derive(Debug, Clone, Serialize)]
pub struct EndSessionResponse {
    pub session: SessionResponse,
    pub balance_minutes: u32,
    pub balance: String,
    /// Present when the debit exceeded the balance.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub debit_clamped: Option<DebitClamped>,
}

impl From<EndSessionResult> for EndSessionResponse {
    fn from(result: EndSessionResult) -> Self {
        Self {
            session: result.session.into(),
            balance_minutes: result.balance_minutes,
            balance: format_duration(result.balance_minutes),
            debit_clamped: result.debit_clamped,
        }
    }
}

/// Membership record fields.
#[derive(Debug, Clone, Serialize)]
pub struct MembershipRecordResponse {
    pub id: String,
    pub member_id: String,
    pub start_date: String,
    pub end_date: String,
    pub status: MembershipStatus,
}

impl From<MembershipRecord> for MembershipRecordResponse {
    fn from(record: MembershipRecord) -> Self {
        Self {
            id: record.id.to_string(),
            member_id: record.member_id.to_string(),
            start_date: rfc3339(&record.start_date),
            end_date: rfc3339(&record.end_date),
            status: record.status,
        }
    }
}

/// Membership plus its entitlement at request time.
#[derive(Debug, Clone, Serialize)]
pub struct MembershipResponse {
    #[serde(flatten)]
    pub record: MembershipRecordResponse,
    pub has_access: bool,
    pub days_remaining: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expiry: Option<ExpiryReason>,
}

impl MembershipResponse {
    /// Evaluates a freshly written record at `now`.
    pub fn at(record: MembershipRecord, now: &Timestamp) -> Self {
        let expiry = record.entitlement_at(now).err();
        let days_remaining = record.days_remaining(now);
        Self {
            record: record.into(),
            has_access: expiry.is_none(),
            days_remaining,
            expiry,
        }
    }
}

impl From<MembershipView> for MembershipResponse {
    fn from(view: MembershipView) -> Self {
        Self {
            record: view.record.into(),
            has_access: view.has_access,
            days_remaining: view.days_remaining,
            expiry: view.expiry,
        }
    }
}

/// Response for SetMembership.
#[derive(Debug, Clone, Serialize)]
pub struct SetMembershipResponse {
    #[serde(flatten)]
    pub membership: MembershipResponse,
    pub created: bool,
}

impl SetMembershipResponse {
    pub fn at(result: SetMembershipResult, now: &Timestamp) -> Self {
        Self {
            membership: MembershipResponse::at(result.record, now),
            created: result.created,
        }
    }
}

/// Time-bank balance of one member.
#[derive(Debug, Clone, Serialize)]
pub struct TimeBankResponse {
    pub member_id: String,
    pub account_id: Option<String>,
    pub balance_minutes: u32,
    pub balance: String,
}

impl From<TimeBankBalance> for TimeBankResponse {
    fn from(view: TimeBankBalance) -> Self {
        Self {
            member_id: view.member_id.to_string(),
            account_id: view.account_id.map(|id| id.to_string()),
            balance_minutes: view.balance_minutes,
            balance: format_duration(view.balance_minutes),
        }
    }
}

/// Response for CreditTime.
#[derive(Debug, Clone, Serialize)]
pub struct CreditTimeResponse {
    #[serde(flatten)]
    pub time_bank: TimeBankResponse,
    pub opened: bool,
}

impl From<CreditTimeResult> for CreditTimeResponse {
    fn from(result: CreditTimeResult) -> Self {
        let account = result.account;
        Self {
            time_bank: TimeBankResponse {
                member_id: account.member_id().to_string(),
                account_id: Some(account.id().to_string()),
                balance_minutes: account.balance_minutes(),
                balance: format_duration(account.balance_minutes()),
            },
            opened: result.opened,
        }
    }
}

/// One row of the member roster.
#[derive(Debug, Clone, Serialize)]
pub struct RosterEntryResponse {
    pub member_id: String,
    pub membership: Option<MembershipRecordResponse>,
    pub balance_minutes: u32,
    pub balance: String,
    pub has_active_session: bool,
}

impl From<MemberLedgerView> for RosterEntryResponse {
    fn from(view: MemberLedgerView) -> Self {
        Self {
            member_id: view.member_id.to_string(),
            membership: view.membership.map(Into::into),
            balance_minutes: view.balance_minutes,
            balance: format_duration(view.balance_minutes),
            has_active_session: view.has_active_session,
        }
    }
}

/// Dashboard statistics.
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    pub active_member_count: u64,
    pub active_session_count: u64,
    pub total_minutes_used: u64,
    pub since: String,
    pub as_of: String,
}

impl From<LedgerStatistics> for StatsResponse {
    fn from(stats: LedgerStatistics) -> Self {
        Self {
            active_member_count: stats.active_member_count,
            active_session_count: stats.active_session_count,
            total_minutes_used: stats.total_minutes_used,
            since: rfc3339(&stats.since),
            as_of: rfc3339(&stats.as_of),
        }
    }
}

/// Standard error response.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    /// Error code for programmatic handling.
    pub code: String,
    /// Human-readable error message.
    pub message: String,
    /// Additional details (optional).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ErrorResponse {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }
}
