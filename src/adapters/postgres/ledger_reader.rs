//! PostgreSQL implementation of LedgerReader.
//!
//! Every query is a single statement, so each result comes from one MVCC
//! snapshot even while writers commit concurrently.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::foundation::{
    DomainError, MemberId, MembershipId, PlaySessionId, Timestamp,
};
use crate::domain::membership::MembershipRecord;
use crate::domain::play_session::PlaySession;
use crate::domain::time_bank::TimeBankAccount;
use crate::ports::{LedgerReader, LedgerStatistics, MemberLedgerView, SessionFilter};

use super::rows::{
    parse_member_id, parse_membership_status, parse_minutes, MembershipRow, PlaySessionRow,
    TimeBankRow,
};

/// PostgreSQL implementation of the LedgerReader port.
pub struct PostgresLedgerReader {
    pool: PgPool,
}

impl PostgresLedgerReader {
    /// Creates a new PostgresLedgerReader with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Row for roster queries; membership columns are null for members without one.
#[derive(Debug, sqlx::FromRow)]
struct RosterRow {
    member_id: String,
    membership_id: Option<Uuid>,
    start_date: Option<DateTime<Utc>>,
    end_date: Option<DateTime<Utc>>,
    status: Option<String>,
    created_at: Option<DateTime<Utc>>,
    updated_at: Option<DateTime<Utc>>,
    balance_minutes: i64,
    has_active_session: bool,
}

impl TryFrom<RosterRow> for MemberLedgerView {
    type Error = DomainError;

    fn try_from(row: RosterRow) -> Result<Self, Self::Error> {
        let member_id = parse_member_id(row.member_id)?;
        let membership = match (
            row.membership_id,
            row.start_date,
            row.end_date,
            row.status,
            row.created_at,
            row.updated_at,
        ) {
            (Some(id), Some(start), Some(end), Some(status), Some(created), Some(updated)) => {
                Some(MembershipRecord {
                    id: MembershipId::from_uuid(id),
                    member_id: member_id.clone(),
                    start_date: Timestamp::from_datetime(start),
                    end_date: Timestamp::from_datetime(end),
                    status: parse_membership_status(&status)?,
                    created_at: Timestamp::from_datetime(created),
                    updated_at: Timestamp::from_datetime(updated),
                })
            }
            _ => None,
        };

        Ok(MemberLedgerView {
            member_id,
            membership,
            balance_minutes: parse_minutes(row.balance_minutes)?,
            has_active_session: row.has_active_session,
        })
    }
}

/// Row for the dashboard statistics query.
#[derive(Debug, sqlx::FromRow)]
struct StatisticsRow {
    active_member_count: i64,
    active_session_count: i64,
    total_minutes_used: i64,
    as_of: DateTime<Utc>,
}

#[async_trait]
impl LedgerReader for PostgresLedgerReader {
    async fn get_membership(
        &self,
        member_id: &MemberId,
    ) -> Result<Option<MembershipRecord>, DomainError> {
        let row: Option<MembershipRow> = sqlx::query_as(
            r#"
            SELECT id, member_id, start_date, end_date, status, created_at, updated_at
            FROM memberships
            WHERE member_id = $1
            "#,
        )
        .bind(member_id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to get membership: {}", e)))?;

        row.map(MembershipRecord::try_from).transpose()
    }

    async fn get_time_bank(
        &self,
        member_id: &MemberId,
    ) -> Result<Option<TimeBankAccount>, DomainError> {
        let row: Option<TimeBankRow> = sqlx::query_as(
            r#"
            SELECT id, member_id, balance_minutes, created_at, updated_at
            FROM time_banks
            WHERE member_id = $1
            "#,
        )
        .bind(member_id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to get time bank: {}", e)))?;

        row.map(TimeBankAccount::try_from).transpose()
    }

    async fn get_session(
        &self,
        session_id: &PlaySessionId,
    ) -> Result<Option<PlaySession>, DomainError> {
        let row: Option<PlaySessionRow> = sqlx::query_as(
            r#"
            SELECT id, member_id, start_time, end_time, minutes_used, status
            FROM play_sessions
            WHERE id = $1
            "#,
        )
        .bind(session_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to get session: {}", e)))?;

        row.map(PlaySession::try_from).transpose()
    }

    async fn list_sessions(&self, filter: &SessionFilter) -> Result<Vec<PlaySession>, DomainError> {
        let rows: Vec<PlaySessionRow> = sqlx::query_as(
            r#"
            SELECT id, member_id, start_time, end_time, minutes_used, status
            FROM play_sessions
            WHERE ($1::TEXT IS NULL OR member_id = $1)
              AND ($2::TEXT IS NULL OR status = $2)
            ORDER BY start_time DESC
            LIMIT $3
            "#,
        )
        .bind(filter.member_id.as_ref().map(|m| m.as_str()))
        .bind(filter.status.map(|s| s.as_str()))
        .bind(i64::from(filter.limit))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to list sessions: {}", e)))?;

        rows.into_iter().map(PlaySession::try_from).collect()
    }

    async fn list_roster(&self) -> Result<Vec<MemberLedgerView>, DomainError> {
        let rows: Vec<RosterRow> = sqlx::query_as(
            r#"
            WITH members AS (
                SELECT member_id FROM memberships
                UNION
                SELECT member_id FROM time_banks
                UNION
                SELECT member_id FROM play_sessions
            )
            SELECT
                m.member_id,
                r.id AS membership_id,
                r.start_date,
                r.end_date,
                r.status,
                r.created_at,
                r.updated_at,
                COALESCE(t.balance_minutes, 0) AS balance_minutes,
                EXISTS (
                    SELECT 1 FROM play_sessions s
                    WHERE s.member_id = m.member_id AND s.status = 'active'
                ) AS has_active_session
            FROM members m
            LEFT JOIN memberships r ON r.member_id = m.member_id
            LEFT JOIN time_banks t ON t.member_id = m.member_id
            ORDER BY m.member_id
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to list roster: {}", e)))?;

        rows.into_iter().map(MemberLedgerView::try_from).collect()
    }

    async fn get_statistics(&self, since: Timestamp) -> Result<LedgerStatistics, DomainError> {
        let row: StatisticsRow = sqlx::query_as(
            r#"
            SELECT
                (SELECT COUNT(*) FROM memberships WHERE status = 'active')
                    AS active_member_count,
                (SELECT COUNT(*) FROM play_sessions WHERE status = 'active')
                    AS active_session_count,
                (SELECT COALESCE(SUM(minutes_used), 0)::BIGINT FROM play_sessions
                    WHERE status = 'completed' AND end_time >= $1)
                    AS total_minutes_used,
                NOW() AS as_of
            "#,
        )
        .bind(since.as_datetime())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to get ledger statistics: {}", e)))?;

        Ok(LedgerStatistics {
            active_member_count: row.active_member_count.max(0) as u64,
            active_session_count: row.active_session_count.max(0) as u64,
            total_minutes_used: row.total_minutes_used.max(0) as u64,
            since,
            as_of: Timestamp::from_datetime(row.as_of),
        })
    }
}
