//! PostgreSQL implementation of LedgerRepository.
//!
//! Each unit of work is one database transaction. The first statement takes
//! a transaction-scoped advisory lock keyed on the member id, so units of
//! work on the same member queue behind each other while different members
//! proceed in parallel. The lock is released on commit or rollback.

use async_trait::async_trait;
use sqlx::{PgConnection, PgPool, Postgres, Transaction};

use crate::domain::foundation::{DomainError, ErrorCode, MemberId, PlaySessionId};
use crate::domain::membership::MembershipRecord;
use crate::domain::play_session::PlaySession;
use crate::domain::time_bank::TimeBankAccount;
use crate::ports::{LedgerRepository, MemberTransaction};

use super::rows::{
    parse_member_id, MembershipRow, PlaySessionRow, TimeBankRow, ONE_ACTIVE_SESSION_INDEX,
};

/// PostgreSQL implementation of the LedgerRepository port.
pub struct PostgresLedgerRepository {
    pool: PgPool,
}

impl PostgresLedgerRepository {
    /// Creates a new PostgresLedgerRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LedgerRepository for PostgresLedgerRepository {
    async fn begin(&self, member_id: &MemberId) -> Result<Box<dyn MemberTransaction>, DomainError> {
        let mut tx = self.pool.begin().await.map_err(|e| {
            DomainError::database(format!("Failed to begin transaction: {}", e))
        })?;

        sqlx::query("SELECT pg_advisory_xact_lock(hashtextextended($1, 0))")
            .bind(member_id.as_str())
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                DomainError::database(format!("Failed to lock member {}: {}", member_id, e))
            })?;

        Ok(Box::new(PostgresMemberTransaction {
            member_id: member_id.clone(),
            tx: Some(tx),
        }))
    }

    async fn find_session_owner(
        &self,
        session_id: &PlaySessionId,
    ) -> Result<Option<MemberId>, DomainError> {
        let owner: Option<String> =
            sqlx::query_scalar("SELECT member_id FROM play_sessions WHERE id = $1")
                .bind(session_id.as_uuid())
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| {
                    DomainError::database(format!("Failed to find session owner: {}", e))
                })?;

        owner.map(parse_member_id).transpose()
    }
}

/// One member-scoped database transaction.
///
/// Dropping it without commit rolls the transaction back.
struct PostgresMemberTransaction {
    member_id: MemberId,
    tx: Option<Transaction<'static, Postgres>>,
}

impl PostgresMemberTransaction {
    fn conn(&mut self) -> Result<&mut PgConnection, DomainError> {
        match self.tx.as_mut() {
            Some(tx) => Ok(&mut **tx),
            None => Err(DomainError::new(
                ErrorCode::InternalError,
                "Unit of work already committed",
            )),
        }
    }
}

#[async_trait]
impl MemberTransaction for PostgresMemberTransaction {
    fn member_id(&self) -> &MemberId {
        &self.member_id
    }

    async fn membership(&mut self) -> Result<Option<MembershipRecord>, DomainError> {
        let member_id = self.member_id.clone();
        let row: Option<MembershipRow> = sqlx::query_as(
            r#"
            SELECT id, member_id, start_date, end_date, status, created_at, updated_at
            FROM memberships
            WHERE member_id = $1
            "#,
        )
        .bind(member_id.as_str())
        .fetch_optional(self.conn()?)
        .await
        .map_err(|e| DomainError::database(format!("Failed to load membership: {}", e)))?;

        row.map(MembershipRecord::try_from).transpose()
    }

    async fn time_bank(&mut self) -> Result<Option<TimeBankAccount>, DomainError> {
        let member_id = self.member_id.clone();
        let row: Option<TimeBankRow> = sqlx::query_as(
            r#"
            SELECT id, member_id, balance_minutes, created_at, updated_at
            FROM time_banks
            WHERE member_id = $1
            "#,
        )
        .bind(member_id.as_str())
        .fetch_optional(self.conn()?)
        .await
        .map_err(|e| DomainError::database(format!("Failed to load time bank: {}", e)))?;

        row.map(TimeBankAccount::try_from).transpose()
    }

    async fn active_session(&mut self) -> Result<Option<PlaySession>, DomainError> {
        let member_id = self.member_id.clone();
        let row: Option<PlaySessionRow> = sqlx::query_as(
            r#"
            SELECT id, member_id, start_time, end_time, minutes_used, status
            FROM play_sessions
            WHERE member_id = $1 AND status = 'active'
            "#,
        )
        .bind(member_id.as_str())
        .fetch_optional(self.conn()?)
        .await
        .map_err(|e| DomainError::database(format!("Failed to load active session: {}", e)))?;

        row.map(PlaySession::try_from).transpose()
    }

    async fn session(
        &mut self,
        session_id: &PlaySessionId,
    ) -> Result<Option<PlaySession>, DomainError> {
        let member_id = self.member_id.clone();
        let row: Option<PlaySessionRow> = sqlx::query_as(
            r#"
            SELECT id, member_id, start_time, end_time, minutes_used, status
            FROM play_sessions
            WHERE id = $1 AND member_id = $2
            "#,
        )
        .bind(session_id.as_uuid())
        .bind(member_id.as_str())
        .fetch_optional(self.conn()?)
        .await
        .map_err(|e| DomainError::database(format!("Failed to load session: {}", e)))?;

        row.map(PlaySession::try_from).transpose()
    }

    async fn save_membership(&mut self, record: &MembershipRecord) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO memberships (
                id, member_id, start_date, end_date, status, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (member_id) DO UPDATE SET
                end_date = EXCLUDED.end_date,
                status = EXCLUDED.status,
                updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(record.id.as_uuid())
        .bind(record.member_id.as_str())
        .bind(record.start_date.as_datetime())
        .bind(record.end_date.as_datetime())
        .bind(record.status.as_str())
        .bind(record.created_at.as_datetime())
        .bind(record.updated_at.as_datetime())
        .execute(self.conn()?)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.constraint() == Some("memberships_window_check") {
                    return DomainError::new(
                        ErrorCode::ValidationFailed,
                        "Membership end date precedes its start date",
                    )
                    .with_detail("field", "end_date");
                }
            }
            DomainError::database(format!("Failed to save membership: {}", e))
        })?;

        Ok(())
    }

    async fn save_time_bank(&mut self, account: &TimeBankAccount) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO time_banks (
                id, member_id, balance_minutes, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (member_id) DO UPDATE SET
                balance_minutes = EXCLUDED.balance_minutes,
                updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(account.id().as_uuid())
        .bind(account.member_id().as_str())
        .bind(i64::from(account.balance_minutes()))
        .bind(account.created_at().as_datetime())
        .bind(account.updated_at().as_datetime())
        .execute(self.conn()?)
        .await
        .map_err(|e| DomainError::database(format!("Failed to save time bank: {}", e)))?;

        Ok(())
    }

    async fn insert_session(&mut self, session: &PlaySession) -> Result<(), DomainError> {
        let member_id = self.member_id.clone();
        sqlx::query(
            r#"
            INSERT INTO play_sessions (
                id, member_id, start_time, end_time, minutes_used, status
            ) VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(session.id.as_uuid())
        .bind(session.member_id.as_str())
        .bind(session.start_time.as_datetime())
        .bind(session.end_time.as_ref().map(|t| *t.as_datetime()))
        .bind(session.minutes_used.map(i64::from))
        .bind(session.status.as_str())
        .execute(self.conn()?)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.constraint() == Some(ONE_ACTIVE_SESSION_INDEX) {
                    return DomainError::new(
                        ErrorCode::ActiveSessionExists,
                        format!("Member {} already has an active session", member_id),
                    )
                    .with_detail("member_id", member_id.to_string());
                }
            }
            DomainError::database(format!("Failed to insert session: {}", e))
        })?;

        Ok(())
    }

    async fn update_session(&mut self, session: &PlaySession) -> Result<(), DomainError> {
        let member_id = self.member_id.clone();
        let result = sqlx::query(
            r#"
            UPDATE play_sessions SET
                end_time = $3,
                minutes_used = $4,
                status = $5
            WHERE id = $1 AND member_id = $2
            "#,
        )
        .bind(session.id.as_uuid())
        .bind(member_id.as_str())
        .bind(session.end_time.as_ref().map(|t| *t.as_datetime()))
        .bind(session.minutes_used.map(i64::from))
        .bind(session.status.as_str())
        .execute(self.conn()?)
        .await
        .map_err(|e| DomainError::database(format!("Failed to update session: {}", e)))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::new(
                ErrorCode::SessionNotFound,
                format!("Play session {} not found", session.id),
            )
            .with_detail("session_id", session.id.to_string()));
        }

        Ok(())
    }

    async fn commit(&mut self) -> Result<(), DomainError> {
        let tx = self.tx.take().ok_or_else(|| {
            DomainError::new(ErrorCode::InternalError, "Unit of work already committed")
        })?;
        tx.commit()
            .await
            .map_err(|e| DomainError::database(format!("Failed to commit transaction: {}", e)))
    }
}
