//! ListSessionsHandler - Query handler for the session history.

use std::sync::Arc;

use crate::application::authorization::{require_admin, require_view};
use crate::application::context::CallContext;
use crate::domain::foundation::{MemberId, ValidationError};
use crate::domain::ledger::LedgerError;
use crate::domain::play_session::{PlaySession, PlaySessionStatus};
use crate::ports::{LedgerReader, SessionFilter};

/// Largest page a caller may request.
pub const MAX_SESSION_PAGE_SIZE: u32 = 500;

/// Query to list sessions, newest first.
#[derive(Debug, Clone, Default)]
pub struct ListSessionsQuery {
    pub member_id: Option<MemberId>,
    pub status: Option<PlaySessionStatus>,
    /// Page size; the configured default when absent.
    pub limit: Option<u32>,
}

/// Handler for session listings.
///
/// Listing one member's sessions needs admin or that member; the full
/// listing is admin-only.
pub struct ListSessionsHandler {
    reader: Arc<dyn LedgerReader>,
    default_page_size: u32,
}

impl ListSessionsHandler {
    pub fn new(reader: Arc<dyn LedgerReader>, default_page_size: u32) -> Self {
        Self {
            reader,
            default_page_size,
        }
    }

    pub async fn handle(
        &self,
        query: ListSessionsQuery,
        ctx: &CallContext,
    ) -> Result<Vec<PlaySession>, LedgerError> {
        match &query.member_id {
            Some(member_id) => require_view(&ctx.actor, member_id, "list these play sessions")?,
            None => require_admin(&ctx.actor, "list all play sessions")?,
        }

        let limit = query.limit.unwrap_or(self.default_page_size);
        if limit == 0 || limit > MAX_SESSION_PAGE_SIZE {
            return Err(ValidationError::out_of_range(
                "limit",
                1,
                i64::from(MAX_SESSION_PAGE_SIZE),
                i64::from(limit),
            )
            .into());
        }

        let mut filter = SessionFilter::with_limit(limit);
        if let Some(member_id) = query.member_id {
            filter = filter.for_member(member_id);
        }
        if let Some(status) = query.status {
            filter = filter.with_status(status);
        }

        Ok(self.reader.list_sessions(&filter).await?)
    }
}
