//! GetSessionHandler - Query handler for a single play session.

use std::sync::Arc;

use crate::application::authorization::require_view;
use crate::application::context::CallContext;
use crate::domain::foundation::PlaySessionId;
use crate::domain::ledger::LedgerError;
use crate::domain::play_session::PlaySession;
use crate::ports::LedgerReader;

/// Query to get one session.
#[derive(Debug, Clone)]
pub struct GetSessionQuery {
    pub session_id: PlaySessionId,
}

/// Handler for session lookups. Members may read only their own sessions.
pub struct GetSessionHandler {
    reader: Arc<dyn LedgerReader>,
}

impl GetSessionHandler {
    pub fn new(reader: Arc<dyn LedgerReader>) -> Self {
        Self { reader }
    }

    pub async fn handle(
        &self,
        query: GetSessionQuery,
        ctx: &CallContext,
    ) -> Result<PlaySession, LedgerError> {
        let session = self
            .reader
            .get_session(&query.session_id)
            .await?
            .ok_or_else(|| LedgerError::session_not_found(&query.session_id))?;

        require_view(&ctx.actor, &session.member_id, "read this play session")?;
        Ok(session)
    }
}
