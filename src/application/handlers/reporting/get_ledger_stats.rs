//! GetLedgerStatsHandler - Query handler for dashboard statistics.

use std::sync::Arc;

use crate::application::context::CallContext;
use crate::domain::foundation::Timestamp;
use crate::domain::ledger::LedgerError;
use crate::ports::{LedgerReader, LedgerStatistics};

/// Query for dashboard aggregates.
#[derive(Debug, Clone, Default)]
pub struct GetLedgerStatsQuery {
    /// Lower bound for minutes used. Defaults to the start of the current UTC day.
    pub since: Option<Timestamp>,
}

/// Handler for dashboard statistics.
///
/// Available to any authenticated caller. All figures come from one snapshot.
pub struct GetLedgerStatsHandler {
    reader: Arc<dyn LedgerReader>,
}

impl GetLedgerStatsHandler {
    pub fn new(reader: Arc<dyn LedgerReader>) -> Self {
        Self { reader }
    }

    pub async fn handle(
        &self,
        query: GetLedgerStatsQuery,
        ctx: &CallContext,
    ) -> Result<LedgerStatistics, LedgerError> {
        let since = query.since.unwrap_or_else(|| ctx.now().start_of_day());
        Ok(self.reader.get_statistics(since).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryLedgerStore;
    use crate::domain::foundation::{Actor, MemberId};

    #[tokio::test]
    async fn since_defaults_to_start_of_day() {
        let now = Timestamp::now();
        let ctx = CallContext::new(Actor::member(MemberId::new("alice").unwrap())).at(now);

        let stats = GetLedgerStatsHandler::new(Arc::new(InMemoryLedgerStore::new()))
            .handle(GetLedgerStatsQuery::default(), &ctx)
            .await
            .unwrap();

        assert_eq!(stats.since, now.start_of_day());
        assert_eq!(stats.active_member_count, 0);
        assert_eq!(stats.total_minutes_used, 0);
    }
}
