//! Deadline enforcement for ledger units of work.

use std::future::Future;
use tokio::time::{timeout_at, Instant};
use tracing::warn;

use crate::domain::ledger::LedgerError;

/// Runs the pre-commit phase of an operation under `deadline`.
///
/// On expiry the future is dropped, which drops any unit of work it holds
/// and discards its staged writes. Work that finishes only after the
/// deadline is discarded the same way, so callers that commit on `Ok`
/// never start a commit past the deadline.
pub async fn before_deadline<F, T>(
    deadline: Instant,
    operation: &'static str,
    work: F,
) -> Result<T, LedgerError>
where
    F: Future<Output = Result<T, LedgerError>>,
{
    match timeout_at(deadline, work).await {
        Ok(Ok(staged)) if Instant::now() < deadline => Ok(staged),
        Ok(Err(e)) => Err(e),
        Ok(Ok(_)) | Err(_) => {
            warn!(operation, "deadline exceeded before commit, rolled back");
            Err(LedgerError::deadline_exceeded(operation))
        }
    }
}
