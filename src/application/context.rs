//! Call context for ledger operations.
//!
//! Instead of every handler taking `actor`, `now` and `deadline` separately,
//! each takes one `CallContext` built at the API boundary.

use std::time::Duration;
use tokio::time::Instant;
use uuid::Uuid;

use crate::domain::foundation::{Actor, Timestamp};

/// Context that flows through one ledger call.
#[derive(Debug, Clone)]
pub struct CallContext {
    /// The authenticated caller.
    pub actor: Actor,

    /// Fixed clock reading. `None` reads the wall clock.
    now: Option<Timestamp>,

    /// Caller-supplied deadline. `None` falls back to the configured timeout.
    deadline: Option<Instant>,

    /// Links log lines of one request.
    correlation_id: Option<String>,
}

impl CallContext {
    pub fn new(actor: Actor) -> Self {
        Self {
            actor,
            now: None,
            deadline: None,
            correlation_id: None,
        }
    }

    /// Builder: pin the clock, e.g. to replay an operation at a known instant.
    pub fn at(mut self, now: Timestamp) -> Self {
        self.now = Some(now);
        self
    }

    /// Builder: abort the operation if it has not reached commit by `deadline`.
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Builder: add correlation ID for request tracing.
    pub fn with_correlation_id(mut self, id: impl Into<String>) -> Self {
        self.correlation_id = Some(id.into());
        self
    }

    /// Clock reading for the operation.
    pub fn now(&self) -> Timestamp {
        self.now.unwrap_or_else(Timestamp::now)
    }

    /// The caller's deadline, or `fallback` from now.
    pub fn deadline_or(&self, fallback: Duration) -> Instant {
        self.deadline.unwrap_or_else(|| Instant::now() + fallback)
    }

    /// Returns the correlation ID, generating one if not set.
    pub fn correlation_id(&self) -> String {
        self.correlation_id
            .clone()
            .unwrap_or_else(|| Uuid::new_v4().to_string())
    }
}
