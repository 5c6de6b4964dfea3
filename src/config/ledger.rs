//! Ledger behaviour configuration

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;
use crate::application::handlers::MAX_SESSION_PAGE_SIZE;
use crate::domain::time_bank::MAX_CREDIT_MINUTES;

/// Ledger configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LedgerConfig {
    /// Deadline for an operation when the caller supplies none, in milliseconds
    #[serde(default = "default_operation_timeout")]
    pub operation_timeout_ms: u64,

    /// Largest amount a single credit may add
    #[serde(default = "default_max_credit_minutes")]
    pub max_credit_minutes: u32,

    /// Page size for session listings without an explicit limit
    #[serde(default = "default_session_page_size")]
    pub default_session_page_size: u32,
}

impl LedgerConfig {
    /// Get operation timeout as Duration
    pub fn operation_timeout(&self) -> Duration {
        Duration::from_millis(self.operation_timeout_ms)
    }

    /// Validate ledger configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.operation_timeout_ms == 0 || self.operation_timeout_ms > 60_000 {
            return Err(ValidationError::InvalidOperationTimeout);
        }
        if self.max_credit_minutes == 0 || self.max_credit_minutes > MAX_CREDIT_MINUTES {
            return Err(ValidationError::InvalidCreditLimit(MAX_CREDIT_MINUTES));
        }
        if self.default_session_page_size == 0
            || self.default_session_page_size > MAX_SESSION_PAGE_SIZE
        {
            return Err(ValidationError::InvalidPageSize(MAX_SESSION_PAGE_SIZE));
        }
        Ok(())
    }
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            operation_timeout_ms: default_operation_timeout(),
            max_credit_minutes: default_max_credit_minutes(),
            default_session_page_size: default_session_page_size(),
        }
    }
}

fn default_operation_timeout() -> u64 {
    5_000
}

fn default_max_credit_minutes() -> u32 {
    60 * 24 * 31
}

fn default_session_page_size() -> u32 {
    50
}
