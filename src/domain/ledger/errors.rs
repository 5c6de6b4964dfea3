//! Ledger error types.
//!
//! Every facade operation fails with one of these. Soft outcomes such as a
//! clamped debit are reported on the success value instead.
//!
//! # HTTP Status Mapping
//!
//! | Error | HTTP Status |
//! |-------|-------------|
//! | NotFound | 404 |
//! | Validation | 400 |
//! | Conflict | 409 |
//! | MembershipExpired | 403 |
//! | InsufficientBalance | 402 |
//! | Forbidden | 403 |
//! | DeadlineExceeded | 504 |
//! | Infrastructure | 500 |

use std::fmt;

use crate::domain::foundation::{
    DomainError, ErrorCode, MemberId, PlaySessionId, ValidationError,
};
use crate::domain::membership::ExpiryReason;

/// Kind of record a lookup failed to find.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Membership,
    Session,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityKind::Membership => f.write_str("Membership"),
            EntityKind::Session => f.write_str("Play session"),
        }
    }
}

/// Concurrent or duplicate operations the ledger refuses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConflictKind {
    /// The member already has an active session.
    ActiveSessionExists { member_id: MemberId },

    /// The session was already ended.
    AlreadyCompleted { session_id: PlaySessionId },
}

/// Ledger-specific errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// Unknown member or session.
    NotFound { entity: EntityKind, id: String },

    /// Malformed input.
    Validation { field: String, message: String },

    /// Concurrent or duplicate operation.
    Conflict(ConflictKind),

    /// The member has no valid membership right now.
    MembershipExpired {
        member_id: MemberId,
        reason: ExpiryReason,
    },

    /// The member has no prepaid minutes left.
    InsufficientBalance {
        member_id: MemberId,
        balance_minutes: u32,
    },

    /// The caller's role does not allow the operation.
    Forbidden { action: String },

    /// The caller's deadline passed before commit.
    DeadlineExceeded { operation: String },

    /// Storage or other infrastructure failure.
    Infrastructure(String),
}

impl LedgerError {
    pub fn membership_not_found(member_id: &MemberId) -> Self {
        LedgerError::NotFound {
            entity: EntityKind::Membership,
            id: member_id.to_string(),
        }
    }

    pub fn session_not_found(session_id: &PlaySessionId) -> Self {
        LedgerError::NotFound {
            entity: EntityKind::Session,
            id: session_id.to_string(),
        }
    }

    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        LedgerError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn active_session_exists(member_id: MemberId) -> Self {
        LedgerError::Conflict(ConflictKind::ActiveSessionExists { member_id })
    }

    pub fn already_completed(session_id: PlaySessionId) -> Self {
        LedgerError::Conflict(ConflictKind::AlreadyCompleted { session_id })
    }

    pub fn membership_expired(member_id: MemberId, reason: ExpiryReason) -> Self {
        LedgerError::MembershipExpired { member_id, reason }
    }

    pub fn insufficient_balance(member_id: MemberId, balance_minutes: u32) -> Self {
        LedgerError::InsufficientBalance {
            member_id,
            balance_minutes,
        }
    }

    pub fn forbidden(action: impl Into<String>) -> Self {
        LedgerError::Forbidden {
            action: action.into(),
        }
    }

    pub fn deadline_exceeded(operation: impl Into<String>) -> Self {
        LedgerError::DeadlineExceeded {
            operation: operation.into(),
        }
    }

    pub fn infrastructure(message: impl Into<String>) -> Self {
        LedgerError::Infrastructure(message.into())
    }

    /// Returns the error code for this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            LedgerError::NotFound {
                entity: EntityKind::Membership,
                ..
            } => ErrorCode::MembershipNotFound,
            LedgerError::NotFound {
                entity: EntityKind::Session,
                ..
            } => ErrorCode::SessionNotFound,
            LedgerError::Validation { .. } => ErrorCode::ValidationFailed,
            LedgerError::Conflict(ConflictKind::ActiveSessionExists { .. }) => {
                ErrorCode::ActiveSessionExists
            }
            LedgerError::Conflict(ConflictKind::AlreadyCompleted { .. }) => {
                ErrorCode::SessionAlreadyCompleted
            }
            LedgerError::MembershipExpired { .. } => ErrorCode::MembershipExpired,
            LedgerError::InsufficientBalance { .. } => ErrorCode::InsufficientBalance,
            LedgerError::Forbidden { .. } => ErrorCode::Forbidden,
            LedgerError::DeadlineExceeded { .. } => ErrorCode::DeadlineExceeded,
            LedgerError::Infrastructure(_) => ErrorCode::DatabaseError,
        }
    }

    /// Returns a user-friendly error message.
    pub fn message(&self) -> String {
        match self {
            LedgerError::NotFound { entity, id } => format!("{} not found: {}", entity, id),
            LedgerError::Validation { field, message } => {
                format!("Validation failed for '{}': {}", field, message)
            }
            LedgerError::Conflict(ConflictKind::ActiveSessionExists { member_id }) => {
                format!("Member {} already has an active session", member_id)
            }
            LedgerError::Conflict(ConflictKind::AlreadyCompleted { session_id }) => {
                format!("Play session {} has already ended", session_id)
            }
            LedgerError::MembershipExpired { member_id, reason } => match reason {
                ExpiryReason::NoMembership => {
                    format!("Member {} has no membership", member_id)
                }
                ExpiryReason::Lapsed { end_date } => format!(
                    "Membership of {} expired at {}",
                    member_id,
                    end_date.as_datetime().to_rfc3339()
                ),
                ExpiryReason::Inactive => {
                    format!("Membership of {} is inactive", member_id)
                }
            },
            LedgerError::InsufficientBalance { member_id, .. } => {
                format!("Member {} has no time left in the time bank", member_id)
            }
            LedgerError::Forbidden { action } => format!("Not allowed to {}", action),
            LedgerError::DeadlineExceeded { operation } => {
                format!("Deadline exceeded before {} could commit", operation)
            }
            LedgerError::Infrastructure(msg) => format!("Error: {}", msg),
        }
    }

    /// Returns true if the caller may retry the same request.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            LedgerError::Infrastructure(_) | LedgerError::DeadlineExceeded { .. }
        )
    }
}

impl fmt::Display for LedgerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for LedgerError {}

impl From<ValidationError> for LedgerError {
    fn from(err: ValidationError) -> Self {
        LedgerError::Validation {
            field: err.field().to_string(),
            message: err.to_string(),
        }
    }
}

impl From<DomainError> for LedgerError {
    fn from(err: DomainError) -> Self {
        let member_id = err
            .details
            .get("member_id")
            .and_then(|id| MemberId::new(id.as_str()).ok());
        let session_id = err
            .details
            .get("session_id")
            .and_then(|id| id.parse::<PlaySessionId>().ok());

        match (err.code, member_id, session_id) {
            (ErrorCode::ValidationFailed, _, _) => LedgerError::Validation {
                field: err
                    .details
                    .get("field")
                    .cloned()
                    .unwrap_or_else(|| "unknown".to_string()),
                message: err.message,
            },
            (ErrorCode::ActiveSessionExists, Some(member_id), _) => {
                LedgerError::active_session_exists(member_id)
            }
            (ErrorCode::SessionAlreadyCompleted, _, Some(session_id)) => {
                LedgerError::already_completed(session_id)
            }
            (ErrorCode::SessionNotFound, _, Some(session_id)) => {
                LedgerError::session_not_found(&session_id)
            }
            (ErrorCode::MembershipNotFound, Some(member_id), _) => {
                LedgerError::membership_not_found(&member_id)
            }
            (ErrorCode::Forbidden, _, _) => LedgerError::Forbidden {
                action: err.message,
            },
            (ErrorCode::DeadlineExceeded, _, _) => LedgerError::DeadlineExceeded {
                operation: err.message,
            },
            _ => LedgerError::Infrastructure(err.to_string()),
        }
    }
}

impl From<LedgerError> for DomainError {
    fn from(err: LedgerError) -> Self {
        DomainError::new(err.code(), err.message())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::Timestamp;

    fn member() -> MemberId {
        MemberId::new("member-7").unwrap()
    }

    // ============================================================
    // Code Tests
    // ============================================================

    #[test]
    fn not_found_codes_follow_entity() {
        assert_eq!(
            LedgerError::membership_not_found(&member()).code(),
            ErrorCode::MembershipNotFound
        );
        assert_eq!(
            LedgerError::session_not_found(&PlaySessionId::new()).code(),
            ErrorCode::SessionNotFound
        );
    }

    #[test]
    fn conflict_codes_follow_kind() {
        assert_eq!(
            LedgerError::active_session_exists(member()).code(),
            ErrorCode::ActiveSessionExists
        );
        assert_eq!(
            LedgerError::already_completed(PlaySessionId::new()).code(),
            ErrorCode::SessionAlreadyCompleted
        );
    }

    // ============================================================
    // Message Tests
    // ============================================================

    #[test]
    fn expired_message_names_the_reason() {
        let lapsed = LedgerError::membership_expired(
            member(),
            ExpiryReason::Lapsed {
                end_date: Timestamp::parse_inclusive("end", "2025-01-31").unwrap(),
            },
        );
        assert!(lapsed.message().contains("2025-01-31"));

        let none = LedgerError::membership_expired(member(), ExpiryReason::NoMembership);
        assert!(none.message().contains("no membership"));
    }

    #[test]
    fn display_matches_message() {
        let err = LedgerError::insufficient_balance(member(), 0);
        assert_eq!(format!("{}", err), err.message());
    }

    // ============================================================
    // Retryable Tests
    // ============================================================

    #[test]
    fn only_transient_errors_are_retryable() {
        assert!(LedgerError::infrastructure("connection reset").is_retryable());
        assert!(LedgerError::deadline_exceeded("start_session").is_retryable());
        assert!(!LedgerError::active_session_exists(member()).is_retryable());
        assert!(!LedgerError::validation("minutes", "must be positive").is_retryable());
    }

    // ============================================================
    // Conversion Tests
    // ============================================================

    #[test]
    fn active_session_domain_error_becomes_conflict() {
        let err = DomainError::new(ErrorCode::ActiveSessionExists, "duplicate")
            .with_detail("member_id", "member-7");
        assert_eq!(LedgerError::from(err), LedgerError::active_session_exists(member()));
    }

    #[test]
    fn completed_domain_error_becomes_conflict() {
        let session_id = PlaySessionId::new();
        let err = DomainError::new(ErrorCode::SessionAlreadyCompleted, "done")
            .with_detail("session_id", session_id.to_string());
        assert_eq!(LedgerError::from(err), LedgerError::already_completed(session_id));
    }

    #[test]
    fn validation_keeps_field() {
        let err: LedgerError = ValidationError::empty_field("member_id").into();
        assert!(matches!(err, LedgerError::Validation { ref field, .. } if field == "member_id"));

        let via_domain: LedgerError = DomainError::from(ValidationError::empty_field("end_date")).into();
        assert!(matches!(via_domain, LedgerError::Validation { ref field, .. } if field == "end_date"));
    }

    #[test]
    fn database_errors_become_infrastructure() {
        let err: LedgerError = DomainError::database("pool timed out").into();
        assert_eq!(err.code(), ErrorCode::DatabaseError);
        assert!(err.message().contains("pool timed out"));
    }

    #[test]
    fn converts_to_domain_error() {
        let err = LedgerError::forbidden("credit time");
        let domain: DomainError = err.clone().into();
        assert_eq!(domain.code, ErrorCode::Forbidden);
        assert_eq!(domain.message, err.message());
    }
}
