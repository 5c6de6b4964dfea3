//! HTTP handlers for ledger endpoints.
//!
//! These handlers connect Axum routes to the `LedgerFacade`.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::extract::{FromRequestParts, Json, Path, Query, State};
use axum::http::request::Parts;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use tracing::error;

use crate::application::{
    CallContext, CreditTimeCommand, EndSessionCommand, GetLedgerStatsQuery, GetMembershipQuery,
    GetSessionQuery, GetTimeBankQuery, LedgerFacade, ListSessionsQuery, SetMembershipCommand,
    StartSessionCommand,
};
use crate::domain::foundation::{
    Actor, MemberId, PlaySessionId, Role, Timestamp, ValidationError,
};
use crate::domain::ledger::LedgerError;
use crate::domain::membership::MembershipStatus;
use crate::domain::play_session::PlaySessionStatus;

use super::dto::{
    CreditTimeRequest, CreditTimeResponse, EndSessionResponse, ErrorResponse,
    ListSessionsParams, MembershipResponse, RosterEntryResponse, SessionResponse,
    SetMembershipRequest, SetMembershipResponse, StartSessionRequest, StartSessionResponse,
    StatsParams, StatsResponse, TimeBankResponse,
};

/// Header carrying the caller's member id.
pub const USER_ID_HEADER: &str = "x-user-id";
/// Header carrying the caller's role (`admin` or `member`).
pub const USER_ROLE_HEADER: &str = "x-user-role";
/// Optional header linking log lines of one request.
pub const CORRELATION_ID_HEADER: &str = "x-correlation-id";
/// Optional header with the caller's deadline in milliseconds from now.
pub const DEADLINE_HEADER: &str = "x-deadline-ms";

// ════════════════════════════════════════════════════════════════════════════════
// Application State
// ════════════════════════════════════════════════════════════════════════════════

/// Shared application state.
#[derive(Clone)]
pub struct LedgerAppState {
    pub facade: Arc<LedgerFacade>,
}

impl LedgerAppState {
    pub fn new(facade: LedgerFacade) -> Self {
        Self {
            facade: Arc::new(facade),
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Caller Context (set by the upstream identity proxy)
// ════════════════════════════════════════════════════════════════════════════════

/// Call context extracted from the identity headers.
#[derive(Debug, Clone)]
pub struct RequestContext(pub CallContext);

fn header<'a>(parts: &'a Parts, name: &str) -> Option<&'a str> {
    parts
        .headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

#[async_trait]
impl<S> FromRequestParts<S> for RequestContext
where
    S: Send + Sync,
{
    type Rejection = LedgerApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let member_id = header(parts, USER_ID_HEADER)
            .and_then(|v| MemberId::new(v).ok())
            .ok_or(LedgerApiError::Unauthenticated)?;
        let role = header(parts, USER_ROLE_HEADER)
            .and_then(|v| v.parse::<Role>().ok())
            .ok_or(LedgerApiError::Unauthenticated)?;

        let mut ctx = CallContext::new(Actor::new(member_id, role));
        if let Some(id) = header(parts, CORRELATION_ID_HEADER) {
            ctx = ctx.with_correlation_id(id);
        }
        if let Some(raw) = header(parts, DEADLINE_HEADER) {
            let millis: u64 = raw.parse().map_err(|_| {
                LedgerError::from(ValidationError::invalid_format(
                    DEADLINE_HEADER,
                    "expected milliseconds as an unsigned integer",
                ))
            })?;
            ctx = ctx.with_deadline(tokio::time::Instant::now() + Duration::from_millis(millis));
        }

        Ok(RequestContext(ctx))
    }
}

fn parse_member_id(raw: String) -> Result<MemberId, LedgerError> {
    Ok(MemberId::new(raw)?)
}

fn parse_session_id(raw: &str) -> Result<PlaySessionId, LedgerError> {
    raw.parse().map_err(|_| {
        LedgerError::from(ValidationError::invalid_format(
            "session_id",
            "expected a UUID",
        ))
    })
}

// ════════════════════════════════════════════════════════════════════════════════
// Play Sessions
// ════════════════════════════════════════════════════════════════════════════════

/// POST /api/sessions - Start a play session
pub async fn start_session(
    State(state): State<LedgerAppState>,
    RequestContext(ctx): RequestContext,
    Json(request): Json<StartSessionRequest>,
) -> Result<impl IntoResponse, LedgerApiError> {
    let cmd = StartSessionCommand {
        member_id: parse_member_id(request.member_id)?,
    };
    let result = state.facade.start_session(cmd, &ctx).await?;
    Ok((StatusCode::CREATED, Json(StartSessionResponse::from(result))))
}

/// POST /api/sessions/:id/end - End a play session and debit the time bank
pub async fn end_session(
    State(state): State<LedgerAppState>,
    RequestContext(ctx): RequestContext,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, LedgerApiError> {
    let cmd = EndSessionCommand {
        session_id: parse_session_id(&id)?,
    };
    let result = state.facade.end_session(cmd, &ctx).await?;
    Ok(Json(EndSessionResponse::from(result)))
}

/// GET /api/sessions/:id - Session detail
pub async fn get_session(
    State(state): State<LedgerAppState>,
    RequestContext(ctx): RequestContext,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, LedgerApiError> {
    let query = GetSessionQuery {
        session_id: parse_session_id(&id)?,
    };
    let session = state.facade.get_session(query, &ctx).await?;
    Ok(Json(SessionResponse::from(session)))
}

/// GET /api/sessions - Session list, newest first
pub async fn list_sessions(
    State(state): State<LedgerAppState>,
    RequestContext(ctx): RequestContext,
    Query(params): Query<ListSessionsParams>,
) -> Result<impl IntoResponse, LedgerApiError> {
    let query = ListSessionsQuery {
        member_id: params.member_id.map(parse_member_id).transpose()?,
        status: params
            .status
            .map(|s| s.parse::<PlaySessionStatus>())
            .transpose()
            .map_err(LedgerError::from)?,
        limit: params.limit,
    };
    let sessions = state.facade.list_sessions(query, &ctx).await?;
    let response: Vec<SessionResponse> = sessions.into_iter().map(Into::into).collect();
    Ok(Json(response))
}

// ════════════════════════════════════════════════════════════════════════════════
// Members
// ════════════════════════════════════════════════════════════════════════════════

/// GET /api/members - Roster with membership and balance per member
pub async fn list_members(
    State(state): State<LedgerAppState>,
    RequestContext(ctx): RequestContext,
) -> Result<impl IntoResponse, LedgerApiError> {
    let roster = state.facade.list_members(&ctx).await?;
    let response: Vec<RosterEntryResponse> = roster.into_iter().map(Into::into).collect();
    Ok(Json(response))
}

/// GET /api/members/:member_id/membership - Current membership
pub async fn get_membership(
    State(state): State<LedgerAppState>,
    RequestContext(ctx): RequestContext,
    Path(member_id): Path<String>,
) -> Result<impl IntoResponse, LedgerApiError> {
    let query = GetMembershipQuery {
        member_id: parse_member_id(member_id)?,
    };
    let view = state.facade.get_membership(query, &ctx).await?;
    Ok(Json(MembershipResponse::from(view)))
}

/// PUT /api/members/:member_id/membership - Create or replace the membership
pub async fn set_membership(
    State(state): State<LedgerAppState>,
    RequestContext(ctx): RequestContext,
    Path(member_id): Path<String>,
    Json(request): Json<SetMembershipRequest>,
) -> Result<impl IntoResponse, LedgerApiError> {
    let status = match request.status.as_deref() {
        Some(raw) => raw.parse::<MembershipStatus>().map_err(LedgerError::from)?,
        None => MembershipStatus::default(),
    };
    let cmd = SetMembershipCommand {
        member_id: parse_member_id(member_id)?,
        end_date: Timestamp::parse_inclusive("end_date", &request.end_date)
            .map_err(LedgerError::from)?,
        status,
    };

    let now = ctx.now();
    let result = state.facade.set_membership(cmd, &ctx).await?;
    let code = if result.created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((code, Json(SetMembershipResponse::at(result, &now))))
}

/// GET /api/members/:member_id/time-bank - Balance, zero without an account
pub async fn get_time_bank(
    State(state): State<LedgerAppState>,
    RequestContext(ctx): RequestContext,
    Path(member_id): Path<String>,
) -> Result<impl IntoResponse, LedgerApiError> {
    let query = GetTimeBankQuery {
        member_id: parse_member_id(member_id)?,
    };
    let balance = state.facade.get_time_bank(query, &ctx).await?;
    Ok(Json(TimeBankResponse::from(balance)))
}

/// POST /api/members/:member_id/time-bank/credits - Add prepaid minutes
pub async fn credit_time(
    State(state): State<LedgerAppState>,
    RequestContext(ctx): RequestContext,
    Path(member_id): Path<String>,
    Json(request): Json<CreditTimeRequest>,
) -> Result<impl IntoResponse, LedgerApiError> {
    let cmd = CreditTimeCommand {
        member_id: parse_member_id(member_id)?,
        minutes: request.minutes,
    };
    let result = state.facade.credit_time(cmd, &ctx).await?;
    Ok(Json(CreditTimeResponse::from(result)))
}

// ════════════════════════════════════════════════════════════════════════════════
// Dashboard
// ════════════════════════════════════════════════════════════════════════════════

/// GET /api/stats - Active members, active sessions, minutes used since
pub async fn get_stats(
    State(state): State<LedgerAppState>,
    RequestContext(ctx): RequestContext,
    Query(params): Query<StatsParams>,
) -> Result<impl IntoResponse, LedgerApiError> {
    let since = params
        .since
        .as_deref()
        .map(|raw| Timestamp::parse_lower_bound("since", raw))
        .transpose()
        .map_err(LedgerError::from)?;
    let stats = state
        .facade
        .statistics(GetLedgerStatsQuery { since }, &ctx)
        .await?;
    Ok(Json(StatsResponse::from(stats)))
}

// ════════════════════════════════════════════════════════════════════════════════
// Error Handling
// ════════════════════════════════════════════════════════════════════════════════

/// API error wrapper for HTTP responses.
#[derive(Debug)]
pub enum LedgerApiError {
    /// Identity headers missing or malformed.
    Unauthenticated,
    Ledger(LedgerError),
}

impl From<LedgerError> for LedgerApiError {
    fn from(err: LedgerError) -> Self {
        Self::Ledger(err)
    }
}

impl LedgerApiError {
    fn status(&self) -> StatusCode {
        match self {
            LedgerApiError::Unauthenticated => StatusCode::UNAUTHORIZED,
            LedgerApiError::Ledger(err) => match err {
                LedgerError::NotFound { .. } => StatusCode::NOT_FOUND,
                LedgerError::Validation { .. } => StatusCode::BAD_REQUEST,
                LedgerError::Conflict(_) => StatusCode::CONFLICT,
                LedgerError::MembershipExpired { .. } => StatusCode::FORBIDDEN,
                LedgerError::InsufficientBalance { .. } => StatusCode::PAYMENT_REQUIRED,
                LedgerError::Forbidden { .. } => StatusCode::FORBIDDEN,
                LedgerError::DeadlineExceeded { .. } => StatusCode::GATEWAY_TIMEOUT,
                LedgerError::Infrastructure(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }
}

impl IntoResponse for LedgerApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match &self {
            LedgerApiError::Unauthenticated => ErrorResponse::new(
                "UNAUTHENTICATED",
                "X-User-Id and X-User-Role headers are required",
            ),
            LedgerApiError::Ledger(err) => {
                let body = ErrorResponse::new(err.code().to_string(), err.message());
                match err {
                    LedgerError::MembershipExpired { reason, .. } => {
                        body.with_details(serde_json::json!(reason))
                    }
                    LedgerError::InsufficientBalance {
                        balance_minutes, ..
                    } => body.with_details(serde_json::json!({ "balance_minutes": balance_minutes })),
                    LedgerError::Infrastructure(msg) => {
                        error!(error = %msg, "ledger request failed");
                        ErrorResponse::new(err.code().to_string(), "Internal error")
                    }
                    _ => body,
                }
            }
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::ErrorCode;

    #[test]
    fn status_mapping_follows_error_kind() {
        let member = MemberId::new("alice").unwrap();
        let cases = [
            (
                LedgerError::membership_not_found(&member),
                StatusCode::NOT_FOUND,
            ),
            (
                LedgerError::validation("minutes", "too small"),
                StatusCode::BAD_REQUEST,
            ),
            (
                LedgerError::active_session_exists(member.clone()),
                StatusCode::CONFLICT,
            ),
            (
                LedgerError::insufficient_balance(member.clone(), 0),
                StatusCode::PAYMENT_REQUIRED,
            ),
            (
                LedgerError::forbidden("credit time"),
                StatusCode::FORBIDDEN,
            ),
            (
                LedgerError::deadline_exceeded("start_session"),
                StatusCode::GATEWAY_TIMEOUT,
            ),
            (
                LedgerError::infrastructure("connection reset"),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, expected) in cases {
            assert_eq!(LedgerApiError::from(err).status(), expected);
        }
        assert_eq!(
            LedgerApiError::Unauthenticated.status(),
            StatusCode::UNAUTHORIZED
        );
    }

    #[test]
    fn malformed_session_id_is_a_validation_error() {
        let err = parse_session_id("not-a-uuid").unwrap_err();
        assert_eq!(err.code(), ErrorCode::ValidationFailed);
    }
}
