//! Axum router configuration for ledger endpoints.

use axum::{
    routing::{get, post},
    Router,
};

use super::handlers::{
    credit_time, end_session, get_membership, get_session, get_stats, get_time_bank,
    list_members, list_sessions, set_membership, start_session, LedgerAppState,
};

/// Play session routes, mounted at `/sessions`.
///
/// - `POST /` - Start a session
/// - `GET /` - List sessions (`member_id`, `status`, `limit`)
/// - `GET /:id` - Session detail
/// - `POST /:id/end` - End a session
pub fn session_routes() -> Router<LedgerAppState> {
    Router::new()
        .route("/", post(start_session).get(list_sessions))
        .route("/:id", get(get_session))
        .route("/:id/end", post(end_session))
}

/// Member routes, mounted at `/members`.
///
/// - `GET /` - Roster (admin only)
/// - `GET|PUT /:member_id/membership` - Current membership
/// - `GET /:member_id/time-bank` - Balance
/// - `POST /:member_id/time-bank/credits` - Add minutes
pub fn member_routes() -> Router<LedgerAppState> {
    Router::new()
        .route("/", get(list_members))
        .route(
            "/:member_id/membership",
            get(get_membership).put(set_membership),
        )
        .route("/:member_id/time-bank", get(get_time_bank))
        .route("/:member_id/time-bank/credits", post(credit_time))
}

/// Complete ledger API, suitable for mounting at `/api`.
///
/// # Example
///
/// ```ignore
/// let app = Router::new()
///     .nest("/api", ledger_router())
///     .with_state(LedgerAppState::new(facade));
/// ```
pub fn ledger_router() -> Router<LedgerAppState> {
    Router::new()
        .nest("/sessions", session_routes())
        .nest("/members", member_routes())
        .route("/stats", get(get_stats))
}
