//! HTTP adapter for ledger endpoints.
//!
//! Exposes the ledger facade via REST API:
//! - `POST /api/sessions` - Start a play session
//! - `POST /api/sessions/:id/end` - End a play session
//! - `GET /api/sessions/:id` - Session detail
//! - `GET /api/sessions` - Session list
//! - `GET /api/members` - Member roster
//! - `GET|PUT /api/members/:member_id/membership` - Membership
//! - `GET /api/members/:member_id/time-bank` - Time-bank balance
//! - `POST /api/members/:member_id/time-bank/credits` - Credit minutes
//! - `GET /api/stats` - Dashboard statistics
//!
//! Callers are identified by the `X-User-Id` and `X-User-Role` headers set
//! by the identity proxy in front of the service.

pub mod dto;
pub mod handlers;
pub mod routes;

pub use handlers::{LedgerApiError, LedgerAppState, RequestContext};
pub use routes::ledger_router;
