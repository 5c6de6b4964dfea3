//! Integration tests for ledger HTTP endpoints.
//!
//! These tests drive the full router over an in-memory store:
//! 1. Identity headers are required and roles are enforced
//! 2. The session lifecycle bills the time bank
//! 3. Error kinds map to their status codes and `{code, message}` bodies

use axum::body::{to_bytes, Body};
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use club_ledger::adapters::http::{ledger_router, LedgerAppState};
use club_ledger::application::LedgerFacade;
use club_ledger::config::LedgerConfig;

// =============================================================================
// Test Infrastructure
// =============================================================================

fn app() -> Router {
    let facade = LedgerFacade::in_memory(&LedgerConfig::default());
    Router::new()
        .nest("/api", ledger_router())
        .with_state(LedgerAppState::new(facade))
}

struct Caller {
    id: &'static str,
    role: &'static str,
}

const ADMIN: Caller = Caller {
    id: "staff-1",
    role: "admin",
};

fn member(id: &'static str) -> Caller {
    Caller { id, role: "member" }
}

async fn send(
    app: &Router,
    caller: Option<&Caller>,
    method: Method,
    uri: &str,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut request = Request::builder().method(method).uri(uri);
    if let Some(caller) = caller {
        request = request
            .header("X-User-Id", caller.id)
            .header("X-User-Role", caller.role);
    }
    let request = match body {
        Some(body) => request
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => request.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

async fn enroll(app: &Router, id: &str, minutes: i64) {
    let (status, _) = send(
        app,
        Some(&ADMIN),
        Method::PUT,
        &format!("/api/members/{id}/membership"),
        Some(json!({ "end_date": "2999-12-31" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = send(
        app,
        Some(&ADMIN),
        Method::POST,
        &format!("/api/members/{id}/time-bank/credits"),
        Some(json!({ "minutes": minutes })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

// =============================================================================
// Identity
// =============================================================================

#[tokio::test]
async fn missing_identity_headers_are_unauthenticated() {
    let app = app();
    let (status, body) = send(&app, None, Method::GET, "/api/stats", None).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "UNAUTHENTICATED");
}

#[tokio::test]
async fn members_cannot_mutate_the_ledger() {
    let app = app();
    let (status, body) = send(
        &app,
        Some(&member("alice")),
        Method::POST,
        "/api/members/alice/time-bank/credits",
        Some(json!({ "minutes": 60 })),
    )
    .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "FORBIDDEN");
}

#[tokio::test]
async fn members_see_only_their_own_balance() {
    let app = app();
    enroll(&app, "alice", 60).await;

    let (status, body) = send(
        &app,
        Some(&member("alice")),
        Method::GET,
        "/api/members/alice/time-bank",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["balance_minutes"], 60);
    assert_eq!(body["balance"], "1h 0m");

    let (status, _) = send(
        &app,
        Some(&member("bob")),
        Method::GET,
        "/api/members/alice/time-bank",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

// =============================================================================
// Session Lifecycle
// =============================================================================

#[tokio::test]
async fn session_lifecycle_debits_the_time_bank() {
    let app = app();
    enroll(&app, "alice", 90).await;

    let (status, started) = send(
        &app,
        Some(&ADMIN),
        Method::POST,
        "/api/sessions",
        Some(json!({ "member_id": "alice" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(started["session"]["status"], "active");
    assert_eq!(started["balance_minutes"], 90);
    let session_id = started["session"]["id"].as_str().unwrap().to_string();

    let (status, _) = send(
        &app,
        Some(&ADMIN),
        Method::POST,
        "/api/sessions",
        Some(json!({ "member_id": "alice" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, ended) = send(
        &app,
        Some(&ADMIN),
        Method::POST,
        &format!("/api/sessions/{session_id}/end"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ended["session"]["status"], "completed");
    assert_eq!(ended["session"]["minutes_used"], 1);
    assert_eq!(ended["balance_minutes"], 89);
    assert!(ended.get("debit_clamped").is_none());

    let (status, body) = send(
        &app,
        Some(&ADMIN),
        Method::POST,
        &format!("/api/sessions/{session_id}/end"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "SESSION_ALREADY_COMPLETED");

    let (status, detail) = send(
        &app,
        Some(&member("alice")),
        Method::GET,
        &format!("/api/sessions/{session_id}"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(detail["duration"], "0h 1m");
}

#[tokio::test]
async fn start_without_balance_is_payment_required() {
    let app = app();
    let (status, _) = send(
        &app,
        Some(&ADMIN),
        Method::PUT,
        "/api/members/bob/membership",
        Some(json!({ "end_date": "2999-12-31", "status": "active" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = send(
        &app,
        Some(&ADMIN),
        Method::POST,
        "/api/sessions",
        Some(json!({ "member_id": "bob" })),
    )
    .await;
    assert_eq!(status, StatusCode::PAYMENT_REQUIRED);
    assert_eq!(body["code"], "INSUFFICIENT_BALANCE");
    assert_eq!(body["details"]["balance_minutes"], 0);
}

#[tokio::test]
async fn lapsed_membership_is_forbidden_even_when_active() {
    let app = app();
    enroll(&app, "carol", 60).await;

    let (status, body) = send(
        &app,
        Some(&ADMIN),
        Method::PUT,
        "/api/members/carol/membership",
        Some(json!({ "end_date": "2000-01-01", "status": "active" })),
    )
    .await;
    // Rewriting the window to a date before its start is rejected.
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_FAILED");

    let (status, _) = send(
        &app,
        Some(&ADMIN),
        Method::PUT,
        "/api/members/dave/membership",
        Some(json!({ "end_date": "2000-01-01" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    send(
        &app,
        Some(&ADMIN),
        Method::POST,
        "/api/members/dave/time-bank/credits",
        Some(json!({ "minutes": 60 })),
    )
    .await;

    let (status, body) = send(
        &app,
        Some(&ADMIN),
        Method::POST,
        "/api/sessions",
        Some(json!({ "member_id": "dave" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "MEMBERSHIP_EXPIRED");
    assert_eq!(body["details"]["reason"], "lapsed");
}

// =============================================================================
// Validation and Lookups
// =============================================================================

#[tokio::test]
async fn invalid_inputs_are_bad_requests() {
    let app = app();

    let (status, body) = send(
        &app,
        Some(&ADMIN),
        Method::POST,
        "/api/members/alice/time-bank/credits",
        Some(json!({ "minutes": 0 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_FAILED");

    let (status, _) = send(
        &app,
        Some(&ADMIN),
        Method::PUT,
        "/api/members/alice/membership",
        Some(json!({ "end_date": "next tuesday" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(
        &app,
        Some(&ADMIN),
        Method::PUT,
        "/api/members/alice/membership",
        Some(json!({ "end_date": "+262142-12-31" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_FAILED");

    let (status, _) = send(&app, Some(&ADMIN), Method::GET, "/api/sessions?limit=0", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&app, Some(&ADMIN), Method::GET, "/api/sessions/not-a-uuid", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn unknown_records_are_not_found() {
    let app = app();

    let (status, body) = send(
        &app,
        Some(&ADMIN),
        Method::GET,
        "/api/members/nobody/membership",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "MEMBERSHIP_NOT_FOUND");

    let (status, _) = send(
        &app,
        Some(&ADMIN),
        Method::POST,
        "/api/sessions/6f9619ff-8b86-d011-b42d-00c04fc964ff/end",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// =============================================================================
// Roster and Dashboard
// =============================================================================

#[tokio::test]
async fn roster_and_stats_reflect_activity() {
    let app = app();
    enroll(&app, "alice", 90).await;
    enroll(&app, "bob", 30).await;
    send(
        &app,
        Some(&ADMIN),
        Method::POST,
        "/api/sessions",
        Some(json!({ "member_id": "bob" })),
    )
    .await;

    let (status, roster) = send(&app, Some(&ADMIN), Method::GET, "/api/members", None).await;
    assert_eq!(status, StatusCode::OK);
    let roster = roster.as_array().unwrap();
    assert_eq!(roster.len(), 2);
    assert_eq!(roster[0]["member_id"], "alice");
    assert_eq!(roster[1]["has_active_session"], true);

    let (status, _) = send(&app, Some(&member("bob")), Method::GET, "/api/members", None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, stats) = send(&app, Some(&member("bob")), Method::GET, "/api/stats", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stats["active_member_count"], 2);
    assert_eq!(stats["active_session_count"], 1);
    assert_eq!(stats["total_minutes_used"], 0);

    let (status, sessions) = send(
        &app,
        Some(&member("bob")),
        Method::GET,
        "/api/sessions?member_id=bob&status=active",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(sessions.as_array().unwrap().len(), 1);
}
