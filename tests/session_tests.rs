//! End-to-end session lifecycle scenarios against a canned transport.

mod common;

use std::time::Duration;

use chrono::Utc;
use reqwest::Method;
use serde_json::json;

use aquadesk::clients::backend::ApiError;
use aquadesk::session::{
    LoginOutcome, LogoutReason, PersistedSession, SessionEvent, SessionManager, SessionStore,
};

use common::{MockTransport, cashier_json, login_ok_body, long_lived_token, temp_store, token_with_exp};

#[tokio::test]
async fn login_on_approved_device_persists_and_profile_refreshes() {
    let transport = MockTransport::new();
    transport.route("POST", "auth/login", 200, login_ok_body(&long_lived_token()));
    transport.route(
        "GET",
        "auth/me",
        200,
        json!({ "data": {
            "id": "u-7",
            "name": "Ana Reyes",
            "email": "ana@example.com",
            "role": "admin",
            "adminLevel": 1,
            "deviceApproved": true
        }}),
    );

    let store = temp_store();
    let session = SessionManager::new(transport, SessionStore::new(store.path().to_path_buf()));

    let outcome = session.login("ana@example.com", "secret").await.unwrap();
    match outcome {
        LoginOutcome::Success { user } => assert_eq!(user.email, "ana@example.com"),
        other => panic!("expected success, got {other:?}"),
    }
    assert!(store.exists());
    assert_eq!(store.load().unwrap().user.role, "cashier");

    // Server-side role change lands on refresh, in memory and on disk.
    let refreshed = session.fetch_current_user().await.unwrap();
    assert_eq!(refreshed.role, "admin");
    assert!(refreshed.is_admin());
    assert_eq!(store.load().unwrap().user.role, "admin");
}

#[tokio::test]
async fn login_on_unrecognized_device_is_pending_not_an_error() {
    let transport = MockTransport::new();
    transport.route(
        "POST",
        "auth/login",
        403,
        json!({
            "code": "DEVICE_NOT_APPROVED",
            "message": "This device must be approved by an administrator",
            "ip": "203.0.113.9",
            "userAgent": "AquaDesk/0.1 (terminal-2)",
            "requestId": "req-41",
            "emailSent": true
        }),
    );

    let store = temp_store();
    let session = SessionManager::new(transport, SessionStore::new(store.path().to_path_buf()));

    let outcome = session.login("ana@example.com", "secret").await.unwrap();
    let LoginOutcome::DevicePending(pending) = outcome else {
        panic!("expected device-pending outcome");
    };

    assert_eq!(pending.ip, "203.0.113.9");
    assert_eq!(pending.user_agent, "AquaDesk/0.1 (terminal-2)");
    assert_eq!(pending.request_id.as_deref(), Some("req-41"));
    assert!(pending.email_sent);

    // No token may be persisted for a held login.
    assert!(!store.exists());
    assert!(!session.is_logged_in().await);
    assert!(session.pending_approval().await.is_some());
}

#[tokio::test]
async fn wrong_credentials_surface_the_backend_message() {
    let transport = MockTransport::new();
    transport.route(
        "POST",
        "auth/login",
        401,
        json!({ "message": "Invalid email or password" }),
    );

    let session = SessionManager::new(transport, temp_store());
    let err = session.login("ana@example.com", "nope").await.unwrap_err();
    match err {
        ApiError::Rejected { status, message } => {
            assert_eq!(status, 401);
            assert_eq!(message, "Invalid email or password");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn unauthorized_response_clears_session_and_later_calls_fail_fast() {
    let transport = MockTransport::new();
    transport.route("POST", "auth/login", 200, login_ok_body(&long_lived_token()));
    transport.route("GET", "sales", 401, json!({ "message": "token revoked" }));

    let store = temp_store();
    let session = SessionManager::new(
        transport.clone(),
        SessionStore::new(store.path().to_path_buf()),
    );
    let mut events = session.subscribe();

    session.login("ana@example.com", "secret").await.unwrap();

    let err = session.request(Method::GET, "sales", None).await.unwrap_err();
    assert!(matches!(err, ApiError::Unauthorized));
    assert!(!store.exists());
    assert!(!session.is_logged_in().await);

    match events.recv().await.unwrap() {
        SessionEvent::LoggedOut { reason } => assert_eq!(reason, LogoutReason::Unauthorized),
    }

    // Stale credentials are never retried: the next call fails before
    // reaching the transport.
    let calls_before = transport.call_count();
    let err = session.request(Method::GET, "sales", None).await.unwrap_err();
    assert!(matches!(err, ApiError::NotLoggedIn));
    assert_eq!(transport.call_count(), calls_before);
}

#[tokio::test]
async fn restored_token_already_expired_is_cleared_synchronously() {
    let store = temp_store();
    store
        .save(&PersistedSession {
            token: token_with_exp(Utc::now().timestamp() - 60),
            user: serde_json::from_value(cashier_json()).unwrap(),
        })
        .unwrap();

    let transport = MockTransport::new();
    let session = SessionManager::new(
        transport.clone(),
        SessionStore::new(store.path().to_path_buf()),
    );

    assert!(session.restore().await.is_none());
    assert!(!session.is_logged_in().await);
    assert!(!store.exists());
    // Clearing an expired session needs no server round-trip.
    assert_eq!(transport.call_count(), 0);
}

#[tokio::test]
async fn auto_logout_fires_at_or_after_expiry_never_before() {
    let transport = MockTransport::new();
    transport.route(
        "POST",
        "auth/login",
        200,
        login_ok_body(&token_with_exp(Utc::now().timestamp() + 2)),
    );

    let store = temp_store();
    let session = SessionManager::new(transport, SessionStore::new(store.path().to_path_buf()));
    let mut events = session.subscribe();

    session.login("ana@example.com", "secret").await.unwrap();
    assert!(session.is_logged_in().await);

    // Well before expiry: still logged in.
    tokio::time::sleep(Duration::from_millis(500)).await;
    assert!(session.is_logged_in().await);

    // Past expiry + skew: the one-shot timer has cleared everything.
    tokio::time::sleep(Duration::from_secs(4)).await;
    assert!(!session.is_logged_in().await);
    assert!(!store.exists());

    match events.recv().await.unwrap() {
        SessionEvent::LoggedOut { reason } => assert_eq!(reason, LogoutReason::Expired),
    }
}

#[tokio::test]
async fn relogin_supersedes_previous_expiry_timer() {
    let transport = MockTransport::new();
    // First token expires almost immediately, second much later.
    transport.route_once_delayed(
        "POST",
        "auth/login",
        200,
        login_ok_body(&token_with_exp(Utc::now().timestamp() + 2)),
        Duration::ZERO,
    );
    transport.route(
        "POST",
        "auth/login",
        200,
        login_ok_body(&long_lived_token()),
    );

    let session = SessionManager::new(transport, temp_store());
    session.login("ana@example.com", "secret").await.unwrap();
    session.login("ana@example.com", "secret").await.unwrap();

    // The first timer would have fired by now; it must have stood down.
    tokio::time::sleep(Duration::from_secs(4)).await;
    assert!(session.is_logged_in().await);
}

#[tokio::test]
async fn logout_clears_locally_even_when_server_is_down() {
    let transport = MockTransport::new();
    transport.route("POST", "auth/login", 200, login_ok_body(&long_lived_token()));
    // No auth/logout route: invalidation gets a 404 and is swallowed.

    let store = temp_store();
    let session = SessionManager::new(transport, SessionStore::new(store.path().to_path_buf()));

    session.login("ana@example.com", "secret").await.unwrap();
    session.logout().await;

    assert!(!session.is_logged_in().await);
    assert!(!store.exists());
}

#[tokio::test]
async fn second_process_observes_logout_without_calling_the_server() {
    let transport_a = MockTransport::new();
    transport_a.route("POST", "auth/login", 200, login_ok_body(&long_lived_token()));
    transport_a.route("POST", "auth/logout", 200, json!({}));

    let store = temp_store();
    let session_a = SessionManager::new(
        transport_a,
        SessionStore::new(store.path().to_path_buf()),
    );
    session_a.login("ana@example.com", "secret").await.unwrap();

    // Second process restores the same persisted session.
    let transport_b = MockTransport::new();
    let session_b = SessionManager::new(
        transport_b.clone(),
        SessionStore::new(store.path().to_path_buf()),
    );
    assert!(session_b.restore().await.is_some());
    assert!(session_b.is_logged_in().await);

    session_a.logout().await;

    // B's next interaction sees the cleared store and never issues the
    // authenticated call that would otherwise 401.
    let err = session_b.request(Method::GET, "sales", None).await.unwrap_err();
    assert!(matches!(err, ApiError::NotLoggedIn));
    assert!(!session_b.is_logged_in().await);
    assert_eq!(transport_b.call_count(), 0);
}

#[tokio::test]
async fn store_watcher_clears_session_in_background() {
    let transport = MockTransport::new();
    transport.route("POST", "auth/login", 200, login_ok_body(&long_lived_token()));

    let store = temp_store();
    let session = SessionManager::new(transport, SessionStore::new(store.path().to_path_buf()));
    session.login("ana@example.com", "secret").await.unwrap();

    let watcher = session.spawn_store_watcher();

    // Another process removes the session file out from under us.
    store.clear().unwrap();

    tokio::time::sleep(Duration::from_secs(5)).await;
    assert!(!session.is_logged_in().await);
    watcher.abort();
}

#[tokio::test]
async fn heartbeat_detects_a_revoked_session() {
    let transport = MockTransport::new();
    transport.route("POST", "auth/login", 200, login_ok_body(&long_lived_token()));
    transport.route("GET", "auth/me", 401, json!({ "message": "revoked" }));

    let session = SessionManager::new(transport, temp_store());
    session.login("ana@example.com", "secret").await.unwrap();

    let heartbeat = session.spawn_heartbeat(Duration::from_millis(200));
    tokio::time::sleep(Duration::from_secs(1)).await;

    assert!(!session.is_logged_in().await);
    heartbeat.abort();
}
