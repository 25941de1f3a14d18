//! Login, logout and session scenarios.

#![allow(clippy::unwrap_used)]

use axum::http::{Method, StatusCode};
use chrono::Duration;
use serde_json::json;

use mrtc_integration_tests::{
    ADMIN_ID, ADMIN_PASSWORD, SUPER_ID, SUPER_PASSWORD, TestApp, test_config,
};

#[tokio::test]
async fn test_admin_login_sets_session_cookie() {
    let app = TestApp::new();

    let response = app.login(ADMIN_ID, ADMIN_PASSWORD).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.json(), json!({ "ok": true, "role": "admin" }));

    let set_cookie = response.set_session_cookie().unwrap();
    assert!(set_cookie.contains("HttpOnly"));
    assert!(set_cookie.contains("SameSite=Lax"));
    assert!(set_cookie.contains("Path=/"));
    assert!(set_cookie.contains("Max-Age=43200"));
}

#[tokio::test]
async fn test_super_login_and_me() {
    let app = TestApp::new();
    let cookie = app.login_cookie(SUPER_ID, SUPER_PASSWORD).await;

    let me = app.call(Method::GET, "/api/admin/me", Some(&cookie)).await;
    assert_eq!(me.status, StatusCode::OK);
    assert_eq!(me.json(), json!({ "role": "super", "allowedContentKeys": ["*"] }));
}

#[tokio::test]
async fn test_admin_me_lists_effective_keys() {
    let mut config = test_config();
    config.auth.admin_allowed_keys = Some(vec!["home".to_string(), "support".to_string()]);
    let app = TestApp::with_config(config);
    let cookie = app.login_cookie(ADMIN_ID, ADMIN_PASSWORD).await;

    let me = app.call(Method::GET, "/api/admin/me", Some(&cookie)).await;
    assert_eq!(
        me.json(),
        json!({ "role": "admin", "allowedContentKeys": ["home", "support"] })
    );
}

#[tokio::test]
async fn test_wrong_password_is_rejected() {
    let app = TestApp::new();

    let response = app.login(ADMIN_ID, "not-the-password").await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert!(response.session_cookie().is_none());

    let response = app.login("nobody", ADMIN_PASSWORD).await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_login_without_configured_ids_is_server_error() {
    let mut config = test_config();
    config.auth.admin.id = None;
    config.auth.super_admin.id = None;
    let app = TestApp::with_config(config);

    let response = app.login(ADMIN_ID, ADMIN_PASSWORD).await;
    assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        response.json()["error"],
        "Server is not configured for admin login"
    );
}

#[tokio::test]
async fn test_login_without_session_token_is_server_error() {
    let mut config = test_config();
    config.auth.admin_session_secret = None;
    let app = TestApp::with_config(config);

    let response = app.login(ADMIN_ID, ADMIN_PASSWORD).await;
    assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);

    // The other role is unaffected.
    let response = app.login(SUPER_ID, SUPER_PASSWORD).await;
    assert_eq!(response.status, StatusCode::OK);
}

#[tokio::test]
async fn test_throttle_blocks_after_five_failures_then_recovers() {
    let app = TestApp::new();

    for _ in 0..5 {
        let response = app.login(ADMIN_ID, "wrong").await;
        assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    }

    // Blocked even with the right password.
    let response = app.login(ADMIN_ID, ADMIN_PASSWORD).await;
    assert_eq!(response.status, StatusCode::TOO_MANY_REQUESTS);

    // Other ids from the same client are tracked separately.
    let response = app.login(SUPER_ID, SUPER_PASSWORD).await;
    assert_eq!(response.status, StatusCode::OK);

    app.clock.advance(Duration::minutes(10) + Duration::seconds(1));
    let response = app.login(ADMIN_ID, ADMIN_PASSWORD).await;
    assert_eq!(response.status, StatusCode::OK);
}

#[tokio::test]
async fn test_success_resets_failure_count() {
    let app = TestApp::new();

    for _ in 0..4 {
        app.login(ADMIN_ID, "wrong").await;
    }
    assert_eq!(app.login(ADMIN_ID, ADMIN_PASSWORD).await.status, StatusCode::OK);

    for _ in 0..4 {
        app.login(ADMIN_ID, "wrong").await;
    }
    assert_eq!(app.login(ADMIN_ID, ADMIN_PASSWORD).await.status, StatusCode::OK);
}

#[tokio::test]
async fn test_logout_clears_cookie() {
    let app = TestApp::new();

    let response = app.call(Method::POST, "/api/admin/logout", None).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.json(), json!({ "ok": true }));

    let set_cookie = response.set_session_cookie().unwrap();
    assert!(set_cookie.contains("Max-Age=0"));
}

#[tokio::test]
async fn test_session_expires_after_max_age() {
    let app = TestApp::new();
    let cookie = app.login_cookie(ADMIN_ID, ADMIN_PASSWORD).await;

    app.clock.advance(Duration::hours(11));
    let me = app.call(Method::GET, "/api/admin/me", Some(&cookie)).await;
    assert_eq!(me.status, StatusCode::OK);

    app.clock.advance(Duration::hours(2));
    let me = app.call(Method::GET, "/api/admin/me", Some(&cookie)).await;
    assert_eq!(me.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_tampered_cookie_is_rejected() {
    let app = TestApp::new();
    let cookie = app.login_cookie(ADMIN_ID, ADMIN_PASSWORD).await;
    let forged = cookie.replacen("admin:", "super:", 1);
    assert_ne!(forged, cookie);

    let response = app.call(Method::GET, "/api/admin/me", Some(&forged)).await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);

    let response = app
        .call(Method::GET, "/api/admin/me", Some("admin_session=garbage"))
        .await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}
