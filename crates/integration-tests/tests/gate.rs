//! Route gate scenarios.

use axum::http::{Method, StatusCode};
use serde_json::json;

use mrtc_integration_tests::{ADMIN_ID, ADMIN_PASSWORD, SUPER_ID, SUPER_PASSWORD, TestApp};

#[tokio::test]
async fn test_pages_redirect_to_login() {
    let app = TestApp::new();

    let response = app.call(Method::GET, "/admin", None).await;
    assert_eq!(response.status, StatusCode::SEE_OTHER);
    assert_eq!(response.location(), Some("/admin/login?next=%2Fadmin"));

    let response = app.call(Method::GET, "/admin/system", None).await;
    assert_eq!(response.location(), Some("/admin/login?next=%2Fadmin%2Fsystem"));
}

#[tokio::test]
async fn test_login_page_is_public() {
    let app = TestApp::new();

    let response = app.call(Method::GET, "/admin/login", None).await;
    assert_eq!(response.status, StatusCode::OK);
    assert!(response.text().contains("<form"));
}

#[tokio::test]
async fn test_admin_cannot_open_system_page() {
    let app = TestApp::new();
    let cookie = app.login_cookie(ADMIN_ID, ADMIN_PASSWORD).await;

    let response = app.call(Method::GET, "/admin", Some(&cookie)).await;
    assert_eq!(response.status, StatusCode::OK);

    let response = app.call(Method::GET, "/admin/system", Some(&cookie)).await;
    assert_eq!(response.status, StatusCode::SEE_OTHER);
}

#[tokio::test]
async fn test_apis_need_a_session() {
    let app = TestApp::new();

    for uri in ["/api/content", "/api/admin/me", "/api/admin/policy", "/api/admin/backup"] {
        let response = app.call(Method::GET, uri, None).await;
        assert_eq!(response.status, StatusCode::UNAUTHORIZED, "{uri}");
        assert_eq!(response.json(), json!({ "error": "login required" }));
    }
}

#[tokio::test]
async fn test_super_apis_reject_admin() {
    let app = TestApp::new();
    let cookie = app.login_cookie(ADMIN_ID, ADMIN_PASSWORD).await;

    for uri in [
        "/api/admin/accounts",
        "/api/admin/policy",
        "/api/admin/backup",
        "/api/admin/inquiries",
    ] {
        let response = app.call(Method::GET, uri, Some(&cookie)).await;
        assert_eq!(response.status, StatusCode::FORBIDDEN, "{uri}");
    }
}

#[tokio::test]
async fn test_super_sees_accounts() {
    let app = TestApp::new();
    let cookie = app.login_cookie(SUPER_ID, SUPER_PASSWORD).await;

    let response = app.call(Method::GET, "/api/admin/accounts", Some(&cookie)).await;
    assert_eq!(response.status, StatusCode::OK);
    let body = response.json();
    let accounts = body["accounts"].as_array().expect("accounts array");
    assert_eq!(accounts.len(), 2);
    assert!(accounts.iter().any(|a| a["id"] == SUPER_ID && a["role"] == "super"));
    assert!(accounts.iter().any(|a| a["id"] == ADMIN_ID && a["passwordConfigured"] == true));
    // Secrets never appear.
    assert!(!response.text().contains("argon2"));
}

#[tokio::test]
async fn test_public_routes_stay_open() {
    let app = TestApp::new();

    let response = app.call(Method::GET, "/health", None).await;
    assert_eq!(response.status, StatusCode::OK);
    assert!(response.headers.contains_key("x-request-id"));

    let response = app.call(Method::GET, "/health/ready", None).await;
    assert_eq!(response.status, StatusCode::OK);
}

#[tokio::test]
async fn test_login_form_redirects_to_next() {
    use axum::body::Body;
    use axum::http::{Request, header};

    let app = TestApp::new();
    let form = format!("id={ADMIN_ID}&password={ADMIN_PASSWORD}&next=%2Fadmin");
    let request = Request::builder()
        .method(Method::POST)
        .uri("/admin/login")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(form))
        .expect("valid request");

    let response = app.send(request).await;
    assert_eq!(response.status, StatusCode::SEE_OTHER);
    assert_eq!(response.location(), Some("/admin"));

    let cookie = response.session_cookie().expect("session cookie");
    let dashboard = app.call(Method::GET, "/admin", Some(&cookie)).await;
    assert_eq!(dashboard.status, StatusCode::OK);
}
