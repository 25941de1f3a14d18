//! Backup export and restore scenarios.

#![allow(clippy::unwrap_used)]

use axum::http::{Method, StatusCode};
use serde_json::json;

use mrtc_core::ContentEntry;
use mrtc_integration_tests::{SUPER_ID, SUPER_PASSWORD, TestApp};
use mrtc_site::clock::Clock;
use mrtc_site::db::ContentStore;

#[tokio::test]
async fn test_export_then_restore_into_fresh_site() {
    let source = TestApp::new();
    let mut home = ContentEntry::empty("home");
    home.title = "Welcome".to_string();
    let mut support = ContentEntry::empty("support");
    support.body = "Call us".to_string();
    source.store.upsert_many(&[home, support]).await.unwrap();

    let cookie = source.login_cookie(SUPER_ID, SUPER_PASSWORD).await;
    let export = source
        .call(Method::GET, "/api/admin/backup", Some(&cookie))
        .await;
    assert_eq!(export.status, StatusCode::OK);
    let export = export.json();
    assert_eq!(export["count"], 2);
    assert_eq!(export["exportedAt"], json!(source.clock.now()));

    let target = TestApp::new();
    let cookie = target.login_cookie(SUPER_ID, SUPER_PASSWORD).await;
    let response = target
        .json(
            Method::POST,
            "/api/admin/backup",
            &json!({ "rows": export["rows"] }),
            Some(&cookie),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.json(), json!({ "ok": true, "restored": 2 }));

    let home = target.store.get("home").await.unwrap().unwrap();
    assert_eq!(home.title, "Welcome");
    let support = target.store.get("support").await.unwrap().unwrap();
    assert_eq!(support.body, "Call us");
}

#[tokio::test]
async fn test_restore_skips_rows_without_valid_key() {
    let app = TestApp::new();
    let cookie = app.login_cookie(SUPER_ID, SUPER_PASSWORD).await;

    let response = app
        .json(
            Method::POST,
            "/api/admin/backup",
            &json!({ "rows": [
                { "key": "home", "title": "ok" },
                { "key": "bad key" },
                { "title": "no key" },
            ] }),
            Some(&cookie),
        )
        .await;
    assert_eq!(response.json()["restored"], 1);
}

#[tokio::test]
async fn test_restore_requires_rows_array() {
    let app = TestApp::new();
    let cookie = app.login_cookie(SUPER_ID, SUPER_PASSWORD).await;

    let response = app
        .json(
            Method::POST,
            "/api/admin/backup",
            &json!({ "rows": "nope" }),
            Some(&cookie),
        )
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}
