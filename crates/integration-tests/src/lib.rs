//! Integration tests for the MRTC site.
//!
//! The router is driven in-process with `tower::ServiceExt::oneshot`
//! against the in-memory content store and a manual clock, so no database
//! or running server is needed.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p mrtc-integration-tests
//! ```

use std::net::SocketAddr;
use std::sync::Arc;

use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{PasswordHasher, SaltString, rand_core::OsRng},
};
use axum::{
    Router,
    body::{Body, Bytes},
    extract::ConnectInfo,
    http::{HeaderMap, Method, Request, StatusCode, header},
};
use http_body_util::BodyExt;
use secrecy::SecretString;
use serde_json::Value;
use tower::ServiceExt;

use mrtc_site::clock::ManualClock;
use mrtc_site::config::{AuthConfig, RoleCredentials, SiteConfig};
use mrtc_site::db::MemoryContentStore;
use mrtc_site::middleware::SESSION_COOKIE;
use mrtc_site::routes;
use mrtc_site::services::{MemoryLoginThrottle, ThrottleSettings};
use mrtc_site::state::AppState;

pub const ADMIN_ID: &str = "editor";
pub const ADMIN_PASSWORD: &str = "editor-pass-2024";
pub const SUPER_ID: &str = "operator";
pub const SUPER_PASSWORD: &str = "operator-pass-2024";
pub const ADMIN_TOKEN: &str = "a9Xk2LmQ7vRt4ZpW8nBc3HsJ6dFg1YeU";
pub const SUPER_TOKEN: &str = "Z7mN3qPx8LkV2wRt6YbH9cJd4FgS1aEu";

/// Peer address attached to every test request.
pub const TEST_PEER: &str = "198.51.100.20:51000";

/// Argon2id hash with minimal cost parameters.
#[must_use]
pub fn cheap_hash(password: &str) -> String {
    let params = Params::new(1024, 1, 1, None).expect("valid argon2 params");
    Argon2::new(Algorithm::Argon2id, Version::V0x13, params)
        .hash_password(password.as_bytes(), &SaltString::generate(&mut OsRng))
        .expect("hash password")
        .to_string()
}

/// Configuration with both accounts and session tokens set.
#[must_use]
pub fn test_config() -> SiteConfig {
    SiteConfig {
        database_url: None,
        host: "127.0.0.1".parse().expect("valid ip"),
        port: 3000,
        base_url: "http://localhost:3000".to_string(),
        auth: AuthConfig {
            admin: RoleCredentials {
                id: Some(ADMIN_ID.to_string()),
                password_hash: Some(SecretString::from(cheap_hash(ADMIN_PASSWORD))),
                password: None,
            },
            super_admin: RoleCredentials {
                id: Some(SUPER_ID.to_string()),
                password_hash: Some(SecretString::from(cheap_hash(SUPER_PASSWORD))),
                password: None,
            },
            admin_session_secret: Some(SecretString::from(ADMIN_TOKEN)),
            super_session_secret: Some(SecretString::from(SUPER_TOKEN)),
            session_max_age_secs: 12 * 60 * 60,
            allow_plaintext_passwords: false,
            admin_allowed_keys: None,
        },
        trust_proxy_headers: false,
        sentry_dsn: None,
        sentry_environment: None,
        sentry_sample_rate: 1.0,
        sentry_traces_sample_rate: 0.0,
        tls: None,
    }
}

/// Router plus handles to the pieces tests need to poke at.
pub struct TestApp {
    pub app: Router,
    pub state: AppState,
    pub store: Arc<MemoryContentStore>,
    pub clock: Arc<ManualClock>,
}

impl Default for TestApp {
    fn default() -> Self {
        Self::new()
    }
}

impl TestApp {
    /// App with [`test_config`].
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(test_config())
    }

    /// App with a custom configuration.
    #[must_use]
    pub fn with_config(config: SiteConfig) -> Self {
        let store = Arc::new(MemoryContentStore::new());
        let clock = Arc::new(ManualClock::default());
        let throttle = Arc::new(MemoryLoginThrottle::new(
            ThrottleSettings::default(),
            clock.clone(),
        ));
        let state = AppState::with_services(config, store.clone(), None, clock.clone(), throttle);

        Self {
            app: routes::app(state.clone()),
            state,
            store,
            clock,
        }
    }

    /// Send a request through the router.
    pub async fn send(&self, mut request: Request<Body>) -> TestResponse {
        let peer: SocketAddr = TEST_PEER.parse().expect("valid socket addr");
        request.extensions_mut().insert(ConnectInfo(peer));

        let response = self
            .app
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible");
        let status = response.status();
        let headers = response.headers().clone();
        let body = response
            .into_body()
            .collect()
            .await
            .expect("read body")
            .to_bytes();

        TestResponse {
            status,
            headers,
            body,
        }
    }

    /// Send a request without a body.
    pub async fn call(&self, method: Method, uri: &str, cookie: Option<&str>) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        self.send(builder.body(Body::empty()).expect("valid request"))
            .await
    }

    /// Send a JSON request.
    pub async fn json(&self, method: Method, uri: &str, body: &Value, cookie: Option<&str>) -> TestResponse {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        self.send(
            builder
                .body(Body::from(body.to_string()))
                .expect("valid request"),
        )
        .await
    }

    /// `POST /api/admin/login`.
    pub async fn login(&self, id: &str, password: &str) -> TestResponse {
        self.json(
            Method::POST,
            "/api/admin/login",
            &serde_json::json!({ "id": id, "password": password }),
            None,
        )
        .await
    }

    /// Log in and return the `Cookie` header value for later requests.
    pub async fn login_cookie(&self, id: &str, password: &str) -> String {
        let response = self.login(id, password).await;
        assert_eq!(response.status, StatusCode::OK, "login failed: {:?}", response.json());
        response.session_cookie().expect("login sets a session cookie")
    }
}

/// Buffered response.
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl TestResponse {
    /// Body parsed as JSON.
    #[must_use]
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body).expect("JSON body")
    }

    /// Body as text.
    #[must_use]
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// `Location` header, if any.
    #[must_use]
    pub fn location(&self) -> Option<&str> {
        self.headers
            .get(header::LOCATION)
            .and_then(|v| v.to_str().ok())
    }

    /// The full `Set-Cookie` header for the session cookie.
    #[must_use]
    pub fn set_session_cookie(&self) -> Option<String> {
        self.headers
            .get_all(header::SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .find(|v| v.starts_with(&format!("{SESSION_COOKIE}=")))
            .map(ToString::to_string)
    }

    /// `name=value` pair of the session cookie, ready for a `Cookie` header.
    #[must_use]
    pub fn session_cookie(&self) -> Option<String> {
        self.set_session_cookie()
            .and_then(|c| c.split(';').next().map(ToString::to_string))
    }
}
