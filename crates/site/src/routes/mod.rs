//! HTTP route handlers for the site.
//!
//! # Route Structure
//!
//! ```text
//! GET    /health                 - Liveness check
//! GET    /health/ready           - Readiness check (database when configured)
//!
//! # Auth
//! POST   /api/admin/login        - Log in with id/password, sets admin_session
//! POST   /api/admin/logout       - Clear admin_session
//! GET    /api/admin/me           - Current role and editable keys
//!
//! # Content (any session; writes checked against the access policy)
//! GET    /api/content?key=       - Read one content row
//! PATCH  /api/content            - Write one content row
//!
//! # Super only
//! GET    /api/admin/accounts     - Account overview
//! GET    /api/admin/policy       - Effective admin allow-list
//! PATCH  /api/admin/policy       - Replace the admin allow-list
//! GET    /api/admin/backup       - Export all rows
//! POST   /api/admin/backup       - Restore rows
//! GET    /api/admin/inquiries    - List inquiries
//! PATCH  /api/admin/inquiries    - Update inquiry status/note
//! DELETE /api/admin/inquiries    - Delete an inquiry
//!
//! # Public
//! POST   /api/inquiry            - Submit the contact form
//!
//! # Admin pages
//! GET    /admin/login            - Login form (POST submits it)
//! POST   /admin/logout           - Log out
//! GET    /admin                  - Dashboard
//! GET    /admin/system           - System overview (super)
//! ```

pub mod accounts;
pub mod auth;
pub mod backup;
pub mod content;
pub mod inquiries;
pub mod pages;
pub mod policy;

use axum::{Router, extract::State, http::StatusCode, routing::get};
use tower_http::trace::{DefaultOnResponse, OnResponse, TraceLayer};
use tracing::Span;

use crate::middleware::{request_id_middleware, route_gate, security_headers_middleware};
use crate::state::AppState;

/// All application routes, without middleware.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .merge(auth::router())
        .merge(content::router())
        .merge(policy::router())
        .merge(accounts::router())
        .merge(backup::router())
        .merge(inquiries::router())
        .merge(pages::router())
}

/// The application with its middleware stack and state applied.
///
/// Sentry layers and static files are added by the binary.
pub fn app(state: AppState) -> Router {
    routes()
        .layer(axum::middleware::from_fn_with_state(state.clone(), route_gate))
        .layer(axum::middleware::from_fn(security_headers_middleware))
        .layer(axum::middleware::from_fn(request_id_middleware))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &axum::http::Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        uri = %request.uri().path(),
                        request_id = tracing::field::Empty,
                        status = tracing::field::Empty,
                        latency_ms = tracing::field::Empty,
                    )
                })
                .on_response(
                    |response: &axum::http::Response<_>, latency: std::time::Duration, span: &Span| {
                        span.record("status", response.status().as_u16());
                        span.record(
                            "latency_ms",
                            u64::try_from(latency.as_millis()).unwrap_or(u64::MAX),
                        );
                        DefaultOnResponse::default().on_response(response, latency, span);
                    },
                ),
        )
        .with_state(state)
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Verifies database connectivity when running against `PostgreSQL`.
/// Returns 503 Service Unavailable if the database is not reachable.
async fn readiness(State(state): State<AppState>) -> StatusCode {
    let Some(pool) = state.pool() else {
        return StatusCode::OK;
    };
    match sqlx::query("SELECT 1").fetch_one(pool).await {
        Ok(_) => StatusCode::OK,
        Err(_) => StatusCode::SERVICE_UNAVAILABLE,
    }
}
