//! Route gate.
//!
//! Runs before routing for every request. Admin pages and admin APIs need a
//! valid session; a subset of them needs the `super` role. API rejections
//! are JSON (401 without a session, 403 with the wrong role); page
//! rejections redirect to the login page.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};

use mrtc_core::AdminRole;

use super::auth::login_redirect_target;
use super::session::session_from_headers;
use crate::error::AppError;
use crate::state::AppState;

/// How a path is protected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Protection {
    /// No session needed.
    Public,
    /// Admin shell page; rejections redirect to login.
    Page,
    /// Admin API; rejections are JSON errors.
    Api,
}

const PROTECTED_API_PREFIXES: &[&str] = &[
    "/api/content",
    "/api/admin/me",
    "/api/admin/accounts",
    "/api/admin/backup",
    "/api/admin/policy",
    "/api/admin/inquiries",
];

const SUPER_PREFIXES: &[&str] = &[
    "/admin/system",
    "/api/admin/accounts",
    "/api/admin/backup",
    "/api/admin/policy",
    "/api/admin/inquiries",
];

const LOGIN_PAGE: &str = "/admin/login";

/// `path` equals `prefix` or continues it with a `/` segment.
fn under(path: &str, prefix: &str) -> bool {
    path.strip_prefix(prefix)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
}

/// Classify a request path.
#[must_use]
pub fn classify(path: &str) -> Protection {
    if under(path, "/admin") {
        if under(path, LOGIN_PAGE) {
            Protection::Public
        } else {
            Protection::Page
        }
    } else if PROTECTED_API_PREFIXES.iter().any(|p| under(path, p)) {
        Protection::Api
    } else {
        Protection::Public
    }
}

/// Role a protected path requires.
#[must_use]
pub fn required_role(path: &str) -> AdminRole {
    if SUPER_PREFIXES.iter().any(|p| under(path, p)) {
        AdminRole::Super
    } else {
        AdminRole::Admin
    }
}

/// Middleware enforcing the session and role requirements of each path.
pub async fn route_gate(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let path = request.uri().path().to_owned();
    let protection = classify(&path);
    if protection == Protection::Public {
        return next.run(request).await;
    }

    let required = required_role(&path);
    let session = session_from_headers(&state, request.headers());

    let denied = match session {
        None => Some(AppError::Unauthorized("login required".to_string())),
        Some(s) if !s.role.satisfies(required) => {
            Some(AppError::Forbidden("super admin role required".to_string()))
        }
        Some(_) => None,
    };

    match (denied, protection) {
        (None, _) => next.run(request).await,
        (Some(err), Protection::Api) => {
            tracing::debug!(%path, status = %err.status(), "Route gate rejected API request");
            err.into_response()
        }
        (Some(_), _) => {
            tracing::debug!(%path, "Route gate redirecting to login");
            Redirect::to(&login_redirect_target(&path)).into_response()
        }
    }
}
