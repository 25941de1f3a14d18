//! Authentication extractors for the site API.
//!
//! The route gate already rejects unauthenticated requests to protected
//! paths; handlers still take one of these extractors so that a route added
//! outside the gate's list is not silently left open.

use std::net::{IpAddr, SocketAddr};

use axum::{
    extract::{ConnectInfo, FromRequestParts},
    http::{HeaderMap, request::Parts},
    response::{IntoResponse, Redirect, Response},
};

use super::session::session_from_headers;
use crate::error::AppError;
use crate::models::Session;
use crate::state::AppState;

/// Error returned when an extractor rejects a request.
#[derive(Debug)]
pub enum AuthRejection {
    /// Redirect to the login page (for HTML requests).
    RedirectToLogin(String),
    /// No valid session (for API requests).
    Unauthorized,
    /// Session present but the role is insufficient.
    Forbidden,
}

impl AuthRejection {
    fn missing_session(parts: &Parts) -> Self {
        let path = parts.uri.path();
        if path.starts_with("/api/") {
            Self::Unauthorized
        } else {
            Self::RedirectToLogin(path.to_owned())
        }
    }
}

/// Login page URL that returns to `next` after signing in.
#[must_use]
pub fn login_redirect_target(next: &str) -> String {
    format!("/admin/login?next={}", urlencoding::encode(next))
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::RedirectToLogin(next) => Redirect::to(&login_redirect_target(&next)).into_response(),
            Self::Unauthorized => AppError::Unauthorized("login required".to_string()).into_response(),
            Self::Forbidden => {
                AppError::Forbidden("super admin role required".to_string()).into_response()
            }
        }
    }
}

/// Extractor that requires a valid admin session of any role.
///
/// # Example
///
/// ```rust,ignore
/// async fn handler(RequireSession(session): RequireSession) -> impl IntoResponse {
///     session.role.to_string()
/// }
/// ```
#[derive(Debug, Clone, Copy)]
pub struct RequireSession(pub Session);

impl FromRequestParts<AppState> for RequireSession {
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        session_from_headers(state, &parts.headers)
            .map(Self)
            .ok_or_else(|| AuthRejection::missing_session(parts))
    }
}

/// Extractor that requires a `super` session.
///
/// Missing sessions are handled like [`RequireSession`]; an `admin` session
/// gets 403 Forbidden.
#[derive(Debug, Clone, Copy)]
pub struct RequireSuper(pub Session);

impl FromRequestParts<AppState> for RequireSuper {
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let session = session_from_headers(state, &parts.headers)
            .ok_or_else(|| AuthRejection::missing_session(parts))?;

        if !session.is_super() {
            return Err(AuthRejection::Forbidden);
        }

        Ok(Self(session))
    }
}

/// Client address used to key the login throttle.
///
/// Proxy headers are only consulted when `TRUST_PROXY_HEADERS` is enabled;
/// otherwise the socket peer address is used. Falls back to `"unknown"`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientAddr(pub String);

/// Sentinel used when no client address can be determined.
pub const UNKNOWN_CLIENT: &str = "unknown";

impl FromRequestParts<AppState> for ClientAddr {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        if state.config().trust_proxy_headers
            && let Some(ip) = forwarded_client_ip(&parts.headers)
        {
            return Ok(Self(ip.to_string()));
        }

        let peer = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip().to_string());

        Ok(Self(peer.unwrap_or_else(|| UNKNOWN_CLIENT.to_string())))
    }
}

/// Client IP from proxy headers: Cloudflare, then the first
/// `X-Forwarded-For` hop, then `X-Real-IP`, then Fly.io.
#[must_use]
pub fn forwarded_client_ip(headers: &HeaderMap) -> Option<IpAddr> {
    let header = |name: &str| headers.get(name).and_then(|v| v.to_str().ok());

    header("cf-connecting-ip")
        .and_then(|s| s.trim().parse().ok())
        .or_else(|| {
            header("x-forwarded-for")
                .and_then(|s| s.split(',').next())
                .and_then(|s| s.trim().parse().ok())
        })
        .or_else(|| header("x-real-ip").and_then(|s| s.trim().parse().ok()))
        .or_else(|| header("fly-client-ip").and_then(|s| s.trim().parse().ok()))
}
