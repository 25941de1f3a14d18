//! HTTP middleware stack for the site.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (capture errors, HTTP context)
//! 2. `TraceLayer` (request tracing)
//! 3. Request ID (add unique ID to each request)
//! 4. Security headers
//! 5. Route gate (role checks for `/admin` pages and admin APIs)

pub mod auth;
pub mod gate;
pub mod request_id;
pub mod security_headers;
pub mod session;

pub use auth::{AuthRejection, ClientAddr, RequireSession, RequireSuper};
pub use gate::{Protection, classify, required_role, route_gate};
pub use request_id::request_id_middleware;
pub use security_headers::security_headers_middleware;
pub use session::{SESSION_COOKIE, clear_session_cookie, session_cookie, session_from_headers};
