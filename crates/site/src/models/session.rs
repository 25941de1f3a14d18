//! Decoded admin session.

use chrono::{DateTime, Utc};
use serde::Serialize;

use mrtc_core::AdminRole;

/// An authenticated admin session.
///
/// Nothing is stored server side: a session exists only as the signed
/// `admin_session` cookie and is rebuilt from it on every request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Session {
    /// Role the session was issued for.
    pub role: AdminRole,
    /// When the session was issued.
    pub issued_at: DateTime<Utc>,
}

impl Session {
    /// Whether the session holds the `super` role.
    #[must_use]
    pub fn is_super(&self) -> bool {
        self.role == AdminRole::Super
    }
}
