//! Authentication error types.

use thiserror::Error;

use mrtc_core::AdminRole;

/// Errors that can occur while issuing sessions.
#[derive(Debug, Error)]
pub enum AuthError {
    /// No session signing secret is configured for the role.
    #[error("session token is not configured for role {0}")]
    MissingSecret(AdminRole),

    /// The admin login ids are not configured.
    #[error("admin login ids are not configured")]
    MissingIds,

    /// The signing key was rejected by the MAC implementation.
    #[error("invalid signing key: {0}")]
    InvalidKey(String),
}
