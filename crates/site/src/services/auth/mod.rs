//! Admin authentication.
//!
//! Two fixed accounts (`admin` and `super`) configured through environment
//! variables. A successful login issues a signed `admin_session` cookie; no
//! session state is kept on the server.
//!
//! - [`SessionCodec`] - issues and decodes session cookie values
//! - [`CredentialValidator`] - checks a submitted id/password pair
//! - [`LoginThrottle`] - blocks a client after repeated failures

mod error;
pub mod password;
pub mod session;
pub mod throttle;

pub use error::AuthError;
pub use password::{CredentialValidator, hash_password};
pub use session::SessionCodec;
pub use throttle::{LoginThrottle, MemoryLoginThrottle, ThrottleSettings, throttle_key};
