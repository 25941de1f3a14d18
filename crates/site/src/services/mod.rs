//! Business logic services for the site.
//!
//! # Services
//!
//! - `auth` - Session tokens, credential checks and the login throttle
//! - `policy` - Which content keys the `admin` role may edit

pub mod auth;
pub mod policy;

pub use auth::{
    AuthError, CredentialValidator, LoginThrottle, MemoryLoginThrottle, SessionCodec,
    ThrottleSettings, throttle_key,
};
pub use policy::{AccessPolicy, PolicyError, PolicySource, can_edit};
