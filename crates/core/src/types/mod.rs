//! Core types for the MRTC site.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod content;
pub mod role;
pub mod section;

pub use content::{
    ContentEntry, ContentKey, ContentKeyError, DEFAULT_CONTENT_KEY, DERIVED_KEY_SUFFIXES,
    INQUIRY_KEY_PREFIX, POLICY_KEY, base_key,
};
pub use role::{AdminRole, AdminRoleParseError};
pub use section::{DEFAULT_SECTIONS, SiteSection, default_allowed_keys};
