//! MRTC Core - Shared types library.
//!
//! This crate provides common types used across all MRTC site components:
//! - `site` - Public site API and admin panel
//! - `cli` - Command-line tools for migrations and content management
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no database
//! access, no HTTP. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Roles, content entries, content keys and the built-in site sections

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
