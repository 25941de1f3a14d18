//! MRTC site library.
//!
//! Content API and admin panel of the MRTC corporate website. All editable
//! copy lives in one key-value table; two admin roles (`super`, `admin`)
//! edit it through cookie sessions, with the `admin` role limited to an
//! allow-list of content keys.
//!
//! Exposed as a library so that the router can be driven from tests and
//! the CLI can reuse the store and password helpers.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod clock;
pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
