//! Content persistence.
//!
//! # Table: `site_content`
//!
//! Every piece of editable site copy, the admin policy document and the
//! stored inquiries live in one key-value table. Handlers go through the
//! [`ContentStore`] trait; [`PgContentStore`] backs production and
//! [`MemoryContentStore`] backs local runs without a database and tests.
//!
//! # Migrations
//!
//! Migrations are stored in `crates/site/migrations/` and run via:
//! ```bash
//! cargo run -p mrtc-cli -- migrate
//! ```

pub mod content;
pub mod memory;

use std::time::Duration;

use async_trait::async_trait;
use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

use mrtc_core::ContentEntry;

pub use content::PgContentStore;
pub use memory::MemoryContentStore;

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Key-value store of content rows.
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Fetch one row.
    async fn get(&self, key: &str) -> Result<Option<ContentEntry>, StoreError>;

    /// Insert or replace a row, returning it with its new `updated_at`.
    async fn upsert(&self, entry: &ContentEntry) -> Result<ContentEntry, StoreError>;

    /// Insert or replace many rows at once. Returns the number written.
    async fn upsert_many(&self, entries: &[ContentEntry]) -> Result<usize, StoreError>;

    /// All rows whose key starts with `prefix`, ordered by key.
    async fn list_prefix(&self, prefix: &str) -> Result<Vec<ContentEntry>, StoreError>;

    /// Every row, ordered by key.
    async fn list_all(&self) -> Result<Vec<ContentEntry>, StoreError>;

    /// Delete a row. Returns `false` if it did not exist.
    async fn delete(&self, key: &str) -> Result<bool, StoreError>;
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(1)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
