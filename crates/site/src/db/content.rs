//! `PostgreSQL` content store.

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::instrument;

use mrtc_core::ContentEntry;

use super::{ContentStore, StoreError};

const SELECT_COLUMNS: &str = "key, title, subtitle, body, hero_image_url, updated_at";

/// Content store backed by the `site_content` table.
#[derive(Clone)]
pub struct PgContentStore {
    pool: PgPool,
}

impl PgContentStore {
    /// Create a new store.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const UPSERT_SQL: &str = r"
    INSERT INTO site_content (key, title, subtitle, body, hero_image_url, updated_at)
    VALUES ($1, $2, $3, $4, $5, NOW())
    ON CONFLICT (key) DO UPDATE SET
        title = EXCLUDED.title,
        subtitle = EXCLUDED.subtitle,
        body = EXCLUDED.body,
        hero_image_url = EXCLUDED.hero_image_url,
        updated_at = NOW()
    RETURNING key, title, subtitle, body, hero_image_url, updated_at
";

#[async_trait]
impl ContentStore for PgContentStore {
    #[instrument(skip(self))]
    async fn get(&self, key: &str) -> Result<Option<ContentEntry>, StoreError> {
        let row = sqlx::query_as::<_, ContentEntry>(&format!(
            "SELECT {SELECT_COLUMNS} FROM site_content WHERE key = $1"
        ))
        .bind(key)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    #[instrument(skip(self, entry), fields(key = %entry.key))]
    async fn upsert(&self, entry: &ContentEntry) -> Result<ContentEntry, StoreError> {
        let row = sqlx::query_as::<_, ContentEntry>(UPSERT_SQL)
            .bind(&entry.key)
            .bind(&entry.title)
            .bind(&entry.subtitle)
            .bind(&entry.body)
            .bind(&entry.hero_image_url)
            .fetch_one(&self.pool)
            .await?;

        Ok(row)
    }

    #[instrument(skip(self, entries), fields(count = entries.len()))]
    async fn upsert_many(&self, entries: &[ContentEntry]) -> Result<usize, StoreError> {
        let mut tx = self.pool.begin().await?;
        for entry in entries {
            sqlx::query(UPSERT_SQL)
                .bind(&entry.key)
                .bind(&entry.title)
                .bind(&entry.subtitle)
                .bind(&entry.body)
                .bind(&entry.hero_image_url)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;

        Ok(entries.len())
    }

    #[instrument(skip(self))]
    async fn list_prefix(&self, prefix: &str) -> Result<Vec<ContentEntry>, StoreError> {
        // LIKE would treat the `_` in `inquiry_` as a wildcard.
        let rows = sqlx::query_as::<_, ContentEntry>(&format!(
            "SELECT {SELECT_COLUMNS} FROM site_content \
             WHERE left(key, char_length($1)) = $1 ORDER BY key"
        ))
        .bind(prefix)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    #[instrument(skip(self))]
    async fn list_all(&self) -> Result<Vec<ContentEntry>, StoreError> {
        let rows = sqlx::query_as::<_, ContentEntry>(&format!(
            "SELECT {SELECT_COLUMNS} FROM site_content ORDER BY key"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    #[instrument(skip(self))]
    async fn delete(&self, key: &str) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM site_content WHERE key = $1")
            .bind(key)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
