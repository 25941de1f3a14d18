//! In-memory content store.
//!
//! Used when no database is configured and by tests. Contents are lost on
//! restart.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use mrtc_core::ContentEntry;

use super::{ContentStore, StoreError};

/// Content store held in a process-local map.
#[derive(Debug, Default)]
pub struct MemoryContentStore {
    rows: RwLock<BTreeMap<String, ContentEntry>>,
}

impl MemoryContentStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-filled with `entries`.
    #[must_use]
    pub fn with_entries(entries: impl IntoIterator<Item = ContentEntry>) -> Self {
        let now = Utc::now();
        let rows = entries
            .into_iter()
            .map(|mut entry| {
                entry.updated_at = Some(now);
                (entry.key.clone(), entry)
            })
            .collect();
        Self {
            rows: RwLock::new(rows),
        }
    }
}

#[async_trait]
impl ContentStore for MemoryContentStore {
    async fn get(&self, key: &str) -> Result<Option<ContentEntry>, StoreError> {
        Ok(self.rows.read().await.get(key).cloned())
    }

    async fn upsert(&self, entry: &ContentEntry) -> Result<ContentEntry, StoreError> {
        let mut stored = entry.clone();
        stored.updated_at = Some(Utc::now());
        self.rows
            .write()
            .await
            .insert(stored.key.clone(), stored.clone());
        Ok(stored)
    }

    async fn upsert_many(&self, entries: &[ContentEntry]) -> Result<usize, StoreError> {
        let now = Utc::now();
        let mut rows = self.rows.write().await;
        for entry in entries {
            let mut stored = entry.clone();
            stored.updated_at = Some(now);
            rows.insert(stored.key.clone(), stored);
        }
        Ok(entries.len())
    }

    async fn list_prefix(&self, prefix: &str) -> Result<Vec<ContentEntry>, StoreError> {
        Ok(self
            .rows
            .read()
            .await
            .range(prefix.to_owned()..)
            .take_while(|(key, _)| key.starts_with(prefix))
            .map(|(_, entry)| entry.clone())
            .collect())
    }

    async fn list_all(&self) -> Result<Vec<ContentEntry>, StoreError> {
        Ok(self.rows.read().await.values().cloned().collect())
    }

    async fn delete(&self, key: &str) -> Result<bool, StoreError> {
        Ok(self.rows.write().await.remove(key).is_some())
    }
}
