//! Content access policy for the `admin` role.
//!
//! The `super` role may edit every content key. The `admin` role may edit the
//! keys on its allow-list plus the derived keys (`<key>_extra`,
//! `<key>_style`) of those keys.
//!
//! The allow-list comes from the first source that yields a non-empty list:
//!
//! 1. the policy document stored under the `admin_policy` content row
//! 2. the `ADMIN_ALLOWED_KEYS` environment list
//! 3. the built-in list of site sections

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::instrument;

use mrtc_core::{AdminRole, ContentEntry, POLICY_KEY, base_key, default_allowed_keys};

use crate::db::{ContentStore, StoreError};

/// Errors that can occur when updating the policy.
#[derive(Debug, Error)]
pub enum PolicyError {
    /// Nothing left after trimming and dropping empty entries.
    #[error("allowedContentKeys must contain at least one key")]
    Empty,

    /// Persisting the document failed.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// The document could not be serialized.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Stored policy document, kept as JSON in the `admin_policy` row body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyDocument {
    pub allowed_content_keys: Vec<String>,
}

/// Trim keys, drop empty entries and remove duplicates, keeping first-seen order.
pub fn clean_keys<I, S>(keys: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut cleaned: Vec<String> = Vec::new();
    for key in keys {
        let key = key.as_ref().trim();
        if !key.is_empty() && !cleaned.iter().any(|k| k == key) {
            cleaned.push(key.to_owned());
        }
    }
    cleaned
}

/// Whether `role` may write the content row `key` under the allow-list `allowed`.
#[must_use]
pub fn can_edit(role: AdminRole, key: &str, allowed: &[String]) -> bool {
    match role {
        AdminRole::Super => true,
        AdminRole::Admin => {
            let listed = |k: &str| allowed.iter().any(|a| a == k);
            listed(key) || base_key(key).is_some_and(listed)
        }
    }
}

/// One provider of the admin allow-list.
#[async_trait]
pub trait PolicySource: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// The allow-list, or `None` to defer to the next source.
    async fn allowed_keys(&self) -> Option<Vec<String>>;
}

/// Policy document stored in the content table.
pub struct StoredPolicy {
    store: Arc<dyn ContentStore>,
}

impl StoredPolicy {
    /// Read the document from `store`.
    #[must_use]
    pub fn new(store: Arc<dyn ContentStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl PolicySource for StoredPolicy {
    fn name(&self) -> &'static str {
        "stored"
    }

    async fn allowed_keys(&self) -> Option<Vec<String>> {
        let entry = match self.store.get(POLICY_KEY).await {
            Ok(entry) => entry?,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read stored admin policy");
                return None;
            }
        };
        if entry.body.trim().is_empty() {
            return None;
        }
        match serde_json::from_str::<PolicyDocument>(&entry.body) {
            Ok(doc) => Some(clean_keys(doc.allowed_content_keys)),
            Err(e) => {
                tracing::warn!(error = %e, "Ignoring malformed admin policy document");
                None
            }
        }
    }
}

/// Fixed list, used for both the environment list and the built-in list.
pub struct StaticPolicy {
    name: &'static str,
    keys: Option<Vec<String>>,
}

impl StaticPolicy {
    /// List configured through `ADMIN_ALLOWED_KEYS`.
    #[must_use]
    pub fn from_env_list(keys: Option<Vec<String>>) -> Self {
        Self {
            name: "env",
            keys: keys.map(clean_keys),
        }
    }

    /// The built-in list of site sections.
    #[must_use]
    pub fn builtin() -> Self {
        Self {
            name: "builtin",
            keys: Some(default_allowed_keys()),
        }
    }
}

#[async_trait]
impl PolicySource for StaticPolicy {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn allowed_keys(&self) -> Option<Vec<String>> {
        self.keys.clone()
    }
}

/// Resolves and updates the admin allow-list.
pub struct AccessPolicy {
    store: Arc<dyn ContentStore>,
    sources: Vec<Box<dyn PolicySource>>,
}

impl AccessPolicy {
    /// Standard source chain: stored document, environment list, built-in list.
    #[must_use]
    pub fn new(store: Arc<dyn ContentStore>, env_keys: Option<Vec<String>>) -> Self {
        let sources: Vec<Box<dyn PolicySource>> = vec![
            Box::new(StoredPolicy::new(store.clone())),
            Box::new(StaticPolicy::from_env_list(env_keys)),
            Box::new(StaticPolicy::builtin()),
        ];
        Self { store, sources }
    }

    /// The allow-list currently in effect for the `admin` role.
    #[instrument(skip(self))]
    pub async fn effective_allowed_keys(&self) -> Vec<String> {
        for source in &self.sources {
            if let Some(keys) = source.allowed_keys().await
                && !keys.is_empty()
            {
                tracing::debug!(source = source.name(), count = keys.len(), "Resolved admin policy");
                return keys;
            }
        }
        default_allowed_keys()
    }

    /// Whether `role` may write `key` under the current policy.
    pub async fn can_edit(&self, role: AdminRole, key: &str) -> bool {
        if role == AdminRole::Super {
            return true;
        }
        can_edit(role, key, &self.effective_allowed_keys().await)
    }

    /// Replace the stored allow-list. Returns the cleaned list.
    ///
    /// Callers must restrict this to the `super` role.
    ///
    /// # Errors
    ///
    /// Returns `PolicyError::Empty` if nothing is left after cleaning, or a
    /// store error if persisting fails.
    #[instrument(skip(self, keys))]
    pub async fn set_allowed_keys<S: AsRef<str>>(&self, keys: &[S]) -> Result<Vec<String>, PolicyError> {
        let cleaned = clean_keys(keys);
        if cleaned.is_empty() {
            return Err(PolicyError::Empty);
        }

        let document = PolicyDocument {
            allowed_content_keys: cleaned.clone(),
        };
        let mut entry = ContentEntry::empty(POLICY_KEY);
        entry.title = "Admin access policy".to_string();
        entry.body = serde_json::to_string(&document)?;
        self.store.upsert(&entry).await?;

        tracing::info!(count = cleaned.len(), "Admin policy updated");
        Ok(cleaned)
    }
}
