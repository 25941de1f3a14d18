//! Seed content rows.
//!
//! Reads a YAML list of rows:
//!
//! ```yaml
//! - key: home
//!   title: 엠알티씨
//!   subtitle: Compressed air specialists
//!   body: ""
//!   hero_image_url: /images/hero.jpg
//! ```
//!
//! Without a file only an empty `home` row is created. Existing rows are left
//! untouched unless `--overwrite` is given.

use std::path::Path;

use serde::Deserialize;
use tracing::info;

use mrtc_core::{ContentEntry, ContentKey, DEFAULT_CONTENT_KEY};
use mrtc_site::db::{self, ContentStore, PgContentStore};

/// One row of the seed file.
#[derive(Debug, Deserialize)]
struct SeedRow {
    key: ContentKey,
    #[serde(default)]
    title: String,
    #[serde(default)]
    subtitle: String,
    #[serde(default)]
    body: String,
    #[serde(default)]
    hero_image_url: String,
}

impl From<SeedRow> for ContentEntry {
    fn from(row: SeedRow) -> Self {
        let mut entry = Self::empty(row.key.into_inner());
        entry.title = row.title;
        entry.subtitle = row.subtitle;
        entry.body = row.body;
        entry.hero_image_url = row.hero_image_url;
        entry
    }
}

/// Parse seed rows from YAML. Reserved keys are rejected.
fn parse_rows(yaml: &str) -> Result<Vec<ContentEntry>, Box<dyn std::error::Error>> {
    let rows: Vec<SeedRow> = serde_yaml::from_str(yaml)?;
    if let Some(row) = rows.iter().find(|r| r.key.is_reserved()) {
        return Err(format!("Seed file may not contain reserved key '{}'", row.key).into());
    }
    Ok(rows.into_iter().map(ContentEntry::from).collect())
}

/// Seed content rows from `file`, or a default `home` row.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, or if database
/// operations fail.
pub async fn content(file: Option<&Path>, overwrite: bool) -> Result<(), Box<dyn std::error::Error>> {
    let entries = match file {
        Some(path) => {
            info!(path = %path.display(), "Loading content rows from file");
            parse_rows(&tokio::fs::read_to_string(path).await?)?
        }
        None => vec![ContentEntry::empty(DEFAULT_CONTENT_KEY)],
    };
    info!(rows = entries.len(), "Parsed seed rows");

    let database_url = super::database_url()?;
    let pool = db::create_pool(&database_url).await?;
    let store = PgContentStore::new(pool);
    info!("Connected to database");

    let mut pending = Vec::with_capacity(entries.len());
    for entry in entries {
        if !overwrite && store.get(&entry.key).await?.is_some() {
            info!(key = %entry.key, "Skipping existing row");
            continue;
        }
        pending.push(entry);
    }

    let written = store.upsert_many(&pending).await?;
    info!(written, "Seeding complete");
    Ok(())
}
