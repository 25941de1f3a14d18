//! Content backup and restore (super only).

use axum::{Json, Router, extract::State, routing::get};
use serde_json::{Value, json};
use tracing::instrument;

use mrtc_core::{ContentEntry, ContentKey};

use crate::error::AppError;
use crate::middleware::RequireSuper;
use crate::state::AppState;

/// Build the backup router.
pub fn router() -> Router<AppState> {
    Router::new().route("/api/admin/backup", get(export).post(restore))
}

/// Export every content row.
///
/// GET /api/admin/backup
#[instrument(skip_all)]
async fn export(State(state): State<AppState>, _super: RequireSuper) -> Result<Json<Value>, AppError> {
    let rows = state.store().list_all().await?;
    tracing::info!(count = rows.len(), "Content exported");

    Ok(Json(json!({
        "exportedAt": state.clock().now(),
        "count": rows.len(),
        "rows": rows,
    })))
}

/// Turn one backup row into an entry. Rows without a valid string key are skipped.
fn row_to_entry(row: &Value) -> Option<ContentEntry> {
    let key = ContentKey::parse(row.get("key")?.as_str()?).ok()?;
    let field = |name: &str| {
        row.get(name)
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_owned()
    };

    let mut entry = ContentEntry::empty(key.into_inner());
    entry.title = field("title");
    entry.subtitle = field("subtitle");
    entry.body = field("body");
    entry.hero_image_url = field("hero_image_url");
    Some(entry)
}

/// Restore rows from an export. Existing rows with the same key are replaced.
///
/// POST /api/admin/backup
#[instrument(skip_all)]
async fn restore(
    State(state): State<AppState>,
    _super: RequireSuper,
    Json(body): Json<Value>,
) -> Result<Json<Value>, AppError> {
    let Some(rows) = body.get("rows").and_then(Value::as_array) else {
        return Err(AppError::BadRequest("rows must be an array".to_string()));
    };

    let entries: Vec<ContentEntry> = rows.iter().filter_map(row_to_entry).collect();
    let skipped = rows.len() - entries.len();
    let restored = state.store().upsert_many(&entries).await?;
    tracing::info!(restored, skipped, "Content restored from backup");

    Ok(Json(json!({ "ok": true, "restored": restored })))
}
