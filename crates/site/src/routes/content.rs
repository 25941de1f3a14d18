//! Content read/write API.
//!
//! Reads and writes both go through the access policy: `super` may access
//! any key, `admin` only its allowed keys and their derived keys. Reserved
//! rows (the policy document, inquiries) are never served or written here.

use axum::{
    Json, Router,
    extract::{Query, State},
    routing::get,
};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::instrument;

use mrtc_core::{AdminRole, ContentEntry, ContentKey, DEFAULT_CONTENT_KEY};

use crate::error::AppError;
use crate::middleware::RequireSession;
use crate::state::AppState;

/// Build the content router.
pub fn router() -> Router<AppState> {
    Router::new().route("/api/content", get(show).patch(update))
}

/// Query parameters of `GET /api/content`.
#[derive(Debug, Deserialize)]
pub struct ContentQuery {
    pub key: Option<String>,
}

/// Body of `PATCH /api/content`. Omitted fields keep their stored value.
#[derive(Debug, Deserialize)]
pub struct ContentUpdate {
    pub key: Option<String>,
    pub title: Option<String>,
    pub subtitle: Option<String>,
    pub body: Option<String>,
    pub hero_image_url: Option<String>,
}

/// Parse a requested key, defaulting to `home` and refusing reserved rows.
fn content_key(raw: Option<&str>) -> Result<ContentKey, AppError> {
    let raw = raw.map(str::trim).filter(|k| !k.is_empty()).unwrap_or(DEFAULT_CONTENT_KEY);
    let key = ContentKey::parse(raw).map_err(|e| AppError::BadRequest(e.to_string()))?;
    if key.is_reserved() {
        return Err(AppError::Forbidden(format!(
            "'{key}' is a reserved key and cannot be accessed through the content API"
        )));
    }
    Ok(key)
}

/// Refuse keys the role may not touch under the current policy.
async fn ensure_access(state: &AppState, role: AdminRole, key: &ContentKey) -> Result<(), AppError> {
    if state.policy().can_edit(role, key.as_str()).await {
        return Ok(());
    }
    tracing::info!(%key, %role, "Content access denied by policy");
    Err(AppError::Forbidden(
        "this page is not editable by your role".to_string(),
    ))
}

/// Fetch one content row; a missing row is returned empty.
///
/// GET /api/content?key=
#[instrument(skip_all)]
async fn show(
    State(state): State<AppState>,
    RequireSession(session): RequireSession,
    Query(query): Query<ContentQuery>,
) -> Result<Json<ContentEntry>, AppError> {
    let key = content_key(query.key.as_deref())?;
    ensure_access(&state, session.role, &key).await?;

    let entry = state
        .store()
        .get(key.as_str())
        .await?
        .unwrap_or_else(|| ContentEntry::empty(key.into_inner()));

    Ok(Json(entry))
}

/// Write one content row.
///
/// PATCH /api/content
#[instrument(skip_all)]
async fn update(
    State(state): State<AppState>,
    RequireSession(session): RequireSession,
    Json(update): Json<ContentUpdate>,
) -> Result<Json<Value>, AppError> {
    let key = content_key(update.key.as_deref())?;
    ensure_access(&state, session.role, &key).await?;

    let mut entry = state
        .store()
        .get(key.as_str())
        .await?
        .unwrap_or_else(|| ContentEntry::empty(key.as_str()));
    if let Some(title) = update.title {
        entry.title = title;
    }
    if let Some(subtitle) = update.subtitle {
        entry.subtitle = subtitle;
    }
    if let Some(body) = update.body {
        entry.body = body;
    }
    if let Some(url) = update.hero_image_url {
        entry.hero_image_url = url;
    }

    let saved = state.store().upsert(&entry).await?;
    tracing::info!(%key, role = %session.role, "Content updated");

    Ok(Json(json!({ "ok": true, "content": saved })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_key_defaults_to_home() {
        assert_eq!(content_key(None).map(ContentKey::into_inner).ok().as_deref(), Some("home"));
        assert_eq!(content_key(Some("  ")).map(ContentKey::into_inner).ok().as_deref(), Some("home"));
    }

    #[test]
    fn test_content_key_rejects_reserved_and_invalid() {
        assert!(matches!(content_key(Some("admin_policy")), Err(AppError::Forbidden(_))));
        assert!(matches!(content_key(Some("inquiry_1")), Err(AppError::Forbidden(_))));
        assert!(matches!(content_key(Some("../x")), Err(AppError::BadRequest(_))));
    }
}
