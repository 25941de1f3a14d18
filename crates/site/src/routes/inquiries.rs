//! Contact-form inquiries.
//!
//! Anyone may submit an inquiry; listing, updating and deleting them is
//! restricted to the `super` role.

use axum::{
    Json, Router,
    extract::{Query, State},
    routing::{get, post},
};
use chrono::Duration;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::instrument;

use mrtc_core::INQUIRY_KEY_PREFIX;

use crate::error::AppError;
use crate::middleware::RequireSuper;
use crate::models::{Inquiry, InquiryStatus, InquiryView};
use crate::state::AppState;

const MAX_NAME_LEN: usize = 100;
const MAX_PHONE_LEN: usize = 40;
const MAX_MESSAGE_LEN: usize = 5000;

/// Build the inquiry routers (public submit and super management).
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/inquiry", post(submit))
        .route("/api/admin/inquiries", get(list).patch(update).delete(remove))
}

/// Public submission body. `website` is a honeypot left empty by people.
#[derive(Debug, Deserialize)]
pub struct InquiryRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub website: String,
}

/// Update body for `PATCH /api/admin/inquiries`.
#[derive(Debug, Deserialize)]
pub struct InquiryUpdate {
    pub key: String,
    pub status: Option<String>,
    pub note: Option<String>,
}

/// Query for `DELETE /api/admin/inquiries`.
#[derive(Debug, Deserialize)]
pub struct InquiryKeyQuery {
    pub key: Option<String>,
}

fn inquiry_key(key: &str) -> Result<&str, AppError> {
    let key = key.trim();
    if key.len() > INQUIRY_KEY_PREFIX.len() && key.starts_with(INQUIRY_KEY_PREFIX) {
        Ok(key)
    } else {
        Err(AppError::BadRequest("key must be an inquiry key".to_string()))
    }
}

/// Submit a contact-form inquiry.
///
/// POST /api/inquiry
#[instrument(skip_all)]
async fn submit(
    State(state): State<AppState>,
    Json(request): Json<InquiryRequest>,
) -> Result<Json<Value>, AppError> {
    if !request.website.trim().is_empty() {
        tracing::info!("Dropping inquiry that filled the honeypot field");
        return Ok(Json(json!({ "ok": true })));
    }

    let name = request.name.trim();
    let phone = request.phone.trim();
    let message = request.message.trim();
    if name.is_empty() || phone.is_empty() || message.is_empty() {
        return Err(AppError::BadRequest(
            "name, phone and message are required".to_string(),
        ));
    }
    if name.chars().count() > MAX_NAME_LEN
        || phone.chars().count() > MAX_PHONE_LEN
        || message.chars().count() > MAX_MESSAGE_LEN
    {
        return Err(AppError::BadRequest("inquiry is too long".to_string()));
    }

    let created_at = state.clock().now();
    let inquiry = Inquiry {
        name: name.to_owned(),
        phone: phone.to_owned(),
        message: message.to_owned(),
        note: String::new(),
        created_at: Some(created_at),
        status: InquiryStatus::New,
    };

    // Two submissions in the same millisecond would share a key.
    let mut at = created_at;
    let mut key = Inquiry::key_for(at);
    while state.store().get(&key).await?.is_some() {
        at += Duration::milliseconds(1);
        key = Inquiry::key_for(at);
    }

    let entry = inquiry
        .to_entry(&key)
        .map_err(|e| AppError::Internal(e.to_string()))?;
    state.store().upsert(&entry).await?;
    tracing::info!(%key, "Inquiry received");

    Ok(Json(json!({ "ok": true })))
}

/// List inquiries, newest first.
///
/// GET /api/admin/inquiries
async fn list(State(state): State<AppState>, _super: RequireSuper) -> Result<Json<Value>, AppError> {
    let mut inquiries: Vec<InquiryView> = state
        .store()
        .list_prefix(INQUIRY_KEY_PREFIX)
        .await?
        .into_iter()
        .map(|entry| InquiryView {
            inquiry: Inquiry::from_entry(&entry),
            key: entry.key,
        })
        .collect();
    // Newest first; rows without a receive time go last, by key.
    inquiries.sort_by(|a, b| {
        b.inquiry
            .created_at
            .cmp(&a.inquiry.created_at)
            .then_with(|| b.key.cmp(&a.key))
    });

    Ok(Json(json!({ "inquiries": inquiries })))
}

/// Update the status and/or note of an inquiry.
///
/// PATCH /api/admin/inquiries
#[instrument(skip_all)]
async fn update(
    State(state): State<AppState>,
    _super: RequireSuper,
    Json(update): Json<InquiryUpdate>,
) -> Result<Json<Value>, AppError> {
    let key = inquiry_key(&update.key)?;
    // An unknown status is ignored as long as a note is given.
    let status = update
        .status
        .as_deref()
        .and_then(|s| s.parse::<InquiryStatus>().ok());
    if status.is_none() && update.note.is_none() {
        return Err(AppError::BadRequest(
            "status must be 'new' or 'done', or a note must be given".to_string(),
        ));
    }

    let entry = state
        .store()
        .get(key)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("inquiry {key}")))?;
    let mut inquiry = Inquiry::from_entry(&entry);

    if let Some(status) = status {
        inquiry.status = status;
    }
    if let Some(note) = update.note {
        inquiry.note = note;
    }

    let updated = inquiry
        .to_entry(key)
        .map_err(|e| AppError::Internal(e.to_string()))?;
    state.store().upsert(&updated).await?;
    tracing::info!(%key, status = ?inquiry.status, "Inquiry updated");

    let view = InquiryView {
        key: key.to_owned(),
        inquiry,
    };
    Ok(Json(json!({ "ok": true, "inquiry": view })))
}

/// Delete an inquiry.
///
/// DELETE /api/admin/inquiries?key=
#[instrument(skip_all)]
async fn remove(
    State(state): State<AppState>,
    _super: RequireSuper,
    Query(query): Query<InquiryKeyQuery>,
) -> Result<Json<Value>, AppError> {
    let key = inquiry_key(query.key.as_deref().unwrap_or_default())?;
    if !state.store().delete(key).await? {
        return Err(AppError::NotFound(format!("inquiry {key}")));
    }
    tracing::info!(%key, "Inquiry deleted");

    Ok(Json(json!({ "ok": true })))
}
