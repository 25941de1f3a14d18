//! Admin access policy endpoints (super only).

use axum::{Json, Router, extract::State, routing::get};
use serde_json::{Value, json};
use tracing::instrument;

use crate::error::AppError;
use crate::middleware::RequireSuper;
use crate::state::AppState;

/// Build the policy router.
pub fn router() -> Router<AppState> {
    Router::new().route("/api/admin/policy", get(show).patch(update))
}

/// Effective admin allow-list.
///
/// GET /api/admin/policy
async fn show(State(state): State<AppState>, _super: RequireSuper) -> Json<Value> {
    let keys = state.policy().effective_allowed_keys().await;
    Json(json!({ "allowedContentKeys": keys }))
}

/// Replace the stored allow-list.
///
/// PATCH /api/admin/policy
///
/// Body: `{"allowedContentKeys": ["home", ...]}`. Non-string entries are
/// ignored; the list must not be empty after trimming.
#[instrument(skip_all)]
async fn update(
    State(state): State<AppState>,
    _super: RequireSuper,
    Json(body): Json<Value>,
) -> Result<Json<Value>, AppError> {
    let Some(list) = body.get("allowedContentKeys").and_then(Value::as_array) else {
        return Err(AppError::BadRequest(
            "allowedContentKeys must be an array".to_string(),
        ));
    };
    let keys: Vec<&str> = list.iter().filter_map(Value::as_str).collect();

    let saved = state.policy().set_allowed_keys(keys.as_slice()).await?;

    Ok(Json(json!({ "ok": true, "allowedContentKeys": saved })))
}
