//! Admin login, logout and session introspection.

use axum::{
    Json, Router,
    extract::State,
    response::IntoResponse,
    routing::{get, post},
};
use axum_extra::extract::cookie::CookieJar;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::instrument;

use mrtc_core::AdminRole;

use crate::error::AppError;
use crate::middleware::{ClientAddr, RequireSession, clear_session_cookie, session_cookie};
use crate::services::{AuthError, throttle_key};
use crate::state::AppState;

/// Build the auth API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/admin/login", post(login))
        .route("/api/admin/logout", post(logout))
        .route("/api/admin/me", get(me))
}

/// Login request body.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub password: String,
}

/// Response of `GET /api/admin/me`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MeResponse {
    pub role: AdminRole,
    pub allowed_content_keys: Vec<String>,
}

/// Check credentials behind the throttle and issue a session cookie value.
///
/// Shared by the JSON API and the login form.
///
/// # Errors
///
/// - `Configuration` when login ids or the role's session token are missing
/// - `RateLimited` while the client/id pair is blocked
/// - `Unauthorized` for wrong credentials
pub async fn authenticate(
    state: &AppState,
    client: &str,
    id: &str,
    password: &str,
) -> Result<(AdminRole, String), AppError> {
    if !state.config().auth.ids_configured() {
        return Err(AuthError::MissingIds.into());
    }

    let id = id.trim();
    let key = throttle_key(client, id);
    if state.throttle().is_blocked(&key).await {
        tracing::warn!(client, "Login attempt while blocked");
        return Err(AppError::RateLimited(
            "too many failed attempts, try again later".to_string(),
        ));
    }

    let Some(role) = state.credentials().validate(id, password) else {
        state.throttle().record_failure(&key).await;
        tracing::info!(client, "Login failed");
        return Err(AppError::Unauthorized("invalid id or password".to_string()));
    };

    state.throttle().record_success(&key).await;
    let value = state.sessions().issue(role)?;
    tracing::info!(client, %role, "Login succeeded");

    Ok((role, value))
}

/// Log in with id and password.
///
/// POST /api/admin/login
#[instrument(skip(state, jar, body), fields(client = %client.0))]
async fn login(
    State(state): State<AppState>,
    client: ClientAddr,
    jar: CookieJar,
    Json(body): Json<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    let (role, value) = authenticate(&state, &client.0, &body.id, &body.password).await?;
    let cookie = session_cookie(
        value,
        state.sessions().max_age(),
        state.config().secure_cookies(),
    );

    Ok((jar.add(cookie), Json(json!({ "ok": true, "role": role }))))
}

/// Clear the session cookie.
///
/// POST /api/admin/logout
async fn logout(jar: CookieJar) -> impl IntoResponse {
    (clear_session_cookie(jar), Json(json!({ "ok": true })))
}

/// Current role and editable keys.
///
/// GET /api/admin/me
async fn me(State(state): State<AppState>, RequireSession(session): RequireSession) -> Json<MeResponse> {
    let allowed_content_keys = if session.is_super() {
        vec!["*".to_string()]
    } else {
        state.policy().effective_allowed_keys().await
    };

    Json(MeResponse {
        role: session.role,
        allowed_content_keys,
    })
}
