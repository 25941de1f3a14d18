//! Account overview (super only).

use axum::{Json, Router, extract::State, routing::get};
use serde::Serialize;
use serde_json::{Value, json};

use mrtc_core::AdminRole;

use crate::middleware::RequireSuper;
use crate::state::AppState;

/// Build the accounts router.
pub fn router() -> Router<AppState> {
    Router::new().route("/api/admin/accounts", get(list))
}

/// One configured admin account.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountView {
    pub role: AdminRole,
    pub id: Option<String>,
    /// A password hash (or an enabled plaintext password) is configured.
    pub password_configured: bool,
    /// A session token is configured.
    pub session_configured: bool,
    pub permissions: Vec<&'static str>,
    pub allowed_content_keys: Vec<String>,
}

/// Describe both accounts and what each may do.
///
/// GET /api/admin/accounts
async fn list(State(state): State<AppState>, _super: RequireSuper) -> Json<Value> {
    let auth = &state.config().auth;
    let admin_keys = state.policy().effective_allowed_keys().await;

    let accounts: Vec<AccountView> = AdminRole::ALL
        .into_iter()
        .map(|role| {
            let creds = auth.credentials(role);
            let (permissions, allowed_content_keys) = match role {
                AdminRole::Super => (
                    vec!["content:*", "accounts", "policy", "backup", "inquiries", "system"],
                    vec!["*".to_string()],
                ),
                AdminRole::Admin => (vec!["content:allowed"], admin_keys.clone()),
            };
            AccountView {
                role,
                id: creds.id.clone(),
                password_configured: creds.password_hash.is_some()
                    || (creds.password.is_some() && auth.allow_plaintext_passwords),
                session_configured: auth.session_secret(role).is_some(),
                permissions,
                allowed_content_keys,
            }
        })
        .collect();

    Json(json!({ "accounts": accounts }))
}
