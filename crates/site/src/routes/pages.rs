//! Admin shell pages.
//!
//! Minimal server-rendered pages: the login form the route gate redirects
//! to, a dashboard and the super-only system overview. Editing itself goes
//! through the JSON APIs.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form, Router,
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
    routing::get,
};
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;

use mrtc_core::{AdminRole, DEFAULT_SECTIONS};

use super::auth::authenticate;
use crate::error::AppError;
use crate::middleware::{
    ClientAddr, RequireSession, RequireSuper, clear_session_cookie, session_cookie,
    session_from_headers,
};
use crate::state::AppState;

const DASHBOARD: &str = "/admin";

/// Build the admin page router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/admin/login", get(login_page).post(login_submit))
        .route("/admin/logout", axum::routing::post(logout))
        .route("/admin", get(dashboard))
        .route("/admin/system", get(system))
}

/// Login page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    pub next: String,
    pub error: Option<String>,
}

/// Dashboard template.
#[derive(Template, WebTemplate)]
#[template(path = "dashboard.html")]
pub struct DashboardTemplate {
    pub role: AdminRole,
    pub editable: Vec<(String, String)>,
    pub all_keys: bool,
}

/// System overview template.
#[derive(Template, WebTemplate)]
#[template(path = "system.html")]
pub struct SystemTemplate {
    pub allowed_keys: Vec<String>,
    pub admin_id: String,
    pub super_id: String,
    pub persistent_store: bool,
    pub trust_proxy_headers: bool,
}

/// `next` parameter of the login page.
#[derive(Debug, Deserialize)]
pub struct NextQuery {
    pub next: Option<String>,
}

/// Login form fields.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub password: String,
    pub next: Option<String>,
}

/// Only follow `next` back into the admin area.
fn safe_next(next: Option<&str>) -> &str {
    match next {
        Some(path)
            if (path == DASHBOARD || path.starts_with("/admin/"))
                && !path.starts_with("/admin/login") =>
        {
            path
        }
        _ => DASHBOARD,
    }
}

/// Render the login page, or skip it for an existing session.
///
/// GET /admin/login
async fn login_page(
    State(state): State<AppState>,
    headers: axum::http::HeaderMap,
    Query(query): Query<NextQuery>,
) -> Response {
    let next = safe_next(query.next.as_deref()).to_owned();
    if session_from_headers(&state, &headers).is_some() {
        return Redirect::to(&next).into_response();
    }

    LoginTemplate { next, error: None }.into_response()
}

/// Handle the login form.
///
/// POST /admin/login
async fn login_submit(
    State(state): State<AppState>,
    client: ClientAddr,
    jar: CookieJar,
    Form(form): Form<LoginForm>,
) -> Response {
    let next = safe_next(form.next.as_deref()).to_owned();

    match authenticate(&state, &client.0, &form.id, &form.password).await {
        Ok((_, value)) => {
            let cookie = session_cookie(
                value,
                state.sessions().max_age(),
                state.config().secure_cookies(),
            );
            (jar.add(cookie), Redirect::to(&next)).into_response()
        }
        Err(err) => {
            let message = match &err {
                AppError::Unauthorized(_) => "Invalid id or password.",
                AppError::RateLimited(_) => "Too many failed attempts. Try again in a few minutes.",
                _ => {
                    tracing::error!(error = %err, "Admin login unavailable");
                    "Admin login is not available. Contact the site operator."
                }
            };
            (
                err.status(),
                LoginTemplate {
                    next,
                    error: Some(message.to_string()),
                },
            )
                .into_response()
        }
    }
}

/// Clear the session and return to the login page.
///
/// POST /admin/logout
async fn logout(jar: CookieJar) -> impl IntoResponse {
    (clear_session_cookie(jar), Redirect::to("/admin/login"))
}

/// Dashboard listing the sections the session may edit.
///
/// GET /admin
async fn dashboard(State(state): State<AppState>, RequireSession(session): RequireSession) -> DashboardTemplate {
    let allowed = state.policy().effective_allowed_keys().await;
    let label = |key: &str| {
        DEFAULT_SECTIONS
            .iter()
            .find(|s| s.slug == key)
            .map_or(key, |s| s.label)
            .to_owned()
    };

    let editable = if session.is_super() {
        std::iter::once("home")
            .chain(DEFAULT_SECTIONS.iter().map(|s| s.slug))
            .map(|key| (key.to_owned(), label(key)))
            .collect()
    } else {
        allowed.iter().map(|key| (key.clone(), label(key))).collect()
    };

    DashboardTemplate {
        role: session.role,
        editable,
        all_keys: session.is_super(),
    }
}

/// System overview for the super role.
///
/// GET /admin/system
async fn system(State(state): State<AppState>, _super: RequireSuper) -> SystemTemplate {
    let config = state.config();
    let id = |role| {
        config
            .auth
            .credentials(role)
            .id
            .clone()
            .unwrap_or_else(|| "(not set)".to_string())
    };

    SystemTemplate {
        allowed_keys: state.policy().effective_allowed_keys().await,
        admin_id: id(AdminRole::Admin),
        super_id: id(AdminRole::Super),
        persistent_store: state.pool().is_some(),
        trust_proxy_headers: config.trust_proxy_headers,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_safe_next() {
        assert_eq!(safe_next(None), "/admin");
        assert_eq!(safe_next(Some("/admin/system")), "/admin/system");
        assert_eq!(safe_next(Some("/admin")), "/admin");
        assert_eq!(safe_next(Some("https://evil.example")), "/admin");
        assert_eq!(safe_next(Some("//evil.example")), "/admin");
        assert_eq!(safe_next(Some("/admin/login")), "/admin");
        assert_eq!(safe_next(Some("/administrator")), "/admin");
    }
}
