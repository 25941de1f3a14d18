//! Session cookie helpers.

use axum::http::HeaderMap;
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};

use crate::models::Session;
use crate::state::AppState;

/// Name of the admin session cookie.
pub const SESSION_COOKIE: &str = "admin_session";

/// Build the session cookie carrying `value`.
#[must_use]
pub fn session_cookie(value: String, max_age: chrono::Duration, secure: bool) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, value))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .max_age(time::Duration::seconds(max_age.num_seconds()))
        .build()
}

/// Remove the session cookie from `jar`.
#[must_use]
pub fn clear_session_cookie(jar: CookieJar) -> CookieJar {
    jar.remove(Cookie::build(SESSION_COOKIE).path("/"))
}

/// Decode the session carried by the request cookies, if any.
#[must_use]
pub fn session_from_headers(state: &AppState, headers: &HeaderMap) -> Option<Session> {
    let jar = CookieJar::from_headers(headers);
    let value = jar.get(SESSION_COOKIE)?.value();
    state.sessions().decode(value)
}
