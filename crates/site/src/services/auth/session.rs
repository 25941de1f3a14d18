//! Signed session tokens.
//!
//! A cookie value has the shape `role:token`, where the token is
//! `{issued_at}.{signature}`: the issue time in unix seconds and the hex
//! HMAC-SHA256 of `"{role}:{issued_at}"` keyed by that role's session secret.
//!
//! Rotating a role's secret invalidates every outstanding cookie of that role
//! on its next request.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;

use mrtc_core::AdminRole;

use super::AuthError;
use crate::clock::Clock;
use crate::config::AuthConfig;
use crate::models::Session;

type HmacSha256 = Hmac<Sha256>;

/// How far in the future an issue time may lie before a token is rejected.
const MAX_CLOCK_SKEW_SECS: i64 = 60;

/// Issues and decodes `admin_session` cookie values.
pub struct SessionCodec {
    admin_secret: Option<SecretString>,
    super_secret: Option<SecretString>,
    max_age: Duration,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for SessionCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionCodec")
            .field("admin_secret", &self.admin_secret.as_ref().map(|_| "[REDACTED]"))
            .field("super_secret", &self.super_secret.as_ref().map(|_| "[REDACTED]"))
            .field("max_age", &self.max_age)
            .finish_non_exhaustive()
    }
}

impl SessionCodec {
    /// Create a codec from the configured role secrets.
    #[must_use]
    pub fn new(auth: &AuthConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            admin_secret: auth.admin_session_secret.clone(),
            super_secret: auth.super_session_secret.clone(),
            max_age: Duration::seconds(auth.session_max_age_secs),
            clock,
        }
    }

    /// Session lifetime, also used as the cookie max-age.
    #[must_use]
    pub const fn max_age(&self) -> Duration {
        self.max_age
    }

    const fn secret(&self, role: AdminRole) -> Option<&SecretString> {
        match role {
            AdminRole::Admin => self.admin_secret.as_ref(),
            AdminRole::Super => self.super_secret.as_ref(),
        }
    }

    fn mac(&self, role: AdminRole, issued_at: i64) -> Result<HmacSha256, AuthError> {
        let secret = self.secret(role).ok_or(AuthError::MissingSecret(role))?;
        let mut mac = HmacSha256::new_from_slice(secret.expose_secret().as_bytes())
            .map_err(|e| AuthError::InvalidKey(e.to_string()))?;
        mac.update(format!("{role}:{issued_at}").as_bytes());
        Ok(mac)
    }

    /// Issue a cookie value for `role`.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::MissingSecret` if no session secret is configured
    /// for the role.
    pub fn issue(&self, role: AdminRole) -> Result<String, AuthError> {
        let issued_at = self.clock.now().timestamp();
        let signature = hex::encode(self.mac(role, issued_at)?.finalize().into_bytes());
        Ok(format!("{role}:{issued_at}.{signature}"))
    }

    /// Decode a cookie value.
    ///
    /// Returns `None` for anything that is not a currently valid session:
    /// unknown role, malformed or empty token, bad signature, a role without
    /// a configured secret, or an issue time outside the accepted window.
    #[must_use]
    pub fn decode(&self, value: &str) -> Option<Session> {
        let (role, token) = value.split_once(':')?;
        let role: AdminRole = role.parse().ok()?;
        let (issued_at, signature) = token.split_once('.')?;
        if issued_at.is_empty() || issued_at.starts_with('+') {
            return None;
        }
        let issued_at: i64 = issued_at.parse().ok()?;
        let signature = hex::decode(signature).ok()?;

        self.mac(role, issued_at).ok()?.verify_slice(&signature).ok()?;

        let issued_at = DateTime::<Utc>::from_timestamp(issued_at, 0)?;
        let now = self.clock.now();
        if issued_at > now + Duration::seconds(MAX_CLOCK_SKEW_SECS) {
            return None;
        }
        if now - issued_at > self.max_age {
            return None;
        }

        Some(Session { role, issued_at })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use secrecy::SecretString;

    use super::*;
    use crate::clock::ManualClock;
    use crate::config::RoleCredentials;

    const ADMIN_SECRET: &str = "a9Xk2LmQ7vRt4ZpW8nBc3HsJ6dFg1YeU";
    const SUPER_SECRET: &str = "Z7mN3qPx8LkV2wRt6YbH9cJd4FgS1aEu";

    fn auth(admin: Option<&str>, super_admin: Option<&str>) -> AuthConfig {
        AuthConfig {
            admin: RoleCredentials::default(),
            super_admin: RoleCredentials::default(),
            admin_session_secret: admin.map(SecretString::from),
            super_session_secret: super_admin.map(SecretString::from),
            session_max_age_secs: 3600,
            allow_plaintext_passwords: false,
            admin_allowed_keys: None,
        }
    }

    fn codec_with(auth: &AuthConfig) -> (SessionCodec, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::default());
        (SessionCodec::new(auth, clock.clone()), clock)
    }

    #[test]
    fn test_issue_then_decode() {
        let (codec, _) = codec_with(&auth(Some(ADMIN_SECRET), Some(SUPER_SECRET)));

        for role in AdminRole::ALL {
            let value = codec.issue(role).unwrap();
            assert!(value.starts_with(&format!("{role}:")));
            assert_eq!(codec.decode(&value).unwrap().role, role);
        }
    }

    #[test]
    fn test_issue_without_secret_fails() {
        let (codec, _) = codec_with(&auth(Some(ADMIN_SECRET), None));
        assert!(matches!(
            codec.issue(AdminRole::Super),
            Err(AuthError::MissingSecret(AdminRole::Super))
        ));
    }

    #[test]
    fn test_decode_rejects_garbage() {
        let (codec, _) = codec_with(&auth(Some(ADMIN_SECRET), Some(SUPER_SECRET)));
        for value in [
            "",
            "admin",
            "admin:",
            "root:123.abcd",
            "admin:notatoken",
            "admin:123.zz",
            "admin:.00",
            ":::",
        ] {
            assert!(codec.decode(value).is_none(), "accepted {value:?}");
        }
    }

    #[test]
    fn test_decode_rejects_role_swap() {
        let (codec, _) = codec_with(&auth(Some(ADMIN_SECRET), Some(SUPER_SECRET)));
        let value = codec.issue(AdminRole::Admin).unwrap();
        let forged = value.replacen("admin:", "super:", 1);
        assert!(codec.decode(&forged).is_none());
    }

    #[test]
    fn test_decode_rejects_tampered_signature() {
        let (codec, _) = codec_with(&auth(Some(ADMIN_SECRET), Some(SUPER_SECRET)));
        let mut value = codec.issue(AdminRole::Admin).unwrap();
        let last = value.pop().unwrap();
        value.push(if last == '0' { '1' } else { '0' });
        assert!(codec.decode(&value).is_none());
    }

    #[test]
    fn test_secret_rotation_invalidates_sessions() {
        let (codec, clock) = codec_with(&auth(Some(ADMIN_SECRET), Some(SUPER_SECRET)));
        let value = codec.issue(AdminRole::Admin).unwrap();

        let rotated = SessionCodec::new(
            &auth(Some("Q4wE8rT2yU6iO1pA5sD9fG3hJ7kL0zXc"), Some(SUPER_SECRET)),
            clock,
        );
        assert!(rotated.decode(&value).is_none());

        let unset = SessionCodec::new(&auth(None, Some(SUPER_SECRET)), Arc::new(ManualClock::default()));
        assert!(unset.decode(&value).is_none());
    }

    #[test]
    fn test_decode_enforces_max_age() {
        let (codec, clock) = codec_with(&auth(Some(ADMIN_SECRET), Some(SUPER_SECRET)));
        let value = codec.issue(AdminRole::Super).unwrap();

        clock.advance(Duration::seconds(3599));
        assert!(codec.decode(&value).is_some());

        clock.advance(Duration::seconds(2));
        assert!(codec.decode(&value).is_none());
    }

    #[test]
    fn test_decode_rejects_future_tokens() {
        let (codec, clock) = codec_with(&auth(Some(ADMIN_SECRET), Some(SUPER_SECRET)));
        clock.advance(Duration::minutes(5));
        let future = codec.issue(AdminRole::Admin).unwrap();

        let (present, _) = codec_with(&auth(Some(ADMIN_SECRET), Some(SUPER_SECRET)));
        assert!(present.decode(&future).is_none());
    }
}
