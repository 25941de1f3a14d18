//! Site configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Authentication
//! - `ADMIN_ID` / `SUPER_ADMIN_ID` - Login ids of the two roles
//! - `ADMIN_PASSWORD_HASH` / `SUPER_ADMIN_PASSWORD_HASH` - Argon2 PHC hashes
//!   (generate with `mrtc hash-password`)
//! - `ADMIN_PASSWORD` / `SUPER_ADMIN_PASSWORD` - Legacy plaintext passwords,
//!   only honored when `ALLOW_PLAINTEXT_PASSWORDS=true`
//! - `ADMIN_SESSION_TOKEN` / `SUPER_ADMIN_SESSION_TOKEN` - Per-role session
//!   signing secrets (min 32 chars, high entropy)
//! - `ADMIN_ALLOWED_KEYS` - Comma-separated default allow-list for the admin role
//!
//! Missing authentication variables do not stop the server: the login
//! endpoint fails closed with a 500 instead.
//!
//! ## Optional
//! - `SITE_DATABASE_URL` - `PostgreSQL` connection string (falls back to
//!   `DATABASE_URL`; without either the in-memory store is used)
//! - `SITE_HOST` - Bind address (default: 127.0.0.1)
//! - `SITE_PORT` - Listen port (default: 3000)
//! - `SITE_BASE_URL` - Public URL (default: <http://localhost:3000>)
//! - `SESSION_MAX_AGE_SECS` - Session lifetime (default: 43200, 12 hours)
//! - `TRUST_PROXY_HEADERS` - Key the login throttle on proxy headers (default: false)
//! - `ALLOW_PLAINTEXT_PASSWORDS` - Accept legacy plaintext passwords (default: false)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//!
//! ## Optional (TLS)
//! - `SITE_TLS_CERT` - PEM-encoded certificate chain
//! - `SITE_TLS_KEY` - PEM-encoded private key

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};

use argon2::PasswordHash;
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

use mrtc_core::AdminRole;

use crate::services::policy::clean_keys;

const MIN_SESSION_SECRET_LENGTH: usize = 32;
const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;
const DEFAULT_SESSION_MAX_AGE_SECS: i64 = 12 * 60 * 60;
const MAX_SESSION_MAX_AGE_SECS: i64 = 30 * 24 * 60 * 60;

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "secret",
    "password",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
    "put-your",
    "add-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Site application configuration.
#[derive(Debug, Clone)]
pub struct SiteConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: Option<SecretString>,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL of the site
    pub base_url: String,
    /// Admin authentication configuration
    pub auth: AuthConfig,
    /// Whether client addresses may be read from proxy headers
    pub trust_proxy_headers: bool,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g., "development", "staging", "production")
    pub sentry_environment: Option<String>,
    /// Sentry error sample rate (0.0 to 1.0)
    pub sentry_sample_rate: f32,
    /// Sentry traces sample rate for performance monitoring (0.0 to 1.0)
    pub sentry_traces_sample_rate: f32,
    /// TLS configuration for HTTPS (optional)
    pub tls: Option<TlsConfig>,
}

/// Login credentials configured for one role.
///
/// Implements `Debug` manually to redact the password material.
#[derive(Clone, Default)]
pub struct RoleCredentials {
    /// Login id
    pub id: Option<String>,
    /// Argon2 PHC string (preferred)
    pub password_hash: Option<SecretString>,
    /// Legacy plaintext password
    pub password: Option<SecretString>,
}

impl std::fmt::Debug for RoleCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RoleCredentials")
            .field("id", &self.id)
            .field(
                "password_hash",
                &self.password_hash.as_ref().map(|_| "[REDACTED]"),
            )
            .field("password", &self.password.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

impl RoleCredentials {
    fn from_env(prefix: &str) -> Result<Self, ConfigError> {
        let password_hash = match get_optional_env(&format!("{prefix}_PASSWORD_HASH")) {
            Some(hash) => {
                validate_password_hash(&hash, &format!("{prefix}_PASSWORD_HASH"))?;
                Some(SecretString::from(hash))
            }
            None => None,
        };

        Ok(Self {
            id: get_optional_env(&format!("{prefix}_ID")),
            password_hash,
            password: get_optional_env(&format!("{prefix}_PASSWORD")).map(SecretString::from),
        })
    }
}

/// Admin authentication configuration.
///
/// Implements `Debug` manually to redact the session secrets.
#[derive(Clone)]
pub struct AuthConfig {
    /// Credentials of the `admin` role
    pub admin: RoleCredentials,
    /// Credentials of the `super` role
    pub super_admin: RoleCredentials,
    /// Session signing secret of the `admin` role
    pub admin_session_secret: Option<SecretString>,
    /// Session signing secret of the `super` role
    pub super_session_secret: Option<SecretString>,
    /// Session lifetime in seconds
    pub session_max_age_secs: i64,
    /// Accept legacy plaintext passwords
    pub allow_plaintext_passwords: bool,
    /// Default allow-list from `ADMIN_ALLOWED_KEYS`
    pub admin_allowed_keys: Option<Vec<String>>,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let redact = |s: &Option<SecretString>| s.as_ref().map(|_| "[REDACTED]");
        f.debug_struct("AuthConfig")
            .field("admin", &self.admin)
            .field("super_admin", &self.super_admin)
            .field("admin_session_secret", &redact(&self.admin_session_secret))
            .field("super_session_secret", &redact(&self.super_session_secret))
            .field("session_max_age_secs", &self.session_max_age_secs)
            .field("allow_plaintext_passwords", &self.allow_plaintext_passwords)
            .field("admin_allowed_keys", &self.admin_allowed_keys)
            .finish()
    }
}

impl AuthConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let admin_session_secret = get_optional_session_secret("ADMIN_SESSION_TOKEN")?;
        let super_session_secret = get_optional_session_secret("SUPER_ADMIN_SESSION_TOKEN")?;

        let session_max_age_secs = get_env_or_default(
            "SESSION_MAX_AGE_SECS",
            &DEFAULT_SESSION_MAX_AGE_SECS.to_string(),
        )
        .parse::<i64>()
        .map_err(|e| ConfigError::InvalidEnvVar("SESSION_MAX_AGE_SECS".to_string(), e.to_string()))?;
        if !(60..=MAX_SESSION_MAX_AGE_SECS).contains(&session_max_age_secs) {
            return Err(ConfigError::InvalidEnvVar(
                "SESSION_MAX_AGE_SECS".to_string(),
                format!("must be between 60 and {MAX_SESSION_MAX_AGE_SECS}"),
            ));
        }

        Ok(Self {
            admin: RoleCredentials::from_env("ADMIN")?,
            super_admin: RoleCredentials::from_env("SUPER_ADMIN")?,
            admin_session_secret,
            super_session_secret,
            session_max_age_secs,
            allow_plaintext_passwords: get_bool_env("ALLOW_PLAINTEXT_PASSWORDS")?,
            admin_allowed_keys: get_optional_env("ADMIN_ALLOWED_KEYS")
                .and_then(|raw| parse_key_list(&raw)),
        })
    }

    /// Credentials configured for `role`.
    #[must_use]
    pub const fn credentials(&self, role: AdminRole) -> &RoleCredentials {
        match role {
            AdminRole::Admin => &self.admin,
            AdminRole::Super => &self.super_admin,
        }
    }

    /// Session signing secret configured for `role`.
    #[must_use]
    pub const fn session_secret(&self, role: AdminRole) -> Option<&SecretString> {
        match role {
            AdminRole::Admin => self.admin_session_secret.as_ref(),
            AdminRole::Super => self.super_session_secret.as_ref(),
        }
    }

    /// Whether both login ids are configured.
    ///
    /// Login refuses to run without them.
    #[must_use]
    pub const fn ids_configured(&self) -> bool {
        self.admin.id.is_some() && self.super_admin.id.is_some()
    }

    /// Log warnings for risky but accepted settings.
    pub fn warn_on_weak_settings(&self) {
        for role in AdminRole::ALL {
            let creds = self.credentials(role);
            if creds.password.is_some() && creds.password_hash.is_none() {
                if self.allow_plaintext_passwords {
                    tracing::warn!(%role, "Plaintext password login is enabled; configure a password hash instead");
                } else {
                    tracing::warn!(%role, "Plaintext password is set but ignored (ALLOW_PLAINTEXT_PASSWORDS is off)");
                }
            }
            if self.session_secret(role).is_none() {
                tracing::warn!(%role, "Session token is not configured; logins for this role will fail");
            }
        }
        if !self.ids_configured() {
            tracing::warn!("ADMIN_ID / SUPER_ADMIN_ID are not both set; admin login is disabled");
        }
    }
}

/// TLS configuration for HTTPS.
#[derive(Clone)]
pub struct TlsConfig {
    /// PEM-encoded certificate chain
    pub cert_pem: String,
    /// PEM-encoded private key
    pub key_pem: SecretString,
}

impl std::fmt::Debug for TlsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TlsConfig")
            .field("cert_pem", &"[CERTIFICATE]")
            .field("key_pem", &"[REDACTED]")
            .finish()
    }
}

impl TlsConfig {
    fn from_env() -> Result<Option<Self>, ConfigError> {
        let cert_pem = get_optional_env("SITE_TLS_CERT");
        let key_pem = get_optional_env("SITE_TLS_KEY");

        match (cert_pem, key_pem) {
            (Some(cert), Some(key)) => Ok(Some(Self {
                cert_pem: cert,
                key_pem: SecretString::from(key),
            })),
            (None, None) => Ok(None),
            _ => Err(ConfigError::InvalidEnvVar(
                "SITE_TLS_*".to_string(),
                "Both SITE_TLS_CERT and SITE_TLS_KEY must be set together".to_string(),
            )),
        }
    }
}

impl SiteConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if variables are invalid, or if secrets that are
    /// present fail validation (length, placeholder detection, entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let database_url = get_database_url("SITE_DATABASE_URL");
        let host = get_env_or_default("SITE_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("SITE_HOST".to_string(), e.to_string()))?;
        let port = get_env_or_default("SITE_PORT", "3000")
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidEnvVar("SITE_PORT".to_string(), e.to_string()))?;
        let base_url = get_env_or_default("SITE_BASE_URL", "http://localhost:3000");
        url::Url::parse(&base_url)
            .map_err(|e| ConfigError::InvalidEnvVar("SITE_BASE_URL".to_string(), e.to_string()))?;

        let auth = AuthConfig::from_env()?;
        let trust_proxy_headers = get_bool_env("TRUST_PROXY_HEADERS")?;
        let sentry_dsn = get_optional_env("SENTRY_DSN");
        let sentry_environment = get_optional_env("SENTRY_ENVIRONMENT");
        let sentry_sample_rate = get_optional_env("SENTRY_SAMPLE_RATE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(1.0);
        let sentry_traces_sample_rate = get_optional_env("SENTRY_TRACES_SAMPLE_RATE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(0.1);
        let tls = TlsConfig::from_env()?;

        Ok(Self {
            database_url,
            host,
            port,
            base_url,
            auth,
            trust_proxy_headers,
            sentry_dsn,
            sentry_environment,
            sentry_sample_rate,
            sentry_traces_sample_rate,
            tls,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether cookies must carry the `Secure` attribute.
    #[must_use]
    pub fn secure_cookies(&self) -> bool {
        self.base_url.starts_with("https://")
    }
}

/// Split a comma-separated key list, trimming entries and dropping empty
/// ones and duplicates. Returns `None` when nothing is left.
#[must_use]
pub fn parse_key_list(raw: &str) -> Option<Vec<String>> {
    let keys = clean_keys(raw.split(','));
    (!keys.is_empty()).then_some(keys)
}

// =============================================================================
// Helpers
// =============================================================================

/// Get database URL with fallback to generic `DATABASE_URL`.
fn get_database_url(primary_key: &str) -> Option<SecretString> {
    get_optional_env(primary_key)
        .or_else(|| get_optional_env("DATABASE_URL"))
        .map(SecretString::from)
}

/// Get an optional environment variable. Empty values count as unset.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    get_optional_env(key).unwrap_or_else(|| default.to_string())
}

/// Parse a boolean flag; unset means `false`.
fn get_bool_env(key: &str) -> Result<bool, ConfigError> {
    match get_optional_env(key).as_deref().map(str::to_ascii_lowercase).as_deref() {
        None | Some("0" | "false" | "no" | "off") => Ok(false),
        Some("1" | "true" | "yes" | "on") => Ok(true),
        Some(other) => Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            format!("expected a boolean, got '{other}'"),
        )),
    }
}

/// Load an optional session secret, validating it when present.
fn get_optional_session_secret(key: &str) -> Result<Option<SecretString>, ConfigError> {
    let Some(value) = get_optional_env(key) else {
        return Ok(None);
    };
    validate_secret_strength(&value, key)?;
    let secret = SecretString::from(value);
    validate_session_secret(&secret, key)?;
    Ok(Some(secret))
}

/// Check that a password hash is a parseable PHC string.
fn validate_password_hash(hash: &str, var_name: &str) -> Result<(), ConfigError> {
    PasswordHash::new(hash)
        .map(|_| ())
        .map_err(|e| ConfigError::InvalidEnvVar(var_name.to_string(), format!("not a PHC hash: {e}")))
}

/// Validate that a session secret meets minimum length requirements.
fn validate_session_secret(secret: &SecretString, var_name: &str) -> Result<(), ConfigError> {
    let value = secret.expose_secret();
    if value.len() < MIN_SESSION_SECRET_LENGTH {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "must be at least {} characters (got {})",
                MIN_SESSION_SECRET_LENGTH,
                value.len()
            ),
        ));
    }
    Ok(())
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.chars().count() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)] // Character count will never exceed f64 precision
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use `mrtc gen-secret`."
            ),
        ));
    }

    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const STRONG_SECRET: &str = "q8Vd2kLx9TzR4mWp7HsB3nYc6JfA1uEg";

    /// Every variable `from_env` reads, cleared so host settings cannot leak in.
    fn cleared_env() -> Vec<(&'static str, Option<&'static str>)> {
        [
            "SITE_DATABASE_URL",
            "DATABASE_URL",
            "SITE_HOST",
            "SITE_PORT",
            "SITE_BASE_URL",
            "ADMIN_ID",
            "ADMIN_PASSWORD",
            "ADMIN_PASSWORD_HASH",
            "SUPER_ADMIN_ID",
            "SUPER_ADMIN_PASSWORD",
            "SUPER_ADMIN_PASSWORD_HASH",
            "ADMIN_SESSION_TOKEN",
            "SUPER_ADMIN_SESSION_TOKEN",
            "ADMIN_ALLOWED_KEYS",
            "SESSION_MAX_AGE_SECS",
            "TRUST_PROXY_HEADERS",
            "ALLOW_PLAINTEXT_PASSWORDS",
            "SITE_TLS_CERT",
            "SITE_TLS_KEY",
        ]
        .into_iter()
        .map(|k| (k, None))
        .collect()
    }

    fn with_env<R>(overrides: &[(&'static str, &'static str)], f: impl FnOnce() -> R) -> R {
        let mut vars = cleared_env();
        for (key, value) in overrides {
            vars.retain(|(k, _)| k != key);
            vars.push((key, Some(value)));
        }
        temp_env::with_vars(vars, f)
    }

    #[test]
    fn test_shannon_entropy_empty() {
        assert!(shannon_entropy("").abs() < f64::EPSILON);
    }

    #[test]
    fn test_shannon_entropy_two_chars() {
        let entropy = shannon_entropy("abababab");
        assert!((entropy - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_validate_secret_strength_placeholder() {
        let err = validate_secret_strength("your-session-token-here", "TEST_VAR").unwrap_err();
        assert!(matches!(err, ConfigError::InsecureSecret(_, _)));
    }

    #[test]
    fn test_validate_secret_strength_low_entropy() {
        let err = validate_secret_strength(&"ab".repeat(20), "TEST_VAR").unwrap_err();
        assert!(matches!(err, ConfigError::InsecureSecret(_, _)));
    }

    #[test]
    fn test_validate_secret_strength_valid() {
        assert!(validate_secret_strength(STRONG_SECRET, "TEST_VAR").is_ok());
    }

    #[test]
    fn test_validate_session_secret_too_short() {
        let secret = SecretString::from("short");
        assert!(validate_session_secret(&secret, "TEST_SESSION").is_err());
    }

    #[test]
    fn test_parse_key_list() {
        assert_eq!(
            parse_key_list(" home, company ,,home,support "),
            Some(vec!["home".to_string(), "company".to_string(), "support".to_string()])
        );
        assert_eq!(parse_key_list(" , ,"), None);
    }

    #[test]
    fn test_from_env_defaults() {
        let config = with_env(&[], || SiteConfig::from_env().unwrap());
        assert!(config.database_url.is_none());
        assert_eq!(config.socket_addr().to_string(), "127.0.0.1:3000");
        assert!(!config.secure_cookies());
        assert!(!config.trust_proxy_headers);
        assert!(!config.auth.ids_configured());
        assert!(config.auth.session_secret(AdminRole::Super).is_none());
        assert_eq!(config.auth.session_max_age_secs, DEFAULT_SESSION_MAX_AGE_SECS);
        assert!(config.auth.admin_allowed_keys.is_none());
    }

    #[test]
    fn test_from_env_reads_auth_settings() {
        let config = with_env(
            &[
                ("ADMIN_ID", "editor"),
                ("SUPER_ADMIN_ID", "root"),
                ("SUPER_ADMIN_SESSION_TOKEN", STRONG_SECRET),
                ("ADMIN_ALLOWED_KEYS", "home,support"),
                ("TRUST_PROXY_HEADERS", "true"),
                ("SITE_BASE_URL", "https://mrtc.kr"),
            ],
            || SiteConfig::from_env().unwrap(),
        );
        assert!(config.auth.ids_configured());
        assert!(config.auth.session_secret(AdminRole::Super).is_some());
        assert!(config.auth.session_secret(AdminRole::Admin).is_none());
        assert_eq!(
            config.auth.admin_allowed_keys,
            Some(vec!["home".to_string(), "support".to_string()])
        );
        assert!(config.trust_proxy_headers);
        assert!(config.secure_cookies());
    }

    #[test]
    fn test_from_env_rejects_weak_session_token() {
        let result = with_env(&[("ADMIN_SESSION_TOKEN", "changeme")], SiteConfig::from_env);
        assert!(matches!(result, Err(ConfigError::InsecureSecret(_, _))));
    }

    #[test]
    fn test_from_env_rejects_malformed_password_hash() {
        let result = with_env(&[("ADMIN_PASSWORD_HASH", "scrypt:abc:def")], SiteConfig::from_env);
        assert!(matches!(result, Err(ConfigError::InvalidEnvVar(_, _))));
    }

    #[test]
    fn test_from_env_rejects_bad_bool() {
        let result = with_env(&[("TRUST_PROXY_HEADERS", "maybe")], SiteConfig::from_env);
        assert!(matches!(result, Err(ConfigError::InvalidEnvVar(_, _))));
    }

    #[test]
    fn test_from_env_rejects_partial_tls() {
        let result = with_env(&[("SITE_TLS_CERT", "-----BEGIN")], SiteConfig::from_env);
        assert!(matches!(result, Err(ConfigError::InvalidEnvVar(_, _))));
    }

    #[test]
    fn test_auth_config_debug_redacts_secrets() {
        let config = with_env(
            &[
                ("ADMIN_ID", "editor"),
                ("ADMIN_PASSWORD", "hunter2-plaintext"),
                ("ADMIN_SESSION_TOKEN", STRONG_SECRET),
            ],
            || SiteConfig::from_env().unwrap(),
        );

        let debug_output = format!("{:?}", config.auth);

        assert!(debug_output.contains("editor"));
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("hunter2-plaintext"));
        assert!(!debug_output.contains(STRONG_SECRET));
    }
}
