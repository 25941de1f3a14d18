//! CLI command implementations.

pub mod migrate;
pub mod secrets;
pub mod seed;

use secrecy::SecretString;

/// Errors shared by the database commands.
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error("Missing environment variable: SITE_DATABASE_URL (or DATABASE_URL)")]
    MissingDatabaseUrl,
}

/// Database URL from `SITE_DATABASE_URL`, falling back to `DATABASE_URL`.
///
/// # Errors
///
/// Returns `CommandError::MissingDatabaseUrl` if neither is set.
pub fn database_url() -> Result<SecretString, CommandError> {
    dotenvy::dotenv().ok();

    ["SITE_DATABASE_URL", "DATABASE_URL"]
        .into_iter()
        .find_map(|key| std::env::var(key).ok().filter(|v| !v.trim().is_empty()))
        .map(SecretString::from)
        .ok_or(CommandError::MissingDatabaseUrl)
}

#[cfg(test)]
mod tests {
    use secrecy::ExposeSecret;

    use super::*;

    #[test]
    fn test_database_url_fallback() {
        temp_env::with_vars(
            [
                ("SITE_DATABASE_URL", None),
                ("DATABASE_URL", Some("postgres://localhost/mrtc")),
            ],
            || {
                let url = database_url().ok();
                assert_eq!(
                    url.as_ref().map(|u| u.expose_secret().to_string()).as_deref(),
                    Some("postgres://localhost/mrtc")
                );
            },
        );
    }

    #[test]
    fn test_database_url_missing() {
        temp_env::with_vars(
            [("SITE_DATABASE_URL", None::<&str>), ("DATABASE_URL", None)],
            || {
                assert!(matches!(
                    database_url(),
                    Err(CommandError::MissingDatabaseUrl)
                ));
            },
        );
    }
}
