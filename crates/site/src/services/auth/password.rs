//! Credential validation for the two admin accounts.

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use secrecy::ExposeSecret;

use mrtc_core::AdminRole;

use crate::config::{AuthConfig, RoleCredentials};

/// Checks submitted credentials against the configured accounts.
#[derive(Debug, Clone)]
pub struct CredentialValidator {
    admin: RoleCredentials,
    super_admin: RoleCredentials,
    allow_plaintext: bool,
}

impl CredentialValidator {
    /// Create a validator from the authentication configuration.
    #[must_use]
    pub fn new(auth: &AuthConfig) -> Self {
        Self {
            admin: auth.admin.clone(),
            super_admin: auth.super_admin.clone(),
            allow_plaintext: auth.allow_plaintext_passwords,
        }
    }

    const fn credentials(&self, role: AdminRole) -> &RoleCredentials {
        match role {
            AdminRole::Admin => &self.admin,
            AdminRole::Super => &self.super_admin,
        }
    }

    /// Return the role whose credentials match, checking `super` first.
    ///
    /// Both roles are always evaluated so an unknown id costs the same as a
    /// wrong password.
    #[must_use]
    pub fn validate(&self, id: &str, password: &str) -> Option<AdminRole> {
        if password.is_empty() {
            return None;
        }

        let mut matched = None;
        for role in AdminRole::ALL {
            let creds = self.credentials(role);
            let id_ok = creds
                .id
                .as_deref()
                .is_some_and(|expected| constant_time_compare(expected, id));
            let password_ok = self.check_password(creds, password);
            if id_ok && password_ok && matched.is_none() {
                matched = Some(role);
            }
        }
        matched
    }

    fn check_password(&self, creds: &RoleCredentials, password: &str) -> bool {
        if let Some(hash) = &creds.password_hash {
            return verify_password(password, hash.expose_secret());
        }
        match &creds.password {
            Some(expected) if self.allow_plaintext => {
                constant_time_compare(expected.expose_secret(), password)
            }
            _ => false,
        }
    }
}

/// Hash a password using Argon2id.
///
/// # Errors
///
/// Returns an error if hashing fails.
pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
}

/// Verify a password against a PHC hash.
fn verify_password(password: &str, hash: &str) -> bool {
    let Ok(parsed_hash) = PasswordHash::new(hash) else {
        return false;
    };

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok()
}

/// Constant-time string comparison to prevent timing attacks.
fn constant_time_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result: u8 = 0;
    for (x, y) in a.bytes().zip(b.bytes()) {
        result |= x ^ y;
    }

    result == 0
}
