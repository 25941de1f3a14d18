//! Admin role type.

use serde::{Deserialize, Serialize};

/// Error returned when a string is not a known admin role.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid admin role: {0}")]
pub struct AdminRoleParseError(pub String);

/// Admin role with two permission tiers.
///
/// The wire form (`"admin"` / `"super"`) is used in session cookies and in
/// JSON responses, so it must stay stable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdminRole {
    /// Content administrator restricted to the allowed content keys.
    Admin,
    /// System operator: every content key, accounts, policy, backup.
    Super,
}

impl AdminRole {
    /// All roles, in the order credentials are checked at login.
    pub const ALL: [Self; 2] = [Self::Super, Self::Admin];

    /// Returns the wire name of the role.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Super => "super",
        }
    }

    /// Whether this role satisfies a route that requires `required`.
    ///
    /// `Super` satisfies everything; `Admin` only satisfies `Admin`.
    #[must_use]
    pub const fn satisfies(self, required: Self) -> bool {
        matches!((self, required), (Self::Super, _) | (Self::Admin, Self::Admin))
    }
}

impl std::fmt::Display for AdminRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for AdminRole {
    type Err = AdminRoleParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Self::Admin),
            "super" => Ok(Self::Super),
            _ => Err(AdminRoleParseError(s.to_owned())),
        }
    }
}
