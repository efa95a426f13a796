//! Reviewer roles.

use std::fmt;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Access level of a dashboard user.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Read-only access. Everyone without an assignment is a viewer.
    #[default]
    Viewer,
    /// May change review state.
    Reviewer,
    /// May change review state.
    Admin,
}

impl Role {
    /// Maps a stored role name to a role. Unknown names are viewers.
    #[must_use]
    pub fn from_stored(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "reviewer" => Self::Reviewer,
            "admin" => Self::Admin,
            _ => Self::Viewer,
        }
    }

    /// Returns `true` if the role may mutate review state.
    #[must_use]
    pub const fn can_write(self) -> bool {
        matches!(self, Self::Reviewer | Self::Admin)
    }

    /// Lower-case role name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Viewer => "viewer",
            Self::Reviewer => "reviewer",
            Self::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of a role lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoleAssignment {
    /// Effective role.
    pub role: Role,
    /// Whether the email has an entry in the reviewer directory.
    pub exists: bool,
}

impl RoleAssignment {
    /// Assignment for an email with no directory entry.
    pub const UNKNOWN: Self = Self {
        role: Role::Viewer,
        exists: false,
    };
}

/// Canonical form of an email used for directory lookups.
#[must_use]
pub fn normalize_email(email: &str) -> String {
    email.trim().to_ascii_lowercase()
}

/// Minimal syntactic email check: one `@`, non-empty local part, and a
/// dotted domain without whitespace.
#[must_use]
pub fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !email.chars().any(char::is_whitespace)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writers_are_reviewer_and_admin() {
        assert!(!Role::Viewer.can_write());
        assert!(Role::Reviewer.can_write());
        assert!(Role::Admin.can_write());
    }

    #[test]
    fn unknown_stored_role_is_viewer() {
        assert_eq!(Role::from_stored("Reviewer"), Role::Reviewer);
        assert_eq!(Role::from_stored("owner"), Role::Viewer);
    }

    #[test]
    fn email_validation() {
        assert!(is_valid_email("qa@example.com"));
        assert!(!is_valid_email("qa@example"));
        assert!(!is_valid_email("@example.com"));
        assert!(!is_valid_email("qa@@example.com"));
        assert!(!is_valid_email("q a@example.com"));
    }

    #[test]
    fn email_normalization() {
        assert_eq!(normalize_email("  QA@Example.COM "), "qa@example.com");
    }
}
