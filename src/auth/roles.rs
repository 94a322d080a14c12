// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Roles and authority strings.
//!
//! Every permission the gate checks is a plain authority string. Roles from
//! token claims become `ROLE_<NAME>` and scopes become `SCOPE_<name>`.

/// Prefix applied to role claim values.
pub const ROLE_PREFIX: &str = "ROLE_";

/// Prefix applied to scope claim values.
pub const SCOPE_PREFIX: &str = "SCOPE_";

/// Roles the profile API knows about.
///
/// ## Role Hierarchy
///
/// - `Admin` - May create, update and delete profiles
/// - `User` - May read profiles and the secured user endpoints
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Full administrative access
    Admin,
    /// Normal authenticated user
    User,
}

impl Role {
    /// The authority string granted by this role.
    pub fn authority(&self) -> &'static str {
        match self {
            Role::Admin => "ROLE_ADMIN",
            Role::User => "ROLE_USER",
        }
    }
}

/// Normalise a role claim value into an authority.
///
/// Values already carrying the `ROLE_` prefix are kept as is, anything else
/// is upper-cased and prefixed.
pub fn role_authority(value: &str) -> String {
    if value.starts_with(ROLE_PREFIX) {
        value.to_string()
    } else {
        format!("{ROLE_PREFIX}{}", value.to_uppercase())
    }
}

/// Normalise a scope into an authority. Scopes are case sensitive.
pub fn scope_authority(scope: &str) -> String {
    format!("{SCOPE_PREFIX}{scope}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_authorities() {
        assert_eq!(Role::Admin.authority(), "ROLE_ADMIN");
        assert_eq!(Role::User.authority(), "ROLE_USER");
    }

    #[test]
    fn role_values_are_prefixed_once() {
        assert_eq!(role_authority("admin"), "ROLE_ADMIN");
        assert_eq!(role_authority("ROLE_ADMIN"), "ROLE_ADMIN");
        assert_eq!(role_authority("editor"), "ROLE_EDITOR");
    }

    #[test]
    fn scopes_keep_their_case() {
        assert_eq!(scope_authority("read:messages"), "SCOPE_read:messages");
        assert_eq!(scope_authority("Write:All"), "SCOPE_Write:All");
    }
}
