// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! JWT claims and the validated principal.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::roles::{role_authority, scope_authority};

/// Claims read from an access token.
///
/// Signature, `exp`, `iss`, `aud` and `nbf` are checked by the validator
/// before these are read, so only the claims the principal is built from are
/// typed. Everything else (roles, custom namespaced claims, email) stays in
/// `extra`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Subject (user ID)
    pub sub: String,

    /// Expiration timestamp
    pub exp: i64,

    /// Space-delimited OAuth2 scopes
    #[serde(default)]
    pub scope: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl TokenClaims {
    /// Scopes granted by the `scope` claim.
    pub fn scopes(&self) -> impl Iterator<Item = &str> {
        self.scope
            .as_deref()
            .unwrap_or_default()
            .split_whitespace()
    }

    /// Role values from `roles`, `authorities` and the optional namespaced
    /// roles claim. Each claim may be an array of strings or a
    /// space-delimited string.
    pub fn roles(&self, roles_claim: Option<&str>) -> Vec<String> {
        ["roles", "authorities"]
            .into_iter()
            .chain(roles_claim)
            .filter_map(|name| self.extra.get(name))
            .flat_map(string_values)
            .collect()
    }

    /// Authorities derived from roles and scopes.
    pub fn authorities(&self, roles_claim: Option<&str>) -> BTreeSet<String> {
        self.roles(roles_claim)
            .iter()
            .map(|role| role_authority(role))
            .chain(self.scopes().map(scope_authority))
            .collect()
    }
}

fn string_values(value: &Value) -> Vec<String> {
    match value {
        Value::String(s) => s.split_whitespace().map(str::to_string).collect(),
        Value::Array(items) => items
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    }
}

/// Authenticated caller, created per request from a validated token.
#[derive(Debug, Clone, PartialEq)]
pub struct Principal {
    /// Token subject
    pub subject: String,

    /// Normalised authorities (`ROLE_*`, `SCOPE_*`)
    pub authorities: BTreeSet<String>,

    /// Every claim of the token as received
    pub raw_claims: Map<String, Value>,

    /// Token expiration (Unix timestamp)
    pub expires_at: i64,
}

impl Principal {
    /// Build the principal from validated claims.
    pub fn from_claims(
        claims: TokenClaims,
        raw_claims: Map<String, Value>,
        roles_claim: Option<&str>,
    ) -> Self {
        Self {
            authorities: claims.authorities(roles_claim),
            subject: claims.sub,
            raw_claims,
            expires_at: claims.exp,
        }
    }

    pub fn has_authority(&self, authority: &str) -> bool {
        self.authorities.contains(authority)
    }

    pub fn has_scope(&self, scope: &str) -> bool {
        self.has_authority(&scope_authority(scope))
    }

    /// The `email` claim, if the token carries one.
    pub fn email(&self) -> Option<&str> {
        self.raw_claims.get("email").and_then(Value::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn claims(value: Value) -> TokenClaims {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn registered_claims_stay_in_extra() {
        let c = claims(json!({"sub": "a", "exp": 1, "aud": ["other", "api"], "iss": "https://issuer/"}));
        assert_eq!(c.extra["aud"], json!(["other", "api"]));
        assert!(c.authorities(None).is_empty());
    }

    #[test]
    fn authorities_union_roles_and_scopes() {
        let c = claims(json!({
            "sub": "auth0|1",
            "exp": 1,
            "scope": "read:messages openid",
            "roles": ["admin"],
            "authorities": "ROLE_USER",
        }));
        let authorities: Vec<_> = c.authorities(None).into_iter().collect();
        assert_eq!(
            authorities,
            vec!["ROLE_ADMIN", "ROLE_USER", "SCOPE_openid", "SCOPE_read:messages"]
        );
    }

    #[test]
    fn namespaced_roles_claim_is_opt_in() {
        let c = claims(json!({
            "sub": "auth0|1",
            "exp": 1,
            "https://example.com/roles": ["editor"],
        }));
        assert!(c.authorities(None).is_empty());
        assert!(c
            .authorities(Some("https://example.com/roles"))
            .contains("ROLE_EDITOR"));
    }

    #[test]
    fn principal_exposes_email_and_authorities() {
        let raw = json!({"sub": "auth0|1", "exp": 1700000000, "email": "bob@secure.com", "roles": ["user"]});
        let Value::Object(map) = raw.clone() else {
            unreachable!()
        };
        let principal = Principal::from_claims(claims(raw), map, None);

        assert_eq!(principal.subject, "auth0|1");
        assert_eq!(principal.email(), Some("bob@secure.com"));
        assert!(principal.has_authority("ROLE_USER"));
        assert!(!principal.has_authority("ROLE_ADMIN"));
        assert_eq!(principal.expires_at, 1700000000);
    }
}
