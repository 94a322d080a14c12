// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Bearer token validation.
//!
//! Checks run in a fixed order:
//!
//! 1. Structure (`Malformed`)
//! 2. Expiry (`Expired`), before the signature so an expired token is
//!    reported as expired whatever its signature
//! 3. Signature against the configured key source (`BadSignature`)
//! 4. Issuer, audience and not-before (`WrongIssuer`, `WrongAudience`,
//!    `NotYetValid`)

use chrono::Utc;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, decode_header, Validation};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use super::claims::{Principal, TokenClaims};
use super::keys::KeySource;
use super::AuthError;

/// Default clock skew tolerance (60 seconds).
pub const DEFAULT_LEEWAY_SECS: u64 = 60;

/// Largest clock skew tolerance accepted (one day).
pub const MAX_LEEWAY_SECS: u64 = 86_400;

/// Validates bearer tokens against one issuer and audience.
#[derive(Debug, Clone)]
pub struct TokenValidator {
    keys: KeySource,
    issuer: String,
    audience: String,
    roles_claim: Option<String>,
    leeway: u64,
}

impl TokenValidator {
    pub fn new(keys: KeySource, issuer: impl Into<String>, audience: impl Into<String>) -> Self {
        Self {
            keys,
            issuer: issuer.into(),
            audience: audience.into(),
            roles_claim: None,
            leeway: DEFAULT_LEEWAY_SECS,
        }
    }

    /// Also read roles from a namespaced custom claim.
    pub fn with_roles_claim(mut self, claim: impl Into<String>) -> Self {
        self.roles_claim = Some(claim.into());
        self
    }

    /// Clock skew tolerance applied to `exp` and `nbf`, capped at
    /// [`MAX_LEEWAY_SECS`].
    pub fn with_leeway(mut self, seconds: u64) -> Self {
        self.leeway = seconds.min(MAX_LEEWAY_SECS);
        self
    }

    pub fn key_source(&self) -> &KeySource {
        &self.keys
    }

    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    pub fn audience(&self) -> &str {
        &self.audience
    }

    /// Validate a raw bearer token and build the caller's principal.
    pub async fn validate(&self, raw: &str) -> Result<Principal, AuthError> {
        if raw.split('.').count() != 3 {
            return Err(AuthError::Malformed);
        }
        let header = decode_header(raw).map_err(|_| AuthError::Malformed)?;

        let raw_claims = jsonwebtoken::dangerous::insecure_decode::<Map<String, Value>>(raw)
            .map_err(|_| AuthError::Malformed)?
            .claims;
        let unverified: TokenClaims = serde_json::from_value(Value::Object(raw_claims.clone()))
            .map_err(|_| AuthError::Malformed)?;

        let now = Utc::now().timestamp();
        let leeway = i64::try_from(self.leeway).unwrap_or(i64::MAX);
        if now >= unverified.exp.saturating_add(leeway) {
            debug!(sub = %unverified.sub, exp = unverified.exp, "Rejected expired token");
            return Err(AuthError::Expired);
        }

        let (decoding_key, algorithm) = self
            .keys
            .decoding_key(header.kid.as_deref())
            .await
            .map_err(|e| {
                warn!(error = %e, kid = ?header.kid, "No usable signing key");
                AuthError::BadSignature
            })?;

        let mut validation = Validation::new(algorithm);
        validation.leeway = self.leeway;
        validation.validate_nbf = true;
        validation.set_issuer(&[&self.issuer]);
        validation.set_audience(&[&self.audience]);
        validation.set_required_spec_claims(&["exp", "sub"]);

        let token_data = decode::<TokenClaims>(raw, &decoding_key, &validation).map_err(|e| {
            let err = match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::Expired,
                ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => AuthError::BadSignature,
                ErrorKind::InvalidIssuer => AuthError::WrongIssuer,
                ErrorKind::InvalidAudience => AuthError::WrongAudience,
                ErrorKind::ImmatureSignature => AuthError::NotYetValid,
                ErrorKind::MissingRequiredClaim(claim) if claim == "iss" => AuthError::WrongIssuer,
                ErrorKind::MissingRequiredClaim(claim) if claim == "aud" => AuthError::WrongAudience,
                _ => AuthError::Malformed,
            };
            debug!(error = %e, sub = %unverified.sub, "Token rejected");
            err
        })?;

        Ok(Principal::from_claims(
            token_data.claims,
            raw_claims,
            self.roles_claim.as_deref(),
        ))
    }
}
