// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Signing-key sources for token verification.

use jsonwebtoken::{Algorithm, DecodingKey};

use super::jwks::JwksManager;

/// Failure to produce a key for signature verification.
///
/// Never shown to clients: the validator reports every variant as a bad
/// signature.
#[derive(Debug, thiserror::Error)]
pub enum KeyError {
    #[error("failed to fetch JWKS: {0}")]
    Fetch(String),
    #[error("JWKS fetch is backing off after repeated failures")]
    BackingOff,
    #[error("no matching key found in JWKS")]
    NoMatchingKey,
    #[error("unsupported {0}")]
    Unsupported(String),
    #[error("invalid key material: {0}")]
    InvalidKey(String),
}

/// Where the validator gets its verification key from.
#[derive(Clone)]
pub enum KeySource {
    /// Keys published by the issuer, cached with a TTL.
    Jwks(JwksManager),
    /// Fixed key material configured at startup.
    Static {
        key: DecodingKey,
        algorithm: Algorithm,
    },
}

impl KeySource {
    /// HS256 shared secret.
    pub fn hmac_secret(secret: &[u8]) -> Self {
        KeySource::Static {
            key: DecodingKey::from_secret(secret),
            algorithm: Algorithm::HS256,
        }
    }

    /// RS256 public key in PEM form.
    pub fn rsa_pem(pem: &[u8]) -> Result<Self, KeyError> {
        let key = DecodingKey::from_rsa_pem(pem).map_err(|e| KeyError::InvalidKey(e.to_string()))?;
        Ok(KeySource::Static {
            key,
            algorithm: Algorithm::RS256,
        })
    }

    /// Resolve the key for a token, using its `kid` header when present.
    pub async fn decoding_key(&self, kid: Option<&str>) -> Result<(DecodingKey, Algorithm), KeyError> {
        match self {
            KeySource::Jwks(jwks) => match kid {
                Some(kid) => jwks.get_decoding_key(kid).await,
                None => jwks.get_any_decoding_key().await,
            },
            KeySource::Static { key, algorithm } => Ok((key.clone(), *algorithm)),
        }
    }

    /// The JWKS manager, if keys come from the issuer.
    pub fn jwks(&self) -> Option<&JwksManager> {
        match self {
            KeySource::Jwks(jwks) => Some(jwks),
            KeySource::Static { .. } => None,
        }
    }
}

impl std::fmt::Debug for KeySource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            KeySource::Jwks(jwks) => f.debug_tuple("Jwks").field(&jwks.jwks_url()).finish(),
            KeySource::Static { algorithm, .. } => {
                f.debug_struct("Static").field("algorithm", algorithm).finish()
            }
        }
    }
}
