// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! Configuration is loaded from the environment once at startup.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `8080` |
//! | `AUTH0_DOMAIN` | Tenant domain; derives issuer and JWKS URL | - |
//! | `AUTH0_ISSUER` | Expected JWT issuer claim | `https://<domain>/` |
//! | `AUTH0_AUDIENCE` | Expected JWT audience claim | Required |
//! | `AUTH0_JWKS_URL` | JWKS endpoint | `https://<domain>/.well-known/jwks.json` |
//! | `AUTH0_SIGNING_SECRET` | HS256 shared secret instead of JWKS | - |
//! | `AUTH0_PUBLIC_KEY_PATH` | RS256 public key PEM instead of JWKS | - |
//! | `AUTH0_ROLES_CLAIM` | Namespaced custom claim holding roles | - |
//! | `JWKS_CACHE_TTL_SECS` | JWKS cache TTL | `300` |
//! | `CLOCK_SKEW_LEEWAY_SECS` | Tolerance for `exp`/`nbf` | `60` |
//! | `SECURED_ROUTE` | Extra path pattern requiring authentication | - |
//! | `TLS_CERT_PATH` / `TLS_KEY_PATH` | Serve HTTPS with this certificate | plain HTTP |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |

use std::path::PathBuf;
use std::time::Duration;

use url::Url;

use crate::auth::{JwksManager, KeySource, TokenValidator};
use crate::auth::jwks::DEFAULT_CACHE_TTL;
use crate::auth::validator::{DEFAULT_LEEWAY_SECS, MAX_LEEWAY_SECS};

pub const HOST_ENV: &str = "HOST";
pub const PORT_ENV: &str = "PORT";
pub const AUTH0_DOMAIN_ENV: &str = "AUTH0_DOMAIN";
pub const AUTH0_ISSUER_ENV: &str = "AUTH0_ISSUER";
pub const AUTH0_AUDIENCE_ENV: &str = "AUTH0_AUDIENCE";
pub const AUTH0_JWKS_URL_ENV: &str = "AUTH0_JWKS_URL";
pub const AUTH0_SIGNING_SECRET_ENV: &str = "AUTH0_SIGNING_SECRET";
pub const AUTH0_PUBLIC_KEY_PATH_ENV: &str = "AUTH0_PUBLIC_KEY_PATH";
pub const AUTH0_ROLES_CLAIM_ENV: &str = "AUTH0_ROLES_CLAIM";
pub const JWKS_CACHE_TTL_ENV: &str = "JWKS_CACHE_TTL_SECS";
pub const LEEWAY_ENV: &str = "CLOCK_SKEW_LEEWAY_SECS";
pub const SECURED_ROUTE_ENV: &str = "SECURED_ROUTE";
pub const TLS_CERT_PATH_ENV: &str = "TLS_CERT_PATH";
pub const TLS_KEY_PATH_ENV: &str = "TLS_KEY_PATH";
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

/// Default tracing filter when `RUST_LOG` is unset.
pub const DEFAULT_LOG_FILTER: &str = "info,tower_http=debug";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{name} has an invalid value {value:?}: {reason}")]
    Invalid {
        name: &'static str,
        value: String,
        reason: String,
    },
    #[error("no signing key source: set AUTH0_SIGNING_SECRET, AUTH0_PUBLIC_KEY_PATH, AUTH0_JWKS_URL or AUTH0_DOMAIN")]
    NoKeySource,
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid public key in {path}: {reason}")]
    Key { path: PathBuf, reason: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    Json,
    #[default]
    Pretty,
}

/// Where verification keys come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeySourceSettings {
    Secret(String),
    PublicKeyPem(PathBuf),
    Jwks { url: String, cache_ttl: Duration },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthSettings {
    pub issuer: String,
    pub audience: String,
    pub keys: KeySourceSettings,
    pub roles_claim: Option<String>,
    pub leeway_secs: u64,
    pub secured_route: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TlsSettings {
    pub cert_path: PathBuf,
    pub key_path: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub log_format: LogFormat,
    pub tls: Option<TlsSettings>,
    pub auth: AuthSettings,
}

impl AppConfig {
    /// Load from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load from any variable lookup. Empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let host = var(HOST_ENV).unwrap_or_else(|| "0.0.0.0".to_string());
        let port = parse_or(var(PORT_ENV), PORT_ENV, 8080u16)?;

        let log_format = match var(LOG_FORMAT_ENV).as_deref() {
            None | Some("pretty") => LogFormat::Pretty,
            Some("json") => LogFormat::Json,
            Some(other) => {
                return Err(ConfigError::Invalid {
                    name: LOG_FORMAT_ENV,
                    value: other.to_string(),
                    reason: "expected `json` or `pretty`".to_string(),
                })
            }
        };

        let tls = match (var(TLS_CERT_PATH_ENV), var(TLS_KEY_PATH_ENV)) {
            (Some(cert), Some(key)) => Some(TlsSettings {
                cert_path: cert.into(),
                key_path: key.into(),
            }),
            (None, None) => None,
            (Some(_), None) => return Err(ConfigError::Missing(TLS_KEY_PATH_ENV)),
            (None, Some(_)) => return Err(ConfigError::Missing(TLS_CERT_PATH_ENV)),
        };

        let domain = var(AUTH0_DOMAIN_ENV);
        let issuer = var(AUTH0_ISSUER_ENV)
            .or_else(|| domain.as_ref().map(|d| format!("https://{d}/")))
            .ok_or(ConfigError::Missing(AUTH0_ISSUER_ENV))?;
        let audience = var(AUTH0_AUDIENCE_ENV).ok_or(ConfigError::Missing(AUTH0_AUDIENCE_ENV))?;

        let keys = if let Some(secret) = var(AUTH0_SIGNING_SECRET_ENV) {
            KeySourceSettings::Secret(secret)
        } else if let Some(path) = var(AUTH0_PUBLIC_KEY_PATH_ENV) {
            KeySourceSettings::PublicKeyPem(path.into())
        } else {
            let url = var(AUTH0_JWKS_URL_ENV)
                .or_else(|| {
                    domain
                        .as_ref()
                        .map(|d| format!("https://{d}/.well-known/jwks.json"))
                })
                .ok_or(ConfigError::NoKeySource)?;
            check_jwks_url(&url)?;
            let ttl = parse_or(
                var(JWKS_CACHE_TTL_ENV),
                JWKS_CACHE_TTL_ENV,
                DEFAULT_CACHE_TTL.as_secs(),
            )?;
            KeySourceSettings::Jwks {
                url,
                cache_ttl: Duration::from_secs(ttl),
            }
        };

        let leeway_secs = parse_or(var(LEEWAY_ENV), LEEWAY_ENV, DEFAULT_LEEWAY_SECS)?;
        if leeway_secs > MAX_LEEWAY_SECS {
            return Err(ConfigError::Invalid {
                name: LEEWAY_ENV,
                value: leeway_secs.to_string(),
                reason: format!("must be at most {MAX_LEEWAY_SECS} seconds"),
            });
        }

        Ok(Self {
            host,
            port,
            log_format,
            tls,
            auth: AuthSettings {
                issuer,
                audience,
                keys,
                roles_claim: var(AUTH0_ROLES_CLAIM_ENV),
                leeway_secs,
                secured_route: var(SECURED_ROUTE_ENV),
            },
        })
    }
}

impl AuthSettings {
    /// Build the token validator, reading key material if needed.
    pub fn validator(&self) -> Result<TokenValidator, ConfigError> {
        let keys = match &self.keys {
            KeySourceSettings::Secret(secret) => KeySource::hmac_secret(secret.as_bytes()),
            KeySourceSettings::PublicKeyPem(path) => {
                let pem = std::fs::read(path).map_err(|source| ConfigError::Io {
                    path: path.clone(),
                    source,
                })?;
                KeySource::rsa_pem(&pem).map_err(|e| ConfigError::Key {
                    path: path.clone(),
                    reason: e.to_string(),
                })?
            }
            KeySourceSettings::Jwks { url, cache_ttl } => {
                KeySource::Jwks(JwksManager::new(url.clone()).with_cache_ttl(*cache_ttl))
            }
        };

        let mut validator = TokenValidator::new(keys, self.issuer.clone(), self.audience.clone())
            .with_leeway(self.leeway_secs);
        if let Some(claim) = &self.roles_claim {
            validator = validator.with_roles_claim(claim.clone());
        }
        Ok(validator)
    }
}

fn parse_or<T>(value: Option<String>, name: &'static str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match value {
        None => Ok(default),
        Some(value) => match value.trim().parse() {
            Ok(parsed) => Ok(parsed),
            Err(e) => Err(ConfigError::Invalid {
                name,
                reason: e.to_string(),
                value,
            }),
        },
    }
}

/// JWKS must come over HTTPS, except from a loopback host.
fn check_jwks_url(raw: &str) -> Result<(), ConfigError> {
    let invalid = |reason: &str| ConfigError::Invalid {
        name: AUTH0_JWKS_URL_ENV,
        value: raw.to_string(),
        reason: reason.to_string(),
    };
    let url = Url::parse(raw).map_err(|e| invalid(&e.to_string()))?;
    let loopback = matches!(url.host_str(), Some("localhost" | "127.0.0.1" | "[::1]"));
    match url.scheme() {
        "https" => Ok(()),
        "http" if loopback => Ok(()),
        _ => Err(invalid("JWKS must be fetched over https")),
    }
}
