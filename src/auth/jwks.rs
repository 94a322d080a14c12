// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! JWKS (JSON Web Key Set) fetching and caching.
//!
//! ## Cache policy
//!
//! - A fresh entry (younger than the TTL) is served directly
//! - A stale entry is served immediately while one background task refreshes it
//! - A cold cache makes the caller wait for a single-flight fetch
//! - Failed fetches back off exponentially; no fetch is attempted while backing off
//! - An unknown `kid` forces one refresh (key rotation), at most every
//!   [`MIN_FORCED_REFRESH_INTERVAL`]

use std::sync::Arc;
use std::time::{Duration, Instant};

use jsonwebtoken::jwk::{AlgorithmParameters, Jwk, JwkSet, KeyAlgorithm};
use jsonwebtoken::{Algorithm, DecodingKey};
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};
use tracing::{debug, info, warn};

use super::keys::KeyError;

/// Default JWKS cache TTL (5 minutes).
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(300);

/// HTTP timeout for a single JWKS fetch.
const FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// First retry delay after a failed fetch; doubles per consecutive failure.
const BACKOFF_BASE: Duration = Duration::from_secs(1);

/// Upper bound for the retry delay.
const BACKOFF_MAX: Duration = Duration::from_secs(60);

/// Unknown key IDs trigger at most one refresh per interval.
pub const MIN_FORCED_REFRESH_INTERVAL: Duration = Duration::from_secs(30);

/// JWKS cache entry.
struct CacheEntry {
    jwks: Arc<JwkSet>,
    fetched_at: Instant,
}

/// Bookkeeping shared by whoever holds the refresh lock.
#[derive(Default)]
struct RefreshState {
    failures: u32,
    retry_at: Option<Instant>,
    last_forced: Option<Instant>,
}

impl RefreshState {
    fn backing_off(&self) -> bool {
        self.retry_at.is_some_and(|at| Instant::now() < at)
    }
}

fn backoff_delay(failures: u32) -> Duration {
    let exponent = failures.saturating_sub(1).min(6);
    (BACKOFF_BASE * 2u32.pow(exponent)).min(BACKOFF_MAX)
}

/// JWKS manager with caching.
///
/// Cloning is cheap; clones share the cache.
#[derive(Clone)]
pub struct JwksManager {
    /// JWKS endpoint URL
    jwks_url: String,
    /// Cache TTL
    cache_ttl: Duration,
    /// Cached JWKS
    cache: Arc<RwLock<Option<CacheEntry>>>,
    /// Held for the duration of a fetch, so at most one runs at a time
    refresh: Arc<Mutex<RefreshState>>,
    /// HTTP client
    client: reqwest::Client,
}

impl JwksManager {
    /// Create a new JWKS manager.
    ///
    /// # Arguments
    /// - `jwks_url`: The JWKS endpoint URL (e.g., `https://tenant.auth0.com/.well-known/jwks.json`)
    pub fn new(jwks_url: impl Into<String>) -> Self {
        Self {
            jwks_url: jwks_url.into(),
            cache_ttl: DEFAULT_CACHE_TTL,
            cache: Arc::new(RwLock::new(None)),
            refresh: Arc::new(Mutex::new(RefreshState::default())),
            client: reqwest::Client::builder()
                .timeout(FETCH_TIMEOUT)
                .build()
                .unwrap_or_default(),
        }
    }

    /// Create with custom cache TTL.
    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    /// Get the JWKS URL.
    pub fn jwks_url(&self) -> &str {
        &self.jwks_url
    }

    /// Check if JWKS is currently cached and fresh.
    pub async fn is_cached(&self) -> bool {
        let cache = self.cache.read().await;
        cache
            .as_ref()
            .is_some_and(|entry| entry.fetched_at.elapsed() < self.cache_ttl)
    }

    /// Check if any JWKS has been loaded, fresh or stale.
    ///
    /// Stale keys keep verifying tokens while a refresh is pending.
    pub async fn has_keys(&self) -> bool {
        self.cache.read().await.is_some()
    }

    /// Get a decoding key for the given key ID.
    pub async fn get_decoding_key(&self, kid: &str) -> Result<(DecodingKey, Algorithm), KeyError> {
        let jwks = self.get_jwks().await?;
        if let Some(jwk) = find_key(&jwks, kid) {
            return jwk_to_decoding_key(jwk);
        }

        // Possibly rotated: refresh once and look again.
        debug!(kid, "Key ID not in cached JWKS, forcing refresh");
        let jwks = self.force_refresh().await?;
        let jwk = find_key(&jwks, kid).ok_or(KeyError::NoMatchingKey)?;
        jwk_to_decoding_key(jwk)
    }

    /// Get any valid decoding key (for tokens without kid).
    pub async fn get_any_decoding_key(&self) -> Result<(DecodingKey, Algorithm), KeyError> {
        let jwks = self.get_jwks().await?;

        for jwk in &jwks.keys {
            if let Ok(result) = jwk_to_decoding_key(jwk) {
                return Ok(result);
            }
        }

        Err(KeyError::NoMatchingKey)
    }

    /// Fetch the JWKS now, ignoring the TTL. Still honours the failure backoff.
    pub async fn refresh(&self) -> Result<(), KeyError> {
        let state = self.refresh.clone().lock_owned().await;
        if state.backing_off() {
            return Err(KeyError::BackingOff);
        }
        self.fetch_and_store(state).await.map(|_| ())
    }

    /// Fetch JWKS (with caching).
    async fn get_jwks(&self) -> Result<Arc<JwkSet>, KeyError> {
        {
            let cache = self.cache.read().await;
            if let Some(entry) = &*cache {
                if entry.fetched_at.elapsed() >= self.cache_ttl {
                    self.spawn_refresh();
                }
                return Ok(entry.jwks.clone());
            }
        }

        // Cold cache: wait for whoever is fetching, or fetch ourselves.
        let state = self.refresh.clone().lock_owned().await;
        if let Some(entry) = &*self.cache.read().await {
            return Ok(entry.jwks.clone());
        }
        if state.backing_off() {
            return Err(KeyError::BackingOff);
        }
        self.fetch_and_store(state).await
    }

    /// Refresh in the background unless a refresh is running or backing off.
    fn spawn_refresh(&self) {
        let Ok(state) = self.refresh.clone().try_lock_owned() else {
            return;
        };
        if state.backing_off() {
            return;
        }
        let manager = self.clone();
        tokio::spawn(async move {
            // Failures are logged and recorded in the backoff state.
            let _ = manager.fetch_and_store(state).await;
        });
    }

    async fn force_refresh(&self) -> Result<Arc<JwkSet>, KeyError> {
        let mut state = self.refresh.clone().lock_owned().await;
        let recently_forced = state
            .last_forced
            .is_some_and(|at| at.elapsed() < MIN_FORCED_REFRESH_INTERVAL);
        if recently_forced || state.backing_off() {
            return Err(KeyError::NoMatchingKey);
        }
        state.last_forced = Some(Instant::now());
        self.fetch_and_store(state).await
    }

    /// Fetch and replace the cache entry. Must be called with the refresh lock.
    async fn fetch_and_store(
        &self,
        mut state: OwnedMutexGuard<RefreshState>,
    ) -> Result<Arc<JwkSet>, KeyError> {
        match self.fetch_jwks().await {
            Ok(jwks) => {
                let jwks = Arc::new(jwks);
                info!(url = %self.jwks_url, keys = jwks.keys.len(), "JWKS refreshed");
                *self.cache.write().await = Some(CacheEntry {
                    jwks: jwks.clone(),
                    fetched_at: Instant::now(),
                });
                state.failures = 0;
                state.retry_at = None;
                Ok(jwks)
            }
            Err(e) => {
                state.failures += 1;
                let delay = backoff_delay(state.failures);
                state.retry_at = Some(Instant::now() + delay);
                warn!(
                    url = %self.jwks_url,
                    error = %e,
                    failures = state.failures,
                    retry_in_ms = delay.as_millis() as u64,
                    "JWKS fetch failed"
                );
                Err(e)
            }
        }
    }

    /// Fetch JWKS from the endpoint.
    async fn fetch_jwks(&self) -> Result<JwkSet, KeyError> {
        let response = self
            .client
            .get(&self.jwks_url)
            .send()
            .await
            .map_err(|e| KeyError::Fetch(e.to_string()))?;

        if !response.status().is_success() {
            return Err(KeyError::Fetch(format!(
                "HTTP {} from JWKS endpoint",
                response.status()
            )));
        }

        response
            .json()
            .await
            .map_err(|e| KeyError::Fetch(e.to_string()))
    }
}

fn find_key<'a>(jwks: &'a JwkSet, kid: &str) -> Option<&'a Jwk> {
    jwks.keys
        .iter()
        .find(|k| k.common.key_id.as_deref() == Some(kid))
}

/// Convert a JWK to a DecodingKey.
fn jwk_to_decoding_key(jwk: &Jwk) -> Result<(DecodingKey, Algorithm), KeyError> {
    match &jwk.algorithm {
        AlgorithmParameters::RSA(rsa) => {
            let key = DecodingKey::from_rsa_components(&rsa.n, &rsa.e)
                .map_err(|e| KeyError::InvalidKey(format!("RSA key: {e}")))?;

            let alg = match jwk.common.key_algorithm {
                Some(KeyAlgorithm::RS384) => Algorithm::RS384,
                Some(KeyAlgorithm::RS512) => Algorithm::RS512,
                _ => Algorithm::RS256,
            };
            Ok((key, alg))
        }
        AlgorithmParameters::EllipticCurve(ec) => {
            let key = DecodingKey::from_ec_components(&ec.x, &ec.y)
                .map_err(|e| KeyError::InvalidKey(format!("EC key: {e}")))?;

            let alg = match jwk.common.key_algorithm {
                Some(KeyAlgorithm::ES384) => Algorithm::ES384,
                _ => Algorithm::ES256,
            };
            Ok((key, alg))
        }
        AlgorithmParameters::OctetKey(_) => {
            let key = DecodingKey::from_jwk(jwk)
                .map_err(|e| KeyError::InvalidKey(format!("symmetric key: {e}")))?;

            let alg = match jwk.common.key_algorithm {
                Some(KeyAlgorithm::HS384) => Algorithm::HS384,
                Some(KeyAlgorithm::HS512) => Algorithm::HS512,
                _ => Algorithm::HS256,
            };
            Ok((key, alg))
        }
        _ => Err(KeyError::Unsupported("key type in JWKS".to_string())),
    }
}
