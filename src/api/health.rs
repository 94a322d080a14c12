// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;
use utoipa::ToSchema;

use crate::auth::Authorized;
use crate::state::AppState;

/// Health check response with individual component status.
#[derive(Debug, Serialize, ToSchema)]
pub struct ReadyResponse {
    /// Overall health status ("ok" or "degraded").
    pub status: String,
    pub checks: HealthChecks,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthChecks {
    pub service: String,
    /// Number of stored profiles.
    pub profiles: usize,
    /// JWKS status. Absent when tokens are verified with fixed key material.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jwks: Option<String>,
}

/// Simple health check response for liveness checks.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
}

/// "ok" while any keys are loaded, even stale ones being refreshed.
/// "unavailable" only when nothing is cached and a fetch fails.
async fn check_jwks(state: &AppState) -> Option<String> {
    let jwks = state.validator.key_source().jwks()?;
    if jwks.has_keys().await {
        return Some("ok".to_string());
    }
    match jwks.refresh().await {
        Ok(()) => Some("ok".to_string()),
        Err(_) => Some("unavailable".to_string()),
    }
}

/// Health check endpoint handler.
///
/// Returns 200 if all checks pass, 503 if any check fails.
#[utoipa::path(
    get,
    path = "/health",
    tag = "Health",
    responses(
        (status = 200, description = "Service is healthy", body = ReadyResponse),
        (status = 503, description = "Service is unhealthy", body = ReadyResponse)
    )
)]
pub async fn health(
    Authorized(_caller): Authorized,
    State(state): State<AppState>,
) -> (StatusCode, Json<ReadyResponse>) {
    ready_report(&state).await
}

async fn ready_report(state: &AppState) -> (StatusCode, Json<ReadyResponse>) {
    let jwks = check_jwks(state).await;
    let all_ok = jwks.as_deref().map(|s| s == "ok").unwrap_or(true);

    let response = ReadyResponse {
        status: if all_ok { "ok" } else { "degraded" }.to_string(),
        checks: HealthChecks {
            service: "ok".to_string(),
            profiles: state.store.read().await.len(),
            jwks,
        },
    };

    let status = if all_ok {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status, Json(response))
}

/// Liveness check handler.
///
/// Always returns 200 if the process is running.
#[utoipa::path(
    get,
    path = "/health/live",
    tag = "Health",
    responses(
        (status = 200, description = "Service is alive", body = HealthResponse)
    )
)]
pub async fn liveness(Authorized(_caller): Authorized) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

/// Readiness check handler.
///
/// Returns 200 only if the signing keys can be loaded.
#[utoipa::path(
    get,
    path = "/health/ready",
    tag = "Health",
    responses(
        (status = 200, description = "Service is ready", body = ReadyResponse),
        (status = 503, description = "Service is not ready", body = ReadyResponse)
    )
)]
pub async fn readiness(
    Authorized(_caller): Authorized,
    State(state): State<AppState>,
) -> (StatusCode, Json<ReadyResponse>) {
    ready_report(&state).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::access_rules;
    use crate::auth::jwks::tests::start_issuer;
    use crate::auth::validator::tests::{AUDIENCE, ISSUER};
    use crate::auth::{AuthorizationGate, JwksManager, KeySource, TokenValidator};
    use crate::store::ProfileStore;
    use std::sync::atomic::Ordering;
    use std::time::Duration;

    fn state_with(validator: TokenValidator) -> AppState {
        AppState::new(
            ProfileStore::seeded(),
            validator,
            AuthorizationGate::new(access_rules(None)),
        )
    }

    #[tokio::test]
    async fn fixed_key_material_is_healthy() {
        let state = state_with(crate::auth::validator::tests::test_validator());
        let (status, Json(report)) = ready_report(&state).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(report.status, "ok");
        assert_eq!(report.checks.profiles, 3);
        assert!(report.checks.jwks.is_none());
    }

    #[tokio::test]
    async fn unreachable_jwks_is_degraded() {
        let jwks = JwksManager::new("http://127.0.0.1:1/.well-known/jwks.json");
        let state = state_with(TokenValidator::new(KeySource::Jwks(jwks), ISSUER, AUDIENCE));
        let (status, Json(report)) = ready_report(&state).await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(report.status, "degraded");
        assert_eq!(report.checks.jwks.as_deref(), Some("unavailable"));
    }

    #[tokio::test]
    async fn stale_jwks_during_outage_is_still_ready() {
        let (url, issuer) = start_issuer().await;
        let jwks = JwksManager::new(url).with_cache_ttl(Duration::ZERO);
        jwks.refresh().await.unwrap();
        issuer.failing.store(true, Ordering::SeqCst);

        let state = state_with(TokenValidator::new(KeySource::Jwks(jwks), ISSUER, AUDIENCE));
        let (status, Json(report)) = ready_report(&state).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(report.checks.jwks.as_deref(), Some("ok"));
    }

    #[tokio::test]
    async fn liveness_is_always_ok() {
        let Json(response) = liveness(Authorized(None)).await;
        assert_eq!(response.status, "ok");
    }
}
