// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Axum extractors that guard handlers.
//!
//! Every handler takes one of these as its first argument, so the gate runs
//! before any handler code:
//!
//! ```rust,ignore
//! async fn list_profiles(Authorized(_caller): Authorized, State(state): State<AppState>) { .. }
//! async fn create_profile(Authenticated(caller): Authenticated, ..) { .. }
//! ```

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
};
use tracing::debug;

use super::gate::{Decision, DenyReason};
use super::{AuthError, Principal};
use crate::state::AppState;

/// Read the bearer token from the `Authorization` header.
///
/// A missing header or a non-Bearer scheme means no token. `Bearer` with an
/// empty value is a malformed token.
pub fn bearer_token(headers: &HeaderMap) -> Result<Option<&str>, AuthError> {
    let Some(value) = headers.get(AUTHORIZATION) else {
        return Ok(None);
    };
    let value = value.to_str().map_err(|_| AuthError::Malformed)?;
    let Some((scheme, token)) = value.split_once(' ') else {
        return Ok(None);
    };
    if !scheme.eq_ignore_ascii_case("bearer") {
        return Ok(None);
    }
    match token.trim() {
        "" => Err(AuthError::Malformed),
        token => Ok(Some(token)),
    }
}

/// The request passed the access rule for its route.
///
/// Holds the principal when a valid token was presented.
pub struct Authorized(pub Option<Principal>);

impl FromRequestParts<AppState> for Authorized {
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let path = parts.uri.path();

        let (principal, token_error) = match bearer_token(&parts.headers) {
            Ok(None) => (None, None),
            Ok(Some(token)) => match state.validator.validate(token).await {
                Ok(principal) => (Some(principal), None),
                Err(e) => (None, Some(e)),
            },
            Err(e) => (None, Some(e)),
        };

        match state.gate.authorize(&parts.method, path, principal.as_ref()) {
            Decision::Allow => Ok(Authorized(principal)),
            Decision::Deny(reason) => {
                debug!(
                    method = %parts.method,
                    path,
                    ?reason,
                    subject = principal.as_ref().map(|p| p.subject.as_str()),
                    "Request denied"
                );
                Err(match reason {
                    DenyReason::Unauthenticated => token_error.unwrap_or(AuthError::Unauthenticated),
                    DenyReason::Forbidden | DenyReason::NoMatchingRule => AuthError::Forbidden,
                })
            }
        }
    }
}

/// The request passed its access rule and carries a valid principal.
pub struct Authenticated(pub Principal);

impl FromRequestParts<AppState> for Authenticated {
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let Authorized(principal) = Authorized::from_request_parts(parts, state).await?;
        principal
            .map(Authenticated)
            .ok_or(AuthError::Unauthenticated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::gate::{AuthorizationGate, Requirement, RouteRule};
    use crate::auth::validator::tests::{test_validator, token_for};
    use crate::auth::Role;
    use crate::store::ProfileStore;
    use axum::http::{Method, Request};

    fn test_state() -> AppState {
        let gate = AuthorizationGate::new(vec![
            RouteRule::new(Method::GET, "/open", Requirement::Public),
            RouteRule::new(Method::GET, "/users", Requirement::any_role(&[Role::User])),
        ]);
        AppState::new(ProfileStore::new(), test_validator(), gate)
    }

    fn parts(method: Method, uri: &str, authorization: Option<String>) -> Parts {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(value) = authorization {
            builder = builder.header(AUTHORIZATION, value);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[test]
    fn bearer_token_parsing() {
        let mut headers = HeaderMap::new();
        assert_eq!(bearer_token(&headers), Ok(None));

        headers.insert(AUTHORIZATION, "Basic dXNlcjpwYXNz".parse().unwrap());
        assert_eq!(bearer_token(&headers), Ok(None));

        headers.insert(AUTHORIZATION, "Bearer abc.def.ghi".parse().unwrap());
        assert_eq!(bearer_token(&headers), Ok(Some("abc.def.ghi")));

        headers.insert(AUTHORIZATION, "bearer  abc ".parse().unwrap());
        assert_eq!(bearer_token(&headers), Ok(Some("abc")));

        headers.insert(AUTHORIZATION, "Bearer ".parse().unwrap());
        assert_eq!(bearer_token(&headers), Err(AuthError::Malformed));
    }

    #[tokio::test]
    async fn public_route_allows_anonymous() {
        let state = test_state();
        let mut parts = parts(Method::GET, "/open", None);
        let Authorized(principal) = Authorized::from_request_parts(&mut parts, &state)
            .await
            .unwrap();
        assert!(principal.is_none());
    }

    #[tokio::test]
    async fn public_route_ignores_invalid_token() {
        let state = test_state();
        let mut parts = parts(Method::GET, "/open", Some("Bearer not-a-jwt".into()));
        assert!(Authorized::from_request_parts(&mut parts, &state).await.is_ok());
    }

    #[tokio::test]
    async fn protected_route_without_token_is_unauthenticated() {
        let state = test_state();
        let mut parts = parts(Method::GET, "/users", None);
        let result = Authorized::from_request_parts(&mut parts, &state).await;
        assert!(matches!(result, Err(AuthError::Unauthenticated)));
    }

    #[tokio::test]
    async fn protected_route_reports_token_error() {
        let state = test_state();
        let mut parts = parts(Method::GET, "/users", Some("Bearer not-a-jwt".into()));
        let result = Authorized::from_request_parts(&mut parts, &state).await;
        assert!(matches!(result, Err(AuthError::Malformed)));
    }

    #[tokio::test]
    async fn wrong_role_is_forbidden() {
        let state = test_state();
        let token = token_for("auth0|eve", &["guest"], None);
        let mut parts = parts(Method::GET, "/users", Some(format!("Bearer {token}")));
        let result = Authorized::from_request_parts(&mut parts, &state).await;
        assert!(matches!(result, Err(AuthError::Forbidden)));
    }

    #[tokio::test]
    async fn unmatched_route_is_forbidden() {
        let state = test_state();
        let token = token_for("auth0|bob", &["user"], None);
        let mut parts = parts(Method::GET, "/elsewhere", Some(format!("Bearer {token}")));
        let result = Authorized::from_request_parts(&mut parts, &state).await;
        assert!(matches!(result, Err(AuthError::Forbidden)));
    }

    #[tokio::test]
    async fn authenticated_extracts_principal() {
        let state = test_state();
        let token = token_for("auth0|bob", &["user"], None);
        let mut parts = parts(Method::GET, "/users", Some(format!("Bearer {token}")));
        let Authenticated(principal) = Authenticated::from_request_parts(&mut parts, &state)
            .await
            .unwrap();
        assert_eq!(principal.subject, "auth0|bob");
    }

    #[tokio::test]
    async fn authenticated_rejects_anonymous_on_public_route() {
        let state = test_state();
        let mut parts = parts(Method::GET, "/open", None);
        let result = Authenticated::from_request_parts(&mut parts, &state).await;
        assert!(matches!(result, Err(AuthError::Unauthenticated)));
    }
}
