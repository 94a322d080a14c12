// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Profile CRUD endpoints.
//!
//! Reads need the user or admin role; writes need admin. The gate enforces
//! this through the extractor before the handler body runs.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use tracing::info;
use validator::Validate;

use super::JsonBody;
use crate::{
    auth::{Authenticated, Authorized},
    error::ApiError,
    models::{CreateProfileRequest, Profile, UpdateProfileRequest},
    state::AppState,
};

#[utoipa::path(
    get,
    path = "/profiles",
    tag = "Profiles",
    security(("bearer" = [])),
    responses(
        (status = 200, body = [Profile]),
        (status = 401, description = "Missing or invalid token"),
        (status = 403, description = "Caller lacks the user or admin role")
    )
)]
pub async fn list_profiles(
    Authorized(_caller): Authorized,
    State(state): State<AppState>,
) -> Json<Vec<Profile>> {
    let store = state.store.read().await;
    Json(store.list())
}

#[utoipa::path(
    post,
    path = "/profiles",
    request_body = CreateProfileRequest,
    tag = "Profiles",
    security(("bearer" = [])),
    responses(
        (status = 201, body = Profile),
        (status = 400, description = "Validation failed"),
        (status = 401, description = "Missing or invalid token"),
        (status = 403, description = "Caller lacks the admin role")
    )
)]
pub async fn create_profile(
    Authenticated(caller): Authenticated,
    State(state): State<AppState>,
    JsonBody(request): JsonBody<CreateProfileRequest>,
) -> Result<(StatusCode, Json<Profile>), ApiError> {
    request.validate()?;
    let (Some(name), Some(email)) = (request.name, request.email) else {
        return Err(ApiError::bad_request("Name and email are required"));
    };

    let profile = state.store.write().await.create(name, email);
    info!(
        subject = %caller.subject,
        authorities = ?caller.authorities,
        profile_id = profile.id,
        "Profile created"
    );
    Ok((StatusCode::CREATED, Json(profile)))
}

#[utoipa::path(
    get,
    path = "/profiles/{id}",
    params(("id" = u64, Path, description = "Profile identifier")),
    tag = "Profiles",
    security(("bearer" = [])),
    responses(
        (status = 200, body = Profile),
        (status = 401, description = "Missing or invalid token"),
        (status = 403, description = "Caller lacks the user or admin role"),
        (status = 404, description = "No profile with this id")
    )
)]
pub async fn get_profile(
    Authorized(_caller): Authorized,
    Path(id): Path<u64>,
    State(state): State<AppState>,
) -> Result<Json<Profile>, ApiError> {
    let store = state.store.read().await;
    Ok(Json(store.get(id)?))
}

#[utoipa::path(
    put,
    path = "/profiles/{id}",
    params(("id" = u64, Path, description = "Profile identifier")),
    request_body = UpdateProfileRequest,
    tag = "Profiles",
    security(("bearer" = [])),
    responses(
        (status = 200, body = Profile),
        (status = 400, description = "Validation failed"),
        (status = 401, description = "Missing or invalid token"),
        (status = 403, description = "Caller lacks the admin role"),
        (status = 404, description = "No profile with this id")
    )
)]
pub async fn update_profile(
    Authenticated(caller): Authenticated,
    Path(id): Path<u64>,
    State(state): State<AppState>,
    JsonBody(request): JsonBody<UpdateProfileRequest>,
) -> Result<Json<Profile>, ApiError> {
    request.validate()?;
    let profile = state.store.write().await.update(id, request)?;
    info!(subject = %caller.subject, profile_id = id, "Profile updated");
    Ok(Json(profile))
}

#[utoipa::path(
    delete,
    path = "/profiles/{id}",
    params(("id" = u64, Path, description = "Profile identifier")),
    tag = "Profiles",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "The removed profile", body = Profile),
        (status = 401, description = "Missing or invalid token"),
        (status = 403, description = "Caller lacks the admin role"),
        (status = 404, description = "No profile with this id")
    )
)]
pub async fn delete_profile(
    Authenticated(caller): Authenticated,
    Path(id): Path<u64>,
    State(state): State<AppState>,
) -> Result<Json<Profile>, ApiError> {
    let profile = state.store.write().await.delete(id)?;
    info!(subject = %caller.subject, profile_id = id, "Profile deleted");
    Ok(Json(profile))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::access_rules;
    use crate::auth::validator::tests::test_validator;
    use crate::auth::{AuthorizationGate, Principal};
    use crate::store::ProfileStore;
    use std::collections::{BTreeSet, HashSet};
    use tokio::task::JoinSet;

    fn test_state() -> AppState {
        AppState::new(
            ProfileStore::seeded(),
            test_validator(),
            AuthorizationGate::new(access_rules(None)),
        )
    }

    fn admin() -> Authenticated {
        Authenticated(Principal {
            subject: "auth0|admin".into(),
            authorities: BTreeSet::from(["ROLE_ADMIN".to_string()]),
            raw_claims: Default::default(),
            expires_at: 0,
        })
    }

    fn create_request(name: &str, email: &str) -> CreateProfileRequest {
        CreateProfileRequest {
            id: None,
            name: Some(name.into()),
            email: Some(email.into()),
        }
    }

    #[tokio::test]
    async fn list_returns_seeded_profiles() {
        let Json(profiles) = list_profiles(Authorized(None), State(test_state())).await;
        assert_eq!(profiles.len(), 3);
        assert_eq!(profiles[0].name, "Bob");
    }

    #[tokio::test]
    async fn create_ignores_client_id() {
        let state = test_state();
        let mut request = create_request("Carol", "carol@secure.com");
        request.id = Some(1);

        let (status, Json(profile)) = create_profile(admin(), State(state.clone()), JsonBody(request))
            .await
            .expect("profile creation succeeds");

        assert_eq!(status, StatusCode::CREATED);
        assert_ne!(profile.id, 1);
        assert_eq!(state.store.read().await.get(1).unwrap().name, "Bob");
        assert_eq!(state.store.read().await.get(profile.id).unwrap(), profile);
    }

    #[tokio::test]
    async fn create_rejects_short_name() {
        let err = create_profile(
            admin(),
            State(test_state()),
            JsonBody(create_request("Al", "al@secure.com")),
        )
        .await
        .unwrap_err();

        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert_eq!(err.fields.len(), 1);
        assert_eq!(err.fields[0].field, "name");
    }

    #[tokio::test]
    async fn get_missing_is_not_found() {
        let err = get_profile(Authorized(None), Path(99), State(test_state()))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::NOT_FOUND);
        assert_eq!(err.message, "Cannot find profile with id: 99");
    }

    #[tokio::test]
    async fn update_validates_present_fields() {
        let request = UpdateProfileRequest {
            email: Some("not-an-email".into()),
            ..Default::default()
        };
        let err = update_profile(admin(), Path(1), State(test_state()), JsonBody(request))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert_eq!(err.fields[0].field, "email");
    }

    #[tokio::test]
    async fn delete_returns_removed_profile() {
        let state = test_state();
        let Json(removed) = delete_profile(admin(), Path(3), State(state.clone()))
            .await
            .unwrap();
        assert_eq!(removed.name, "Eve");

        let err = delete_profile(admin(), Path(3), State(state))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::NOT_FOUND);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_creates_get_distinct_ids() {
        let state = test_state();
        let mut tasks = JoinSet::new();
        for n in 0..50 {
            let state = state.clone();
            tasks.spawn(async move {
                let request = create_request(&format!("User{n:03}"), &format!("u{n}@secure.com"));
                let (_, Json(profile)) = create_profile(admin(), State(state), JsonBody(request))
                    .await
                    .expect("profile creation succeeds");
                profile.id
            });
        }

        let mut ids = HashSet::new();
        while let Some(id) = tasks.join_next().await {
            let id = id.unwrap();
            assert!(id > 3, "seeded id {id} reused");
            assert!(ids.insert(id), "id {id} assigned twice");
        }
        assert_eq!(ids.len(), 50);
        assert_eq!(state.store.read().await.len(), 53);
    }
}
