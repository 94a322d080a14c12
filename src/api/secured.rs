// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Endpoints for any caller holding the user or admin role.

use axum::http::StatusCode;
use serde_json::{Map, Value};
use tracing::info;

use super::JsonBody;
use crate::auth::Authenticated;

/// Return the caller's email claim, falling back to the subject.
#[utoipa::path(
    get,
    path = "/secured/username",
    tag = "Secured",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Email or subject of the caller", body = String),
        (status = 401, description = "Missing or invalid token"),
        (status = 403, description = "Caller lacks the user or admin role")
    )
)]
pub async fn username(Authenticated(caller): Authenticated) -> String {
    info!(
        subject = %caller.subject,
        authorities = ?caller.authorities,
        "Handling username request"
    );
    caller
        .email()
        .map(str::to_string)
        .unwrap_or(caller.subject)
}

/// Accept an arbitrary JSON object and log its entries.
#[utoipa::path(
    post,
    path = "/secured/post",
    tag = "Secured",
    security(("bearer" = [])),
    request_body = Object,
    responses(
        (status = 204, description = "Payload accepted"),
        (status = 401, description = "Missing or invalid token"),
        (status = 403, description = "Caller lacks the user or admin role")
    )
)]
pub async fn post_payload(
    Authenticated(caller): Authenticated,
    JsonBody(payload): JsonBody<Map<String, Value>>,
) -> StatusCode {
    info!(subject = %caller.subject, entries = payload.len(), "Handling post request");
    for (key, value) in &payload {
        info!(%key, %value, "Payload entry");
    }
    StatusCode::NO_CONTENT
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Principal;
    use serde_json::json;
    use std::collections::BTreeSet;

    fn caller(email: Option<&str>) -> Principal {
        let mut raw_claims = Map::new();
        if let Some(email) = email {
            raw_claims.insert("email".into(), json!(email));
        }
        Principal {
            subject: "auth0|bob".into(),
            authorities: BTreeSet::from(["ROLE_USER".to_string()]),
            raw_claims,
            expires_at: 0,
        }
    }

    #[tokio::test]
    async fn username_prefers_email_claim() {
        let name = username(Authenticated(caller(Some("bob@secure.com")))).await;
        assert_eq!(name, "bob@secure.com");
    }

    #[tokio::test]
    async fn username_falls_back_to_subject() {
        let name = username(Authenticated(caller(None))).await;
        assert_eq!(name, "auth0|bob");
    }

    #[tokio::test]
    async fn post_returns_no_content() {
        let payload = json!({"hello": "world", "n": 1});
        let Value::Object(payload) = payload else {
            unreachable!()
        };
        let status = post_payload(Authenticated(caller(None)), JsonBody(payload)).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
    }
}
