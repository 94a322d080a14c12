// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Fixed-response endpoints for checking token handling end to end.

use crate::auth::Authorized;

#[utoipa::path(
    get,
    path = "/ping",
    tag = "Ping",
    responses((status = 200, body = String))
)]
pub async fn ping(Authorized(_caller): Authorized) -> &'static str {
    "All good. You DO NOT need to be authenticated to call /ping"
}

#[utoipa::path(
    get,
    path = "/pong",
    tag = "Ping",
    responses((status = 200, body = String))
)]
pub async fn pong(Authorized(_caller): Authorized) -> &'static str {
    "All good. You DO NOT need to be authenticated to call /pong"
}

#[utoipa::path(
    get,
    path = "/secured/ping",
    tag = "Ping",
    security(("bearer" = [])),
    responses(
        (status = 200, body = String),
        (status = 401, description = "Missing or invalid token")
    )
)]
pub async fn secured_ping(Authorized(_caller): Authorized) -> &'static str {
    "All good. You DO need to be authenticated to call /secured/ping"
}

#[utoipa::path(
    get,
    path = "/api/public",
    tag = "Messages",
    responses((status = 200, body = String))
)]
pub async fn public_message(Authorized(_caller): Authorized) -> &'static str {
    "All good. You DO NOT need to be authenticated to call /api/public"
}

#[utoipa::path(
    get,
    path = "/api/private",
    tag = "Messages",
    security(("bearer" = [])),
    responses(
        (status = 200, body = String),
        (status = 401, description = "Missing or invalid token")
    )
)]
pub async fn private_message(Authorized(_caller): Authorized) -> &'static str {
    "All good. You can see this because you are Authenticated."
}

#[utoipa::path(
    get,
    path = "/api/private-scoped",
    tag = "Messages",
    security(("bearer" = ["read:messages"])),
    responses(
        (status = 200, body = String),
        (status = 401, description = "Missing or invalid token"),
        (status = 403, description = "Token lacks the read:messages scope")
    )
)]
pub async fn private_scoped_message(Authorized(_caller): Authorized) -> &'static str {
    "All good. You can see this because you are Authenticated with a Token granted the 'read:messages' scope"
}

#[utoipa::path(
    get,
    path = "/api/v1/ping",
    tag = "Ping",
    security(("bearer" = [])),
    responses(
        (status = 200, body = String),
        (status = 401, description = "Missing or invalid token")
    )
)]
pub async fn api_ping(Authorized(_caller): Authorized) -> &'static str {
    "All good. You DO need to be authenticated to call /api/v1/ping"
}
