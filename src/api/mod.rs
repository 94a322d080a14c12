// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    extract::FromRequest,
    http::Method,
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    auth::{Requirement, Role, RouteRule},
    error::{ApiError, FieldError},
    models::{CreateProfileRequest, Profile, UpdateProfileRequest},
    state::AppState,
};

pub mod health;
pub mod ping;
pub mod profiles;
pub mod secured;

/// JSON request body whose rejections render as [`ApiError`].
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct JsonBody<T>(pub T);

pub fn router(state: AppState) -> Router {
    let routes = Router::new()
        .route("/ping", get(ping::ping))
        .route("/pong", get(ping::pong))
        .route("/secured/ping", get(ping::secured_ping))
        .route("/secured/username", get(secured::username))
        .route("/secured/post", post(secured::post_payload))
        .route("/api/public", get(ping::public_message))
        .route("/api/private", get(ping::private_message))
        .route("/api/v1/ping", get(ping::api_ping))
        .route("/api/private-scoped", get(ping::private_scoped_message))
        .route(
            "/profiles",
            get(profiles::list_profiles).post(profiles::create_profile),
        )
        .route(
            "/profiles/{id}",
            get(profiles::get_profile)
                .put(profiles::update_profile)
                .delete(profiles::delete_profile),
        )
        .route("/health", get(health::health))
        .route("/health/live", get(health::liveness))
        .route("/health/ready", get(health::readiness))
        .with_state(state);

    routes
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(TraceLayer::new_for_http())
                .layer(PropagateRequestIdLayer::x_request_id())
                .layer(CorsLayer::permissive()),
        )
}

/// The access table checked by the authorization gate on every request.
///
/// `secured_route` adds one more pattern that only needs a valid token.
pub fn access_rules(secured_route: Option<&str>) -> Vec<RouteRule> {
    let readers = Requirement::any_role(&[Role::User, Role::Admin]);
    let admins = Requirement::any_role(&[Role::Admin]);

    let mut rules = vec![
        RouteRule::new(Method::GET, "/ping", Requirement::Public),
        RouteRule::new(Method::GET, "/pong", Requirement::Public),
        RouteRule::new(Method::GET, "/secured/ping", Requirement::AuthenticatedAny),
        RouteRule::new(Method::GET, "/secured/username", readers.clone()),
        RouteRule::new(Method::POST, "/secured/post", readers.clone()),
        RouteRule::new(Method::GET, "/api/public", Requirement::Public),
        RouteRule::new(
            Method::GET,
            "/api/private-scoped",
            Requirement::scope("read:messages"),
        ),
        RouteRule::any_method("/api/**", Requirement::AuthenticatedAny),
        RouteRule::new(Method::GET, "/profiles", readers.clone()),
        RouteRule::new(Method::POST, "/profiles", admins.clone()),
        RouteRule::new(Method::GET, "/profiles/{id}", readers),
        RouteRule::new(Method::PUT, "/profiles/{id}", admins.clone()),
        RouteRule::new(Method::DELETE, "/profiles/{id}", admins),
        RouteRule::new(Method::GET, "/health", Requirement::Public),
        RouteRule::new(Method::GET, "/health/live", Requirement::Public),
        RouteRule::new(Method::GET, "/health/ready", Requirement::Public),
    ];
    if let Some(pattern) = secured_route {
        rules.push(RouteRule::any_method(pattern, Requirement::AuthenticatedAny));
    }
    rules
}

#[derive(OpenApi)]
#[openapi(
    paths(
        ping::ping,
        ping::pong,
        ping::secured_ping,
        ping::public_message,
        ping::private_message,
        ping::private_scoped_message,
        ping::api_ping,
        secured::username,
        secured::post_payload,
        profiles::list_profiles,
        profiles::create_profile,
        profiles::get_profile,
        profiles::update_profile,
        profiles::delete_profile,
        health::health,
        health::liveness,
        health::readiness
    ),
    components(
        schemas(
            Profile,
            CreateProfileRequest,
            UpdateProfileRequest,
            FieldError,
            health::ReadyResponse,
            health::HealthChecks,
            health::HealthResponse
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Ping", description = "Fixed responses for checking token handling"),
        (name = "Messages", description = "Public, private and scoped messages"),
        (name = "Secured", description = "Endpoints for users and admins"),
        (name = "Profiles", description = "Profile management"),
        (name = "Health", description = "Liveness and readiness checks")
    )
)]
struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}
