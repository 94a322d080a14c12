// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Authentication Module
//!
//! Bearer-token authentication and route-rule authorization.
//!
//! ## Auth Flow
//!
//! 1. The client obtains an access token from the identity provider (Auth0)
//! 2. The client sends `Authorization: Bearer <JWT>`
//! 3. The server:
//!    - Resolves the signing key (JWKS or fixed key material)
//!    - Verifies expiry, signature, issuer and audience
//!    - Builds a [`Principal`] with `ROLE_*` and `SCOPE_*` authorities
//!    - Asks the [`AuthorizationGate`] whether the route allows the caller
//!
//! ## Security
//!
//! - Routes not covered by a rule are denied
//! - JWKS is cached with a TTL and refreshed in the background
//! - Clock skew tolerance defaults to 60 seconds

pub mod claims;
pub mod error;
pub mod extractor;
pub mod gate;
pub mod jwks;
pub mod keys;
pub mod roles;
pub mod validator;

pub use claims::{Principal, TokenClaims};
pub use error::AuthError;
pub use extractor::{Authenticated, Authorized};
pub use gate::{AuthorizationGate, Decision, DenyReason, Requirement, RouteRule};
pub use jwks::JwksManager;
pub use keys::{KeyError, KeySource};
pub use roles::Role;
pub use validator::TokenValidator;
