// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Secured Profile API
//!
//! An HTTP API that validates Auth0-issued bearer tokens and gates each route
//! by role or scope, fronting a small in-memory profile store.
//!
//! ## Modules
//!
//! - `api` - HTTP API handlers and the route access table (Axum)
//! - `auth` - Token validation, JWKS caching and route-rule authorization
//! - `config` - Environment configuration
//! - `store` - In-memory profile store

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod models;
pub mod state;
pub mod store;
