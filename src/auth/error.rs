// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authentication and authorization errors.

use axum::{
    http::{header::WWW_AUTHENTICATE, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Errors raised while validating a bearer token or authorizing a request.
///
/// Token-layer and gate-layer failures are terminal for the request.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    /// Token could not be parsed into header, payload and signature
    #[error("Token is malformed")]
    Malformed,
    /// Signature did not verify, or no usable signing key was available
    #[error("Token signature is invalid")]
    BadSignature,
    /// Token is at or past its expiry
    #[error("Token has expired")]
    Expired,
    /// `aud` does not match the configured audience
    #[error("Token audience is invalid")]
    WrongAudience,
    /// `iss` does not match the configured issuer
    #[error("Token issuer is invalid")]
    WrongIssuer,
    /// `nbf` lies in the future
    #[error("Token is not yet valid")]
    NotYetValid,
    /// No valid principal on a protected route
    #[error("Authentication is required")]
    Unauthenticated,
    /// Authenticated but lacking the required authority or scope
    #[error("Insufficient permissions for this operation")]
    Forbidden,
}

#[derive(Serialize)]
struct AuthErrorBody {
    error: String,
    error_code: String,
}

impl AuthError {
    /// Get the error code for this error.
    pub fn error_code(&self) -> &'static str {
        match self {
            AuthError::Malformed => "malformed_token",
            AuthError::BadSignature => "invalid_signature",
            AuthError::Expired => "token_expired",
            AuthError::WrongAudience => "invalid_audience",
            AuthError::WrongIssuer => "invalid_issuer",
            AuthError::NotYetValid => "token_not_yet_valid",
            AuthError::Unauthenticated => "unauthenticated",
            AuthError::Forbidden => "forbidden",
        }
    }

    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::Forbidden => StatusCode::FORBIDDEN,
            _ => StatusCode::UNAUTHORIZED,
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(AuthErrorBody {
            error: self.to_string(),
            error_code: self.error_code().to_string(),
        });
        let mut response = (status, body).into_response();
        if status == StatusCode::UNAUTHORIZED {
            response
                .headers_mut()
                .insert(WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
        }
        response
    }
}
