// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # API Data Models
//!
//! Request and response bodies of the profile API. All types derive
//! `Serialize`/`Deserialize` and `ToSchema` for JSON handling and OpenAPI
//! documentation; request types also derive `Validate`.
//!
//! Profiles travel as `{ "id": number|null, "name": string, "email": string }`.
//! Clients may send `id`, but the server always assigns it.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

/// A stored profile.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct Profile {
    /// Server-assigned identifier.
    pub id: u64,
    /// Display name (3-15 characters).
    pub name: String,
    /// Contact email.
    pub email: String,
}

/// Request to create a profile. Both fields are required.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema, Validate)]
pub struct CreateProfileRequest {
    /// Ignored; ids are assigned by the server.
    #[serde(default)]
    pub id: Option<u64>,
    #[validate(
        required(message = "Name is required"),
        length(min = 3, max = 15, message = "Name must be between 3 and 15 characters")
    )]
    pub name: Option<String>,
    #[validate(
        required(message = "Email is required"),
        email(message = "Must be valid email")
    )]
    pub email: Option<String>,
}

/// Partial update. Only the fields present are validated and written.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema, Validate)]
pub struct UpdateProfileRequest {
    /// Ignored; the path decides which profile is updated.
    #[serde(default)]
    pub id: Option<u64>,
    #[validate(length(min = 3, max = 15, message = "Name must be between 3 and 15 characters"))]
    pub name: Option<String>,
    #[validate(email(message = "Must be valid email"))]
    pub email: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create(name: Option<&str>, email: Option<&str>) -> CreateProfileRequest {
        CreateProfileRequest {
            id: None,
            name: name.map(str::to_string),
            email: email.map(str::to_string),
        }
    }

    #[test]
    fn valid_create_request_passes() {
        assert!(create(Some("Bob"), Some("bob@secure.com")).validate().is_ok());
        assert!(create(Some("Fifteen_Chars__"), Some("a@b.io")).validate().is_ok());
    }

    #[test]
    fn short_name_rejected() {
        let errors = create(Some("Al"), Some("al@secure.com")).validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("name"));
        assert!(!fields.contains_key("email"));
    }

    #[test]
    fn long_name_rejected() {
        let errors = create(Some("SixteenCharacter"), Some("x@y.com"))
            .validate()
            .unwrap_err();
        assert!(errors.field_errors().contains_key("name"));
    }

    #[test]
    fn missing_and_invalid_fields_all_reported() {
        let errors = create(None, Some("not-an-email")).validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("name"));
        assert!(fields.contains_key("email"));
    }

    #[test]
    fn update_validates_only_present_fields() {
        let email_only = UpdateProfileRequest {
            email: Some("new@secure.com".into()),
            ..Default::default()
        };
        assert!(email_only.validate().is_ok());

        let bad_email = UpdateProfileRequest {
            email: Some("nope".into()),
            ..Default::default()
        };
        assert!(bad_email.validate().is_err());
    }

    #[test]
    fn wire_shape_accepts_null_id() {
        let request: CreateProfileRequest =
            serde_json::from_str(r#"{"id":null,"name":"Zed","email":"zed@secure.com"}"#).unwrap();
        assert_eq!(request.id, None);
        assert_eq!(request.name.as_deref(), Some("Zed"));
    }
}
