// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! In-memory profile store.
//!
//! The store owns its map and id counter. Callers share it through
//! `Arc<RwLock<ProfileStore>>` (see [`crate::state::AppState`]): mutations take
//! the write lock, so id assignment and updates are serialised.

use std::collections::BTreeMap;

use crate::error::ApiError;
use crate::models::{Profile, UpdateProfileRequest};

#[derive(Debug)]
pub struct ProfileStore {
    profiles: BTreeMap<u64, Profile>,
    next_id: u64,
}

impl Default for ProfileStore {
    fn default() -> Self {
        Self {
            profiles: BTreeMap::new(),
            next_id: 1,
        }
    }
}

impl ProfileStore {
    /// An empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// The demo data set: Bob, Alice and Eve.
    pub fn seeded() -> Self {
        let mut store = Self::new();
        store.create("Bob", "bob@secure.com");
        store.create("Alice", "alice@secure.com");
        store.create("Eve", "eve@hacker.com");
        store
    }

    /// All profiles in id order.
    pub fn list(&self) -> Vec<Profile> {
        self.profiles.values().cloned().collect()
    }

    pub fn get(&self, id: u64) -> Result<Profile, ApiError> {
        self.profiles
            .get(&id)
            .cloned()
            .ok_or_else(|| not_found(id))
    }

    /// Store a new profile under a fresh id. Ids are never reused.
    pub fn create(&mut self, name: impl Into<String>, email: impl Into<String>) -> Profile {
        let id = self.next_id;
        self.next_id += 1;
        let profile = Profile {
            id,
            name: name.into(),
            email: email.into(),
        };
        self.profiles.insert(id, profile.clone());
        profile
    }

    /// Overwrite the fields present in `changes`.
    pub fn update(&mut self, id: u64, changes: UpdateProfileRequest) -> Result<Profile, ApiError> {
        let profile = self.profiles.get_mut(&id).ok_or_else(|| not_found(id))?;
        if let Some(name) = changes.name {
            profile.name = name;
        }
        if let Some(email) = changes.email {
            profile.email = email;
        }
        Ok(profile.clone())
    }

    /// Remove a profile and return it.
    pub fn delete(&mut self, id: u64) -> Result<Profile, ApiError> {
        self.profiles.remove(&id).ok_or_else(|| not_found(id))
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }
}

fn not_found(id: u64) -> ApiError {
    ApiError::not_found(format!("Cannot find profile with id: {id}"))
}
