// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use tokio::sync::RwLock;

use crate::auth::{AuthorizationGate, TokenValidator};
use crate::store::ProfileStore;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<RwLock<ProfileStore>>,
    pub validator: Arc<TokenValidator>,
    pub gate: Arc<AuthorizationGate>,
}

impl AppState {
    pub fn new(store: ProfileStore, validator: TokenValidator, gate: AuthorizationGate) -> Self {
        Self {
            store: Arc::new(RwLock::new(store)),
            validator: Arc::new(validator),
            gate: Arc::new(gate),
        }
    }
}
