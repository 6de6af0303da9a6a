// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use tokio::sync::RwLock;

use crate::auth::AuthConfig;
use crate::store::InMemoryStore;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<RwLock<InMemoryStore>>,
    /// Shared verifier; holds no per-request state.
    pub auth_config: AuthConfig,
}

impl AppState {
    pub fn new(store: InMemoryStore, auth_config: AuthConfig) -> Self {
        Self {
            store: Arc::new(RwLock::new(store)),
            auth_config,
        }
    }
}
