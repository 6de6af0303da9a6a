// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Axum extractors for verified identities.
//!
//! ```rust,ignore
//! async fn create_post(Auth(identity): Auth, ...) -> ... {
//!     // identity.user_id() is the authority-verified author
//! }
//!
//! async fn purge(AdminOnly(identity): AdminOnly) -> ... { ... }
//! ```

use axum::{extract::FromRequestParts, http::request::Parts};

use super::identity::{Identity, RequestContext};
use super::AuthError;
use crate::state::AppState;

/// Extractor for the verified identity of the caller.
///
/// Uses the context attached by [`auth_middleware`](super::middleware::auth_middleware)
/// when present; otherwise verifies the request itself and attaches the
/// context so later extractors reuse it.
pub struct Auth(pub Identity);

impl FromRequestParts<AppState> for Auth {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        if let Some(context) = parts.extensions.get::<RequestContext>() {
            return Ok(Auth(context.identity().clone()));
        }

        let context = state.auth_config.authenticate(&parts.headers).await?;
        let identity = context.identity().clone();
        parts.extensions.insert(context);
        Ok(Auth(identity))
    }
}

/// Extractor that additionally requires `is_admin`.
///
/// A verified non-admin is rejected with `InsufficientPrivilege` (403), not
/// with an authentication error.
pub struct AdminOnly(pub Identity);

impl FromRequestParts<AppState> for AdminOnly {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Auth(identity) = Auth::from_request_parts(parts, state).await?;

        if !identity.is_admin() {
            tracing::info!(
                user_id = %identity.user_id(),
                "admin-only endpoint refused for non-admin"
            );
            return Err(AuthError::InsufficientPrivilege);
        }

        Ok(AdminOnly(identity))
    }
}
