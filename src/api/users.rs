// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! User endpoints.

use axum::Json;
use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use crate::auth::{Auth, Identity, UserId};

/// Response for GET /users/me
#[derive(Debug, Serialize, ToSchema)]
pub struct UserMeResponse {
    /// User's ID as vouched for by the identity service
    pub user_id: UserId,
    pub email: String,
    pub is_admin: bool,
    /// When the caller's token expires, if the authority said
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
}

impl From<Identity> for UserMeResponse {
    fn from(identity: Identity) -> Self {
        Self {
            user_id: identity.user_id(),
            email: identity.email().to_string(),
            is_admin: identity.is_admin(),
            expires_at: identity.expires_at(),
        }
    }
}

/// Get the current authenticated user's identity.
#[utoipa::path(
    get,
    path = "/users/me",
    tag = "Users",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "User information", body = UserMeResponse),
        (status = 401, description = "Unauthorized - invalid or missing token"),
        (status = 503, description = "Identity service unreachable"),
    )
)]
pub async fn get_current_user(Auth(identity): Auth) -> Json<UserMeResponse> {
    Json(identity.into())
}
