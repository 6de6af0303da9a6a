// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Admin-only endpoints. Access requires an identity the authority marked as
//! admin; anyone else gets 403.

use axum::{extract::State, Json};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{auth::AdminOnly, error::ApiError, models::Post, state::AppState};

/// Every post, soft-deleted ones included.
#[derive(Debug, Serialize, ToSchema)]
pub struct AdminPostListResponse {
    pub posts: Vec<Post>,
    pub total: usize,
    pub deleted: usize,
}

#[utoipa::path(
    get,
    path = "/admin/posts",
    tag = "Admin",
    security(("bearer" = [])),
    responses(
        (status = 200, body = AdminPostListResponse),
        (status = 401, description = "Missing or invalid token"),
        (status = 403, description = "Caller is not an admin")
    )
)]
pub async fn list_all_posts(
    AdminOnly(admin): AdminOnly,
    State(state): State<AppState>,
) -> Result<Json<AdminPostListResponse>, ApiError> {
    let posts = state.store.read().await.all_posts();
    let deleted = posts.iter().filter(|post| post.is_deleted).count();
    tracing::info!(admin_id = %admin.user_id(), total = posts.len(), "admin listed posts");

    Ok(Json(AdminPostListResponse {
        total: posts.len(),
        deleted,
        posts,
    }))
}
