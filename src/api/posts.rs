// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Post endpoints. Every route here runs behind the auth middleware; the
//! author of a post is always the verified caller.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::{
    auth::{Auth, UserId},
    error::ApiError,
    models::{CreatePostRequest, Post, UpdatePostRequest},
    state::AppState,
};

#[utoipa::path(
    get,
    path = "/posts",
    tag = "Posts",
    security(("bearer" = [])),
    responses(
        (status = 200, body = [Post]),
        (status = 401, description = "Missing or invalid token"),
        (status = 503, description = "Identity service unreachable")
    )
)]
pub async fn list_posts(
    Auth(_identity): Auth,
    State(state): State<AppState>,
) -> Result<Json<Vec<Post>>, ApiError> {
    let store = state.store.read().await;
    Ok(Json(store.list_posts()))
}

#[utoipa::path(
    post,
    path = "/posts",
    request_body = CreatePostRequest,
    tag = "Posts",
    security(("bearer" = [])),
    responses(
        (status = 201, body = Post),
        (status = 400, description = "Invalid post data"),
        (status = 401, description = "Missing or invalid token"),
        (status = 409, description = "Post already exists"),
        (status = 503, description = "Identity service unreachable")
    )
)]
pub async fn create_post(
    Auth(identity): Auth,
    State(state): State<AppState>,
    Json(request): Json<CreatePostRequest>,
) -> Result<(StatusCode, Json<Post>), ApiError> {
    request.validate().map_err(ApiError::bad_request)?;

    let mut store = state.store.write().await;
    let post = store.create_post(request, identity.user_id())?;
    tracing::info!(post_id = post.id, user_id = %identity.user_id(), "post created");
    Ok((StatusCode::CREATED, Json(post)))
}

#[utoipa::path(
    get,
    path = "/posts/{post_id}",
    params(("post_id" = u64, Path, description = "Post identifier")),
    tag = "Posts",
    security(("bearer" = [])),
    responses(
        (status = 200, body = Post),
        (status = 404, description = "Post not found")
    )
)]
pub async fn post_details(
    Auth(_identity): Auth,
    Path(post_id): Path<u64>,
    State(state): State<AppState>,
) -> Result<Json<Post>, ApiError> {
    let store = state.store.read().await;
    Ok(Json(store.post(post_id)?))
}

#[utoipa::path(
    patch,
    path = "/posts/{post_id}",
    params(("post_id" = u64, Path, description = "Post identifier")),
    request_body = UpdatePostRequest,
    tag = "Posts",
    security(("bearer" = [])),
    responses(
        (status = 200, body = Post),
        (status = 400, description = "Invalid post data"),
        (status = 404, description = "Post not found or not owned by caller"),
        (status = 409, description = "Another post already has this title")
    )
)]
pub async fn update_post(
    Auth(identity): Auth,
    Path(post_id): Path<u64>,
    State(state): State<AppState>,
    Json(request): Json<UpdatePostRequest>,
) -> Result<Json<Post>, ApiError> {
    request.validate().map_err(ApiError::bad_request)?;

    let mut store = state.store.write().await;
    Ok(Json(store.update_post(post_id, identity.user_id(), request)?))
}

#[utoipa::path(
    delete,
    path = "/posts/{post_id}",
    params(("post_id" = u64, Path, description = "Post identifier")),
    tag = "Posts",
    security(("bearer" = [])),
    responses(
        (status = 204),
        (status = 404, description = "Post not found or not deletable by caller")
    )
)]
pub async fn delete_post(
    Auth(identity): Auth,
    Path(post_id): Path<u64>,
    State(state): State<AppState>,
) -> Result<StatusCode, ApiError> {
    let mut store = state.store.write().await;
    store.delete_post(post_id, identity.user_id(), identity.is_admin())?;
    tracing::info!(post_id, user_id = %identity.user_id(), "post deleted");
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/posts/user/{user_id}",
    params(("user_id" = i64, Path, description = "Author identifier")),
    tag = "Posts",
    security(("bearer" = [])),
    responses((status = 200, body = [Post]))
)]
pub async fn user_posts(
    Auth(_identity): Auth,
    Path(user_id): Path<i64>,
    State(state): State<AppState>,
) -> Result<Json<Vec<Post>>, ApiError> {
    let store = state.store.read().await;
    Ok(Json(store.user_posts(UserId(user_id))))
}
