// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{middleware, routing::get, Router};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    auth::{auth_middleware, UserId},
    models::{CreatePostRequest, Post, UpdatePostRequest},
    state::AppState,
};

pub mod admin;
pub mod health;
pub mod posts;
pub mod users;

pub fn router(state: AppState) -> Router {
    let protected = Router::new()
        .route("/posts", get(posts::list_posts).post(posts::create_post))
        .route(
            "/posts/{post_id}",
            get(posts::post_details)
                .patch(posts::update_post)
                .delete(posts::delete_post),
        )
        .route("/posts/user/{user_id}", get(posts::user_posts))
        .route("/users/me", get(users::get_current_user))
        .route("/admin/posts", get(admin::list_all_posts))
        .route_layer(middleware::from_fn_with_state(
            state.auth_config.clone(),
            auth_middleware,
        ));

    let public = Router::new()
        .route("/health/live", get(health::liveness))
        .route("/health/ready", get(health::readiness));

    Router::new()
        .merge(protected)
        .merge(public)
        .with_state(state)
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                SecurityScheme::Http(HttpBuilder::new().scheme(HttpAuthScheme::Bearer).build()),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        posts::list_posts,
        posts::create_post,
        posts::post_details,
        posts::update_post,
        posts::delete_post,
        posts::user_posts,
        users::get_current_user,
        admin::list_all_posts,
        health::liveness,
        health::readiness
    ),
    components(
        schemas(
            Post,
            UserId,
            CreatePostRequest,
            UpdatePostRequest,
            users::UserMeResponse,
            admin::AdminPostListResponse,
            health::HealthResponse,
            health::ReadyResponse,
            health::HealthChecks
        )
    ),
    modifiers(&BearerAuth),
    tags(
        (name = "Posts", description = "Post management"),
        (name = "Users", description = "Caller identity"),
        (name = "Admin", description = "Admin-only views"),
        (name = "Health", description = "Probes")
    )
)]
struct ApiDoc;
