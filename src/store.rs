// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! In-memory post store.
//!
//! Stands in for the service's private relational datastore. Authors are
//! referenced by the `user_id` the identity service vouched for.

use std::collections::BTreeMap;

use chrono::Utc;

use crate::auth::UserId;
use crate::error::ApiError;
use crate::models::{CreatePostRequest, Post, UpdatePostRequest};

const POST_NOT_FOUND: &str = "Post not found";
const POST_EXISTS: &str = "Post already exists";

#[derive(Default)]
pub struct InMemoryStore {
    posts: BTreeMap<u64, Post>,
    next_id: u64,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a post authored by `author`. Titles are unique.
    pub fn create_post(
        &mut self,
        request: CreatePostRequest,
        author: UserId,
    ) -> Result<Post, ApiError> {
        if self.title_taken(&request.title, None) {
            return Err(ApiError::conflict(POST_EXISTS));
        }

        self.next_id += 1;
        let now = Utc::now();
        let post = Post {
            id: self.next_id,
            title: request.title,
            description: request.description,
            image_url: request.image_url,
            created_by_user_id: author,
            created_at: now,
            updated_at: now,
            is_deleted: false,
        };
        self.posts.insert(post.id, post.clone());
        Ok(post)
    }

    /// Whether a post other than `except` already uses `title`.
    fn title_taken(&self, title: &str, except: Option<u64>) -> bool {
        self.posts
            .values()
            .any(|post| post.title == title && Some(post.id) != except)
    }

    /// Non-deleted posts, oldest first.
    pub fn list_posts(&self) -> Vec<Post> {
        self.posts
            .values()
            .filter(|post| !post.is_deleted)
            .cloned()
            .collect()
    }

    pub fn post(&self, post_id: u64) -> Result<Post, ApiError> {
        self.posts
            .get(&post_id)
            .filter(|post| !post.is_deleted)
            .cloned()
            .ok_or_else(|| ApiError::not_found(POST_NOT_FOUND))
    }

    /// Update the fields present in `request`. Only the author may; anyone
    /// else gets "not found". A new title must not clash with another post.
    pub fn update_post(
        &mut self,
        post_id: u64,
        editor: UserId,
        request: UpdatePostRequest,
    ) -> Result<Post, ApiError> {
        let editable = self
            .posts
            .get(&post_id)
            .is_some_and(|post| !post.is_deleted && post.created_by_user_id == editor);
        if !editable {
            return Err(ApiError::not_found(POST_NOT_FOUND));
        }

        if let Some(title) = &request.title {
            if self.title_taken(title, Some(post_id)) {
                return Err(ApiError::conflict(POST_EXISTS));
            }
        }

        let post = self
            .posts
            .get_mut(&post_id)
            .ok_or_else(|| ApiError::not_found(POST_NOT_FOUND))?;
        if let Some(title) = request.title {
            post.title = title;
        }
        if let Some(description) = request.description {
            post.description = description;
        }
        post.updated_at = Utc::now();
        Ok(post.clone())
    }

    /// Soft-delete a post. Its author or any admin may.
    pub fn delete_post(
        &mut self,
        post_id: u64,
        requester: UserId,
        is_admin: bool,
    ) -> Result<(), ApiError> {
        let post = self
            .posts
            .get_mut(&post_id)
            .filter(|post| {
                !post.is_deleted && (is_admin || post.created_by_user_id == requester)
            })
            .ok_or_else(|| ApiError::not_found(POST_NOT_FOUND))?;

        post.is_deleted = true;
        post.updated_at = Utc::now();
        Ok(())
    }

    /// Non-deleted posts written by `user_id`.
    pub fn user_posts(&self, user_id: UserId) -> Vec<Post> {
        self.posts
            .values()
            .filter(|post| !post.is_deleted && post.created_by_user_id == user_id)
            .cloned()
            .collect()
    }

    /// Every post, including soft-deleted ones.
    pub fn all_posts(&self) -> Vec<Post> {
        self.posts.values().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    fn create(title: &str) -> CreatePostRequest {
        CreatePostRequest {
            title: title.into(),
            description: "body".into(),
            image_url: None,
        }
    }

    #[test]
    fn duplicate_title_conflicts() {
        let mut store = InMemoryStore::new();
        store.create_post(create("hello"), UserId(1)).unwrap();
        let err = store.create_post(create("hello"), UserId(2)).unwrap_err();
        assert_eq!(err.status, StatusCode::CONFLICT);
    }

    #[test]
    fn only_author_can_update() {
        let mut store = InMemoryStore::new();
        let post = store.create_post(create("hello"), UserId(1)).unwrap();
        let update = UpdatePostRequest {
            title: Some("changed".into()),
            description: Some("new body".into()),
        };

        let err = store.update_post(post.id, UserId(2), update.clone()).unwrap_err();
        assert_eq!(err.status, StatusCode::NOT_FOUND);

        let updated = store.update_post(post.id, UserId(1), update).unwrap();
        assert_eq!(updated.title, "changed");
    }

    #[test]
    fn admin_can_delete_any_post() {
        let mut store = InMemoryStore::new();
        let post = store.create_post(create("hello"), UserId(1)).unwrap();

        assert!(store.delete_post(post.id, UserId(2), false).is_err());
        store.delete_post(post.id, UserId(2), true).unwrap();

        assert!(store.list_posts().is_empty());
        assert!(store.post(post.id).is_err());
        assert_eq!(store.all_posts().len(), 1);
        assert!(store.all_posts()[0].is_deleted);
    }

    #[test]
    fn user_posts_filters_by_author() {
        let mut store = InMemoryStore::new();
        store.create_post(create("a"), UserId(1)).unwrap();
        store.create_post(create("b"), UserId(2)).unwrap();
        store.create_post(create("c"), UserId(1)).unwrap();

        let titles: Vec<_> = store
            .user_posts(UserId(1))
            .into_iter()
            .map(|post| post.title)
            .collect();
        assert_eq!(titles, vec!["a", "c"]);
    }

    #[test]
    fn renaming_onto_an_existing_title_conflicts() {
        let mut store = InMemoryStore::new();
        store.create_post(create("first"), UserId(1)).unwrap();
        let second = store.create_post(create("second"), UserId(1)).unwrap();

        let update = UpdatePostRequest {
            title: Some("first".into()),
            description: None,
        };
        let err = store.update_post(second.id, UserId(1), update).unwrap_err();
        assert_eq!(err.status, StatusCode::CONFLICT);

        let titles: Vec<_> = store.list_posts().into_iter().map(|post| post.title).collect();
        assert_eq!(titles, vec!["first", "second"]);
    }

    #[test]
    fn keeping_the_same_title_is_not_a_conflict() {
        let mut store = InMemoryStore::new();
        let post = store.create_post(create("first"), UserId(1)).unwrap();

        let update = UpdatePostRequest {
            title: Some("first".into()),
            description: Some("rewritten".into()),
        };
        let updated = store.update_post(post.id, UserId(1), update).unwrap();
        assert_eq!(updated.description, "rewritten");
    }

    #[test]
    fn partial_update_keeps_absent_fields() {
        let mut store = InMemoryStore::new();
        let post = store.create_post(create("first"), UserId(1)).unwrap();

        let update = UpdatePostRequest {
            title: None,
            description: Some("only the body".into()),
        };
        let updated = store.update_post(post.id, UserId(1), update).unwrap();
        assert_eq!(updated.title, "first");
        assert_eq!(updated.description, "only the body");
    }
}
