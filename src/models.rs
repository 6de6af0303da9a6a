// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # API Data Models
//!
//! Request and response structures of the post API. All types derive
//! `Serialize`/`Deserialize` and `ToSchema` for JSON handling and OpenAPI.
//!
//! The author of a post is never taken from a request body: it is the
//! `user_id` of the identity the authority verified.

use std::ops::RangeInclusive;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::auth::UserId;

/// Allowed title length, in characters.
pub const TITLE_LEN: RangeInclusive<usize> = 3..=100;
/// Allowed description length, in characters.
pub const DESCRIPTION_LEN: RangeInclusive<usize> = 3..=1000;

/// Image extensions accepted for `image_url`.
pub const ALLOWED_IMAGE_EXTENSIONS: [&str; 3] = [".png", ".jpg", ".jpeg"];

// =============================================================================
// Post Models
// =============================================================================

/// A post authored by a verified user.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct Post {
    /// Unique identifier for this post.
    pub id: u64,
    pub title: String,
    pub description: String,
    /// Relative URL of the attached image, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    /// Author, as verified by the identity service.
    pub created_by_user_id: UserId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Soft-delete marker. Deleted posts are only visible to admins.
    pub is_deleted: bool,
}

/// Request to create a new post.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CreatePostRequest {
    pub title: String,
    pub description: String,
    /// Optional image (PNG, JPG or JPEG).
    #[serde(default)]
    pub image_url: Option<String>,
}

/// Request to update a post's text. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct UpdatePostRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Check one text field against its length bounds, counted in characters.
fn validate_field(name: &str, value: &str, bounds: RangeInclusive<usize>) -> Result<(), String> {
    if value.trim().is_empty() {
        return Err(format!("{name} must not be empty"));
    }
    let len = value.chars().count();
    if !bounds.contains(&len) {
        return Err(format!(
            "{name} must be between {} and {} characters",
            bounds.start(),
            bounds.end()
        ));
    }
    Ok(())
}

fn validate_title(title: &str) -> Result<(), String> {
    validate_field("title", title, TITLE_LEN)
}

fn validate_description(description: &str) -> Result<(), String> {
    validate_field("description", description, DESCRIPTION_LEN)
}

impl CreatePostRequest {
    pub fn validate(&self) -> Result<(), String> {
        validate_title(&self.title)?;
        validate_description(&self.description)?;
        if let Some(url) = &self.image_url {
            let lower = url.to_ascii_lowercase();
            if !ALLOWED_IMAGE_EXTENSIONS.iter().any(|ext| lower.ends_with(ext)) {
                return Err("Invalid file type. Only PNG, JPG, and JPEG are allowed.".to_string());
            }
        }
        Ok(())
    }
}

impl UpdatePostRequest {
    pub fn validate(&self) -> Result<(), String> {
        if self.title.is_none() && self.description.is_none() {
            return Err("nothing to update: provide title or description".to_string());
        }
        if let Some(title) = &self.title {
            validate_title(title)?;
        }
        if let Some(description) = &self.description {
            validate_description(description)?;
        }
        Ok(())
    }
}
