// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Post Service - resource service with delegated authentication
//!
//! The service stores posts and never validates bearer tokens itself. Each
//! protected request is authenticated by the identity service over HTTP or
//! gRPC, and the verified `user_id` becomes the author of anything created.
//!
//! ## Modules
//!
//! - `api` - HTTP API handlers (Axum)
//! - `auth` - Credential verification client, transports and middleware
//! - `config` - Environment configuration
//! - `store` - In-memory post store

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod logging;
pub mod models;
pub mod state;
pub mod store;
