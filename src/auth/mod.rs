// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Authentication Module
//!
//! Delegated authentication for the post service. The service never validates
//! tokens itself; the identity service (the authority) does.
//!
//! ## Auth Flow
//!
//! 1. Client sends `Authorization: Bearer <token>` through the reverse proxy
//! 2. [`auth_middleware`] extracts the credential
//! 3. [`CredentialVerifier`] asks the authority over HTTP or gRPC
//!    (selected by configuration) and returns a [`VerificationResult`]
//! 4. `Valid` attaches a [`RequestContext`]; `Invalid` is 401;
//!    `Unreachable` is 503 with `Retry-After`
//!
//! ## Security
//!
//! - An [`Identity`] can only come out of an authority answer
//! - Identities are not cached across requests
//! - Credentials are redacted in logs

pub mod error;
pub mod extractor;
pub mod identity;
pub mod middleware;
pub mod transport;
pub mod verdict;
pub mod verifier;

pub use error::AuthError;
pub use extractor::{AdminOnly, Auth};
pub use identity::{Credential, Identity, RequestContext, UserId, VerificationRequest};
pub use middleware::{auth_middleware, AuthConfig};
pub use transport::VerifierTransport;
pub use verdict::{InvalidReason, UnreachableCause, VerificationResult};
pub use verifier::{AlwaysClosed, CircuitPolicy, CredentialVerifier, VerifyPolicy};
