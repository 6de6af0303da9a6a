// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authentication and authorization errors.

use std::time::Duration;

use axum::{
    http::{header::RETRY_AFTER, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use super::identity::Identity;
use super::verdict::{InvalidReason, VerificationResult};

/// Why a protected request was rejected.
///
/// `InsufficientPrivilege` is an authorization failure and is reported with a
/// different status and code than every authentication failure.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Auth token is required")]
    MissingCredential,

    #[error("Invalid authorization header format (expected 'Bearer <token>')")]
    InvalidAuthHeader,

    /// The reason stays server-side; clients get a fixed message.
    #[error("Auth token is invalid")]
    InvalidCredential(InvalidReason),

    #[error("Authentication service unavailable, retry later")]
    AuthorityUnavailable { retry_after: Duration },

    #[error("You are not allowed to access this resource")]
    InsufficientPrivilege,
}

#[derive(Serialize)]
struct AuthErrorBody {
    error: String,
    error_code: String,
}

impl AuthError {
    /// Turn a verdict into the identity or the rejection to send back.
    pub fn check(
        result: VerificationResult,
        retry_after: Duration,
    ) -> Result<Identity, AuthError> {
        match result {
            VerificationResult::Valid(identity) => Ok(identity),
            VerificationResult::Invalid(InvalidReason::MissingCredential) => {
                Err(AuthError::MissingCredential)
            }
            VerificationResult::Invalid(reason) => Err(AuthError::InvalidCredential(reason)),
            VerificationResult::Unreachable(_) => {
                Err(AuthError::AuthorityUnavailable { retry_after })
            }
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            AuthError::MissingCredential => "missing_credential",
            AuthError::InvalidAuthHeader => "invalid_auth_header",
            AuthError::InvalidCredential(_) => "invalid_credential",
            AuthError::AuthorityUnavailable { .. } => "authority_unavailable",
            AuthError::InsufficientPrivilege => "insufficient_privilege",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::MissingCredential
            | AuthError::InvalidAuthHeader
            | AuthError::InvalidCredential(_) => StatusCode::UNAUTHORIZED,
            AuthError::AuthorityUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
            AuthError::InsufficientPrivilege => StatusCode::FORBIDDEN,
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let retry_after = match &self {
            AuthError::AuthorityUnavailable { retry_after } => Some(retry_after.as_secs().max(1)),
            _ => None,
        };
        let body = Json(AuthErrorBody {
            error: self.to_string(),
            error_code: self.error_code().to_string(),
        });

        let mut response = (status, body).into_response();
        if let Some(secs) = retry_after {
            response
                .headers_mut()
                .insert(RETRY_AFTER, HeaderValue::from(secs));
        }
        response
    }
}
