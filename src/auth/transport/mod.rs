// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Transports that carry a verification call to the authority.
//!
//! Each transport normalizes its own failures into a [`VerificationResult`];
//! nothing transport-specific escapes this module.

pub mod http;
pub mod proto;
pub mod rpc;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};

use super::identity::{Identity, UserId, VerificationRequest};
use super::verdict::{InvalidReason, UnreachableCause, VerificationResult};

pub use http::HttpTransport;
pub use rpc::{GrpcIdentityClient, IdentityRpc, RpcTransport};

/// Clock skew tolerance (60 seconds) when checking an identity's expiry.
const CLOCK_SKEW_LEEWAY_SECS: i64 = 60;

/// One way of asking the authority to verify a credential.
///
/// Implementations must be stateless per call and safe to share across
/// concurrent requests.
#[async_trait]
pub trait VerifierTransport: Send + Sync {
    /// Short name used in logs and health output.
    fn name(&self) -> &'static str;

    async fn verify(&self, request: &VerificationRequest) -> VerificationResult;
}

/// Identity fields as the authority reports them, before validation.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct IdentityClaims {
    pub user_id: i64,
    pub email: String,
    pub is_admin: bool,
    pub issued_at: Option<i64>,
    pub expires_at: Option<i64>,
}

impl IdentityClaims {
    /// Validate the claims and turn them into a verdict.
    ///
    /// Structurally wrong claims mean the authority misbehaved, so they are
    /// `Unreachable`, never `Valid`.
    pub(crate) fn into_verdict(self, now: DateTime<Utc>) -> VerificationResult {
        if self.user_id <= 0 {
            return malformed(format!("user_id must be positive, got {}", self.user_id));
        }
        if self.email.trim().is_empty() {
            return malformed("email is empty");
        }

        let issued_at = match self.issued_at.map(timestamp).transpose() {
            Ok(ts) => ts,
            Err(e) => return malformed(e),
        };
        let expires_at = match self.expires_at.map(timestamp).transpose() {
            Ok(ts) => ts,
            Err(e) => return malformed(e),
        };

        if let Some(exp) = expires_at {
            if exp.timestamp() + CLOCK_SKEW_LEEWAY_SECS < now.timestamp() {
                return VerificationResult::Invalid(InvalidReason::Expired);
            }
        }

        VerificationResult::Valid(Identity::from_authority(
            UserId(self.user_id),
            self.email,
            self.is_admin,
            issued_at,
            expires_at,
        ))
    }
}

fn timestamp(secs: i64) -> Result<DateTime<Utc>, String> {
    Utc.timestamp_opt(secs, 0)
        .single()
        .ok_or_else(|| format!("timestamp {secs} is out of range"))
}

fn malformed(detail: impl Into<String>) -> VerificationResult {
    VerificationResult::Unreachable(UnreachableCause::MalformedResponse(detail.into()))
}
