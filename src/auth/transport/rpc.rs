// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! gRPC transport: `identity.v1.IdentityVerifier/VerifyToken`.
//!
//! `UNAUTHENTICATED` and `PERMISSION_DENIED` are rejections; every other
//! status (deadline exceeded, unavailable, transport errors) is `Unreachable`.

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tonic::transport::{Channel, Endpoint};
use tonic::{Code, Status};

use super::proto::{IdentityVerifierClient, VerifyTokenReply, VerifyTokenRequest};
use super::{IdentityClaims, VerifierTransport};
use crate::auth::identity::VerificationRequest;
use crate::auth::verdict::{InvalidReason, UnreachableCause, VerificationResult};
use crate::config::{AuthorityConfig, ConfigError};

/// The single RPC the transport needs. Seam between status mapping and the
/// generated client.
#[async_trait]
pub trait IdentityRpc: Send + Sync {
    async fn verify_token(
        &self,
        request: VerifyTokenRequest,
        deadline: Duration,
    ) -> Result<VerifyTokenReply, Status>;
}

/// [`IdentityRpc`] backed by a lazily connected tonic channel.
#[derive(Debug, Clone)]
pub struct GrpcIdentityClient {
    client: IdentityVerifierClient<Channel>,
}

impl GrpcIdentityClient {
    /// Build the client without connecting; the first call dials the endpoint.
    ///
    /// Must be called from within a tokio runtime.
    pub fn lazy(endpoint: &str, timeout: Duration) -> Result<Self, ConfigError> {
        let endpoint = Endpoint::from_shared(endpoint.to_string())
            .map_err(|e| ConfigError::RpcEndpoint(e.to_string()))?
            .connect_timeout(timeout)
            .timeout(timeout);
        Ok(Self {
            client: IdentityVerifierClient::new(endpoint.connect_lazy()),
        })
    }
}

#[async_trait]
impl IdentityRpc for GrpcIdentityClient {
    async fn verify_token(
        &self,
        request: VerifyTokenRequest,
        deadline: Duration,
    ) -> Result<VerifyTokenReply, Status> {
        let mut request = tonic::Request::new(request);
        request.set_timeout(deadline);
        // The client needs &mut; clone the handle per call.
        let mut client = self.client.clone();
        client
            .verify_token(request)
            .await
            .map(tonic::Response::into_inner)
    }
}

/// Verification over gRPC.
pub struct RpcTransport<R = GrpcIdentityClient> {
    rpc: R,
    deadline: Duration,
}

impl RpcTransport<GrpcIdentityClient> {
    pub fn new(config: &AuthorityConfig) -> Result<Self, ConfigError> {
        let rpc = GrpcIdentityClient::lazy(&config.rpc_endpoint, config.timeout)?;
        Ok(Self::with_rpc(rpc, config.timeout))
    }
}

impl<R: IdentityRpc> RpcTransport<R> {
    pub fn with_rpc(rpc: R, deadline: Duration) -> Self {
        Self { rpc, deadline }
    }
}

#[async_trait]
impl<R: IdentityRpc> VerifierTransport for RpcTransport<R> {
    fn name(&self) -> &'static str {
        "rpc"
    }

    async fn verify(&self, request: &VerificationRequest) -> VerificationResult {
        let message = VerifyTokenRequest {
            credential: request.credential().expose().to_string(),
        };

        match self.rpc.verify_token(message, self.deadline).await {
            Ok(reply) => IdentityClaims {
                user_id: reply.user_id,
                email: reply.email,
                is_admin: reply.is_admin,
                issued_at: reply.issued_at,
                expires_at: reply.expires_at,
            }
            .into_verdict(Utc::now()),
            Err(status) => map_status(&status),
        }
    }
}

fn map_status(status: &Status) -> VerificationResult {
    match status.code() {
        Code::Unauthenticated | Code::PermissionDenied => {
            VerificationResult::Invalid(InvalidReason::Rejected(status.message().to_string()))
        }
        Code::DeadlineExceeded => VerificationResult::Unreachable(UnreachableCause::Timeout),
        code => VerificationResult::Unreachable(UnreachableCause::Rpc {
            code: code_name(code).to_string(),
            message: status.message().to_string(),
        }),
    }
}

fn code_name(code: Code) -> &'static str {
    match code {
        Code::Ok => "ok",
        Code::Cancelled => "cancelled",
        Code::Unknown => "unknown",
        Code::InvalidArgument => "invalid_argument",
        Code::DeadlineExceeded => "deadline_exceeded",
        Code::NotFound => "not_found",
        Code::AlreadyExists => "already_exists",
        Code::PermissionDenied => "permission_denied",
        Code::ResourceExhausted => "resource_exhausted",
        Code::FailedPrecondition => "failed_precondition",
        Code::Aborted => "aborted",
        Code::OutOfRange => "out_of_range",
        Code::Unimplemented => "unimplemented",
        Code::Internal => "internal",
        Code::Unavailable => "unavailable",
        Code::DataLoss => "data_loss",
        Code::Unauthenticated => "unauthenticated",
    }
}
