// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Credential verifier client.
//!
//! Wraps a [`VerifierTransport`] with the call policy:
//!
//! - empty credentials are rejected locally, without a network call
//! - every attempt is bounded by the configured timeout
//! - a transient `Unreachable` is retried once after a fixed backoff
//! - `Invalid` is never retried
//!
//! The verifier holds no per-request state and is shared behind an `Arc`.
//! Dropping the future returned by [`CredentialVerifier::verify`] abandons the
//! outbound call.

use std::sync::Arc;
use std::time::{Duration, Instant};

use super::identity::{Credential, VerificationRequest};
use super::transport::{HttpTransport, RpcTransport, VerifierTransport};
use super::verdict::{InvalidReason, UnreachableCause, VerificationResult};
use crate::config::{AuthorityConfig, ConfigError, TransportKind};

/// Hook consulted around every authority call.
///
/// Lets a deployment add circuit breaking on top of the single retry. The
/// default [`AlwaysClosed`] never refuses a call.
pub trait CircuitPolicy: Send + Sync {
    /// Whether an attempt may be made now.
    fn permit(&self) -> bool;

    /// Observe the result of an attempt that was permitted.
    fn record(&self, result: &VerificationResult);
}

/// Policy that always calls the authority.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysClosed;

impl CircuitPolicy for AlwaysClosed {
    fn permit(&self) -> bool {
        true
    }

    fn record(&self, _result: &VerificationResult) {}
}

/// Timing and retry knobs for the verifier.
#[derive(Debug, Clone, Copy)]
pub struct VerifyPolicy {
    pub timeout: Duration,
    pub retry_backoff: Duration,
    pub retry_transient: bool,
}

impl From<&AuthorityConfig> for VerifyPolicy {
    fn from(config: &AuthorityConfig) -> Self {
        Self {
            timeout: config.timeout,
            retry_backoff: config.retry_backoff,
            retry_transient: config.retry_transient,
        }
    }
}

/// Verifies bearer credentials by delegating to the authority service.
#[derive(Clone)]
pub struct CredentialVerifier {
    transport: Arc<dyn VerifierTransport>,
    circuit: Arc<dyn CircuitPolicy>,
    policy: VerifyPolicy,
}

impl CredentialVerifier {
    /// Build a verifier with the transport selected by configuration.
    pub fn from_config(config: &AuthorityConfig) -> Result<Self, ConfigError> {
        let transport: Arc<dyn VerifierTransport> = match config.transport {
            TransportKind::Http => Arc::new(HttpTransport::new(config)?),
            TransportKind::Rpc => Arc::new(RpcTransport::new(config)?),
        };
        Ok(Self::new(transport, VerifyPolicy::from(config)))
    }

    pub fn new(transport: Arc<dyn VerifierTransport>, policy: VerifyPolicy) -> Self {
        Self {
            transport,
            circuit: Arc::new(AlwaysClosed),
            policy,
        }
    }

    pub fn with_circuit_policy(mut self, circuit: Arc<dyn CircuitPolicy>) -> Self {
        self.circuit = circuit;
        self
    }

    pub fn transport_name(&self) -> &'static str {
        self.transport.name()
    }

    pub fn policy(&self) -> VerifyPolicy {
        self.policy
    }

    /// Verify one credential. Always returns exactly one verdict.
    pub async fn verify(&self, credential: Credential) -> VerificationResult {
        if credential.is_empty() {
            return VerificationResult::Invalid(InvalidReason::MissingCredential);
        }

        let request = VerificationRequest::new(credential);
        let started = Instant::now();

        let first = self.attempt(&request).await;
        if !(self.policy.retry_transient && first.is_transient()) {
            log_result(&request, &first, 1, started);
            return first;
        }

        tracing::debug!(
            credential = %request.credential(),
            transport = self.transport.name(),
            backoff_ms = self.policy.retry_backoff.as_millis() as u64,
            result = ?first,
            "transient authority failure, retrying once"
        );
        tokio::time::sleep(self.policy.retry_backoff).await;

        let second = self.attempt(&request).await;
        log_result(&request, &second, 2, started);
        second
    }

    async fn attempt(&self, request: &VerificationRequest) -> VerificationResult {
        if !self.circuit.permit() {
            return VerificationResult::Unreachable(UnreachableCause::CircuitOpen);
        }

        let call = self.transport.verify(request);
        let result = match tokio::time::timeout(self.policy.timeout, call).await {
            Ok(result) => result,
            Err(_elapsed) => VerificationResult::Unreachable(UnreachableCause::Timeout),
        };

        self.circuit.record(&result);
        result
    }
}

fn log_result(
    request: &VerificationRequest,
    result: &VerificationResult,
    attempts: u32,
    started: Instant,
) {
    let elapsed_ms = started.elapsed().as_millis() as u64;
    match result {
        VerificationResult::Valid(identity) => tracing::debug!(
            credential = %request.credential(),
            user_id = %identity.user_id(),
            attempts,
            elapsed_ms,
            "credential verified"
        ),
        VerificationResult::Invalid(reason) => tracing::debug!(
            credential = %request.credential(),
            reason = %reason,
            attempts,
            elapsed_ms,
            "credential rejected by authority"
        ),
        VerificationResult::Unreachable(cause) => tracing::warn!(
            credential = %request.credential(),
            cause = %cause,
            attempts,
            elapsed_ms,
            "authority unreachable"
        ),
    }
}
