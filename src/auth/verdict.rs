// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Outcome of a single credential verification.

use std::fmt;

use super::identity::Identity;

/// Result of asking the authority about one credential.
///
/// Exactly one variant is populated. `Invalid` is final; `Unreachable` means
/// the authority could not give an answer and the caller may try again later.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerificationResult {
    Valid(Identity),
    Invalid(InvalidReason),
    Unreachable(UnreachableCause),
}

impl VerificationResult {
    pub fn is_valid(&self) -> bool {
        matches!(self, VerificationResult::Valid(_))
    }

    pub fn outcome(&self) -> &'static str {
        match self {
            VerificationResult::Valid(_) => "valid",
            VerificationResult::Invalid(_) => "invalid",
            VerificationResult::Unreachable(_) => "unreachable",
        }
    }

    /// Whether a second attempt could produce a different answer.
    pub fn is_transient(&self) -> bool {
        match self {
            VerificationResult::Unreachable(cause) => cause.is_transient(),
            _ => false,
        }
    }
}

/// Why the authority (or the verifier itself) rejected a credential.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvalidReason {
    /// No credential was presented. Decided locally, no call made.
    MissingCredential,
    /// The authority refused the credential.
    Rejected(String),
    /// The authority vouched for an identity whose validity already ended.
    Expired,
}

impl InvalidReason {
    pub fn code(&self) -> &'static str {
        match self {
            InvalidReason::MissingCredential => "missing_credential",
            InvalidReason::Rejected(_) => "rejected",
            InvalidReason::Expired => "expired",
        }
    }
}

impl fmt::Display for InvalidReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InvalidReason::MissingCredential => f.write_str("missing_credential"),
            InvalidReason::Rejected(detail) if detail.is_empty() => f.write_str("rejected"),
            InvalidReason::Rejected(detail) => write!(f, "rejected: {detail}"),
            InvalidReason::Expired => f.write_str("expired"),
        }
    }
}

/// Why no verdict could be obtained from the authority.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnreachableCause {
    /// The attempt did not finish within the configured bound.
    Timeout,
    /// No connection could be established.
    Connect(String),
    /// Any other transport-level failure.
    Transport(String),
    /// The authority answered with a status that is neither success nor rejection.
    UnexpectedStatus(u16),
    /// RPC failure other than an explicit rejection.
    Rpc { code: String, message: String },
    /// Success status with a payload that failed schema validation.
    MalformedResponse(String),
    /// The availability policy refused to call the authority.
    CircuitOpen,
}

impl UnreachableCause {
    pub fn is_transient(&self) -> bool {
        match self {
            UnreachableCause::Timeout
            | UnreachableCause::Connect(_)
            | UnreachableCause::Transport(_) => true,
            UnreachableCause::UnexpectedStatus(status) => *status >= 500 || *status == 429,
            UnreachableCause::Rpc { code, .. } => matches!(
                code.as_str(),
                "unavailable" | "deadline_exceeded" | "resource_exhausted" | "aborted"
            ),
            UnreachableCause::MalformedResponse(_) | UnreachableCause::CircuitOpen => false,
        }
    }
}

impl fmt::Display for UnreachableCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnreachableCause::Timeout => f.write_str("authority timed out"),
            UnreachableCause::Connect(e) => write!(f, "could not connect to authority: {e}"),
            UnreachableCause::Transport(e) => write!(f, "authority transport error: {e}"),
            UnreachableCause::UnexpectedStatus(status) => {
                write!(f, "authority answered with unexpected status {status}")
            }
            UnreachableCause::Rpc { code, message } => {
                write!(f, "authority rpc failed ({code}): {message}")
            }
            UnreachableCause::MalformedResponse(e) => {
                write!(f, "malformed authority response: {e}")
            }
            UnreachableCause::CircuitOpen => f.write_str("authority calls are suspended"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_credential_code() {
        let reason = InvalidReason::MissingCredential;
        assert_eq!(reason.code(), "missing_credential");
        assert_eq!(reason.to_string(), "missing_credential");
    }

    #[test]
    fn transient_classification() {
        assert!(UnreachableCause::Timeout.is_transient());
        assert!(UnreachableCause::Connect("refused".into()).is_transient());
        assert!(UnreachableCause::UnexpectedStatus(503).is_transient());
        assert!(UnreachableCause::UnexpectedStatus(429).is_transient());
        assert!(!UnreachableCause::UnexpectedStatus(404).is_transient());
        assert!(!UnreachableCause::MalformedResponse("x".into()).is_transient());
        assert!(!UnreachableCause::CircuitOpen.is_transient());
        assert!(UnreachableCause::Rpc {
            code: "unavailable".into(),
            message: String::new()
        }
        .is_transient());
    }

    #[test]
    fn invalid_is_never_transient() {
        let result = VerificationResult::Invalid(InvalidReason::Rejected("bad token".into()));
        assert!(!result.is_transient());
        assert_eq!(result.outcome(), "invalid");
    }
}
