// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! HTTP transport: `GET <verify_url>` with the bearer credential forwarded in
//! the `Authorization` header.
//!
//! ## Status mapping
//!
//! | Authority answer | Verdict |
//! |------------------|---------|
//! | 200 + well-formed identity | `Valid` |
//! | 401 / 403 | `Invalid` |
//! | 200 + envelope `resp_code` 401 / 403 | `Invalid` |
//! | 200 + unparseable or incomplete body | `Unreachable` |
//! | any other status | `Unreachable` |
//! | network error / timeout | `Unreachable` |

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::{header::AUTHORIZATION, Client, StatusCode};
use serde::{Deserialize, Deserializer};
use url::Url;

use super::{IdentityClaims, VerifierTransport};
use crate::auth::identity::VerificationRequest;
use crate::auth::verdict::{InvalidReason, UnreachableCause, VerificationResult};
use crate::config::{AuthorityConfig, ConfigError};

/// Upper bound on how much of a rejection body is kept as the reason.
const MAX_REASON_LEN: usize = 200;

/// Verification over plain HTTP(S) against the authority's endpoint.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    verify_url: Url,
}

impl HttpTransport {
    pub fn new(config: &AuthorityConfig) -> Result<Self, ConfigError> {
        Self::with_url(config.verify_url.clone(), config.timeout)
    }

    pub fn with_url(verify_url: Url, timeout: Duration) -> Result<Self, ConfigError> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .build()?;
        Ok(Self { client, verify_url })
    }

    pub fn verify_url(&self) -> &Url {
        &self.verify_url
    }
}

#[async_trait]
impl VerifierTransport for HttpTransport {
    fn name(&self) -> &'static str {
        "http"
    }

    async fn verify(&self, request: &VerificationRequest) -> VerificationResult {
        let response = match self
            .client
            .get(self.verify_url.clone())
            .header(
                AUTHORIZATION,
                format!("Bearer {}", request.credential().expose()),
            )
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => return VerificationResult::Unreachable(classify_send_error(&e)),
        };

        let status = response.status();
        let body = match response.bytes().await {
            Ok(body) => body,
            Err(e) => return VerificationResult::Unreachable(classify_send_error(&e)),
        };

        interpret(status, &body)
    }
}

fn classify_send_error(e: &reqwest::Error) -> UnreachableCause {
    if e.is_timeout() {
        UnreachableCause::Timeout
    } else if e.is_connect() {
        UnreachableCause::Connect(e.to_string())
    } else {
        UnreachableCause::Transport(e.to_string())
    }
}

/// Map an authority answer to a verdict.
fn interpret(status: StatusCode, body: &[u8]) -> VerificationResult {
    match status {
        StatusCode::OK => interpret_success_body(body),
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            VerificationResult::Invalid(InvalidReason::Rejected(rejection_reason(body)))
        }
        other => {
            VerificationResult::Unreachable(UnreachableCause::UnexpectedStatus(other.as_u16()))
        }
    }
}

fn interpret_success_body(body: &[u8]) -> VerificationResult {
    let parsed: AuthorityBody = match serde_json::from_slice(body) {
        Ok(parsed) => parsed,
        Err(e) => {
            return VerificationResult::Unreachable(UnreachableCause::MalformedResponse(
                e.to_string(),
            ))
        }
    };

    let payload = match parsed {
        AuthorityBody::Bare(payload) => payload,
        AuthorityBody::Envelope(envelope) => match envelope.resp_code {
            200 => match envelope.data {
                Some(data) => match serde_json::from_value::<IdentityPayload>(data) {
                    Ok(payload) => payload,
                    Err(e) => {
                        return VerificationResult::Unreachable(
                            UnreachableCause::MalformedResponse(e.to_string()),
                        )
                    }
                },
                None => {
                    return VerificationResult::Unreachable(UnreachableCause::MalformedResponse(
                        "success envelope without data".to_string(),
                    ))
                }
            },
            401 | 403 => {
                return VerificationResult::Invalid(InvalidReason::Rejected(truncate(
                    envelope.message,
                )))
            }
            other => {
                return VerificationResult::Unreachable(UnreachableCause::UnexpectedStatus(other))
            }
        },
    };

    payload.into_claims().into_verdict(Utc::now())
}

fn rejection_reason(body: &[u8]) -> String {
    #[derive(Deserialize)]
    struct RejectionBody {
        #[serde(alias = "detail", alias = "error")]
        message: String,
    }

    match serde_json::from_slice::<RejectionBody>(body) {
        Ok(parsed) => truncate(parsed.message),
        Err(_) => String::new(),
    }
}

fn truncate(mut message: String) -> String {
    if message.len() > MAX_REASON_LEN {
        let mut cut = MAX_REASON_LEN;
        while !message.is_char_boundary(cut) {
            cut -= 1;
        }
        message.truncate(cut);
    }
    message
}

/// Body of a 200 answer: the authority's standard envelope or a bare identity.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum AuthorityBody {
    Envelope(Envelope),
    Bare(IdentityPayload),
}

#[derive(Debug, Deserialize)]
struct Envelope {
    resp_code: u16,
    #[serde(default)]
    message: String,
    #[serde(default)]
    data: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct IdentityPayload {
    #[serde(alias = "id")]
    user_id: i64,
    email: String,
    #[serde(deserialize_with = "admin_flag")]
    is_admin: bool,
    #[serde(default, alias = "iat")]
    issued_at: Option<i64>,
    #[serde(default, alias = "exp")]
    expires_at: Option<i64>,
}

impl IdentityPayload {
    fn into_claims(self) -> IdentityClaims {
        IdentityClaims {
            user_id: self.user_id,
            email: self.email,
            is_admin: self.is_admin,
            issued_at: self.issued_at,
            expires_at: self.expires_at,
        }
    }
}

/// The identity service stores the admin flag as `0`/`1`; accept that and booleans.
fn admin_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Int(i64),
    }

    match Flag::deserialize(deserializer)? {
        Flag::Bool(flag) => Ok(flag),
        Flag::Int(0) => Ok(false),
        Flag::Int(1) => Ok(true),
        Flag::Int(other) => Err(serde::de::Error::custom(format!(
            "is_admin must be a boolean or 0/1, got {other}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::identity::{Credential, UserId};
    use serde_json::json;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const VERIFY_PATH: &str = "/api/auth/validate-token";

    fn transport_for(server: &MockServer, timeout: Duration) -> HttpTransport {
        let url = Url::parse(&format!("{}{}", server.uri(), VERIFY_PATH)).unwrap();
        HttpTransport::with_url(url, timeout).unwrap()
    }

    fn request(token: &str) -> VerificationRequest {
        VerificationRequest::new(Credential::new(token))
    }

    #[tokio::test]
    async fn bare_identity_is_valid() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(VERIFY_PATH))
            .and(header("authorization", "Bearer tok123"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "user_id": 42,
                "email": "a@b.com",
                "is_admin": false
            })))
            .expect(1)
            .mount(&server)
            .await;

        let transport = transport_for(&server, Duration::from_secs(2));
        let VerificationResult::Valid(identity) = transport.verify(&request("tok123")).await else {
            panic!("expected Valid");
        };
        assert_eq!(identity.user_id(), UserId(42));
        assert_eq!(identity.email(), "a@b.com");
        assert!(!identity.is_admin());
    }

    #[tokio::test]
    async fn envelope_identity_is_valid() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(VERIFY_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "resp_code": 200,
                "message": "",
                "data": {"id": 7, "email": "admin@b.com", "is_admin": 1, "exp": 4_102_444_800_i64}
            })))
            .mount(&server)
            .await;

        let transport = transport_for(&server, Duration::from_secs(2));
        let VerificationResult::Valid(identity) = transport.verify(&request("tok")).await else {
            panic!("expected Valid");
        };
        assert_eq!(identity.user_id(), UserId(7));
        assert!(identity.is_admin());
        assert!(identity.expires_at().is_some());
    }

    #[tokio::test]
    async fn unauthorized_status_is_invalid() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(401)
                    .set_body_json(json!({"detail": "Auth token is invalid"})),
            )
            .mount(&server)
            .await;

        let transport = transport_for(&server, Duration::from_secs(2));
        assert_eq!(
            transport.verify(&request("bad")).await,
            VerificationResult::Invalid(InvalidReason::Rejected("Auth token is invalid".into()))
        );
    }

    #[tokio::test]
    async fn forbidden_status_is_invalid() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&server)
            .await;

        let transport = transport_for(&server, Duration::from_secs(2));
        assert!(matches!(
            transport.verify(&request("bad")).await,
            VerificationResult::Invalid(InvalidReason::Rejected(_))
        ));
    }

    #[tokio::test]
    async fn envelope_rejection_is_invalid() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "resp_code": 401,
                "message": "Signature has expired."
            })))
            .mount(&server)
            .await;

        let transport = transport_for(&server, Duration::from_secs(2));
        assert_eq!(
            transport.verify(&request("old")).await,
            VerificationResult::Invalid(InvalidReason::Rejected("Signature has expired.".into()))
        );
    }

    #[tokio::test]
    async fn server_error_is_unreachable() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(502))
            .mount(&server)
            .await;

        let transport = transport_for(&server, Duration::from_secs(2));
        assert_eq!(
            transport.verify(&request("tok")).await,
            VerificationResult::Unreachable(UnreachableCause::UnexpectedStatus(502))
        );
    }

    #[tokio::test]
    async fn partial_success_payload_is_not_trusted() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"user_id": 42, "email": "a@b.com"})),
            )
            .mount(&server)
            .await;

        let transport = transport_for(&server, Duration::from_secs(2));
        assert!(matches!(
            transport.verify(&request("tok")).await,
            VerificationResult::Unreachable(UnreachableCause::MalformedResponse(_))
        ));
    }

    #[tokio::test]
    async fn wrongly_typed_field_is_malformed() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "user_id": "forty-two",
                "email": "a@b.com",
                "is_admin": false
            })))
            .mount(&server)
            .await;

        let transport = transport_for(&server, Duration::from_secs(2));
        assert!(matches!(
            transport.verify(&request("tok")).await,
            VerificationResult::Unreachable(UnreachableCause::MalformedResponse(_))
        ));
    }

    #[tokio::test]
    async fn non_json_body_is_malformed() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>gateway</html>"))
            .mount(&server)
            .await;

        let transport = transport_for(&server, Duration::from_secs(2));
        assert!(matches!(
            transport.verify(&request("tok")).await,
            VerificationResult::Unreachable(UnreachableCause::MalformedResponse(_))
        ));
    }

    #[tokio::test]
    async fn slow_authority_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"user_id": 1, "email": "a@b.com", "is_admin": false}))
                    .set_delay(Duration::from_secs(2)),
            )
            .mount(&server)
            .await;

        let transport = transport_for(&server, Duration::from_millis(100));
        assert_eq!(
            transport.verify(&request("tok")).await,
            VerificationResult::Unreachable(UnreachableCause::Timeout)
        );
    }

    #[tokio::test]
    async fn refused_connection_is_unreachable() {
        // Bind then drop a listener so the port is very likely closed.
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let url = Url::parse(&format!("http://{addr}{VERIFY_PATH}")).unwrap();
        let transport = HttpTransport::with_url(url, Duration::from_secs(1)).unwrap();
        let result = transport.verify(&request("tok")).await;
        assert!(matches!(result, VerificationResult::Unreachable(_)));
        assert!(result.is_transient());
    }

    #[test]
    fn admin_flag_rejects_other_integers() {
        let err = serde_json::from_value::<IdentityPayload>(json!({
            "user_id": 1, "email": "a@b.com", "is_admin": 2
        }))
        .unwrap_err();
        assert!(err.to_string().contains("0/1"));
    }

    #[test]
    fn long_rejection_reason_is_truncated() {
        let body = serde_json::to_vec(&json!({"message": "x".repeat(500)})).unwrap();
        assert_eq!(rejection_reason(&body).len(), MAX_REASON_LEN);
    }
}
