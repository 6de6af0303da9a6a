// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authentication middleware for Axum.
//!
//! Applied to every protected router subtree. Per request it moves through
//! `pending -> verifying -> {authorized | rejected}`:
//!
//! - `pending`: the bearer credential is read from `Authorization`
//! - `verifying`: the [`CredentialVerifier`] asks the authority
//! - `authorized`: a [`RequestContext`] is attached and the handler runs
//! - `rejected`: 401 for missing/invalid credentials, 503 when the authority
//!   could not answer
//!
//! No retries happen here; the verifier already did what it is allowed to.
//!
//! ```rust,ignore
//! let app = Router::new()
//!     .route("/posts", get(list_posts))
//!     .layer(axum::middleware::from_fn_with_state(
//!         state.auth_config.clone(),
//!         auth_middleware,
//!     ));
//! ```

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Response},
};

use super::identity::{Credential, RequestContext};
use super::verifier::CredentialVerifier;
use super::AuthError;

/// State the middleware needs: the verifier and the 503 retry hint.
#[derive(Clone)]
pub struct AuthConfig {
    pub verifier: Arc<CredentialVerifier>,
    pub retry_after: Duration,
}

impl AuthConfig {
    pub fn new(verifier: CredentialVerifier, retry_after: Duration) -> Self {
        Self {
            verifier: Arc::new(verifier),
            retry_after,
        }
    }

    /// Verify the request's credential and produce its context.
    pub async fn authenticate(&self, headers: &HeaderMap) -> Result<RequestContext, AuthError> {
        let credential = bearer_credential(headers)?;
        tracing::debug!(phase = "verifying", credential = %credential, "verifying credential");

        let result = self.verifier.verify(credential).await;
        let identity = AuthError::check(result, self.retry_after)?;
        Ok(RequestContext::authorized(identity))
    }
}

/// Read the bearer credential from the `Authorization` header.
pub fn bearer_credential(headers: &HeaderMap) -> Result<Credential, AuthError> {
    let raw = headers
        .get(AUTHORIZATION)
        .ok_or(AuthError::MissingCredential)?
        .to_str()
        .map_err(|_| AuthError::InvalidAuthHeader)?
        .trim();

    if raw.is_empty() {
        return Err(AuthError::MissingCredential);
    }

    let (scheme, token) = raw.split_once(' ').unwrap_or((raw, ""));
    if !scheme.eq_ignore_ascii_case("bearer") {
        return Err(AuthError::InvalidAuthHeader);
    }

    Ok(Credential::new(token.trim()))
}

/// Authentication middleware function.
pub async fn auth_middleware(
    State(config): State<AuthConfig>,
    mut request: Request,
    next: Next,
) -> Response {
    match config.authenticate(request.headers()).await {
        Ok(context) => {
            tracing::info!(
                phase = "authorized",
                user_id = %context.identity().user_id(),
                is_admin = context.identity().is_admin(),
                path = %request.uri().path(),
                "request authorized"
            );
            request.extensions_mut().insert(context);
            next.run(request).await
        }
        Err(e) => {
            let reason = match &e {
                AuthError::InvalidCredential(reason) => Some(reason.to_string()),
                _ => None,
            };
            tracing::info!(
                phase = "rejected",
                error_code = e.error_code(),
                reason = reason.as_deref(),
                path = %request.uri().path(),
                "request rejected"
            );
            e.into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::verdict::{InvalidReason, UnreachableCause, VerificationResult};
    use crate::auth::verifier::testing::{valid, verifier_over, ScriptedTransport, Step};
    use axum::{
        body::{to_bytes, Body},
        http::{header::RETRY_AFTER, Request as HttpRequest, StatusCode},
        middleware::from_fn_with_state,
        routing::get,
        Extension, Router,
    };
    use tower::ServiceExt;

    fn config_with(transport: Arc<ScriptedTransport>) -> AuthConfig {
        AuthConfig::new(verifier_over(transport), Duration::from_secs(5))
    }

    async fn whoami(Extension(context): Extension<RequestContext>) -> String {
        context.identity().user_id().to_string()
    }

    fn app(config: AuthConfig) -> Router {
        Router::new()
            .route("/protected", get(whoami))
            .layer(from_fn_with_state(config, auth_middleware))
    }

    fn request(authorization: Option<&str>) -> HttpRequest<Body> {
        let mut builder = HttpRequest::builder().uri("/protected");
        if let Some(value) = authorization {
            builder = builder.header(AUTHORIZATION, value);
        }
        builder.body(Body::empty()).unwrap()
    }

    #[test]
    fn bearer_scheme_is_case_insensitive() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, "bearer  tok123 ".parse().unwrap());
        assert_eq!(bearer_credential(&headers).unwrap().expose(), "tok123");
    }

    #[test]
    fn other_schemes_are_rejected() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, "Basic dXNlcjpwYXNz".parse().unwrap());
        assert!(matches!(
            bearer_credential(&headers),
            Err(AuthError::InvalidAuthHeader)
        ));
    }

    #[test]
    fn bare_bearer_yields_empty_credential() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, "Bearer".parse().unwrap());
        assert!(bearer_credential(&headers).unwrap().is_empty());
    }

    #[tokio::test]
    async fn valid_credential_reaches_handler_with_context() {
        let transport = Arc::new(ScriptedTransport::always(Step::Answer(valid(42, false))));
        let response = app(config_with(transport))
            .oneshot(request(Some("Bearer tok123")))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"42");
    }

    #[tokio::test]
    async fn missing_header_is_401_without_authority_call() {
        let transport = Arc::new(ScriptedTransport::always(Step::Answer(valid(1, false))));
        let response = app(config_with(transport.clone()))
            .oneshot(request(None))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(transport.calls(), 0);
    }

    #[tokio::test]
    async fn empty_bearer_is_401_without_authority_call() {
        let transport = Arc::new(ScriptedTransport::always(Step::Answer(valid(1, false))));
        let response = app(config_with(transport.clone()))
            .oneshot(request(Some("Bearer ")))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(transport.calls(), 0);
    }

    #[tokio::test]
    async fn rejected_credential_is_401() {
        let transport = Arc::new(ScriptedTransport::always(Step::Answer(
            VerificationResult::Invalid(InvalidReason::Rejected("revoked".into())),
        )));
        let response = app(config_with(transport.clone()))
            .oneshot(request(Some("Bearer tok123")))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(transport.calls(), 1);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error_code"], "invalid_credential");
        assert_eq!(json["error"], "Auth token is invalid");
    }

    #[tokio::test]
    async fn unreachable_authority_is_503_not_401() {
        let transport = Arc::new(ScriptedTransport::always(Step::Answer(
            VerificationResult::Unreachable(UnreachableCause::UnexpectedStatus(502)),
        )));
        let response = app(config_with(transport.clone()))
            .oneshot(request(Some("Bearer tok123")))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(response.headers()[RETRY_AFTER], "5");
        // One attempt plus the verifier's single retry; nothing more here.
        assert_eq!(transport.calls(), 2);
    }
}
