// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! Configuration is loaded from the environment once at startup and passed
//! explicitly into the components that need it.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `8000` |
//! | `AUTHORITY_TRANSPORT` | `http` or `rpc` | `http` |
//! | `AUTHORITY_VERIFY_URL` | Identity service verification endpoint | `http://nginx:8080/api/auth/validate-token` |
//! | `AUTHORITY_RPC_ENDPOINT` | Identity service gRPC endpoint | `http://user_service:50051` |
//! | `AUTHORITY_TIMEOUT_MS` | Per-attempt verification timeout | `3000` |
//! | `AUTHORITY_RETRY_BACKOFF_MS` | Backoff before the single retry | `100` |
//! | `AUTHORITY_RETRY` | Retry a transient failure once | `true` |
//! | `AUTHORITY_RETRY_AFTER_SECS` | `Retry-After` sent with 503 responses | `5` |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |

use std::{fmt, net::SocketAddr, str::FromStr, time::Duration};

use url::Url;

pub const HOST_ENV: &str = "HOST";
pub const PORT_ENV: &str = "PORT";
pub const AUTHORITY_TRANSPORT_ENV: &str = "AUTHORITY_TRANSPORT";
pub const AUTHORITY_VERIFY_URL_ENV: &str = "AUTHORITY_VERIFY_URL";
pub const AUTHORITY_RPC_ENDPOINT_ENV: &str = "AUTHORITY_RPC_ENDPOINT";
pub const AUTHORITY_TIMEOUT_MS_ENV: &str = "AUTHORITY_TIMEOUT_MS";
pub const AUTHORITY_RETRY_BACKOFF_MS_ENV: &str = "AUTHORITY_RETRY_BACKOFF_MS";
pub const AUTHORITY_RETRY_ENV: &str = "AUTHORITY_RETRY";
pub const AUTHORITY_RETRY_AFTER_SECS_ENV: &str = "AUTHORITY_RETRY_AFTER_SECS";
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8000;
/// Routed through the reverse proxy, as the identity service is never
/// addressed directly by other services.
const DEFAULT_VERIFY_URL: &str = "http://nginx:8080/api/auth/validate-token";
const DEFAULT_RPC_ENDPOINT: &str = "http://user_service:50051";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(3);
const DEFAULT_RETRY_BACKOFF: Duration = Duration::from_millis(100);
const DEFAULT_RETRY_AFTER: Duration = Duration::from_secs(5);

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value for {name}: {reason}")]
    InvalidValue { name: &'static str, reason: String },

    #[error("failed to build authority HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("invalid authority RPC endpoint: {0}")]
    RpcEndpoint(String),
}

impl ConfigError {
    fn invalid(name: &'static str, reason: impl fmt::Display) -> Self {
        ConfigError::InvalidValue {
            name,
            reason: reason.to_string(),
        }
    }
}

/// Which transport the verifier uses to reach the authority.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportKind {
    Http,
    Rpc,
}

impl TransportKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransportKind::Http => "http",
            TransportKind::Rpc => "rpc",
        }
    }
}

impl fmt::Display for TransportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransportKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "http" => Ok(TransportKind::Http),
            "rpc" | "grpc" => Ok(TransportKind::Rpc),
            other => Err(format!("unknown transport '{other}' (expected 'http' or 'rpc')")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pretty" | "text" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            other => Err(format!("unknown log format '{other}'")),
        }
    }
}

/// Settings for reaching the authority (identity) service.
#[derive(Debug, Clone)]
pub struct AuthorityConfig {
    pub transport: TransportKind,
    /// Full URL of the HTTP verification endpoint.
    pub verify_url: Url,
    /// gRPC endpoint URI of the identity service.
    pub rpc_endpoint: String,
    /// Bound applied to every single verification attempt.
    pub timeout: Duration,
    /// Fixed pause before the one retry of a transient failure.
    pub retry_backoff: Duration,
    pub retry_transient: bool,
    /// Advertised to clients on 503 responses.
    pub retry_after: Duration,
}

impl Default for AuthorityConfig {
    fn default() -> Self {
        Self {
            transport: TransportKind::Http,
            verify_url: Url::parse(DEFAULT_VERIFY_URL).expect("default verify URL is valid"),
            rpc_endpoint: DEFAULT_RPC_ENDPOINT.to_string(),
            timeout: DEFAULT_TIMEOUT,
            retry_backoff: DEFAULT_RETRY_BACKOFF,
            retry_transient: true,
            retry_after: DEFAULT_RETRY_AFTER,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: SocketAddr,
    pub log_format: LogFormat,
    pub authority: AuthorityConfig,
}

impl Config {
    /// Load the configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load the configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let host = lookup(HOST_ENV).unwrap_or_else(|| DEFAULT_HOST.to_string());
        let port: u16 = parse_or(&lookup, PORT_ENV, DEFAULT_PORT)?;
        let bind_addr: SocketAddr = format!("{host}:{port}")
            .parse()
            .map_err(|e| ConfigError::invalid(HOST_ENV, e))?;

        let log_format = parse_or(&lookup, LOG_FORMAT_ENV, LogFormat::Pretty)?;

        let defaults = AuthorityConfig::default();
        let transport = parse_or(&lookup, AUTHORITY_TRANSPORT_ENV, defaults.transport)?;

        let verify_url = match lookup(AUTHORITY_VERIFY_URL_ENV) {
            Some(raw) => {
                let url = Url::parse(&raw)
                    .map_err(|e| ConfigError::invalid(AUTHORITY_VERIFY_URL_ENV, e))?;
                if !matches!(url.scheme(), "http" | "https") {
                    return Err(ConfigError::invalid(
                        AUTHORITY_VERIFY_URL_ENV,
                        "scheme must be http or https",
                    ));
                }
                url
            }
            None => defaults.verify_url,
        };

        let rpc_endpoint = lookup(AUTHORITY_RPC_ENDPOINT_ENV).unwrap_or(defaults.rpc_endpoint);

        let timeout_ms: u64 = parse_or(
            &lookup,
            AUTHORITY_TIMEOUT_MS_ENV,
            defaults.timeout.as_millis() as u64,
        )?;
        if timeout_ms == 0 {
            return Err(ConfigError::invalid(
                AUTHORITY_TIMEOUT_MS_ENV,
                "timeout must be greater than zero",
            ));
        }

        let backoff_ms: u64 = parse_or(
            &lookup,
            AUTHORITY_RETRY_BACKOFF_MS_ENV,
            defaults.retry_backoff.as_millis() as u64,
        )?;
        let retry_transient = parse_or(&lookup, AUTHORITY_RETRY_ENV, defaults.retry_transient)?;
        let retry_after_secs: u64 = parse_or(
            &lookup,
            AUTHORITY_RETRY_AFTER_SECS_ENV,
            defaults.retry_after.as_secs(),
        )?;

        Ok(Self {
            bind_addr,
            log_format,
            authority: AuthorityConfig {
                transport,
                verify_url,
                rpc_endpoint,
                timeout: Duration::from_millis(timeout_ms),
                retry_backoff: Duration::from_millis(backoff_ms),
                retry_transient,
                retry_after: Duration::from_secs(retry_after_secs),
            },
        })
    }
}

fn parse_or<F, T>(lookup: &F, name: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: fmt::Display,
{
    match lookup(name) {
        Some(raw) => raw.trim().parse().map_err(|e| ConfigError::invalid(name, e)),
        None => Ok(default),
    }
}
