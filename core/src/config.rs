//! Client construction options.
//!
//! # Design
//! Every option has a default, so `ClientConfig::default()` is a working
//! plain-HTTP client for `localhost:80`. TLS certificate verification is on
//! unless `TlsVerification::SkipVerify` is chosen explicitly.
//!
//! `from_env` reads the same options from `HMAPI_*` environment variables.
//! Parsing goes through `from_lookup` so it can be exercised without touching
//! the process environment.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::auth::{BearerToken, NoAuth, Signer};
use crate::error::ApiError;
use crate::multipart::BoundaryMode;

pub const ENV_SCHEME: &str = "HMAPI_SCHEME";
pub const ENV_HOST: &str = "HMAPI_HOST";
pub const ENV_PORT: &str = "HMAPI_PORT";
pub const ENV_TLS_VERIFY: &str = "HMAPI_TLS_VERIFY";
pub const ENV_BEARER_TOKEN: &str = "HMAPI_BEARER_TOKEN";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Scheme {
    #[default]
    Http,
    Https,
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scheme::Http => f.write_str("http"),
            Scheme::Https => f.write_str("https"),
        }
    }
}

impl FromStr for Scheme {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "http" => Ok(Scheme::Http),
            "https" => Ok(Scheme::Https),
            other => Err(ApiError::Config(format!("unknown scheme '{other}'"))),
        }
    }
}

/// Whether server certificates are checked on `https` connections.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TlsVerification {
    #[default]
    Verify,
    /// Accept any certificate. Only for development servers.
    SkipVerify,
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub scheme: Scheme,
    pub host: String,
    pub port: u16,
    pub auth: Arc<dyn Signer>,
    pub tls: TlsVerification,
    pub boundary: BoundaryMode,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            scheme: Scheme::Http,
            host: "localhost".to_string(),
            port: 80,
            auth: Arc::new(NoAuth),
            tls: TlsVerification::Verify,
            boundary: BoundaryMode::Fixed,
        }
    }
}

impl ClientConfig {
    pub fn with_scheme(mut self, scheme: Scheme) -> Self {
        self.scheme = scheme;
        self
    }

    pub fn with_host(mut self, host: &str) -> Self {
        self.host = host.to_string();
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_auth(mut self, auth: impl Signer + 'static) -> Self {
        self.auth = Arc::new(auth);
        self
    }

    pub fn with_tls(mut self, tls: TlsVerification) -> Self {
        self.tls = tls;
        self
    }

    pub fn with_boundary(mut self, boundary: BoundaryMode) -> Self {
        self.boundary = boundary;
        self
    }

    /// `{scheme}://{host}:{port}`, the prefix every request path is appended to.
    pub fn base_uri(&self) -> String {
        format!("{}://{}:{}", self.scheme, self.host, self.port)
    }

    pub fn from_env() -> Result<Self, ApiError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from `HMAPI_*` keys resolved by `lookup`. Missing keys
    /// keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ApiError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(scheme) = lookup(ENV_SCHEME) {
            config.scheme = scheme.parse()?;
        }
        if let Some(host) = lookup(ENV_HOST) {
            config.host = host;
        }
        if let Some(port) = lookup(ENV_PORT) {
            config.port = port
                .parse()
                .map_err(|_| ApiError::Config(format!("{ENV_PORT} is not a port number: '{port}'")))?;
        }
        if let Some(verify) = lookup(ENV_TLS_VERIFY) {
            config.tls = match verify.to_ascii_lowercase().as_str() {
                "true" | "1" | "yes" => TlsVerification::Verify,
                "false" | "0" | "no" => TlsVerification::SkipVerify,
                _ => {
                    return Err(ApiError::Config(format!(
                        "{ENV_TLS_VERIFY} must be true or false, got '{verify}'"
                    )))
                }
            };
        }
        if let Some(token) = lookup(ENV_BEARER_TOKEN) {
            config.auth = Arc::new(BearerToken::new(&token)?);
        }

        Ok(config)
    }
}
