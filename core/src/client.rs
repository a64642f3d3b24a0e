//! Entry point for talking to a hypermedia API.
//!
//! # Design
//! `Client` owns the configuration and one pooled HTTP transport, shared by
//! every resource accessor and submission derived from it. Cloning a client
//! is a reference-count bump. Every request goes through `execute`, which
//! applies the configured signer before sending.

use std::sync::Arc;

use tracing::warn;

use crate::config::{ClientConfig, TlsVerification};
use crate::error::ApiError;
use crate::http::HttpMethod;
use crate::resource::ResourceRequest;

/// Handle to a hypermedia API server.
#[derive(Debug, Clone)]
pub struct Client {
    inner: Arc<ClientInner>,
}

#[derive(Debug)]
struct ClientInner {
    config: ClientConfig,
    base_uri: String,
    http: reqwest::Client,
}

impl Client {
    pub fn new(config: ClientConfig) -> Result<Self, ApiError> {
        let skip_verify = config.tls == TlsVerification::SkipVerify;
        if skip_verify {
            warn!(host = %config.host, "TLS certificate verification is disabled");
        }
        let http = reqwest::Client::builder()
            .danger_accept_invalid_certs(skip_verify)
            .build()
            .map_err(|e| ApiError::Config(format!("failed to build HTTP transport: {e}")))?;

        Ok(Self {
            inner: Arc::new(ClientInner {
                base_uri: config.base_uri(),
                config,
                http,
            }),
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    pub fn base_uri(&self) -> &str {
        &self.inner.base_uri
    }

    /// Accessor for the resource at `path`, relative to the base URI.
    pub fn resource(&self, path: &str) -> ResourceRequest {
        ResourceRequest::new(self.clone(), path)
    }

    pub(crate) fn build_request(&self, method: HttpMethod, path: &str) -> Result<reqwest::Request, ApiError> {
        let raw = format!("{}{}", self.inner.base_uri, path);
        let url = reqwest::Url::parse(&raw).map_err(|e| ApiError::InvalidRequest(format!("{raw}: {e}")))?;
        Ok(reqwest::Request::new(method.into(), url))
    }

    /// Sign and send `request`.
    pub(crate) async fn execute(&self, mut request: reqwest::Request) -> Result<reqwest::Response, ApiError> {
        self.inner.config.auth.sign(&mut request);
        Ok(self.inner.http.execute(request).await?)
    }
}
