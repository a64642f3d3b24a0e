//! Resource accessor: GET a path and decode it as a resource document.
//!
//! The body is decoded whatever the response status; a non-document body
//! surfaces as `ApiError::Decode`. No retries and no caching, so every call
//! sees the server's current representation.

use reqwest::header::{HeaderValue, ACCEPT};
use tracing::debug;

use crate::client::Client;
use crate::error::ApiError;
use crate::form::FormRequest;
use crate::http::HttpMethod;
use crate::types::{Content, Link, Resource};

/// A resource path scoped to a client.
#[derive(Debug, Clone)]
pub struct ResourceRequest {
    client: Client,
    path: String,
}

impl ResourceRequest {
    pub(crate) fn new(client: Client, path: &str) -> Self {
        Self {
            client,
            path: path.to_string(),
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    pub async fn get(&self) -> Result<Resource, ApiError> {
        let mut request = self.client.build_request(HttpMethod::Get, &self.path)?;
        request
            .headers_mut()
            .insert(ACCEPT, HeaderValue::from_static("application/json"));

        let response = self.client.execute(request).await?;
        let status = response.status().as_u16();
        let body = response.bytes().await?;
        debug!(path = %self.path, status, bytes = body.len(), "fetched resource");

        Resource::from_slice(&body)
    }

    /// Builder for the form called `name`. Nothing is fetched until submit.
    pub fn form(&self, name: &str) -> FormRequest {
        FormRequest::new(self.clone(), name)
    }

    /// Fetch the resource and return the link descriptor called `name`.
    pub async fn link(&self, name: &str) -> Result<Link, ApiError> {
        let mut resource = self.get().await?;
        resource.links.remove(name).ok_or_else(|| ApiError::LinkNotFound {
            link: name.to_string(),
            resource: self.path.clone(),
        })
    }

    /// Fetch the resource and return the content descriptor called `name`.
    pub async fn content(&self, name: &str) -> Result<Content, ApiError> {
        let mut resource = self.get().await?;
        resource.content.remove(name).ok_or_else(|| ApiError::ContentNotFound {
            content: name.to_string(),
            resource: self.path.clone(),
        })
    }
}
