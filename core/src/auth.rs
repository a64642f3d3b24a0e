//! Request signing.
//!
//! Every outgoing request, resource fetches and form submissions alike,
//! passes through the configured `Signer` right before it is sent.

use std::fmt;

use reqwest::header::{HeaderValue, AUTHORIZATION};
use reqwest::Request;

use crate::error::ApiError;

/// Annotates an outgoing request with credentials.
pub trait Signer: Send + Sync + fmt::Debug {
    fn sign(&self, request: &mut Request);
}

/// Leaves requests untouched. The default signer.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoAuth;

impl Signer for NoAuth {
    fn sign(&self, _request: &mut Request) {}
}

/// Sends `Authorization: Bearer <token>` with every request.
#[derive(Clone)]
pub struct BearerToken {
    header: HeaderValue,
}

impl BearerToken {
    /// Fails if the token cannot be carried in an HTTP header.
    pub fn new(token: &str) -> Result<Self, ApiError> {
        let mut header = HeaderValue::from_str(&format!("Bearer {token}"))
            .map_err(|_| ApiError::Config("bearer token contains invalid header characters".to_string()))?;
        header.set_sensitive(true);
        Ok(Self { header })
    }
}

impl fmt::Debug for BearerToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BearerToken").finish_non_exhaustive()
    }
}

impl Signer for BearerToken {
    fn sign(&self, request: &mut Request) {
        request.headers_mut().insert(AUTHORIZATION, self.header.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> Request {
        Request::new(reqwest::Method::GET, "http://localhost:80/resource".parse().unwrap())
    }

    #[test]
    fn no_auth_leaves_headers_alone() {
        let mut req = request();
        NoAuth.sign(&mut req);
        assert!(req.headers().is_empty());
    }

    #[test]
    fn bearer_token_sets_authorization() {
        let mut req = request();
        BearerToken::new("s3cret").unwrap().sign(&mut req);
        let value = req.headers().get(AUTHORIZATION).unwrap();
        assert_eq!(value.to_str().unwrap(), "Bearer s3cret");
        assert!(value.is_sensitive());
    }

    #[test]
    fn bearer_token_rejects_newlines() {
        let err = BearerToken::new("bad\ntoken").unwrap_err();
        assert!(matches!(err, ApiError::Config(_)));
    }

    #[test]
    fn bearer_token_debug_hides_secret() {
        let token = BearerToken::new("s3cret").unwrap();
        assert!(!format!("{token:?}").contains("s3cret"));
    }
}
