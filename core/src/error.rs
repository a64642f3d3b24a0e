//! Error types for the hypermedia client.
//!
//! # Design
//! `ApiError` covers everything that can stop a fetch or a form submission.
//! Cancellation is deliberately absent: it is not a failure, so a settled
//! submission reports it through `SubmissionError::Cancelled` instead. Errors
//! are returned to the caller and never retried here.

use std::sync::Arc;

use crate::media_type::MediaType;

/// Errors returned by resource fetches and form submissions.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The server could not be reached, or the exchange broke mid-flight.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The resource body is not a valid resource document.
    #[error("failed to decode resource: {0}")]
    Decode(#[source] serde_json::Error),

    #[error("no such form with name '{form}' defined on resource '{resource}'")]
    FormNotFound { form: String, resource: String },

    #[error("no such link with name '{link}' defined on resource '{resource}'")]
    LinkNotFound { link: String, resource: String },

    #[error("no such content with name '{content}' defined on resource '{resource}'")]
    ContentNotFound { content: String, resource: String },

    /// A form enctype or field media type this client cannot encode.
    #[error("media type '{0}' is not supported")]
    UnsupportedMediaType(MediaType),

    /// Writing the form body failed, e.g. a byte-stream field could not be read.
    #[error("failed to encode form body: {0}")]
    Encode(#[source] std::io::Error),

    /// The request could not be constructed (bad URL or header value).
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("invalid client configuration: {0}")]
    Config(String),

    /// A submission activity panicked or was torn down unexpectedly.
    #[error("submission task failed: {0}")]
    Task(String),

    /// `submit` was called outside a tokio runtime.
    #[error("no async runtime available: {0}")]
    Runtime(String),
}

/// Terminal non-success outcome of a form submission.
#[derive(Debug, Clone, thiserror::Error)]
pub enum SubmissionError {
    #[error(transparent)]
    Failed(Arc<ApiError>),

    /// The caller cancelled the submission before it completed.
    #[error("form submission was cancelled")]
    Cancelled,
}

impl SubmissionError {
    /// The underlying failure, if this is not a cancellation.
    pub fn api_error(&self) -> Option<&ApiError> {
        match self {
            SubmissionError::Failed(err) => Some(err.as_ref()),
            SubmissionError::Cancelled => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn form_not_found_names_form_and_resource() {
        let err = ApiError::FormNotFound {
            form: "test".to_string(),
            resource: "/resource".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "no such form with name 'test' defined on resource '/resource'"
        );
    }

    #[test]
    fn unsupported_media_type_names_the_type() {
        let err = ApiError::UnsupportedMediaType(MediaType::JSON);
        assert_eq!(err.to_string(), "media type 'application/json;charset=utf-8' is not supported");
    }

    #[test]
    fn cancellation_is_not_an_api_error() {
        assert!(SubmissionError::Cancelled.api_error().is_none());
        let failed = SubmissionError::Failed(Arc::new(ApiError::Task("boom".to_string())));
        assert!(matches!(failed.api_error(), Some(ApiError::Task(_))));
        assert_eq!(failed.to_string(), "submission task failed: boom");
    }
}
