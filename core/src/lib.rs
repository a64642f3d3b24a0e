//! Client for hypermedia-driven HTTP APIs.
//!
//! # Overview
//! Resources expose named links, forms and content descriptors. A caller
//! fetches a resource, picks a form by name, fills in fields and submits it.
//! Submission re-fetches the resource to get the authoritative form, then
//! streams a `multipart/form-data` body to the form's action while the HTTP
//! exchange is in flight.
//!
//! ```no_run
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! use hmapi_core::{Client, ClientConfig};
//!
//! let client = Client::new(ClientConfig::default().with_port(3000))?;
//! let submission = client
//!     .resource("/resource")
//!     .form("test")
//!     .add_field_as_string("foo", "test")
//!     .submit();
//! let response = submission.wait().await?;
//! assert_eq!(response.status, 200);
//! # Ok(())
//! # }
//! ```
//!
//! # Design
//! - `Client` holds configuration and one pooled transport; accessors and
//!   builders borrow nothing and are cheap to create.
//! - `FormRequest` only accumulates fields. All validation happens in the
//!   submission, against the freshly fetched form.
//! - `FormSubmission` settles exactly once, and reports cancellation
//!   separately from failure.
//! - DTOs are defined independently from the mock-server crate; integration
//!   tests catch schema drift.

pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod form;
pub mod http;
pub mod media_type;
pub mod multipart;
pub mod resource;
pub mod submission;
pub mod types;

pub use auth::{BearerToken, NoAuth, Signer};
pub use client::Client;
pub use config::{ClientConfig, Scheme, TlsVerification};
pub use error::{ApiError, SubmissionError};
pub use form::{FieldEntry, FieldValue, FormRequest};
pub use http::{HttpMethod, HttpResponse};
pub use media_type::MediaType;
pub use multipart::{BoundaryMode, MULTIPART_BOUNDARY};
pub use resource::ResourceRequest;
pub use submission::{FormSubmission, SubmissionStatus};
pub use types::{Content, Form, FormField, Link, Resource};
