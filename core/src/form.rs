//! Client-side form builder.
//!
//! # Design
//! `FormRequest` is a pure accumulator: it records `(name, media type,
//! value)` triples in insertion order and validates nothing. The authoritative
//! form shape is only known once the resource is re-fetched at submit time,
//! so every check happens in the submission engine.
//!
//! Field values are a closed `FieldValue` variant rather than a dynamic value.
//! The media type stays alongside the value because it is what the encoder
//! branches on.

use std::fmt;

use bytes::Bytes;
use tokio::io::AsyncRead;
use tokio_util::sync::CancellationToken;

use crate::media_type::MediaType;
use crate::resource::ResourceRequest;
use crate::submission::FormSubmission;

/// Value supplied for a form field.
pub enum FieldValue {
    Text(String),
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    Bytes(Bytes),
    /// A byte stream copied into the body as it is read. Readable once.
    Reader(Box<dyn AsyncRead + Send + Unpin>),
}

impl FieldValue {
    /// Textual or raw rendering for in-memory values; `None` for `Reader`.
    pub(crate) fn rendered(&self) -> Option<Bytes> {
        match self {
            FieldValue::Text(s) => Some(Bytes::copy_from_slice(s.as_bytes())),
            FieldValue::Bool(b) => Some(Bytes::from_static(if *b { b"true" } else { b"false" })),
            FieldValue::Int(i) => Some(Bytes::from(i.to_string())),
            FieldValue::UInt(u) => Some(Bytes::from(u.to_string())),
            FieldValue::Float(x) => Some(Bytes::from(x.to_string())),
            FieldValue::Bytes(b) => Some(b.clone()),
            FieldValue::Reader(_) => None,
        }
    }
}

impl fmt::Debug for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Text(s) => f.debug_tuple("Text").field(s).finish(),
            FieldValue::Bool(b) => f.debug_tuple("Bool").field(b).finish(),
            FieldValue::Int(i) => f.debug_tuple("Int").field(i).finish(),
            FieldValue::UInt(u) => f.debug_tuple("UInt").field(u).finish(),
            FieldValue::Float(x) => f.debug_tuple("Float").field(x).finish(),
            FieldValue::Bytes(b) => f.debug_tuple("Bytes").field(&b.len()).finish(),
            FieldValue::Reader(_) => f.write_str("Reader(..)"),
        }
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Bool(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Int(value)
    }
}

impl From<u64> for FieldValue {
    fn from(value: u64) -> Self {
        FieldValue::UInt(value)
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Float(value)
    }
}

impl From<Bytes> for FieldValue {
    fn from(value: Bytes) -> Self {
        FieldValue::Bytes(value)
    }
}

impl From<Vec<u8>> for FieldValue {
    fn from(value: Vec<u8>) -> Self {
        FieldValue::Bytes(Bytes::from(value))
    }
}

/// One client-supplied field.
#[derive(Debug)]
pub struct FieldEntry {
    pub name: String,
    pub media_type: MediaType,
    pub value: FieldValue,
}

/// Accumulates fields for a named form on a resource.
#[derive(Debug)]
pub struct FormRequest {
    pub(crate) name: String,
    pub(crate) resource: ResourceRequest,
    pub(crate) fields: Vec<FieldEntry>,
}

impl FormRequest {
    pub(crate) fn new(resource: ResourceRequest, name: &str) -> Self {
        Self {
            name: name.to_string(),
            resource,
            fields: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn resource_path(&self) -> &str {
        self.resource.path()
    }

    pub fn fields(&self) -> &[FieldEntry] {
        &self.fields
    }

    pub fn add_field(mut self, name: &str, media_type: MediaType, value: impl Into<FieldValue>) -> Self {
        self.fields.push(FieldEntry {
            name: name.to_string(),
            media_type,
            value: value.into(),
        });
        self
    }

    pub fn add_field_as_string(self, name: &str, value: &str) -> Self {
        self.add_field(name, MediaType::HMAPI_STRING, value)
    }

    pub fn add_field_as_bool(self, name: &str, value: bool) -> Self {
        self.add_field(name, MediaType::HMAPI_BOOLEAN, value)
    }

    pub fn add_field_as_int(self, name: &str, value: i64) -> Self {
        self.add_field(name, MediaType::HMAPI_INT, value)
    }

    pub fn add_field_as_uint(self, name: &str, value: u64) -> Self {
        self.add_field(name, MediaType::HMAPI_UINT, value)
    }

    pub fn add_field_as_float(self, name: &str, value: f64) -> Self {
        self.add_field(name, MediaType::HMAPI_FLOAT64, value)
    }

    pub fn add_field_as_bytes(self, name: &str, value: impl Into<Bytes>) -> Self {
        self.add_field(name, MediaType::OCTET_STREAM, FieldValue::Bytes(value.into()))
    }

    pub fn add_field_as_octet_stream<R>(self, name: &str, reader: R) -> Self
    where
        R: AsyncRead + Send + Unpin + 'static,
    {
        self.add_field(name, MediaType::OCTET_STREAM, FieldValue::Reader(Box::new(reader)))
    }

    /// Start submitting this form. Returns immediately; the handle settles
    /// once the exchange completes, fails, or is cancelled.
    ///
    /// Must be called from within a tokio runtime; otherwise the returned
    /// submission is already failed.
    pub fn submit(self) -> FormSubmission {
        FormSubmission::start(self, None)
    }

    /// Like `submit`, but cancelling `parent` also cancels this submission.
    /// Use it to attach a deadline.
    pub fn submit_with_cancel(self, parent: &CancellationToken) -> FormSubmission {
        FormSubmission::start(self, Some(parent))
    }
}
