//! Registry of the content encodings the client recognizes.
//!
//! # Design
//! A `MediaType` is an opaque string tag compared by exact string equality.
//! Registry entries are `const` values backed by borrowed strings, while
//! media types decoded from a resource document own their text. Both compare
//! equal when the strings match.

use std::borrow::Cow;
use std::fmt;

use serde::{Deserialize, Serialize};

/// An opaque content-encoding identifier such as `multipart/form-data`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MediaType(Cow<'static, str>);

impl MediaType {
    pub const HMAPI_BOOLEAN: MediaType = MediaType::from_static("application/vnd.hmapi.Bool;charset=utf-8");
    pub const HMAPI_FLOAT32: MediaType = MediaType::from_static("application/vnd.hmapi.Float32;charset=utf-8");
    pub const HMAPI_FLOAT64: MediaType = MediaType::from_static("application/vnd.hmapi.Float64;charset=utf-8");
    pub const HMAPI_INT: MediaType = MediaType::from_static("application/vnd.hmapi.Int;charset=utf-8");
    pub const HMAPI_INT32: MediaType = MediaType::from_static("application/vnd.hmapi.Int32;charset=utf-8");
    pub const HMAPI_INT64: MediaType = MediaType::from_static("application/vnd.hmapi.Int64;charset=utf-8");
    pub const HMAPI_STRING: MediaType = MediaType::from_static("application/vnd.hmapi.String;charset=utf-8");
    pub const HMAPI_UINT: MediaType = MediaType::from_static("application/vnd.hmapi.UInt;charset=utf-8");
    pub const HMAPI_UINT32: MediaType = MediaType::from_static("application/vnd.hmapi.UInt32;charset=utf-8");
    pub const HMAPI_UINT64: MediaType = MediaType::from_static("application/vnd.hmapi.UInt64;charset=utf-8");
    pub const OCTET_STREAM: MediaType = MediaType::from_static("application/octet-stream");
    pub const JSON: MediaType = MediaType::from_static("application/json;charset=utf-8");
    pub const TEXT_PLAIN: MediaType = MediaType::from_static("text/plain;charset=utf-8");
    pub const MULTIPART_FORM_DATA: MediaType = MediaType::from_static("multipart/form-data");

    pub const fn from_static(value: &'static str) -> Self {
        MediaType(Cow::Borrowed(value))
    }

    pub fn new(value: impl Into<String>) -> Self {
        MediaType(Cow::Owned(value.into()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True for the primitive `application/vnd.hmapi.*` value types.
    pub fn is_scalar(&self) -> bool {
        SCALARS.contains(self)
    }

    /// True when a form field of this type can be written as a multipart part.
    pub fn is_form_encodable(&self) -> bool {
        self.is_scalar() || *self == MediaType::OCTET_STREAM
    }
}

const SCALARS: [MediaType; 10] = [
    MediaType::HMAPI_BOOLEAN,
    MediaType::HMAPI_FLOAT32,
    MediaType::HMAPI_FLOAT64,
    MediaType::HMAPI_INT,
    MediaType::HMAPI_INT32,
    MediaType::HMAPI_INT64,
    MediaType::HMAPI_STRING,
    MediaType::HMAPI_UINT,
    MediaType::HMAPI_UINT32,
    MediaType::HMAPI_UINT64,
];

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for MediaType {
    fn from(value: &str) -> Self {
        MediaType::new(value)
    }
}

impl From<String> for MediaType {
    fn from(value: String) -> Self {
        MediaType::new(value)
    }
}
