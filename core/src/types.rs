//! Resource model decoded from the server's JSON representation.
//!
//! # Design
//! These types mirror the mock-server's schema but are defined independently.
//! Integration tests catch any schema drift between the two crates.
//!
//! Untyped values (`FormField::value`, `Content::value`) decode into
//! `serde_json::Value`. Unlike a float-only generic decode, `Value` keeps
//! integers and floats apart, so `100` comes back as an integer.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::http::HttpMethod;
use crate::media_type::MediaType;

/// Decoded representation of an addressable resource.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub links: HashMap<String, Link>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub forms: HashMap<String, Form>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub content: HashMap<String, Content>,
}

impl Resource {
    /// Decode a resource document. The top level must be a JSON object.
    pub fn from_slice(body: &[u8]) -> Result<Self, ApiError> {
        // A derived struct decode would also accept a sequence, so go through
        // `Map` first, which only takes objects.
        let object: serde_json::Map<String, serde_json::Value> =
            serde_json::from_slice(body).map_err(ApiError::Decode)?;
        serde_json::from_value(serde_json::Value::Object(object)).map_err(ApiError::Decode)
    }

    pub fn form(&self, name: &str) -> Option<&Form> {
        self.forms.get(name)
    }

    pub fn link(&self, name: &str) -> Option<&Link> {
        self.links.get(name)
    }

    pub fn content(&self, name: &str) -> Option<&Content> {
        self.content.get(name)
    }
}

/// A link to a resource that can be navigated with a plain GET.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Link {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub href: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub media_type: Option<MediaType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encoding: Option<MediaType>,
}

/// Server-declared action a client may perform against a resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Form {
    /// Target path, appended to the client's base URI.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub action: String,
    #[serde(default = "default_form_method")]
    pub method: HttpMethod,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub media_type: Option<MediaType>,
    /// Encoding of the submitted body; only `multipart/form-data` is submittable.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enctype: Option<MediaType>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<FormField>,
}

fn default_form_method() -> HttpMethod {
    HttpMethod::Post
}

/// A field the server declares on a form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormField {
    pub name: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub media_type: Option<MediaType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encoding: Option<MediaType>,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub multiple: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<serde_json::Value>,
}

/// Named content embedded in or referenced by a resource.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub href: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub media_type: Option<MediaType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encoding: Option<MediaType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<serde_json::Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Resource {
        let mut resource = Resource::default();
        resource.forms.insert(
            "AForm".to_string(),
            Form {
                action: String::new(),
                method: HttpMethod::Post,
                media_type: Some(MediaType::new("WHATEVER")),
                enctype: Some(MediaType::new("WHATEVER")),
                fields: vec![FormField {
                    name: "WHATEVER".to_string(),
                    media_type: Some(MediaType::new("WHATEVER")),
                    encoding: Some(MediaType::new("WHATEVER")),
                    required: true,
                    multiple: true,
                    value: Some(serde_json::json!(100)),
                }],
            },
        );
        resource.links.insert("ALink".to_string(), Link::default());
        resource.content.insert("AContent".to_string(), Content::default());
        resource
    }

    #[test]
    fn resource_roundtrips_through_json() {
        let original = sample();
        let json = serde_json::to_vec(&original).unwrap();
        let back = Resource::from_slice(&json).unwrap();
        assert_eq!(back, original);
    }

    #[test]
    fn integer_field_value_stays_integer() {
        let json = serde_json::to_vec(&sample()).unwrap();
        let back = Resource::from_slice(&json).unwrap();
        let value = back.forms["AForm"].fields[0].value.as_ref().unwrap();
        assert_eq!(value.as_i64(), Some(100));
        assert!(value.is_i64());
    }

    #[test]
    fn empty_maps_are_omitted_and_defaulted() {
        let json = serde_json::to_value(Resource::default()).unwrap();
        assert_eq!(json, serde_json::json!({}));

        let back = Resource::from_slice(b"{}").unwrap();
        assert!(back.links.is_empty());
        assert!(back.forms.is_empty());
        assert!(back.content.is_empty());
    }

    #[test]
    fn form_wire_names() {
        let form: Form = serde_json::from_str(
            r#"{
                "action": "/resource/test",
                "method": "PUT",
                "type": "none",
                "enctype": "multipart/form-data",
                "fields": [{"name": "foo", "type": "application/vnd.hmapi.String;charset=utf-8", "required": true}]
            }"#,
        )
        .unwrap();
        assert_eq!(form.action, "/resource/test");
        assert_eq!(form.method, HttpMethod::Put);
        assert_eq!(form.media_type, Some(MediaType::new("none")));
        assert_eq!(form.enctype, Some(MediaType::MULTIPART_FORM_DATA));
        assert_eq!(form.fields[0].media_type, Some(MediaType::HMAPI_STRING));
        assert!(form.fields[0].required);
        assert!(!form.fields[0].multiple);
        assert!(form.fields[0].value.is_none());
    }

    #[test]
    fn form_method_defaults_to_post() {
        let form: Form = serde_json::from_str(r#"{"action":"/x"}"#).unwrap();
        assert_eq!(form.method, HttpMethod::Post);
        assert!(form.enctype.is_none());
        assert!(form.fields.is_empty());
    }

    #[test]
    fn field_order_is_preserved() {
        let form: Form =
            serde_json::from_str(r#"{"fields":[{"name":"b"},{"name":"a"},{"name":"b"}]}"#).unwrap();
        let names: Vec<&str> = form.fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, ["b", "a", "b"]);
    }

    #[test]
    fn lookups_by_name() {
        let resource = sample();
        assert!(resource.form("AForm").is_some());
        assert!(resource.form("missing").is_none());
        assert!(resource.link("ALink").is_some());
        assert!(resource.content("AContent").is_some());
    }

    #[test]
    fn invalid_document_is_decode_error() {
        assert!(matches!(Resource::from_slice(b"not json"), Err(ApiError::Decode(_))));
        assert!(matches!(Resource::from_slice(b"[]"), Err(ApiError::Decode(_))));
    }

    #[test]
    fn top_level_must_be_an_object() {
        for body in [&b"[{}]"[..], b"[{},{},{}]", b"\"forms\"", b"42"] {
            assert!(
                matches!(Resource::from_slice(body), Err(ApiError::Decode(_))),
                "accepted {}",
                String::from_utf8_lossy(body)
            );
        }
    }

    #[test]
    fn wrongly_typed_member_is_decode_error() {
        let err = Resource::from_slice(br#"{"forms": []}"#).unwrap_err();
        assert!(matches!(err, ApiError::Decode(_)));
    }
}
