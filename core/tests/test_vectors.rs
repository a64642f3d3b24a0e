//! Verify resource decoding and multipart encoding against JSON test vectors
//! stored in `test-vectors/`.
//!
//! Resource vectors compare decoded structure (sorted names), not raw strings,
//! to avoid false negatives from map ordering. Multipart vectors compare the
//! exact body bytes, since framing is the contract.

use hmapi_core::multipart::{encode_fields, Encoded};
use hmapi_core::{ApiError, FieldEntry, FieldValue, HttpMethod, MediaType, Resource};
use tokio_util::sync::CancellationToken;

fn parse_method(s: &str) -> HttpMethod {
    match s {
        "GET" => HttpMethod::Get,
        "HEAD" => HttpMethod::Head,
        "POST" => HttpMethod::Post,
        "PUT" => HttpMethod::Put,
        "PATCH" => HttpMethod::Patch,
        "DELETE" => HttpMethod::Delete,
        "OPTIONS" => HttpMethod::Options,
        other => panic!("unknown method: {other}"),
    }
}

fn names(value: &serde_json::Value) -> Vec<String> {
    value
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v.as_str().unwrap().to_string())
        .collect()
}

fn sorted_keys<V>(map: &std::collections::HashMap<String, V>) -> Vec<String> {
    let mut keys: Vec<String> = map.keys().cloned().collect();
    keys.sort();
    keys
}

// ---------------------------------------------------------------------------
// Resource decoding
// ---------------------------------------------------------------------------

#[test]
fn resource_test_vectors() {
    let raw = include_str!("../../test-vectors/resource.json");
    let vectors: serde_json::Value = serde_json::from_str(raw).unwrap();

    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let body = case["body"].as_str().unwrap();
        let result = Resource::from_slice(body.as_bytes());

        if let Some(expected_error) = case.get("expected_error") {
            let err = result.unwrap_err();
            match expected_error.as_str().unwrap() {
                "Decode" => assert!(matches!(err, ApiError::Decode(_)), "{name}: expected Decode"),
                other => panic!("{name}: unknown expected_error: {other}"),
            }
            continue;
        }

        let resource = result.unwrap();
        let expected = &case["expected"];
        assert_eq!(sorted_keys(&resource.links), names(&expected["links"]), "{name}: links");
        assert_eq!(sorted_keys(&resource.content), names(&expected["content"]), "{name}: content");

        let expected_forms = expected["forms"].as_array().unwrap();
        assert_eq!(resource.forms.len(), expected_forms.len(), "{name}: form count");
        for expected_form in expected_forms {
            let form_name = expected_form["name"].as_str().unwrap();
            let form = resource.form(form_name).unwrap_or_else(|| panic!("{name}: missing form {form_name}"));
            assert_eq!(form.action, expected_form["action"].as_str().unwrap(), "{name}: action");
            assert_eq!(form.method, parse_method(expected_form["method"].as_str().unwrap()), "{name}: method");
            assert_eq!(
                form.enctype.as_ref().map(MediaType::as_str),
                expected_form["enctype"].as_str(),
                "{name}: enctype"
            );
            let field_names: Vec<String> = form.fields.iter().map(|f| f.name.clone()).collect();
            assert_eq!(field_names, names(&expected_form["fields"]), "{name}: fields");
        }
    }
}

// ---------------------------------------------------------------------------
// Multipart encoding
// ---------------------------------------------------------------------------

fn field_entry(raw: &serde_json::Value) -> FieldEntry {
    let media_type = MediaType::new(raw["type"].as_str().unwrap());
    let value = match &raw["value"] {
        serde_json::Value::String(s) if media_type == MediaType::OCTET_STREAM => {
            FieldValue::Reader(Box::new(std::io::Cursor::new(s.clone().into_bytes())))
        }
        serde_json::Value::String(s) => FieldValue::Text(s.clone()),
        serde_json::Value::Bool(b) => FieldValue::Bool(*b),
        serde_json::Value::Number(n) => match (n.as_i64(), n.as_u64()) {
            (Some(i), _) => FieldValue::Int(i),
            (None, Some(u)) => FieldValue::UInt(u),
            (None, None) => FieldValue::Float(n.as_f64().unwrap()),
        },
        other => panic!("unsupported vector value: {other}"),
    };
    FieldEntry {
        name: raw["name"].as_str().unwrap().to_string(),
        media_type,
        value,
    }
}

#[tokio::test]
async fn multipart_test_vectors() {
    let raw = include_str!("../../test-vectors/multipart.json");
    let vectors: serde_json::Value = serde_json::from_str(raw).unwrap();
    let boundary = vectors["boundary"].as_str().unwrap();

    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let fields: Vec<FieldEntry> = case["fields"].as_array().unwrap().iter().map(field_entry).collect();

        let mut sink = Vec::new();
        let result = encode_fields(fields, &mut sink, boundary, &CancellationToken::new()).await;

        if let Some(expected_error) = case.get("expected_error") {
            let err = result.unwrap_err();
            match expected_error.as_str().unwrap() {
                "UnsupportedMediaType" => assert!(
                    matches!(err, ApiError::UnsupportedMediaType(_)),
                    "{name}: expected UnsupportedMediaType"
                ),
                other => panic!("{name}: unknown expected_error: {other}"),
            }
            continue;
        }

        assert_eq!(result.unwrap(), Encoded::Finished, "{name}: outcome");
        assert_eq!(
            String::from_utf8(sink).unwrap(),
            case["expected_body"].as_str().unwrap(),
            "{name}: body"
        );
    }
}
