use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
};

use axum::{
    extract::{Multipart, State},
    http::{HeaderMap, Method, StatusCode},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;

pub const MULTIPART: &str = "multipart/form-data";
pub const HMAPI_STRING: &str = "application/vnd.hmapi.String;charset=utf-8";
pub const HMAPI_BOOL: &str = "application/vnd.hmapi.Bool;charset=utf-8";
pub const JSON: &str = "application/json;charset=utf-8";

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Resource {
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub links: HashMap<String, Link>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub forms: HashMap<String, Form>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub content: HashMap<String, Content>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Link {
    pub href: String,
    #[serde(rename = "type")]
    pub media_type: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Form {
    pub action: String,
    pub method: String,
    #[serde(rename = "type")]
    pub media_type: String,
    pub enctype: String,
    pub fields: Vec<FormField>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FormField {
    pub name: String,
    #[serde(rename = "type")]
    pub media_type: String,
    pub required: bool,
    pub multiple: bool,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Content {
    #[serde(rename = "type")]
    pub media_type: String,
    pub value: serde_json::Value,
}

/// What the echo form reports back about a submission.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Echo {
    pub method: String,
    pub authorization: Option<String>,
    pub fields: Vec<(String, String)>,
}

/// Counters shared between the router and tests.
#[derive(Clone, Debug, Default)]
pub struct MockState {
    inner: Arc<Counters>,
}

#[derive(Debug, Default)]
struct Counters {
    submissions: AtomicUsize,
    stale_fetches: AtomicUsize,
}

impl MockState {
    /// Requests that reached any form action.
    pub fn submissions(&self) -> usize {
        self.inner.submissions.load(Ordering::SeqCst)
    }

    fn record_submission(&self) {
        self.inner.submissions.fetch_add(1, Ordering::SeqCst);
    }
}

pub fn app() -> Router {
    app_with_state(MockState::default())
}

pub fn app_with_state(state: MockState) -> Router {
    Router::new()
        .route("/resource", get(get_resource))
        .route("/resource/test", post(submit_test))
        .route("/resource/echo", post(submit_echo).put(submit_echo))
        .route("/resource/json", post(submit_json))
        .route("/resource/stall", post(submit_stall))
        .route("/stale", get(get_stale))
        .route("/broken", get(get_broken))
        .route("/listing", get(get_listing))
        .with_state(state)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    run_with_state(listener, MockState::default()).await
}

pub async fn run_with_state(listener: TcpListener, state: MockState) -> Result<(), std::io::Error> {
    axum::serve(listener, app_with_state(state)).await
}

fn field(name: &str, media_type: &str, required: bool) -> FormField {
    FormField {
        name: name.to_string(),
        media_type: media_type.to_string(),
        required,
        multiple: false,
    }
}

fn form(action: &str, method: &str, enctype: &str, fields: Vec<FormField>) -> Form {
    Form {
        action: action.to_string(),
        method: method.to_string(),
        media_type: "none".to_string(),
        enctype: enctype.to_string(),
        fields,
    }
}

pub fn resource_document() -> Resource {
    let mut resource = Resource::default();
    resource.links.insert(
        "self".to_string(),
        Link {
            href: "/resource".to_string(),
            media_type: JSON.to_string(),
        },
    );
    resource.content.insert(
        "greeting".to_string(),
        Content {
            media_type: HMAPI_STRING.to_string(),
            value: serde_json::json!("hello"),
        },
    );
    resource.forms.insert(
        "test".to_string(),
        form("/resource/test", "POST", MULTIPART, vec![field("foo", HMAPI_STRING, true)]),
    );
    resource.forms.insert(
        "echo".to_string(),
        form(
            "/resource/echo",
            "POST",
            MULTIPART,
            vec![field("foo", HMAPI_STRING, false), field("flag", HMAPI_BOOL, false)],
        ),
    );
    resource.forms.insert(
        "replace".to_string(),
        form("/resource/echo", "PUT", MULTIPART, Vec::new()),
    );
    resource.forms.insert(
        "json".to_string(),
        form("/resource/json", "POST", JSON, vec![field("foo", HMAPI_STRING, true)]),
    );
    resource.forms.insert(
        "stall".to_string(),
        form("/resource/stall", "POST", MULTIPART, Vec::new()),
    );
    resource
}

async fn get_resource() -> Json<Resource> {
    Json(resource_document())
}

/// Offers the `once` form on the first fetch only.
async fn get_stale(State(state): State<MockState>) -> Json<Resource> {
    let fetches = state.inner.stale_fetches.fetch_add(1, Ordering::SeqCst);
    let mut resource = Resource::default();
    if fetches == 0 {
        resource.forms.insert(
            "once".to_string(),
            form("/resource/test", "POST", MULTIPART, vec![field("foo", HMAPI_STRING, true)]),
        );
    }
    Json(resource)
}

async fn get_broken() -> (StatusCode, &'static str) {
    (StatusCode::OK, "this is not a resource")
}

/// Valid JSON, but an array rather than a resource object.
async fn get_listing() -> Json<serde_json::Value> {
    Json(serde_json::json!([]))
}

async fn read_fields(mut multipart: Multipart) -> Result<Vec<(String, String)>, (StatusCode, String)> {
    let mut fields = Vec::new();
    while let Some(part) = multipart
        .next_field()
        .await
        .map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))?
    {
        let name = part.name().unwrap_or_default().to_string();
        let value = part
            .text()
            .await
            .map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))?;
        fields.push((name, value));
    }
    Ok(fields)
}

async fn submit_test(
    State(state): State<MockState>,
    multipart: Multipart,
) -> (StatusCode, String) {
    state.record_submission();
    let fields = match read_fields(multipart).await {
        Ok(fields) => fields,
        Err(rejection) => return rejection,
    };
    match fields.iter().find(|(name, _)| name == "foo") {
        Some((_, value)) if value == "test" => (StatusCode::OK, "response".to_string()),
        _ => (StatusCode::BAD_REQUEST, "form field foo not supplied".to_string()),
    }
}

async fn submit_echo(
    State(state): State<MockState>,
    method: Method,
    headers: HeaderMap,
    multipart: Multipart,
) -> Result<Json<Echo>, (StatusCode, String)> {
    state.record_submission();
    let fields = read_fields(multipart).await?;
    let authorization = headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    Ok(Json(Echo {
        method: method.to_string(),
        authorization,
        fields,
    }))
}

async fn submit_json(State(state): State<MockState>) -> StatusCode {
    state.record_submission();
    StatusCode::OK
}

/// Never reads the body and never answers.
async fn submit_stall(State(state): State<MockState>) -> StatusCode {
    state.record_submission();
    std::future::pending::<StatusCode>().await
}
