#![allow(dead_code)]

use axum::{
    Router,
    body::Body,
    http::{HeaderMap, Request, StatusCode},
};
use doccrate::{
    CollectionOptions, CollectionSchema, FieldSpec, FieldType, SeaOrmStore, collection_router,
};
use serde_json::{Map, Value};
use tower::ServiceExt;

pub const POSTS_PATH: &str = "/api/v1/posts";

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn posts_schema() -> CollectionSchema {
    CollectionSchema::new()
        .field_spec("title", FieldSpec::new(FieldType::String).required())
        .field("body", FieldType::String)
        .field("views", FieldType::Number)
        .field("published", FieldType::Boolean)
        .field("published_at", FieldType::Date)
        .field("tags", FieldType::array_of(FieldType::String))
        .field("author", FieldType::ObjectId)
        .field_spec("secret", FieldSpec::new(FieldType::String).hidden())
}

pub async fn setup_store() -> SeaOrmStore {
    init_tracing();
    SeaOrmStore::connect("sqlite::memory:")
        .await
        .expect("Failed to setup test database")
}

pub async fn setup_posts_app(options: CollectionOptions) -> Router {
    let store = setup_store().await;
    let posts = store.collection("posts", posts_schema());
    Router::new().nest(POSTS_PATH, collection_router(posts, options))
}

pub async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    body: Option<Value>,
) -> (StatusCode, HeaderMap, Value) {
    send_with_headers(app, method, uri, body, &[]).await
}

pub async fn send_with_headers(
    app: &Router,
    method: &str,
    uri: &str,
    body: Option<Value>,
    headers: &[(&str, &str)],
) -> (StatusCode, HeaderMap, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    for (name, value) in headers {
        builder = builder.header(*name, *value);
    }
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_string(&body).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, headers, json)
}

/// Creates a post and returns it as the API renders it.
pub async fn create_post(app: &Router, post: Value) -> Value {
    let (status, _, created) = send(app, "POST", POSTS_PATH, Some(post)).await;
    assert_eq!(status, StatusCode::OK, "create failed: {created}");
    created
}

pub fn total_count(headers: &HeaderMap) -> u64 {
    headers
        .get("x-total-count")
        .expect("X-Total-Count header missing")
        .to_str()
        .unwrap()
        .parse()
        .unwrap()
}

pub fn object(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        other => panic!("expected an object, got {other}"),
    }
}

pub fn titles(list: &Value) -> Vec<String> {
    list.as_array()
        .expect("expected a JSON array")
        .iter()
        .map(|post| post["title"].as_str().unwrap_or_default().to_string())
        .collect()
}
