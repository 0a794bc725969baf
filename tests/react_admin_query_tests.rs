use async_trait::async_trait;
use axum::http::StatusCode;
use doccrate::{
    ApiError, Capabilities, CollectionOptions, FieldCondition, FieldValue, Filter,
    InputTransformer,
};
use serde_json::{Map, Value, json};
use std::sync::{Arc, Mutex};

mod common;
use common::{POSTS_PATH, create_post, send, setup_posts_app, titles, total_count};

/// Tests for the react-admin simple-rest data provider dialect.
/// Based on: https://marmelab.com/react-admin/DataProviders.html

async fn seed(app: &axum::Router) {
    let posts = [
        json!({"title": "Rust ownership", "body": "borrowing rules", "views": 30, "published": true, "tags": ["rust", "memory"]}),
        json!({"title": "Go channels", "body": "select and friends", "views": 10, "published": false, "tags": ["go"]}),
        json!({"title": "Async rust", "body": "futures and tokio", "views": 50, "published": true, "tags": ["rust", "async"]}),
        json!({"title": "Python typing", "body": "gradual types", "views": 20, "published": true, "tags": ["python"]}),
        json!({"title": "Zig comptime", "body": "code at compile time", "views": 5, "published": false, "tags": []}),
    ];
    for post in posts {
        create_post(app, post).await;
    }
}

fn list_uri(query: &str) -> String {
    format!("{POSTS_PATH}?{query}")
}

#[tokio::test]
async fn test_create_exposes_id_first() {
    let app = setup_posts_app(CollectionOptions::new()).await;
    let created = create_post(&app, json!({"title": "Hello", "views": "7"})).await;

    let object = created.as_object().unwrap();
    assert_eq!(object.keys().next().map(String::as_str), Some("id"));
    assert!(!object.contains_key("_id"));
    assert_eq!(created["id"].as_str().unwrap().len(), 24);
    assert_eq!(created["views"], json!(7));
}

#[tokio::test]
async fn test_getlist_returns_total_count_header() {
    let app = setup_posts_app(CollectionOptions::new()).await;
    seed(&app).await;

    let (status, headers, list) = send(&app, "GET", POSTS_PATH, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(total_count(&headers), 5);
    assert_eq!(list.as_array().unwrap().len(), 5);
    for post in list.as_array().unwrap() {
        assert!(post["id"].is_string());
        assert!(post.get("_id").is_none());
    }
}

#[tokio::test]
async fn test_getlist_with_start_and_end() {
    let app = setup_posts_app(CollectionOptions::new()).await;
    seed(&app).await;

    let (status, headers, list) = send(&app, "GET", &list_uri("_start=1&_end=3"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(titles(&list), vec!["Go channels", "Async rust"]);
    // Total counts every match, not the page
    assert_eq!(total_count(&headers), 5);
}

#[tokio::test]
async fn test_getlist_window_is_clamped_to_max_rows() {
    let app = setup_posts_app(CollectionOptions::new().max_rows(2)).await;
    seed(&app).await;

    let (_, headers, list) = send(&app, "GET", POSTS_PATH, None).await;
    assert_eq!(list.as_array().unwrap().len(), 2);
    assert_eq!(total_count(&headers), 5);

    let (_, _, list) = send(&app, "GET", &list_uri("_start=0&_end=100"), None).await;
    assert_eq!(list.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_getlist_inverted_window_is_empty() {
    let app = setup_posts_app(CollectionOptions::new()).await;
    seed(&app).await;

    let (status, headers, list) = send(&app, "GET", &list_uri("_start=4&_end=2"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(list.as_array().unwrap().is_empty());
    assert_eq!(total_count(&headers), 5);
}

#[tokio::test]
async fn test_getlist_sorting() {
    let app = setup_posts_app(CollectionOptions::new()).await;
    seed(&app).await;

    let (_, _, list) = send(&app, "GET", &list_uri("_sort=views&_order=DESC"), None).await;
    assert_eq!(
        titles(&list),
        vec!["Async rust", "Rust ownership", "Python typing", "Go channels", "Zig comptime"]
    );

    let (_, _, list) = send(&app, "GET", &list_uri("_sort=title&_order=asc"), None).await;
    assert_eq!(
        titles(&list),
        vec!["Async rust", "Go channels", "Python typing", "Rust ownership", "Zig comptime"]
    );
}

#[tokio::test]
async fn test_getlist_sort_needs_both_parameters() {
    let app = setup_posts_app(CollectionOptions::new()).await;
    seed(&app).await;

    let (_, _, list) = send(&app, "GET", &list_uri("_sort=views"), None).await;
    assert_eq!(
        titles(&list),
        vec!["Rust ownership", "Go channels", "Async rust", "Python typing", "Zig comptime"]
    );
}

#[tokio::test]
async fn test_getlist_sort_by_id_follows_creation_order() {
    let app = setup_posts_app(CollectionOptions::new()).await;
    let created: Vec<String> = (0..8).map(|i| format!("p{i}")).collect();
    for title in &created {
        create_post(&app, json!({ "title": title })).await;
    }

    let (_, _, list) = send(&app, "GET", &list_uri("_sort=id&_order=ASC"), None).await;
    assert_eq!(titles(&list), created);

    let (_, _, list) = send(&app, "GET", &list_uri("_sort=id&_order=DESC"), None).await;
    let reversed: Vec<String> = created.iter().rev().cloned().collect();
    assert_eq!(titles(&list), reversed);
}

#[tokio::test]
async fn test_getlist_sort_then_page() {
    let app = setup_posts_app(CollectionOptions::new()).await;
    seed(&app).await;

    let (_, _, list) = send(
        &app,
        "GET",
        &list_uri("_sort=views&_order=ASC&_start=1&_end=3"),
        None,
    )
    .await;
    assert_eq!(titles(&list), vec!["Go channels", "Python typing"]);
}

#[tokio::test]
async fn test_getlist_range_operators() {
    let app = setup_posts_app(CollectionOptions::new()).await;
    seed(&app).await;

    let (_, headers, list) = send(
        &app,
        "GET",
        &list_uri("views_gte=10&views_lt=50&_sort=views&_order=ASC"),
        None,
    )
    .await;
    assert_eq!(titles(&list), vec!["Go channels", "Python typing", "Rust ownership"]);
    assert_eq!(total_count(&headers), 3);

    let (_, _, list) = send(&app, "GET", &list_uri("views_ne=30&views_gt=10"), None).await;
    assert_eq!(titles(&list), vec!["Async rust", "Python typing"]);
}

#[tokio::test]
async fn test_getlist_equality_and_lists() {
    let app = setup_posts_app(CollectionOptions::new()).await;
    seed(&app).await;

    let (_, _, list) = send(&app, "GET", &list_uri("published=false"), None).await;
    assert_eq!(titles(&list), vec!["Go channels", "Zig comptime"]);

    let (_, _, list) = send(&app, "GET", &list_uri("views_in=5&views_in=50"), None).await;
    assert_eq!(titles(&list), vec!["Async rust", "Zig comptime"]);

    let (_, _, list) = send(&app, "GET", &list_uri("views=10&views=20"), None).await;
    assert_eq!(titles(&list), vec!["Go channels", "Python typing"]);
}

#[tokio::test]
async fn test_getlist_array_field_matches_elements() {
    let app = setup_posts_app(CollectionOptions::new()).await;
    seed(&app).await;

    let (_, _, list) = send(&app, "GET", &list_uri("tags=rust"), None).await;
    assert_eq!(titles(&list), vec!["Rust ownership", "Async rust"]);

    let (_, _, list) = send(&app, "GET", &list_uri("tags=go&tags=python"), None).await;
    assert_eq!(titles(&list), vec!["Go channels", "Python typing"]);
}

#[tokio::test]
async fn test_getlist_by_ids() {
    let app = setup_posts_app(CollectionOptions::new()).await;
    let first = create_post(&app, json!({"title": "First"})).await;
    create_post(&app, json!({"title": "Second"})).await;
    let third = create_post(&app, json!({"title": "Third"})).await;

    let query = format!(
        "id={}&id={}",
        first["id"].as_str().unwrap(),
        third["id"].as_str().unwrap()
    );
    let (_, headers, list) = send(&app, "GET", &list_uri(&query), None).await;
    assert_eq!(titles(&list), vec!["First", "Third"]);
    assert_eq!(total_count(&headers), 2);
}

#[tokio::test]
async fn test_getlist_ignores_values_that_do_not_cast() {
    let app = setup_posts_app(CollectionOptions::new()).await;
    seed(&app).await;

    let (status, headers, _) = send(&app, "GET", &list_uri("views=lots&views_gte=abc"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(total_count(&headers), 5);

    let (_, headers, _) = send(&app, "GET", &list_uri("views=lots&published=true"), None).await;
    assert_eq!(total_count(&headers), 3);
}

#[tokio::test]
async fn test_getlist_rejects_raw_operators() {
    let app = setup_posts_app(CollectionOptions::new()).await;
    seed(&app).await;

    let query = format!("{}=1", url_escape::encode_component("$where"));
    let (status, headers, _) = send(&app, "GET", &list_uri(&query), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(total_count(&headers), 5);
}

#[tokio::test]
async fn test_getlist_search() {
    let options = CollectionOptions::new()
        .search_fields(["title", "body"])
        .allowed_regex_fields(["title", "body"]);
    let app = setup_posts_app(options).await;
    seed(&app).await;

    let (_, headers, list) = send(&app, "GET", &list_uri("q=RUST"), None).await;
    assert_eq!(titles(&list), vec!["Rust ownership", "Async rust"]);
    assert_eq!(total_count(&headers), 2);

    // Matches in the body count too
    let query = format!("q={}", url_escape::encode_component("compile time"));
    let (_, _, list) = send(&app, "GET", &list_uri(&query), None).await;
    assert_eq!(titles(&list), vec!["Zig comptime"]);

    // Search combines with other filters
    let (_, _, list) = send(&app, "GET", &list_uri("q=rust&views_gt=40"), None).await;
    assert_eq!(titles(&list), vec!["Async rust"]);
}

#[tokio::test]
async fn test_search_term_is_literal() {
    let options = CollectionOptions::new()
        .search_fields(["title"])
        .allowed_regex_fields(["title"]);
    let app = setup_posts_app(options).await;
    seed(&app).await;

    let query = format!("q={}", url_escape::encode_component(".*"));
    let (_, headers, _) = send(&app, "GET", &list_uri(&query), None).await;
    assert_eq!(total_count(&headers), 0);
}

#[tokio::test]
async fn test_regex_fields_match_substrings() {
    let app = setup_posts_app(CollectionOptions::new().allowed_regex_fields(["title"])).await;
    seed(&app).await;

    let (_, _, list) = send(&app, "GET", &list_uri("title=RUST"), None).await;
    assert_eq!(titles(&list), vec!["Rust ownership", "Async rust"]);

    // Without regex the match is exact
    let app = setup_posts_app(CollectionOptions::new()).await;
    seed(&app).await;
    let (_, headers, _) = send(&app, "GET", &list_uri("title=RUST"), None).await;
    assert_eq!(total_count(&headers), 0);
}

#[tokio::test]
async fn test_list_query_is_always_applied() {
    let published_only =
        Filter::new().with("published", FieldCondition::Equals(FieldValue::Bool(true)));
    let app = setup_posts_app(CollectionOptions::new().list_query(published_only)).await;
    seed(&app).await;

    let (_, headers, list) = send(&app, "GET", &list_uri("views_gte=25"), None).await;
    assert_eq!(titles(&list), vec!["Rust ownership", "Async rust"]);
    assert_eq!(total_count(&headers), 2);

    // A request filter on the same field replaces the static one
    let (_, _, list) = send(&app, "GET", &list_uri("published=false"), None).await;
    assert_eq!(titles(&list), vec!["Go channels", "Zig comptime"]);
}

#[tokio::test]
async fn test_hidden_fields_are_not_returned() {
    let app = setup_posts_app(CollectionOptions::new()).await;
    let created = create_post(&app, json!({"title": "Classified", "secret": "42"})).await;
    let id = created["id"].as_str().unwrap();

    let (_, _, fetched) = send(&app, "GET", &format!("{POSTS_PATH}/{id}"), None).await;
    assert_eq!(fetched["title"], "Classified");
    assert!(fetched.get("secret").is_none());

    let (_, _, list) = send(&app, "GET", POSTS_PATH, None).await;
    assert!(list[0].get("secret").is_none());
}

#[tokio::test]
async fn test_extra_selects_reveal_hidden_fields() {
    let app = setup_posts_app(CollectionOptions::new().extra_selects("+secret")).await;
    let created = create_post(&app, json!({"title": "Classified", "secret": "42"})).await;
    let id = created["id"].as_str().unwrap();

    let (_, _, fetched) = send(&app, "GET", &format!("{POSTS_PATH}/{id}"), None).await;
    assert_eq!(fetched["secret"], "42");

    let (_, _, list) = send(&app, "GET", POSTS_PATH, None).await;
    assert_eq!(list[0]["secret"], "42");
}

#[tokio::test]
async fn test_getone() {
    let app = setup_posts_app(CollectionOptions::new()).await;
    let created = create_post(&app, json!({"title": "One", "published_at": "2024-03-01"})).await;
    let id = created["id"].as_str().unwrap();

    let (status, _, fetched) = send(&app, "GET", &format!("{POSTS_PATH}/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["id"], created["id"]);
    assert_eq!(fetched["published_at"], "2024-03-01T00:00:00.000Z");
}

#[tokio::test]
async fn test_getone_accepts_uppercase_id() {
    let app = setup_posts_app(CollectionOptions::new()).await;
    let created = create_post(&app, json!({"title": "Loud"})).await;
    let id = created["id"].as_str().unwrap().to_ascii_uppercase();

    let (status, _, fetched) = send(&app, "GET", &format!("{POSTS_PATH}/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["id"], created["id"]);
}

#[tokio::test]
async fn test_getone_failures_are_bad_requests() {
    let app = setup_posts_app(CollectionOptions::new()).await;

    let (status, _, body) =
        send(&app, "GET", &format!("{POSTS_PATH}/5f1c0d1b7e4c5b0e9c4d8e1d"), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());

    let (status, _, _) = send(&app, "GET", &format!("{POSTS_PATH}/not-an-id"), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_create_validation_errors() {
    let app = setup_posts_app(CollectionOptions::new()).await;

    let (status, _, body) = send(&app, "POST", POSTS_PATH, Some(json!({"views": 3}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"], json!(["Path `title` is required."]));

    let (status, _, body) = send(
        &app,
        "POST",
        POSTS_PATH,
        Some(json!({"title": "Bad views", "views": "many"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["details"],
        json!(["Cast to Number failed for value \"many\" at path \"views\""])
    );
}

#[tokio::test]
async fn test_create_with_client_id() {
    let app = setup_posts_app(CollectionOptions::new()).await;
    let id = "5f1c0d1b7e4c5b0e9c4d8e1d";

    let created = create_post(&app, json!({"id": id, "title": "Chosen id"})).await;
    assert_eq!(created["id"], id);

    let (status, _, _) = send(
        &app,
        "POST",
        POSTS_PATH,
        Some(json!({"id": id, "title": "Same id again"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_create_drops_undeclared_fields() {
    let app = setup_posts_app(CollectionOptions::new()).await;
    let created = create_post(&app, json!({"title": "Strict", "rating": 5})).await;
    assert!(created.get("rating").is_none());
}

#[tokio::test]
async fn test_update() {
    let app = setup_posts_app(CollectionOptions::new()).await;
    let created = create_post(&app, json!({"title": "Draft", "views": 1})).await;
    let id = created["id"].as_str().unwrap();

    // react-admin sends the whole record back, id included
    let (status, _, updated) = send(
        &app,
        "PUT",
        &format!("{POSTS_PATH}/{id}"),
        Some(json!({"id": id, "title": "Final", "views": "2"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["id"], id);
    assert_eq!(updated["title"], "Final");
    assert_eq!(updated["views"], 2);

    let (_, _, fetched) = send(&app, "GET", &format!("{POSTS_PATH}/{id}"), None).await;
    assert_eq!(fetched["title"], "Final");
}

#[tokio::test]
async fn test_update_failures_are_bad_requests() {
    let app = setup_posts_app(CollectionOptions::new()).await;
    let created = create_post(&app, json!({"title": "Keep"})).await;
    let id = created["id"].as_str().unwrap();

    let (status, _, _) = send(
        &app,
        "PUT",
        &format!("{POSTS_PATH}/5f1c0d1b7e4c5b0e9c4d8e1d"),
        Some(json!({"title": "Nobody"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _, _) = send(
        &app,
        "PUT",
        &format!("{POSTS_PATH}/{id}"),
        Some(json!({"title": null})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _, body) = send(
        &app,
        "PUT",
        &format!("{POSTS_PATH}/{id}"),
        Some(json!({"id": "5f1c0d1b7e4c5b0e9c4d8e1d"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["details"][0].as_str().unwrap().contains("immutable field '_id'"));
}

#[tokio::test]
async fn test_delete() {
    let app = setup_posts_app(CollectionOptions::new()).await;
    let created = create_post(&app, json!({"title": "Short lived"})).await;
    let id = created["id"].as_str().unwrap();
    let uri = format!("{POSTS_PATH}/{id}");

    let (status, _, deleted) = send(&app, "DELETE", &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(deleted["id"], id);
    assert_eq!(deleted["title"], "Short lived");

    let (status, _, body) = send(&app, "DELETE", &uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Element does not exist");

    let (status, _, _) = send(&app, "DELETE", &format!("{POSTS_PATH}/nope"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, headers, _) = send(&app, "GET", POSTS_PATH, None).await;
    assert_eq!(total_count(&headers), 0);
}

#[tokio::test]
async fn test_read_only_fields_are_stripped() {
    let app = setup_posts_app(CollectionOptions::new().read_only_fields(["views"])).await;

    let created = create_post(&app, json!({"title": "Counted", "views": 1000})).await;
    assert!(created.get("views").is_none());

    let id = created["id"].as_str().unwrap();
    let (status, _, updated) = send(
        &app,
        "PUT",
        &format!("{POSTS_PATH}/{id}"),
        Some(json!({"title": "Still counted", "views": 1000})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["title"], "Still counted");
    assert!(updated.get("views").is_none());
}

struct SlugTitles;

#[async_trait]
impl InputTransformer for SlugTitles {
    async fn transform(
        &self,
        mut body: Map<String, Value>,
    ) -> Result<Map<String, Value>, ApiError> {
        match body.get("title").and_then(Value::as_str) {
            Some(title) if title.trim().is_empty() => {
                Err(ApiError::bad_request("Title must not be blank"))
            }
            Some(title) => {
                let slug = title.to_lowercase().replace(' ', "-");
                body.insert("body".to_string(), Value::String(slug));
                Ok(body)
            }
            None => Ok(body),
        }
    }
}

#[tokio::test]
async fn test_input_transformer_runs_before_write() {
    let app =
        setup_posts_app(CollectionOptions::new().input_transformer(Arc::new(SlugTitles))).await;

    let created = create_post(&app, json!({"title": "Hello World"})).await;
    assert_eq!(created["body"], "hello-world");

    let (status, _, body) = send(&app, "POST", POSTS_PATH, Some(json!({"title": "  "}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Title must not be blank");

    let (_, headers, _) = send(&app, "GET", POSTS_PATH, None).await;
    assert_eq!(total_count(&headers), 1);
}

const ASSIGNED_ID: &str = "5f1c0d1b7e4c5b0e9c4d8e1d";

/// Records every payload it sees and assigns a fixed `id` when none is given.
#[derive(Default)]
struct RecordingTransformer {
    seen: Mutex<Vec<Map<String, Value>>>,
}

#[async_trait]
impl InputTransformer for RecordingTransformer {
    async fn transform(
        &self,
        mut body: Map<String, Value>,
    ) -> Result<Map<String, Value>, ApiError> {
        self.seen.lock().unwrap().push(body.clone());
        if !body.contains_key("id") {
            body.insert("id".to_string(), json!(ASSIGNED_ID));
        }
        Ok(body)
    }
}

#[tokio::test]
async fn test_transformer_sees_payload_after_read_only_filter() {
    let recorder = Arc::new(RecordingTransformer::default());
    let app = setup_posts_app(
        CollectionOptions::new()
            .read_only_fields(["views"])
            .input_transformer(recorder.clone()),
    )
    .await;

    let created = create_post(&app, json!({"title": "Tracked", "views": 7})).await;
    assert_eq!(created["id"], ASSIGNED_ID);
    assert!(created.get("views").is_none());

    let uri = format!("{POSTS_PATH}/{ASSIGNED_ID}");
    let (status, _, fetched) = send(&app, "GET", &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["title"], "Tracked");

    let (status, _, updated) = send(
        &app,
        "PUT",
        &uri,
        Some(json!({"title": "Retitled", "views": 9})),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "update failed: {updated}");
    assert_eq!(updated["id"], ASSIGNED_ID);
    assert_eq!(updated["title"], "Retitled");
    assert!(updated.get("views").is_none());

    let seen = recorder.seen.lock().unwrap();
    assert_eq!(seen.len(), 2);
    for payload in seen.iter() {
        assert!(!payload.contains_key("views"));
        assert!(!payload.contains_key("_id"));
    }
    assert_eq!(seen[0]["title"], "Tracked");
    assert_eq!(seen[1]["title"], "Retitled");
}

#[tokio::test]
async fn test_disabled_capabilities_are_not_routed() {
    let app =
        setup_posts_app(CollectionOptions::new().capabilities(Capabilities::read_only())).await;

    let (status, _, _) = send(&app, "POST", POSTS_PATH, Some(json!({"title": "No"}))).await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);

    let (status, _, _) = send(
        &app,
        "DELETE",
        &format!("{POSTS_PATH}/5f1c0d1b7e4c5b0e9c4d8e1d"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);

    let (status, _, _) = send(&app, "GET", POSTS_PATH, None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_hydration_applies_the_current_schema() {
    let store = common::setup_store().await;
    let loose = store.collection("posts", common::posts_schema().non_strict());
    let writer = axum::Router::new().nest(
        POSTS_PATH,
        doccrate::collection_router(loose, CollectionOptions::new()),
    );
    let created = create_post(&writer, json!({"title": "Old shape", "legacy": true})).await;
    let uri = format!("{POSTS_PATH}/{}", created["id"].as_str().unwrap());

    let mount = |options: CollectionOptions| {
        let posts = store.collection("posts", common::posts_schema());
        axum::Router::new().nest(POSTS_PATH, doccrate::collection_router(posts, options))
    };

    // Lean reads return the stored document as is
    let (_, _, lean) = send(&mount(CollectionOptions::new()), "GET", &uri, None).await;
    assert_eq!(lean["legacy"], true);

    let (_, _, hydrated) =
        send(&mount(CollectionOptions::new().use_lean(false)), "GET", &uri, None).await;
    assert_eq!(hydrated["title"], "Old shape");
    assert!(hydrated.get("legacy").is_none());
}
