//! The collection router: list, get, create, update and delete over one
//! [`DocumentStore`], in the shape react-admin's `simple-rest` data provider
//! expects.
//!
//! | Method | Path | Success | Failure |
//! |---|---|---|---|
//! | GET | `/` | array + `X-Total-Count` | 500 |
//! | GET | `/{id}` | document | 400 (also when missing) |
//! | POST | `/` | created document | 400 |
//! | PUT | `/{id}` | updated document | 400 (also when missing) |
//! | DELETE | `/{id}` | deleted document | 404 |

use axum::{
    Json, Router,
    extract::{Path, RawQuery, State},
    http::StatusCode,
    middleware,
    routing::{MethodRouter, delete, get, post, put},
};
use hyper::HeaderMap;
use serde_json::{Map, Value};
use std::sync::Arc;

use crate::acl::{AclAction, AclGate, acl_gate};
use crate::config::CollectionOptions;
use crate::errors::ApiError;
use crate::filtering::{
    Filter, cast_filter, parse_query, parse_sorting, parse_window, total_count_header,
    unsupported_regex_flags,
};
use crate::ids::{convert_id, virtual_id, virtual_ids};
use crate::models::{ListParams, filter_get_list, parse_query_string};
use crate::payload::{InputTransformer, filter_read_only};
use crate::store::{DocumentStore, FindOptions, Projection, StoreError};
use crate::value::Document;

type SharedState = Arc<CollectionState>;

/// Everything a request needs, resolved once when the router is built.
pub struct CollectionState {
    store: Arc<dyn DocumentStore>,
    search_fields: Option<Vec<String>>,
    allowed_regex_fields: Vec<String>,
    regex_flags: String,
    read_only_fields: Option<Vec<String>>,
    input_transformer: Option<Arc<dyn InputTransformer>>,
    list_query: Filter,
    max_rows: u64,
    projection: Option<Projection>,
    use_lean: bool,
}

impl CollectionState {
    fn new(store: Arc<dyn DocumentStore>, mut options: CollectionOptions) -> Self {
        let ignored = unsupported_regex_flags(&options.regex_flags);
        if !ignored.is_empty() {
            tracing::warn!(flags = ?ignored, "ignoring unsupported regex flags");
        }

        let mut list_query = std::mem::take(&mut options.list_query);
        if let Some(raw) = options.take_raw_list_query() {
            let configured = cast_filter(
                raw,
                store.schema(),
                &options.allowed_regex_fields,
                &options.regex_flags,
            );
            list_query = list_query.merge(configured);
        }

        Self {
            search_fields: options.q,
            allowed_regex_fields: options.allowed_regex_fields,
            regex_flags: options.regex_flags,
            read_only_fields: options.read_only_fields,
            input_transformer: options.input_transformer,
            list_query,
            max_rows: options.max_rows,
            projection: options.extra_selects.as_deref().map(Projection::parse),
            use_lean: options.use_lean,
            store,
        }
    }

    /// Static list query overlaid with the request's filter and search.
    fn list_filter(&self, query: Map<String, Value>) -> Filter {
        let schema = self.store.schema();
        let raw = convert_id(filter_get_list(query));
        let filter = cast_filter(raw, schema, &self.allowed_regex_fields, &self.regex_flags);
        let filter = parse_query(
            filter,
            schema,
            &self.allowed_regex_fields,
            self.search_fields.as_deref(),
            &self.regex_flags,
        );
        self.list_query.clone().merge(filter)
    }

    async fn prepare_payload(&self, body: Map<String, Value>) -> Result<Document, ApiError> {
        let payload = filter_read_only(body, self.read_only_fields.as_deref());
        let payload = match &self.input_transformer {
            Some(transformer) => transformer.transform(payload).await?,
            None => payload,
        };
        Ok(convert_id(payload))
    }
}

/// Builds the router for one collection. Nest it under the collection's
/// path, e.g. `Router::new().nest("/posts", collection_router(store, options))`.
pub fn collection_router(
    store: impl DocumentStore + 'static,
    options: CollectionOptions,
) -> Router {
    let capabilities = options.capabilities;
    let gate = |action: AclAction| match (&options.acl_name, &options.authorizer) {
        (Some(acl_name), Some(authorizer)) => {
            Some(AclGate::new(Arc::clone(authorizer), acl_name, action))
        }
        _ => None,
    };

    let list_gate = gate(AclAction::List);
    let create_gate = gate(AclAction::Create);
    let edit_gate = gate(AclAction::Edit);
    let delete_gate = gate(AclAction::Delete);

    tracing::debug!(
        acl = ?options.acl_name,
        guarded = list_gate.is_some(),
        ?capabilities,
        "mounting collection routes"
    );

    let state: SharedState = Arc::new(CollectionState::new(Arc::new(store), options));

    let mut router = Router::new();
    if capabilities.list {
        router = router.route("/", guarded(get(list_documents), list_gate.clone()));
    }
    if capabilities.create {
        router = router.route("/", guarded(post(create_document), create_gate));
    }
    if capabilities.get {
        router = router.route("/{id}", guarded(get(get_document), list_gate));
    }
    if capabilities.update {
        router = router.route("/{id}", guarded(put(update_document), edit_gate));
    }
    if capabilities.delete {
        router = router.route("/{id}", guarded(delete(delete_document), delete_gate));
    }

    router.with_state(state)
}

fn guarded(
    method_router: MethodRouter<SharedState>,
    gate: Option<AclGate>,
) -> MethodRouter<SharedState> {
    match gate {
        Some(gate) => method_router.route_layer(middleware::from_fn_with_state(gate, acl_gate)),
        None => method_router,
    }
}

async fn list_documents(
    State(state): State<SharedState>,
    RawQuery(query): RawQuery,
) -> Result<(HeaderMap, Json<Vec<Document>>), ApiError> {
    let query = parse_query_string(query.as_deref().unwrap_or_default());
    let params = ListParams::from_query(&query);
    let filter = state.list_filter(query);
    let window = parse_window(&params, state.max_rows);

    let options = FindOptions {
        sort: parse_sorting(&params),
        skip: window.skip,
        limit: Some(window.limit),
        projection: state.projection.clone(),
        lean: state.use_lean,
    };

    let list_failed = |err: StoreError| {
        ApiError::from_store(StatusCode::INTERNAL_SERVER_ERROR, "Failed to list documents", err)
    };
    let documents = state.store.find(&filter, &options).await.map_err(list_failed)?;
    let total = state.store.count(&filter).await.map_err(list_failed)?;

    Ok((total_count_header(total), Json(virtual_ids(documents))))
}

async fn get_document(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<Document>, ApiError> {
    let document = state
        .store
        .find_by_id(&id, state.projection.as_ref(), state.use_lean)
        .await
        .map_err(|err| ApiError::from_store(StatusCode::BAD_REQUEST, "Bad request", err))?;

    Ok(Json(virtual_id(document)))
}

async fn create_document(
    State(state): State<SharedState>,
    Json(body): Json<Map<String, Value>>,
) -> Result<Json<Document>, ApiError> {
    let payload = state.prepare_payload(body).await?;
    let created = state
        .store
        .create(payload)
        .await
        .map_err(|err| ApiError::from_store(StatusCode::BAD_REQUEST, "Bad request", err))?;

    Ok(Json(virtual_id(created)))
}

async fn update_document(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    Json(body): Json<Map<String, Value>>,
) -> Result<Json<Document>, ApiError> {
    let payload = state.prepare_payload(body).await?;
    let updated = state
        .store
        .find_and_update(&id, payload, state.use_lean)
        .await
        .map_err(|err| ApiError::from_store(StatusCode::BAD_REQUEST, "Bad request", err))?;

    Ok(Json(virtual_id(updated)))
}

async fn delete_document(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<Document>, ApiError> {
    let deleted = state
        .store
        .find_and_delete(&id, state.use_lean)
        .await
        .map_err(|err| {
            ApiError::from_store(StatusCode::NOT_FOUND, "Element does not exist", err)
        })?;

    Ok(Json(virtual_id(deleted)))
}
