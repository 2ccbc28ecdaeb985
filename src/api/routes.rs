use std::sync::Arc;

use axum::Json;
use axum::Router;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use serde_json::json;

use crate::api::envelope::Reply;
use crate::api::service::{
    AdminService, CollectionQuery, CreateCollectionRequest, CreateDatabaseRequest,
    DeleteCollectionsRequest, DeleteDatabasesRequest,
};

type AppState = Arc<AdminService>;

pub fn build_router(service: Arc<AdminService>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/databases", get(list_databases))
        // create/delete are static segments and take precedence over `{name}`
        .route("/databases/create", post(create_database))
        .route("/databases/delete", post(delete_databases))
        .route("/databases/{name}", get(get_database))
        .route("/collections", get(list_collections))
        .route("/collections/create", post(create_collection))
        .route("/collections/delete", post(delete_collections))
        .route("/collections/{name}", get(get_collection))
        .with_state(service)
}

async fn blocking(task: impl FnOnce() -> Reply + Send + 'static) -> Reply {
    tokio::task::spawn_blocking(task).await.unwrap_or_else(|err| {
        log::error!("request task failed: {err}");
        Reply::error(StatusCode::INTERNAL_SERVER_ERROR, "request task failed")
    })
}

fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, Reply> {
    payload.map(|Json(request)| request).map_err(|rejection| {
        log::warn!("rejected request body: {}", rejection.body_text());
        Reply::error(StatusCode::BAD_REQUEST, rejection.body_text())
    })
}

async fn health() -> Reply {
    Reply::ok(json!({ "status": "ok" }))
}

async fn list_databases(State(service): State<AppState>) -> Reply {
    blocking(move || service.list_databases()).await
}

async fn get_database(State(service): State<AppState>, Path(name): Path<String>) -> Reply {
    blocking(move || service.get_database(&name)).await
}

async fn create_database(
    State(service): State<AppState>,
    payload: Result<Json<CreateDatabaseRequest>, JsonRejection>,
) -> Reply {
    match json_body(payload) {
        Ok(request) => blocking(move || service.create_database(request)).await,
        Err(reply) => reply,
    }
}

async fn delete_databases(
    State(service): State<AppState>,
    payload: Result<Json<DeleteDatabasesRequest>, JsonRejection>,
) -> Reply {
    match json_body(payload) {
        Ok(request) => blocking(move || service.delete_databases(request)).await,
        Err(reply) => reply,
    }
}

async fn list_collections(
    State(service): State<AppState>,
    Query(query): Query<CollectionQuery>,
) -> Reply {
    blocking(move || service.list_collections(query)).await
}

async fn get_collection(
    State(service): State<AppState>,
    Path(name): Path<String>,
    Query(query): Query<CollectionQuery>,
) -> Reply {
    blocking(move || service.get_collection(query, &name)).await
}

async fn create_collection(
    State(service): State<AppState>,
    payload: Result<Json<CreateCollectionRequest>, JsonRejection>,
) -> Reply {
    match json_body(payload) {
        Ok(request) => blocking(move || service.create_collection(request)).await,
        Err(reply) => reply,
    }
}

async fn delete_collections(
    State(service): State<AppState>,
    payload: Result<Json<DeleteCollectionsRequest>, JsonRejection>,
) -> Reply {
    match json_body(payload) {
        Ok(request) => blocking(move || service.delete_collections(request)).await,
        Err(reply) => reply,
    }
}
