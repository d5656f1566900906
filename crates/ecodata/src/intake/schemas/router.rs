use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::json;

use super::domain::{CreateSchemaRequest, SchemaQuery, UpdateSchemaRequest};
use super::service::SchemaService;
use crate::audit::ClientInfo;
use crate::error::ServiceError;
use crate::extract::{CurrentUser, JsonBody};
use crate::intake::parse_id;

pub fn schema_router(service: Arc<SchemaService>) -> Router {
    Router::new()
        .route("/api/schemas", get(list_handler).post(create_handler))
        .route("/api/schemas/:id", get(get_handler).patch(update_handler))
        .with_state(service)
}

async fn list_handler(
    State(service): State<Arc<SchemaService>>,
    CurrentUser(_session): CurrentUser,
    Query(query): Query<SchemaQuery>,
) -> Result<Response, ServiceError> {
    let schemas = service.list(&query)?;
    Ok(Json(json!({ "schemas": schemas })).into_response())
}

async fn create_handler(
    State(service): State<Arc<SchemaService>>,
    CurrentUser(session): CurrentUser,
    client: ClientInfo,
    JsonBody(request): JsonBody<CreateSchemaRequest>,
) -> Result<Response, ServiceError> {
    let schema = service.create(&session, &client, request)?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "success": true, "schema": schema })),
    )
        .into_response())
}

async fn get_handler(
    State(service): State<Arc<SchemaService>>,
    CurrentUser(_session): CurrentUser,
    Path(id): Path<String>,
) -> Result<Response, ServiceError> {
    let schema = service.get(parse_id(&id, "schema")?)?;
    Ok(Json(json!({ "schema": schema })).into_response())
}

async fn update_handler(
    State(service): State<Arc<SchemaService>>,
    CurrentUser(session): CurrentUser,
    client: ClientInfo,
    Path(id): Path<String>,
    JsonBody(request): JsonBody<UpdateSchemaRequest>,
) -> Result<Response, ServiceError> {
    let schema = service.update(&session, &client, parse_id(&id, "schema")?, request)?;
    Ok(Json(json!({ "success": true, "schema": schema })).into_response())
}
