use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::json;

use super::domain::{CreateFormRequest, FormPage, FormQuery, UpdateFormRequest};
use super::service::FormService;
use crate::audit::ClientInfo;
use crate::error::ServiceError;
use crate::extract::{CurrentUser, JsonBody};
use crate::intake::parse_id;

pub fn form_router(service: Arc<FormService>) -> Router {
    Router::new()
        .route("/api/forms", get(list_handler).post(create_handler))
        .route(
            "/api/forms/:id",
            get(get_handler)
                .patch(update_handler)
                .delete(delete_handler),
        )
        .with_state(service)
}

async fn list_handler(
    State(service): State<Arc<FormService>>,
    CurrentUser(session): CurrentUser,
    Query(query): Query<FormQuery>,
) -> Result<Json<FormPage>, ServiceError> {
    service.list(&session, &query).map(Json)
}

async fn create_handler(
    State(service): State<Arc<FormService>>,
    CurrentUser(session): CurrentUser,
    client: ClientInfo,
    JsonBody(request): JsonBody<CreateFormRequest>,
) -> Result<Response, ServiceError> {
    let form = service.create(&session, &client, request)?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "success": true, "form": form })),
    )
        .into_response())
}

async fn get_handler(
    State(service): State<Arc<FormService>>,
    CurrentUser(_session): CurrentUser,
    Path(id): Path<String>,
) -> Result<Response, ServiceError> {
    let form = service.get(parse_id(&id, "form")?)?;
    Ok(Json(json!({ "form": form })).into_response())
}

async fn update_handler(
    State(service): State<Arc<FormService>>,
    CurrentUser(session): CurrentUser,
    client: ClientInfo,
    Path(id): Path<String>,
    JsonBody(request): JsonBody<UpdateFormRequest>,
) -> Result<Response, ServiceError> {
    let form = service.update(&session, &client, parse_id(&id, "form")?, request)?;
    Ok(Json(json!({ "success": true, "form": form })).into_response())
}

async fn delete_handler(
    State(service): State<Arc<FormService>>,
    CurrentUser(session): CurrentUser,
    client: ClientInfo,
    Path(id): Path<String>,
) -> Result<Response, ServiceError> {
    service.delete(&session, &client, parse_id(&id, "form")?)?;
    Ok(Json(json!({ "success": true })).into_response())
}
