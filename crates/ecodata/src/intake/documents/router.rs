use std::sync::Arc;

use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::json;

use super::domain::{DocumentPage, DocumentQuery, UpdateDocumentRequest, UploadedFile};
use super::service::DocumentService;
use crate::audit::ClientInfo;
use crate::error::ServiceError;
use crate::extract::{CurrentUser, JsonBody};
use crate::intake::parse_id;

pub fn document_router(service: Arc<DocumentService>) -> Router {
    Router::new()
        .route("/api/documents", get(list_handler).post(upload_handler))
        .route("/api/documents/:id", get(get_handler).patch(update_handler))
        .with_state(service)
}

async fn list_handler(
    State(service): State<Arc<DocumentService>>,
    CurrentUser(session): CurrentUser,
    Query(query): Query<DocumentQuery>,
) -> Result<Json<DocumentPage>, ServiceError> {
    service.list(&session, &query).map(Json)
}

async fn upload_handler(
    State(service): State<Arc<DocumentService>>,
    CurrentUser(session): CurrentUser,
    client: ClientInfo,
    mut multipart: Multipart,
) -> Result<Response, ServiceError> {
    let mut file = None;
    let mut schema_id = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| ServiceError::validation(err.body_text()))?
    {
        let field_name = field.name().unwrap_or_default().to_string();
        match field_name.as_str() {
            "file" => {
                let filename = field.file_name().unwrap_or_default().to_string();
                let content_type = field.content_type().map(str::to_string);
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|err| ServiceError::validation(err.body_text()))?;
                file = Some(UploadedFile {
                    filename,
                    content_type,
                    bytes: bytes.to_vec(),
                });
            }
            "schemaId" => {
                schema_id = Some(
                    field
                        .text()
                        .await
                        .map_err(|err| ServiceError::validation(err.body_text()))?,
                );
            }
            _ => {}
        }
    }

    let file = file.ok_or_else(|| ServiceError::validation("file is required"))?;
    let outcome = service.upload(&session, &client, file, schema_id).await?;
    Ok((StatusCode::CREATED, Json(outcome)).into_response())
}

async fn get_handler(
    State(service): State<Arc<DocumentService>>,
    CurrentUser(session): CurrentUser,
    Path(id): Path<String>,
) -> Result<Response, ServiceError> {
    let document = service.get(&session, parse_id(&id, "document")?)?;
    Ok(Json(json!({ "document": document })).into_response())
}

async fn update_handler(
    State(service): State<Arc<DocumentService>>,
    CurrentUser(session): CurrentUser,
    client: ClientInfo,
    Path(id): Path<String>,
    JsonBody(request): JsonBody<UpdateDocumentRequest>,
) -> Result<Response, ServiceError> {
    let document = service.update(&session, &client, parse_id(&id, "document")?, request)?;
    Ok(Json(json!({ "success": true, "document": document })).into_response())
}
