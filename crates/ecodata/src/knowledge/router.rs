use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};

use super::service::{CreatePageRequest, KnowledgeSearch, KnowledgeSearchQuery, KnowledgeService};
use crate::audit::ClientInfo;
use crate::error::ServiceError;
use crate::extract::{CurrentUser, JsonBody};

pub fn knowledge_router(service: Arc<KnowledgeService>) -> Router {
    Router::new()
        .route("/api/knowledge", get(search_handler).post(create_handler))
        .with_state(service)
}

async fn search_handler(
    State(service): State<Arc<KnowledgeService>>,
    CurrentUser(_session): CurrentUser,
    Query(query): Query<KnowledgeSearchQuery>,
) -> Result<Json<KnowledgeSearch>, ServiceError> {
    service.search(query).await.map(Json)
}

async fn create_handler(
    State(service): State<Arc<KnowledgeService>>,
    CurrentUser(session): CurrentUser,
    client: ClientInfo,
    JsonBody(request): JsonBody<CreatePageRequest>,
) -> Result<(StatusCode, Json<Value>), ServiceError> {
    let page_id = service.create_page(&session, &client, request).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "success": true, "pageId": page_id })),
    ))
}
