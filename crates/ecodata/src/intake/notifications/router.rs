use std::sync::Arc;

use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};

use super::domain::{MarkReadRequest, MarkReadResponse, NotificationList, NotificationQuery};
use super::service::NotificationService;
use crate::audit::ClientInfo;
use crate::error::ServiceError;
use crate::extract::{CurrentUser, JsonBody};

pub fn notification_router(service: Arc<NotificationService>) -> Router {
    Router::new()
        .route(
            "/api/notifications",
            get(list_handler).patch(mark_read_handler),
        )
        .with_state(service)
}

async fn list_handler(
    State(service): State<Arc<NotificationService>>,
    CurrentUser(session): CurrentUser,
    Query(query): Query<NotificationQuery>,
) -> Result<Json<NotificationList>, ServiceError> {
    service.list(&session, &query).map(Json)
}

async fn mark_read_handler(
    State(service): State<Arc<NotificationService>>,
    CurrentUser(session): CurrentUser,
    client: ClientInfo,
    JsonBody(request): JsonBody<MarkReadRequest>,
) -> Result<Json<MarkReadResponse>, ServiceError> {
    service.mark_read(&session, &client, request).map(Json)
}
