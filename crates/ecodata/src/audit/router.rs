use std::sync::Arc;

use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};

use super::service::{AuditPage, AuditQuery, AuditService};
use crate::error::ServiceError;
use crate::extract::CurrentUser;

pub fn audit_router(service: Arc<AuditService>) -> Router {
    Router::new()
        .route("/api/audit", get(list_handler))
        .with_state(service)
}

pub(crate) async fn list_handler(
    State(service): State<Arc<AuditService>>,
    CurrentUser(session): CurrentUser,
    Query(query): Query<AuditQuery>,
) -> Result<Json<AuditPage>, ServiceError> {
    service.list(&session, query).map(Json)
}
