use std::sync::Arc;

use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};

use super::domain::{ProductQuery, PurchaseRequest};
use super::service::MarketplaceService;
use crate::audit::ClientInfo;
use crate::error::ServiceError;
use crate::extract::{CurrentUser, JsonBody};

/// The product catalogue is public; purchases need a session.
pub fn marketplace_router(service: Arc<MarketplaceService>) -> Router {
    Router::new()
        .route(
            "/api/marketplace",
            get(list_handler).post(purchase_handler),
        )
        .with_state(service)
}

async fn list_handler(
    State(service): State<Arc<MarketplaceService>>,
    Query(query): Query<ProductQuery>,
) -> Result<Json<Value>, ServiceError> {
    let products = service.list(&query)?;
    Ok(Json(json!({ "products": products })))
}

async fn purchase_handler(
    State(service): State<Arc<MarketplaceService>>,
    CurrentUser(session): CurrentUser,
    client: ClientInfo,
    JsonBody(request): JsonBody<PurchaseRequest>,
) -> Result<Json<Value>, ServiceError> {
    let purchase = service.purchase(&session, &client, request)?;
    Ok(Json(json!({ "success": true, "purchase": purchase })))
}
