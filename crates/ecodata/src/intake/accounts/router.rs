use std::sync::Arc;

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;

use super::domain::{LoginRequest, RegisterRequest, RegisteredResponse, SessionResponse};
use super::service::AccountService;
use crate::audit::ClientInfo;
use crate::error::ServiceError;
use crate::extract::{CurrentUser, JsonBody};

pub fn account_router(service: Arc<AccountService>) -> Router {
    Router::new()
        .route("/api/auth/register", post(register_handler))
        .route("/api/auth/login", post(login_handler))
        .route("/api/auth/logout", post(logout_handler))
        .route("/api/auth/me", get(me_handler))
        .with_state(service)
}

async fn register_handler(
    State(service): State<Arc<AccountService>>,
    client: ClientInfo,
    JsonBody(request): JsonBody<RegisterRequest>,
) -> Result<Response, ServiceError> {
    let user = service.register(&client, request).await?;
    Ok((
        StatusCode::CREATED,
        Json(RegisteredResponse {
            success: true,
            user,
        }),
    )
        .into_response())
}

async fn login_handler(
    State(service): State<Arc<AccountService>>,
    client: ClientInfo,
    JsonBody(request): JsonBody<LoginRequest>,
) -> Result<Response, ServiceError> {
    let outcome = service.login(&client, request).await?;
    Ok((
        [(header::SET_COOKIE, outcome.cookie)],
        Json(SessionResponse {
            success: true,
            user: outcome.session,
        }),
    )
        .into_response())
}

async fn logout_handler(
    State(service): State<Arc<AccountService>>,
    current: Option<CurrentUser>,
    client: ClientInfo,
) -> Result<Response, ServiceError> {
    let session = current.map(|CurrentUser(session)| session);
    let cookie = service.logout(session.as_ref(), &client)?;
    Ok(([(header::SET_COOKIE, cookie)], Json(json!({ "success": true }))).into_response())
}

async fn me_handler(CurrentUser(session): CurrentUser) -> Json<serde_json::Value> {
    Json(json!({ "user": session }))
}
