use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

use super::SessionService;

/// Resolves the caller's session and stores it in request extensions.
///
/// Never rejects: handlers decide whether a missing session is an error.
pub async fn resolve_session(
    State(sessions): State<Arc<SessionService>>,
    mut request: Request,
    next: Next,
) -> Response {
    let token = session_token(request.headers(), sessions.cookie_name());
    if let Some(session) = sessions.validate(token.as_deref()) {
        request.extensions_mut().insert(session);
    }

    next.run(request).await
}

/// Reads the session cookie, falling back to an `Authorization: Bearer` header.
pub fn session_token(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    cookie_value(headers, cookie_name).or_else(|| bearer_token(headers))
}

fn cookie_value(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == cookie_name)
        .map(|(_, value)| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(|token| token.trim().to_string())
        .filter(|token| !token.is_empty())
}
