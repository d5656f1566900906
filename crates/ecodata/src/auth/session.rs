use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use uuid::Uuid;

use super::Role;
use crate::config::AuthConfig;

/// Identity carried by a valid session token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSession {
    pub user_id: Uuid,
    pub email: String,
    pub name: String,
    pub role: Role,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Claims {
    sub: String,
    user_id: Uuid,
    email: String,
    name: String,
    role: Role,
    iat: i64,
    exp: i64,
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("unable to sign session token: {0}")]
    Signing(#[from] jsonwebtoken::errors::Error),
}

/// Cookie attributes for the session transport.
#[derive(Debug, Clone)]
pub struct CookieSettings {
    pub name: String,
    pub secure: bool,
}

/// Issues and validates HS256 session tokens.
#[derive(Clone)]
pub struct SessionService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl_secs: i64,
    cookie: CookieSettings,
}

impl SessionService {
    pub fn new(secret: &str, ttl: Duration, cookie: CookieSettings) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            ttl_secs: i64::try_from(ttl.as_secs()).unwrap_or(i64::MAX),
            cookie,
        }
    }

    pub fn from_config(config: &AuthConfig) -> Self {
        Self::new(
            &config.secret,
            config.session_ttl,
            CookieSettings {
                name: config.cookie_name.clone(),
                secure: config.secure_cookie,
            },
        )
    }

    pub fn cookie_name(&self) -> &str {
        &self.cookie.name
    }

    pub fn issue(&self, session: &UserSession) -> Result<String, SessionError> {
        self.issue_with_ttl(session, self.ttl_secs)
    }

    fn issue_with_ttl(&self, session: &UserSession, ttl_secs: i64) -> Result<String, SessionError> {
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: session.user_id.to_string(),
            user_id: session.user_id,
            email: session.email.clone(),
            name: session.name.clone(),
            role: session.role,
            iat: now,
            exp: now.saturating_add(ttl_secs),
        };

        Ok(encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &self.encoding_key,
        )?)
    }

    /// Missing, malformed, forged, and expired tokens all resolve to `None`.
    pub fn validate(&self, token: Option<&str>) -> Option<UserSession> {
        let token = token.map(str::trim).filter(|token| !token.is_empty())?;
        let validation = Validation::new(Algorithm::HS256);

        decode::<Claims>(token, &self.decoding_key, &validation)
            .ok()
            .map(|data| UserSession {
                user_id: data.claims.user_id,
                email: data.claims.email,
                name: data.claims.name,
                role: data.claims.role,
            })
    }

    /// `Set-Cookie` value carrying a freshly issued token.
    pub fn session_cookie(&self, token: &str) -> String {
        self.cookie_header(token, self.ttl_secs)
    }

    /// `Set-Cookie` value that removes the session cookie.
    pub fn clear_cookie(&self) -> String {
        self.cookie_header("", 0)
    }

    fn cookie_header(&self, value: &str, max_age: i64) -> String {
        let mut cookie = format!(
            "{}={}; HttpOnly; SameSite=Lax; Path=/; Max-Age={}",
            self.cookie.name, value, max_age
        );
        if self.cookie.secure {
            cookie.push_str("; Secure");
        }
        cookie
    }
}
