use std::sync::Arc;

use chrono::Utc;
use serde_json::json;
use tracing::info;

use super::domain::{normalize_email, LoginRequest, RegisterRequest, User, UserView, MIN_PASSWORD_LEN};
use super::repository::UserRepository;
use crate::audit::{AuditAction, AuditEvent, AuditResource, AuditTrail, ClientInfo};
use crate::auth::{PasswordHasher, Role, SessionService, UserSession};
use crate::error::ServiceError;
use crate::intake::notifications::{Notification, NotificationKind, NotificationRepository};
use crate::intake::present;
use crate::persistence::RepositoryError;

/// A successful login: the session identity plus the `Set-Cookie` value carrying it.
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub session: UserSession,
    pub cookie: String,
}

/// Registration, login, and logout.
pub struct AccountService {
    users: Arc<dyn UserRepository>,
    notifications: Arc<dyn NotificationRepository>,
    audit: AuditTrail,
    sessions: Arc<SessionService>,
    hasher: PasswordHasher,
}

impl AccountService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        notifications: Arc<dyn NotificationRepository>,
        audit: AuditTrail,
        sessions: Arc<SessionService>,
        hasher: PasswordHasher,
    ) -> Self {
        Self {
            users,
            notifications,
            audit,
            sessions,
            hasher,
        }
    }

    pub async fn register(
        &self,
        client: &ClientInfo,
        request: RegisterRequest,
    ) -> Result<UserView, ServiceError> {
        let (Some(email), Some(password), Some(full_name)) = (
            present(request.email.as_deref()),
            request.password.as_deref().filter(|password| !password.is_empty()),
            present(request.full_name.as_deref()),
        ) else {
            return Err(ServiceError::validation(
                "email, password and fullName are required",
            ));
        };

        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(ServiceError::validation(format!(
                "password must be at least {MIN_PASSWORD_LEN} characters"
            )));
        }

        if self
            .users
            .find_user_by_email(&normalize_email(email))?
            .is_some()
        {
            return Err(ServiceError::conflict("email already registered"));
        }

        let password_hash = self.hasher.hash(password).await?;
        let role = Role::parse_or_default(request.role.as_deref());

        let user = self
            .users
            .insert_user(User::new(email, password_hash, full_name, role))
            .map_err(|err| match err {
                RepositoryError::Conflict => ServiceError::conflict("email already registered"),
                other => other.into(),
            })?;

        self.audit.record(
            user.id,
            client,
            AuditEvent::new(AuditAction::Create, AuditResource::User, user.id)
                .with_details(json!({ "email": user.email, "role": user.role })),
        )?;

        self.notifications.insert_notification(
            Notification::new(
                user.id,
                NotificationKind::Success,
                "Welcome to EcoData!",
                format!(
                    "Hello {}, your account was created successfully.",
                    user.full_name
                ),
            )
            .with_link("/dashboard"),
        )?;

        info!(user_id = %user.id, role = %user.role, "user registered");
        Ok(user.view())
    }

    pub async fn login(
        &self,
        client: &ClientInfo,
        request: LoginRequest,
    ) -> Result<LoginOutcome, ServiceError> {
        let (Some(email), Some(password)) = (
            present(request.email.as_deref()),
            request.password.as_deref().filter(|password| !password.is_empty()),
        ) else {
            return Err(ServiceError::validation("email and password are required"));
        };

        let mut user = self
            .users
            .find_user_by_email(&normalize_email(email))?
            .ok_or(ServiceError::InvalidCredentials)?;

        if !self.hasher.verify(password, &user.password_hash).await? {
            return Err(ServiceError::InvalidCredentials);
        }

        user.last_login_at = Some(Utc::now());
        self.users.update_user(user.clone())?;

        self.audit.record(
            user.id,
            client,
            AuditEvent::new(AuditAction::Login, AuditResource::User, user.id)
                .with_details(json!({ "email": user.email })),
        )?;

        let session = user.session();
        let token = self.sessions.issue(&session)?;
        info!(user_id = %user.id, "user logged in");

        Ok(LoginOutcome {
            cookie: self.sessions.session_cookie(&token),
            session,
        })
    }

    /// Returns the `Set-Cookie` value that clears the session. Audited only when a session
    /// was present.
    pub fn logout(
        &self,
        session: Option<&UserSession>,
        client: &ClientInfo,
    ) -> Result<String, ServiceError> {
        if let Some(session) = session {
            self.audit.record(
                session.user_id,
                client,
                AuditEvent::new(AuditAction::Logout, AuditResource::User, session.user_id)
                    .with_details(json!({ "email": session.email })),
            )?;
        }

        Ok(self.sessions.clear_cookie())
    }
}
