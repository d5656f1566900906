use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use super::domain::{AuditAction, AuditEvent, AuditFilter, AuditRecord, ClientInfo};
use super::repository::AuditRepository;
use crate::auth::{authorize, Permission, Role, UserSession};
use crate::error::ServiceError;
use crate::intake::accounts::UserRepository;
use crate::intake::present;
use crate::pagination::{PageRequest, Pagination};
use crate::persistence::RepositoryError;

/// Stamps events with actor, origin, and time, then appends them.
#[derive(Clone)]
pub struct AuditTrail {
    repository: Arc<dyn AuditRepository>,
}

impl AuditTrail {
    pub fn new(repository: Arc<dyn AuditRepository>) -> Self {
        Self { repository }
    }

    pub fn record(
        &self,
        actor: Uuid,
        client: &ClientInfo,
        event: AuditEvent,
    ) -> Result<AuditRecord, RepositoryError> {
        let record = AuditRecord {
            id: Uuid::new_v4(),
            user_id: actor,
            action: event.action,
            resource: event.resource,
            resource_id: event.resource_id,
            details: event.details,
            ip_address: client.ip.clone(),
            user_agent: client.user_agent.clone(),
            created_at: Utc::now(),
        };

        let stored = self.repository.append(record)?;
        info!(
            actor = %stored.user_id,
            action = %stored.action,
            resource = %stored.resource,
            resource_id = %stored.resource_id,
            "audit record appended"
        );
        Ok(stored)
    }
}

/// Query parameters accepted by the audit listing.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditQuery {
    pub page: Option<String>,
    pub limit: Option<String>,
    pub action: Option<String>,
    pub resource: Option<String>,
    pub user_id: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActorSummary {
    pub full_name: String,
    pub email: String,
    pub role: Role,
}

#[derive(Debug, Clone, Serialize)]
pub struct AuditEntryView {
    #[serde(flatten)]
    pub record: AuditRecord,
    pub user: Option<ActorSummary>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AuditPage {
    pub logs: Vec<AuditEntryView>,
    pub pagination: Pagination,
}

/// Read side of the trail, restricted by [`Permission::AuditRead`].
pub struct AuditService {
    repository: Arc<dyn AuditRepository>,
    users: Arc<dyn UserRepository>,
}

impl AuditService {
    pub fn new(repository: Arc<dyn AuditRepository>, users: Arc<dyn UserRepository>) -> Self {
        Self { repository, users }
    }

    pub fn list(&self, session: &UserSession, query: AuditQuery) -> Result<AuditPage, ServiceError> {
        authorize(session, Permission::AuditRead)?;

        let filter = filter_from_query(&query)?;
        let window =
            PageRequest::from_params(query.page.as_deref(), query.limit.as_deref(), 50, 100);

        let records = self
            .repository
            .list_audit(&filter, window.offset(), window.limit)?;
        let total = self.repository.count_audit(&filter)?;

        let logs = records
            .into_iter()
            .map(|record| {
                let user = self
                    .users
                    .fetch_user(record.user_id)?
                    .map(|user| ActorSummary {
                        full_name: user.full_name,
                        email: user.email,
                        role: user.role,
                    });
                Ok(AuditEntryView { record, user })
            })
            .collect::<Result<Vec<_>, RepositoryError>>()?;

        Ok(AuditPage {
            logs,
            pagination: window.describe(total),
        })
    }
}

fn filter_from_query(query: &AuditQuery) -> Result<AuditFilter, ServiceError> {
    let action = match present(query.action.as_deref()) {
        Some(raw) => Some(
            AuditAction::parse(raw)
                .ok_or_else(|| ServiceError::validation(format!("unknown action: {raw}")))?,
        ),
        None => None,
    };

    let user_id = match present(query.user_id.as_deref()) {
        Some(raw) => Some(
            Uuid::parse_str(raw)
                .map_err(|_| ServiceError::validation("userId must be a valid id"))?,
        ),
        None => None,
    };

    Ok(AuditFilter {
        action,
        resource: present(query.resource.as_deref()).map(str::to_string),
        user_id,
    })
}
