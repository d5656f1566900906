use std::sync::Arc;

use serde_json::json;
use uuid::Uuid;

use super::domain::{MarkReadRequest, MarkReadResponse, NotificationList, NotificationQuery};
use super::repository::NotificationRepository;
use crate::audit::{AuditAction, AuditEvent, AuditResource, AuditTrail, ClientInfo};
use crate::auth::UserSession;
use crate::error::ServiceError;

const LIST_LIMIT: usize = 50;

pub struct NotificationService {
    repository: Arc<dyn NotificationRepository>,
    audit: AuditTrail,
}

impl NotificationService {
    pub fn new(repository: Arc<dyn NotificationRepository>, audit: AuditTrail) -> Self {
        Self { repository, audit }
    }

    pub fn list(
        &self,
        session: &UserSession,
        query: &NotificationQuery,
    ) -> Result<NotificationList, ServiceError> {
        let notifications =
            self.repository
                .list_notifications(session.user_id, query.unread_only(), LIST_LIMIT)?;
        let unread_count = self.repository.count_unread(session.user_id)?;

        Ok(NotificationList {
            notifications,
            unread_count,
        })
    }

    pub fn mark_read(
        &self,
        session: &UserSession,
        client: &ClientInfo,
        request: MarkReadRequest,
    ) -> Result<MarkReadResponse, ServiceError> {
        let mark_all = request.mark_all_read.unwrap_or(false);

        let updated = if mark_all {
            self.repository.mark_read(session.user_id, None)?
        } else if let Some(ids) = request.ids {
            let ids: Vec<Uuid> = ids
                .iter()
                .filter_map(|id| Uuid::parse_str(id.trim()).ok())
                .collect();
            self.repository.mark_read(session.user_id, Some(&ids))?
        } else {
            return Err(ServiceError::validation("ids or markAllRead is required"));
        };

        self.audit.record(
            session.user_id,
            client,
            AuditEvent::new(
                AuditAction::Update,
                AuditResource::Notification,
                session.user_id,
            )
            .with_details(json!({ "markAllRead": mark_all, "updated": updated })),
        )?;

        Ok(MarkReadResponse {
            success: true,
            updated,
        })
    }
}
