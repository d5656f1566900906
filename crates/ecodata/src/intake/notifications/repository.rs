use uuid::Uuid;

use super::domain::Notification;
use crate::persistence::RepositoryError;

pub trait NotificationRepository: Send + Sync {
    fn insert_notification(
        &self,
        notification: Notification,
    ) -> Result<Notification, RepositoryError>;
    /// Newest first, at most `limit`.
    fn list_notifications(
        &self,
        user_id: Uuid,
        unread_only: bool,
        limit: usize,
    ) -> Result<Vec<Notification>, RepositoryError>;
    fn count_unread(&self, user_id: Uuid) -> Result<usize, RepositoryError>;
    /// Marks the user's notifications as read, restricted to `ids` when given. Returns how
    /// many changed state.
    fn mark_read(&self, user_id: Uuid, ids: Option<&[Uuid]>) -> Result<usize, RepositoryError>;
}
