use uuid::Uuid;

use super::domain::User;
use crate::persistence::RepositoryError;

pub trait UserRepository: Send + Sync {
    /// Fails with [`RepositoryError::Conflict`] when the email is taken.
    fn insert_user(&self, user: User) -> Result<User, RepositoryError>;
    fn fetch_user(&self, id: Uuid) -> Result<Option<User>, RepositoryError>;
    fn find_user_by_email(&self, email: &str) -> Result<Option<User>, RepositoryError>;
    fn update_user(&self, user: User) -> Result<(), RepositoryError>;
}
