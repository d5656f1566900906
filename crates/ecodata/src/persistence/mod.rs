//! Storage contracts shared by every resource repository, plus the in-memory store used by
//! the service binary and the test-suites.

mod memory;

pub use memory::InMemoryStore;

use crate::audit::AuditRepository;
use crate::intake::accounts::UserRepository;
use crate::intake::documents::{DocumentRepository, ExtractionRepository};
use crate::intake::forms::FormRepository;
use crate::intake::marketplace::ProductRepository;
use crate::intake::notifications::NotificationRepository;
use crate::intake::schemas::SchemaRepository;

/// Error enumeration for repository failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

/// A backing store able to serve every resource repository.
pub trait RecordStore:
    UserRepository
    + DocumentRepository
    + ExtractionRepository
    + SchemaRepository
    + FormRepository
    + NotificationRepository
    + ProductRepository
    + AuditRepository
    + Send
    + Sync
{
    /// Cheap round-trip used by the health endpoint.
    fn ping(&self) -> Result<(), RepositoryError>;
}
