use super::domain::{AuditFilter, AuditRecord};
use crate::persistence::RepositoryError;

/// Append-only storage for the trail: records are never updated or deleted.
pub trait AuditRepository: Send + Sync {
    fn append(&self, record: AuditRecord) -> Result<AuditRecord, RepositoryError>;
    /// Newest first.
    fn list_audit(
        &self,
        filter: &AuditFilter,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<AuditRecord>, RepositoryError>;
    fn count_audit(&self, filter: &AuditFilter) -> Result<usize, RepositoryError>;
}
