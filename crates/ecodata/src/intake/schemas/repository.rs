use uuid::Uuid;

use super::domain::{Schema, SchemaFilter, SchemaVersion};
use crate::persistence::RepositoryError;

pub trait SchemaRepository: Send + Sync {
    /// Fails with [`RepositoryError::Conflict`] when the slug is taken.
    fn insert_schema(&self, schema: Schema) -> Result<Schema, RepositoryError>;
    fn fetch_schema(&self, id: Uuid) -> Result<Option<Schema>, RepositoryError>;
    fn find_schema_by_slug(&self, slug: &str) -> Result<Option<Schema>, RepositoryError>;
    fn update_schema(&self, schema: Schema) -> Result<(), RepositoryError>;
    /// Most recently updated first.
    fn list_schemas(&self, filter: &SchemaFilter) -> Result<Vec<Schema>, RepositoryError>;
    fn push_schema_version(&self, version: SchemaVersion) -> Result<(), RepositoryError>;
    /// Newest first, at most `limit`.
    fn schema_versions(
        &self,
        schema_id: Uuid,
        limit: usize,
    ) -> Result<Vec<SchemaVersion>, RepositoryError>;
    fn count_schema_versions(&self, schema_id: Uuid) -> Result<usize, RepositoryError>;
}
